/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persistence layer is unreachable or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// A persisted row carries a role string the model does not know.
    #[error("turn {turn_id} has invalid role {role:?}")]
    InvalidRole { turn_id: i64, role: String },
}
