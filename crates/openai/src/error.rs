/// Crate-wide result type for completion-service calls.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service returned a typed failure. Only `error_type` is ever
    /// surfaced to users; `message` stays in the logs.
    #[error("completion service error: {error_type}: {message}")]
    Api { error_type: String, message: String },

    /// Transport-level failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A 2xx response without a usable choice.
    #[error("completion response carried no choices")]
    EmptyResponse,
}

impl Error {
    /// Upstream error category, safe to show to users.
    pub fn category(&self) -> &str {
        match self {
            Self::Api { error_type, .. } => error_type,
            Self::Http(_) => "network",
            Self::EmptyResponse => "empty-response",
        }
    }
}
