//! Configuration schema and loading for weft.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::WeftConfig,
};
