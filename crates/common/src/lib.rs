//! Shared types, error definitions, and the command argument bag used across
//! all weft crates.

pub mod args;
pub mod error;
pub mod keys;
pub mod response;

pub use {
    args::{ArgError, ArgValue, CommandArgs, HistoryEntry, Role},
    error::{Error, Result},
    response::Response,
};
