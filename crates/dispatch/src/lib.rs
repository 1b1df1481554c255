//! Event routing: free-text normalization, reply-chain reconstruction, the
//! per-event dispatcher, and outbound response delivery.

pub mod args;
pub mod dispatcher;
pub mod error;
pub mod reply;
pub mod thread;

pub use {
    dispatcher::Dispatcher,
    error::{Error, Result},
    reply::Replier,
    thread::ThreadDecision,
};
