//! SQLite-backed conversation store: conversations, turns, and attachments.
//!
//! The store exclusively owns these entities. Every operation runs against
//! the pool and releases its connection before returning; no caller holds a
//! connection across a suspension point it does not own.

pub mod error;
pub mod model;
pub mod store;

pub use {
    error::{Error, Result},
    model::{Attachment, Conversation, Turn},
    store::ConversationStore,
};
