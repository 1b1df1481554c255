//! Reqwest client for the completion service: chat completion, vision
//! completion, and image generation.

pub mod client;
pub mod error;
pub mod types;

pub use {
    client::OpenAiClient,
    error::{Error, Result},
    types::ChatMessage,
};
