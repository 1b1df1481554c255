//! The messaging-platform boundary: inbound event shapes, the outbound
//! client capability trait, and platform message-size limits.
//!
//! The gateway connection itself lives outside this workspace; everything
//! weft needs from the platform flows through [`PlatformClient`].

pub mod chunk;
pub mod client;
pub mod error;
pub mod event;

pub use {
    chunk::{MAX_CHUNK_LEN, MAX_MESSAGE_LEN, chunk_message, chunk_text, paginate},
    client::{
        CommandSpec, FileUpload, OptionKind, OptionSpec, PlatformClient, RegisteredCommand,
        ReplyTarget,
    },
    error::{Error, Result},
    event::{
        CommandInvocation, CommandOption, ContextMenuInvocation, InboundEvent, InboundMessage,
        MessageAttachment, MessageRef, OptionValue,
    },
};
