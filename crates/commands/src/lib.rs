//! Command handlers and the registry that resolves them by name.
//!
//! Handlers are routing-agnostic: the same handler serves structured
//! invocations, free-text messages, and reply continuations, and only ever
//! sees a normalized [`weft_common::CommandArgs`] bag.

pub mod ai;
pub mod manage;
pub mod registry;
pub mod track;
pub mod translate;

mod command;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_util;

pub use {
    ai::AiCommand,
    command::Command,
    manage::ManageCommand,
    registry::CommandRegistry,
    track::{TrackCommand, TrackingClient},
    translate::TranslateCommand,
};
