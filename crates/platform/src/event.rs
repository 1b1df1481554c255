//! Inbound event shapes delivered by the platform gateway.

use serde::{Deserialize, Serialize};

/// The four shapes of inbound chat events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Platform-native command call carrying a name and typed options.
    Invocation(CommandInvocation),
    /// Free-text message, possibly carrying a resolved reply pointer.
    Message(InboundMessage),
    /// Context-menu command invoked on a target message.
    ContextMenu(ContextMenuInvocation),
}

/// A structured invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInvocation {
    /// Platform-assigned invocation id; doubles as the message id of the
    /// invoking turn.
    pub id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    pub name: String,
    /// Ordered (name, typed value) option list, projected verbatim into the
    /// argument bag.
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub value: OptionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// A free-text message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: i64,
    pub channel_id: i64,
    pub author_id: i64,
    /// Set when the author is a bot (including this one); such messages are
    /// never dispatched.
    pub author_is_bot: bool,
    pub content: String,
    /// Resolved pointer to the message this one replies to, when any.
    pub reply_to: Option<MessageRef>,
    pub attachments: Vec<MessageAttachment>,
}

/// A resolved reply pointer: the referenced message's id plus whatever of
/// its content the platform delivered alongside the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: i64,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAttachment {
    pub id: i64,
    pub url: String,
}

/// A context-menu invocation: a named command applied to a target message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMenuInvocation {
    pub id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    pub command: String,
    /// Content of the message the menu was invoked on.
    pub target_content: String,
}
