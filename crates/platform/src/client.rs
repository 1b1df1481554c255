//! Outbound capability trait implemented per platform connection.

use {async_trait::async_trait, bytes::Bytes};

use crate::error::Result;

/// Where a reply goes: a deferred invocation follow-up or a channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    /// Follow-up to a deferred structured invocation.
    Invocation { id: i64, ephemeral: bool },
    /// Plain channel message, optionally threaded onto a prior message.
    Channel {
        channel_id: i64,
        reply_to: Option<i64>,
    },
}

impl ReplyTarget {
    /// Id of the inbound turn this reply originates from, used to resolve
    /// the conversation when persisting assistant turns.
    pub fn origin_id(&self) -> Option<i64> {
        match self {
            Self::Invocation { id, .. } => Some(*id),
            Self::Channel { reply_to, .. } => *reply_to,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Invocation { ephemeral: true, .. })
    }
}

/// An attachment payload forwarded to the platform.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub data: Bytes,
}

/// Declaration of a named command within an administrative scope.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSpec>,
}

#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub kind: OptionKind,
    /// (label, value) choice pairs; empty for free-form options.
    pub choices: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Boolean,
}

/// A command already registered with the platform.
#[derive(Debug, Clone)]
pub struct RegisteredCommand {
    pub id: i64,
    pub name: String,
}

/// Everything weft asks of the messaging platform.
///
/// Passed explicitly into each handler call; never stored in shared
/// singleton state.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Acknowledge a structured invocation with the deferred "thinking"
    /// signal before slow handler work begins. The privacy flag is fixed
    /// here and cannot change mid-flight.
    async fn defer(&self, invocation_id: i64, ephemeral: bool) -> Result<()>;

    /// Send text; returns the platform-assigned id of the sent message.
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> Result<i64>;

    /// Send a file attachment with an optional caption; returns the sent
    /// message id.
    async fn send_file(
        &self,
        target: &ReplyTarget,
        file: FileUpload,
        caption: Option<&str>,
    ) -> Result<i64>;

    /// Register a named command in a guild scope; returns the command id.
    async fn register_command(&self, guild_id: i64, spec: &CommandSpec) -> Result<i64>;

    async fn list_commands(&self, guild_id: i64) -> Result<Vec<RegisteredCommand>>;

    async fn delete_command(&self, guild_id: i64, command_id: i64) -> Result<()>;
}
