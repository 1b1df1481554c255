//! The mutable, string-keyed argument bag passed to command handlers.
//!
//! Handlers must not know how they were invoked (structured, free text, or
//! reply continuation): every invocation shape is normalized into a
//! [`CommandArgs`] before a handler sees it. Reads validate explicitly:
//! a missing key and a wrongly typed key are distinct error kinds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::keys;

/// Who authored a turn in a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One entry of reconstructed conversation history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Tagged value stored in the argument bag.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    History(Vec<HistoryEntry>),
}

/// Typed read failure on the argument bag.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("missing argument: {key}")]
    Missing { key: String },

    #[error("argument {key} is not a {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
    },
}

/// Canonical argument bag plus the resolved command name.
///
/// The bag is mutable by design: the dispatcher and thread reconstructor add
/// keys (`conversation`, `quoted-message-text`, `image-url`, `model`) after
/// initial parsing. Last writer wins on key collision.
#[derive(Debug, Clone)]
pub struct CommandArgs {
    command: String,
    args: HashMap<String, ArgValue>,
}

impl CommandArgs {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: HashMap::new(),
        }
    }

    /// Command name, always lowercase.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ArgValue) {
        self.args.insert(key.into(), value);
    }

    /// Required string argument.
    pub fn str(&self, key: &str) -> Result<&str, ArgError> {
        match self.args.get(key) {
            Some(ArgValue::Str(s)) => Ok(s),
            Some(_) => Err(ArgError::WrongType {
                key: key.to_string(),
                expected: "string",
            }),
            None => Err(ArgError::Missing {
                key: key.to_string(),
            }),
        }
    }

    /// Optional string argument; `None` when absent. Wrong type is still an error.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, ArgError> {
        match self.args.get(key) {
            Some(ArgValue::Str(s)) => Ok(Some(s)),
            Some(_) => Err(ArgError::WrongType {
                key: key.to_string(),
                expected: "string",
            }),
            None => Ok(None),
        }
    }

    /// Boolean argument with a default when absent.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.args.get(key) {
            Some(ArgValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Reconstructed conversation history, when the thread reconstructor
    /// injected one.
    pub fn history(&self) -> Option<&[HistoryEntry]> {
        match self.args.get(keys::OPT_CONVERSATION) {
            Some(ArgValue::History(h)) => Some(h),
            _ => None,
        }
    }

    /// Whether the reply should be visible only to the invoking user.
    ///
    /// Absent an explicit `private` option the reply is private. Only the
    /// structured paths consult this; channel replies never carry the flag
    /// and stay public.
    pub fn is_private(&self) -> bool {
        self.bool_or(keys::OPT_PRIVATE, true)
    }
}
