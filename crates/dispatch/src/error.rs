use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No handler registered under this name. Silent for free text, a
    /// visible ephemeral message for structured invocations.
    #[error("no handler for command {name}")]
    UnknownCommand { name: String },

    /// A recognized command with nothing after the name.
    #[error("empty message")]
    EmptyMessage,

    #[error(transparent)]
    Platform(#[from] weft_platform::Error),

    #[error(transparent)]
    Store(#[from] weft_store::Error),

    #[error(transparent)]
    Handler(#[from] weft_common::Error),

    #[error("attachment fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("resource at {url} is not an image or video")]
    UnsupportedContentType { url: String },
}

impl Error {
    /// Best-effort text shown to the user when an event fails at the
    /// dispatch boundary. Never exposes internal error detail.
    pub fn user_message(&self, command: &str) -> String {
        match self {
            Self::UnknownCommand { name } => {
                format!("Can't find a handler for command {name}")
            },
            Self::EmptyMessage => {
                "I can't see your message. Please write something after the command name.".into()
            },
            _ => format!(
                "Can't process your command. Something went wrong while processing {command}."
            ),
        }
    }
}
