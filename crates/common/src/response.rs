//! Responses produced by command handlers, consumed by the reply formatter.

/// What a handler wants sent back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Plain text, chunked by the formatter when it exceeds the platform cap.
    /// Sent text is the only response kind persisted as assistant turns.
    Text { success: bool, message: String },
    /// A remote image to fetch and forward as an attachment.
    Image { url: String, caption: Option<String> },
}

impl Response {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text {
            success: true,
            message: message.into(),
        }
    }

    /// A user-visible failure message (handler ran, outcome was not useful).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Text {
            success: false,
            message: message.into(),
        }
    }

    pub fn image(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::Image {
            url: url.into(),
            caption: Some(caption.into()),
        }
    }
}
