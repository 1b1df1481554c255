use weft_common::Role;

/// A persisted thread of turns sharing one command and optional model
/// selection. Created once per top-level invocation; never mutated after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: i64,
    pub command: String,
    pub model: Option<String>,
}

/// One message in a conversation thread.
///
/// `id` is always the platform-assigned message identifier, never a synthetic
/// key, so a future reply event locates the turn by the platform's own
/// reply-pointer without a secondary index. Platform ids are monotonic over
/// time, so ordering by `id` ascending is chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub id: i64,
    pub conversation_id: i64,
    pub role: Role,
    pub content: Option<String>,
    pub reply_to_id: Option<i64>,
    pub attachments: Vec<Attachment>,
}

/// A quoted image/file carried by an inbound turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: i64,
    pub turn_id: i64,
    pub url: String,
}
