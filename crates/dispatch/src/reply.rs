//! Outbound response delivery: chunking, attachment forwarding, and
//! assistant-turn persistence.

use {
    tracing::{debug, warn},
    uuid::Uuid,
};

use {
    weft_common::{Response, Role},
    weft_platform::{FileUpload, PlatformClient, ReplyTarget, chunk_message, paginate},
    weft_store::ConversationStore,
};

use crate::error::{Error, Result};

const MSG_FETCH_FAILED: &str = "Error generating your image, please try again later.";

/// Delivers handler responses and records the bot's own turns.
#[derive(Clone)]
pub struct Replier {
    store: ConversationStore,
    http: reqwest::Client,
}

impl Replier {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Deliver a handler response to its target.
    ///
    /// Persistence is best-effort: a store failure never blocks the
    /// in-flight reply, it only degrades future thread continuation.
    pub async fn deliver(
        &self,
        client: &dyn PlatformClient,
        target: &ReplyTarget,
        response: &Response,
    ) -> Result<()> {
        match response {
            Response::Text { message, .. } => self.send_text(client, target, message).await,
            Response::Image { url, caption } => {
                self.send_file(client, target, url, caption.as_deref()).await
            },
        }
    }

    /// Send text in order, one chunk at a time, persisting each sent chunk
    /// as an assistant turn when the target belongs to a tracked
    /// conversation.
    async fn send_text(
        &self,
        client: &dyn PlatformClient,
        target: &ReplyTarget,
        message: &str,
    ) -> Result<()> {
        let bodies = chunk_message(message);
        if bodies.is_empty() {
            debug!("empty text response, nothing to send");
            return Ok(());
        }
        let framed = paginate(bodies.clone());

        let conversation_id = if target.is_ephemeral() {
            None
        } else {
            self.conversation_for(target).await
        };

        for (body, framed) in bodies.iter().zip(&framed) {
            let sent_id = client.send_text(target, framed).await?;
            if let Some(conversation_id) = conversation_id {
                let result = self
                    .store
                    .append_turn(
                        sent_id,
                        conversation_id,
                        Role::Assistant,
                        Some(body.as_str()),
                        target.origin_id(),
                    )
                    .await;
                if let Err(err) = result {
                    warn!(sent_id, conversation_id, error = %err, "failed to persist assistant turn");
                }
            }
        }
        Ok(())
    }

    /// Fetch the resource and forward it as an attachment. Any failure,
    /// including an unexpected content type, collapses to one fixed
    /// user-visible message.
    async fn send_file(
        &self,
        client: &dyn PlatformClient,
        target: &ReplyTarget,
        url: &str,
        caption: Option<&str>,
    ) -> Result<()> {
        match self.fetch(url).await {
            Ok(upload) => {
                client.send_file(target, upload, caption).await?;
            },
            Err(err) => {
                warn!(url, error = %err, "attachment fetch failed");
                client.send_text(target, MSG_FETCH_FAILED).await?;
            },
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<FileUpload> {
        let response = self.http.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") && !content_type.starts_with("video/") {
            return Err(Error::UnsupportedContentType { url: url.into() });
        }

        let filename = format!("{}{}", Uuid::new_v4(), extension_for(&content_type));
        let data = response.bytes().await?;
        Ok(FileUpload { filename, data })
    }

    /// Resolve the conversation the reply belongs to from the turn it
    /// originates from. Absent origin or turn means nothing gets persisted.
    async fn conversation_for(&self, target: &ReplyTarget) -> Option<i64> {
        let origin_id = target.origin_id()?;
        match self.store.find_turn(origin_id).await {
            Ok(turn) => turn.map(|t| t.conversation_id),
            Err(err) => {
                warn!(origin_id, error = %err, "failed to resolve conversation for reply");
                None
            },
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        _ => "",
    }
}
