//! The `ai` command: chat with the completion service, with a classifier
//! round trip that routes "draw me a ..." prompts to image generation.

use {
    async_trait::async_trait,
    tracing::{info, warn},
    weft_common::{keys, CommandArgs, Response},
    weft_openai::{ChatMessage, OpenAiClient},
    weft_platform::PlatformClient,
};

use crate::command::Command;

const SYSTEM_PROMPT: &str =
    "You are a chat bot. Your name is Weft. You are a helpful assistant.";
const VISION_MODEL: &str = "gpt-4-vision-preview";

const KIND_CHAT: &str = "chat";
const KIND_DRAW: &str = "draw";

const MSG_MISSING: &str = "Sorry, something went wrong. I can't see your message";
const MSG_CONFUSED: &str = "I am confused. Could you try to ask another question?";

pub struct AiCommand {
    client: OpenAiClient,
    default_model: String,
    classifier_model: String,
}

impl AiCommand {
    pub fn new(
        client: OpenAiClient,
        default_model: impl Into<String>,
        classifier_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            default_model: default_model.into(),
            classifier_model: classifier_model.into(),
        }
    }

    /// Pick the model: explicit `model` argument, else the configured default.
    fn model<'a>(&'a self, args: &'a CommandArgs) -> &'a str {
        match args.opt_str(keys::OPT_MODEL) {
            Ok(Some(model)) => model,
            _ => &self.default_model,
        }
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Response {
        match self.client.chat_completion(model, messages).await {
            Ok(text) => Response::text(text),
            Err(err) => upstream_failure(&err),
        }
    }

    async fn draw(&self, prompt: &str) -> Response {
        match self.client.generate_image(prompt).await {
            Ok(url) => Response::image(url, prompt),
            Err(err) => upstream_failure(&err),
        }
    }

    async fn vision(&self, prompt: &str, image_url: &str) -> Response {
        match self
            .client
            .vision_completion(VISION_MODEL, prompt, image_url)
            .await
        {
            Ok(text) => Response::text(text),
            Err(err) => upstream_failure(&err),
        }
    }

    /// Ask a cheap model whether `message` is a chat or a draw request.
    /// Any classifier failure falls back to chat.
    async fn classify(&self, message: &str) -> String {
        let prompt = format!(
            "Determine the given message. Whether it's a normal chat or \
             requesting to draw an image. Just respond with 'chat' or 'draw'. \
             If it's unclear, reply with 'none'. \"{message}\""
        );
        let messages = [ChatMessage::new("user", prompt)];

        match self
            .client
            .chat_completion(&self.classifier_model, &messages)
            .await
        {
            Ok(kind) => kind.trim().to_lowercase(),
            Err(err) => {
                warn!(error = %err, "classifier call failed, assuming chat");
                KIND_CHAT.to_string()
            },
        }
    }
}

#[async_trait]
impl Command for AiCommand {
    fn is_private(&self, args: &CommandArgs) -> bool {
        args.is_private()
    }

    async fn execute(
        &self,
        _client: &dyn PlatformClient,
        args: &CommandArgs,
    ) -> weft_common::Result<Response> {
        let model = self.model(args);

        // Reply continuation: the reconstructed history is the whole prompt.
        if let Some(history) = args.history() {
            info!(model, turns = history.len(), "continuing conversation");
            let mut messages = vec![ChatMessage::new("system", SYSTEM_PROMPT)];
            messages.extend(
                history
                    .iter()
                    .map(|entry| ChatMessage::new(entry.role.as_str(), entry.content.clone())),
            );
            return Ok(self.chat(model, &messages).await);
        }

        let message = match args.opt_str(keys::OPT_MESSAGE) {
            Ok(Some(message)) if !message.trim().is_empty() => message.to_string(),
            _ => return Ok(Response::failure(MSG_MISSING)),
        };

        // A quoted image routes straight to the vision variant.
        if let Ok(Some(image_url)) = args.opt_str(keys::OPT_IMAGE_URL) {
            info!(image_url, "vision completion for quoted image");
            return Ok(self.vision(&message, image_url).await);
        }

        // Quoted text becomes one-shot context ahead of the prompt.
        let prompt = match args.opt_str(keys::OPT_QUOTED_TEXT) {
            Ok(Some(quoted)) => format!("{quoted}\n\n{message}"),
            _ => message.clone(),
        };

        let kind = self.classify(&message).await;
        info!(model, kind, "ai request classified");
        match kind.as_str() {
            KIND_CHAT => {
                let messages = [
                    ChatMessage::new("system", SYSTEM_PROMPT),
                    ChatMessage::new("user", prompt),
                ];
                Ok(self.chat(model, &messages).await)
            },
            KIND_DRAW => Ok(self.draw(&message).await),
            _ => Ok(Response::failure(MSG_CONFUSED)),
        }
    }
}

/// Surface only the upstream error category, never its message.
fn upstream_failure(err: &weft_openai::Error) -> Response {
    warn!(error = %err, "completion service call failed");
    Response::failure(format!(
        "Sorry, there are issues when trying to get a response from the \
         completion service. Error: {}",
        err.category()
    ))
}
