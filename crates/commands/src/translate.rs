//! The `translate` command: context-menu translation of a message to English.

use {
    async_trait::async_trait,
    tracing::warn,
    weft_common::{keys, CommandArgs, Response},
    weft_openai::{ChatMessage, OpenAiClient},
    weft_platform::PlatformClient,
};

use crate::command::Command;

const SYSTEM_PROMPT: &str = "You are a translator who translates the given message to English";
const MSG_MISSING: &str = "Sorry, something went wrong. I can't see your message";

pub struct TranslateCommand {
    client: OpenAiClient,
    model: String,
}

impl TranslateCommand {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Command for TranslateCommand {
    /// Translations are for the invoking user only.
    fn is_private(&self, _args: &CommandArgs) -> bool {
        true
    }

    async fn execute(
        &self,
        _client: &dyn PlatformClient,
        args: &CommandArgs,
    ) -> weft_common::Result<Response> {
        let message = match args.opt_str(keys::OPT_MESSAGE) {
            Ok(Some(message)) if !message.trim().is_empty() => message,
            _ => return Ok(Response::failure(MSG_MISSING)),
        };

        let messages = [
            ChatMessage::new("system", SYSTEM_PROMPT),
            ChatMessage::new("user", message),
        ];
        match self.client.chat_completion(&self.model, &messages).await {
            Ok(text) => Ok(Response::text(text)),
            Err(err) => {
                warn!(error = %err, "translation call failed");
                Ok(Response::failure(format!(
                    "Sorry, there are issues when trying to get a response from \
                     the completion service. Error: {}",
                    err.category()
                )))
            },
        }
    }
}
