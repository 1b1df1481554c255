use tracing::{debug, error};

use crate::{
    error::{Error, Result},
    types::{
        ApiErrorBody, ChatMessage, ChatRequest, ChatResponse, ImageGenerationRequest,
        ImageGenerationResponse, VisionContent, VisionMessage, VisionRequest,
    },
};

const IMAGE_MODEL: &str = "dall-e-3";
const IMAGE_SIZE: &str = "1024x1024";

/// Client for an OpenAI-compatible completion service.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Request a chat completion and return the first choice's text.
    pub async fn chat_completion(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model,
            messages,
            temperature: 0.5,
            max_tokens: 1000,
            top_p: 0.3,
            frequency_penalty: 0.5,
            presence_penalty: 0,
        };
        debug!(model, message_count = messages.len(), "chat completion request");

        let response = self
            .post("/v1/chat/completions")
            .json(&request)
            .send()
            .await?;
        let body: ChatResponse = self.parse(response).await?;
        first_choice(body)
    }

    /// Chat completion with an image URL alongside the prompt.
    pub async fn vision_completion(
        &self,
        model: &str,
        prompt: &str,
        image_url: &str,
    ) -> Result<String> {
        let request = VisionRequest {
            model,
            messages: vec![VisionMessage {
                role: "user",
                content: vec![VisionContent::text(prompt), VisionContent::image(image_url)],
            }],
            max_tokens: 1000,
        };
        debug!(model, image_url, "vision completion request");

        let response = self
            .post("/v1/chat/completions")
            .json(&request)
            .send()
            .await?;
        let body: ChatResponse = self.parse(response).await?;
        first_choice(body)
    }

    /// Generate an image from a prompt and return its URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let request = ImageGenerationRequest {
            model: IMAGE_MODEL,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
        };
        debug!(prompt, "image generation request");

        let response = self
            .post("/v1/images/generations")
            .json(&request)
            .send()
            .await?;
        let body: ImageGenerationResponse = self.parse(response).await?;
        body.data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or(Error::EmptyResponse)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    /// Decode a 2xx body, or map a failure status to a typed API error.
    async fn parse<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let raw = response.text().await.unwrap_or_default();
        error!(%status, body = %raw, "completion service returned failure");

        let detail = serde_json::from_str::<ApiErrorBody>(&raw)
            .ok()
            .and_then(|b| b.error);
        Err(Error::Api {
            error_type: detail
                .as_ref()
                .and_then(|d| d.error_type.clone())
                .unwrap_or_else(|| format!("http-{}", status.as_u16())),
            message: detail
                .and_then(|d| d.message)
                .unwrap_or_else(|| status.to_string()),
        })
    }
}

fn first_choice(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .find_map(|c| c.message.map(|m| m.content))
        .ok_or(Error::EmptyResponse)
}
