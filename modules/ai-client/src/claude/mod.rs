mod client;
pub(crate) mod types;

use base64::Engine;

use crate::error::{AiError, Result};
use crate::schema::StructuredOutput;
use client::{ClaudeClient, ANTHROPIC_API_URL};
use types::*;

const STRUCTURED_TOOL_NAME: &str = "structured_response";

/// An image attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Raw bytes sent inline as base64.
    Inline { media_type: String, bytes: Vec<u8> },
    /// A URL the API fetches itself.
    Url(String),
}

impl ImageInput {
    fn into_source(self) -> ImageSource {
        match self {
            ImageInput::Inline { media_type, bytes } => ImageSource::Base64 {
                media_type,
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
            ImageInput::Url(url) => ImageSource::Url { url },
        }
    }
}

// =============================================================================
// Claude
// =============================================================================

/// Claude handle. Cheap to clone; safe to share across concurrent requests.
#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
    max_tokens: u32,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            http: reqwest::Client::new(),
            max_tokens: 1024,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> ClaudeClient {
        ClaudeClient::new(&self.api_key, self.http.clone(), &self.base_url)
    }

    fn request(&self) -> ChatRequest {
        ChatRequest::new(&self.model)
            .max_tokens(self.max_tokens)
            .temperature(0.0)
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Single-turn completion returning the model's text.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = self.request().system(system).message(WireMessage::user(user));

        let response = self.client().chat(&request).await?;
        response
            .text()
            .ok_or_else(|| AiError::EmptyResponse("no text in Claude response".into()))
    }

    /// Single-turn completion over text plus attached images.
    pub async fn complete_with_images(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
        images: Vec<ImageInput>,
    ) -> Result<String> {
        let sources = images.into_iter().map(ImageInput::into_source).collect();
        let request = self
            .request()
            .system(system)
            .message(WireMessage::user_with_images(sources, user));

        let response = self.client().chat(&request).await?;
        response
            .text()
            .ok_or_else(|| AiError::EmptyResponse("no text in Claude vision response".into()))
    }

    /// Force a tool call whose input schema is `T`, and decode the tool input.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<T> {
        let request = self
            .request()
            .system(system)
            .message(WireMessage::user(user))
            .forced_tool(ToolDefinitionWire {
                name: STRUCTURED_TOOL_NAME.to_string(),
                description: format!("Return the {} as structured data.", T::type_name()),
                input_schema: T::tool_schema(),
            });

        let response = self.client().chat(&request).await?;
        let input = response
            .tool_input(STRUCTURED_TOOL_NAME)
            .ok_or_else(|| {
                AiError::EmptyResponse("no structured output in Claude response".into())
            })?;

        serde_json::from_value(input.clone())
            .map_err(|e| AiError::Parse(format!("failed to decode {}: {e}", T::type_name())))
    }
}
