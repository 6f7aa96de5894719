//! Anthropic messages API backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{
    api_root, endpoint, http_client, read_body, ChatMessage, CompletionRequest, LlmGateway,
};
use crate::error::GatewayError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

pub struct AnthropicGateway {
    client: Client,
    api_key: String,
    url: Url,
}

impl AnthropicGateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConfigured`] for a blank key or invalid base URL.
    pub fn new(
        api_key: &str,
        timeout: Duration,
        base_url: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let client = http_client(api_key, timeout)?;
        let url = endpoint(
            &api_root(base_url.unwrap_or(ANTHROPIC_API_URL))?,
            "messages",
        )?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            url,
        })
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        // The messages API has no JSON mode; the system text asks for JSON.
        let body = MessagesRequest {
            model: &request.model,
            system: &request.system,
            messages: &request.messages,
            max_tokens: request.options.max_tokens,
            temperature: request.options.temperature,
        };

        tracing::debug!(gateway = "anthropic", model = %request.model, "messages request");

        let response = self
            .client
            .post(self.url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::Network)?;

        let text = read_body(response, &request.model).await?;
        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::Decode(format!("messages body: {e}")))?;

        let reply: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        if reply.trim().is_empty() {
            return Err(GatewayError::Decode(
                "response has no text content".to_owned(),
            ));
        }
        Ok(reply)
    }
}
