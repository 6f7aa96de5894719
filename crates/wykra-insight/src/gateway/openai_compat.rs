//! OpenAI chat-completions backend, also used for OpenRouter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{api_root, endpoint, http_client, read_body, ChatRole, CompletionRequest, LlmGateway};
use crate::error::GatewayError;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const APP_TITLE: &str = "Wykra";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenRouter and OpenAI.
///
/// OpenRouter requests carry the `X-Title` attribution header, plus
/// `HTTP-Referer` once [`with_site_url`](Self::with_site_url) is set.
pub struct OpenAiCompatibleGateway {
    client: Client,
    api_key: String,
    url: Url,
    name: &'static str,
    app_name: Option<String>,
    site_url: Option<String>,
}

impl OpenAiCompatibleGateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConfigured`] for a blank key or invalid base URL.
    pub fn openrouter(
        api_key: &str,
        timeout: Duration,
        base_url: Option<&str>,
    ) -> Result<Self, GatewayError> {
        Self::build(
            "openrouter",
            api_key,
            timeout,
            base_url.unwrap_or(OPENROUTER_API_URL),
            Some(APP_TITLE),
        )
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::NotConfigured`] for a blank key or invalid base URL.
    pub fn openai(
        api_key: &str,
        timeout: Duration,
        base_url: Option<&str>,
    ) -> Result<Self, GatewayError> {
        Self::build(
            "openai",
            api_key,
            timeout,
            base_url.unwrap_or(OPENAI_API_URL),
            None,
        )
    }

    #[must_use]
    pub fn with_site_url(mut self, url: &str) -> Self {
        self.site_url = Some(url.to_owned());
        self
    }

    fn build(
        name: &'static str,
        api_key: &str,
        timeout: Duration,
        base_url: &str,
        app_name: Option<&str>,
    ) -> Result<Self, GatewayError> {
        let client = http_client(api_key, timeout)?;
        let url = endpoint(&api_root(base_url)?, "chat/completions")?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            url,
            name,
            app_name: app_name.map(str::to_owned),
            site_url: None,
        })
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: &request.system,
        });
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let body = ChatRequest {
            model: &request.model,
            messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            response_format: request
                .options
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(gateway = self.name, model = %request.model, "chat completion request");

        let mut builder = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(ref name) = self.app_name {
            builder = builder.header("X-Title", name);
        }
        if let Some(ref url) = self.site_url {
            builder = builder.header("HTTP-Referer", url);
        }

        let response = builder.send().await.map_err(GatewayError::Network)?;
        let text = read_body(response, &request.model).await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::Decode(format!("chat completion body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GatewayError::Decode("response has no message content".to_owned()))
    }
}
