//! Language-model gateway capability and its HTTP backends.

mod anthropic;
mod openai_compat;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use wykra_core::LlmBackend;

use crate::error::GatewayError;

pub use anthropic::AnthropicGateway;
pub use openai_compat::OpenAiCompatibleGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend for a JSON object reply where it supports that.
    pub json_mode: bool,
}

/// Vendor-neutral completion call: model, system text, conversation, options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub options: CompletionOptions,
}

/// One language-model backend.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Returns the assistant's text reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

/// Connection settings shared by every backend.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub backend: LlmBackend,
    pub api_key: String,
    /// Overrides the vendor's default API root.
    pub base_url: Option<String>,
    /// Attribution URL, sent as `HTTP-Referer` by the OpenRouter backend.
    pub site_url: Option<String>,
    pub timeout: Duration,
}

/// Builds the backend selected by `config.backend`.
///
/// # Errors
///
/// Returns [`GatewayError::NotConfigured`] for a blank API key, an invalid
/// base URL, or an HTTP client that cannot be built.
pub fn build_gateway(config: &GatewayConfig) -> Result<Arc<dyn LlmGateway>, GatewayError> {
    let base_url = config.base_url.as_deref();
    let gateway: Arc<dyn LlmGateway> = match config.backend {
        LlmBackend::OpenRouter => {
            let gateway =
                OpenAiCompatibleGateway::openrouter(&config.api_key, config.timeout, base_url)?;
            Arc::new(match config.site_url.as_deref() {
                Some(url) => gateway.with_site_url(url),
                None => gateway,
            })
        }
        LlmBackend::OpenAi => Arc::new(OpenAiCompatibleGateway::openai(
            &config.api_key,
            config.timeout,
            base_url,
        )?),
        LlmBackend::Anthropic => Arc::new(AnthropicGateway::new(
            &config.api_key,
            config.timeout,
            base_url,
        )?),
    };
    tracing::debug!(backend = gateway.name(), "LLM gateway ready");
    Ok(gateway)
}

fn http_client(api_key: &str, timeout: Duration) -> Result<Client, GatewayError> {
    if api_key.trim().is_empty() {
        return Err(GatewayError::NotConfigured("API key is empty".to_owned()));
    }
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent("wykra/0.1 (profile-insight)")
        .build()
        .map_err(|e| GatewayError::NotConfigured(format!("cannot build HTTP client: {e}")))
}

/// Parses `raw` as an API root that `Url::join` appends to.
fn api_root(raw: &str) -> Result<Url, GatewayError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised)
        .map_err(|e| GatewayError::NotConfigured(format!("invalid base URL '{raw}': {e}")))
}

fn endpoint(root: &Url, path: &str) -> Result<Url, GatewayError> {
    root.join(path)
        .map_err(|e| GatewayError::NotConfigured(format!("invalid endpoint {path}: {e}")))
}

/// Reads the body of a response, classifying non-2xx statuses.
async fn read_body(response: reqwest::Response, model: &str) -> Result<String, GatewayError> {
    let status = response.status();
    let body = response.text().await.map_err(GatewayError::Network)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(GatewayError::from_status(status, model, excerpt(&body, 500)))
    }
}

/// At most `max` bytes of `text`, cut at a char boundary.
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
