use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::backoff::BackoffPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Test,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which language-model gateway the insight agent talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenRouter,
    OpenAi,
    Anthropic,
}

impl LlmBackend {
    /// Environment variable holding this backend's API key.
    #[must_use]
    pub fn api_key_var(self) -> &'static str {
        match self {
            LlmBackend::OpenRouter => "OPENROUTER_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LlmBackend::OpenRouter => "openrouter",
            LlmBackend::OpenAi => "openai",
            LlmBackend::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(LlmBackend::OpenRouter),
            "openai" => Ok(LlmBackend::OpenAi),
            "anthropic" => Ok(LlmBackend::Anthropic),
            other => Err(format!(
                "unknown LLM backend {other:?} (expected openrouter, openai or anthropic)"
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub brightdata_api_token: String,
    pub brightdata_dataset_id: String,
    pub brightdata_base_url: String,
    pub scrape_request_timeout_secs: u64,
    pub scrape_poll_initial_ms: u64,
    pub scrape_poll_max_ms: u64,
    pub scrape_total_wait_secs: u64,
    pub llm_backend: LlmBackend,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_base_url: Option<String>,
    /// Sent as `HTTP-Referer` to OpenRouter for app attribution.
    pub llm_site_url: Option<String>,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_ms: u64,
    pub llm_retry_backoff_max_ms: u64,
    pub llm_repair_attempts: u32,
}

impl AppConfig {
    #[must_use]
    pub fn scrape_poll_backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.scrape_poll_initial_ms),
            Duration::from_millis(self.scrape_poll_max_ms),
        )
    }

    #[must_use]
    pub fn llm_retry_backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.llm_retry_backoff_ms),
            Duration::from_millis(self.llm_retry_backoff_max_ms),
        )
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("brightdata_api_token", &"[redacted]")
            .field("brightdata_dataset_id", &self.brightdata_dataset_id)
            .field("brightdata_base_url", &self.brightdata_base_url)
            .field(
                "scrape_request_timeout_secs",
                &self.scrape_request_timeout_secs,
            )
            .field("scrape_poll_initial_ms", &self.scrape_poll_initial_ms)
            .field("scrape_poll_max_ms", &self.scrape_poll_max_ms)
            .field("scrape_total_wait_secs", &self.scrape_total_wait_secs)
            .field("llm_backend", &self.llm_backend)
            .field("llm_api_key", &"[redacted]")
            .field("llm_model", &self.llm_model)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_site_url", &self.llm_site_url)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_backoff_ms", &self.llm_retry_backoff_ms)
            .field("llm_retry_backoff_max_ms", &self.llm_retry_backoff_max_ms)
            .field("llm_repair_attempts", &self.llm_repair_attempts)
            .finish()
    }
}
