use crate::app_config::{AppConfig, Environment, LlmBackend};
use crate::ConfigError;

const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Like [`load_app_config`], with `backend` taking precedence over
/// `WYKRA_LLM_BACKEND`. Only the chosen backend's API key is required.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_with_backend(
    backend: Option<LlmBackend>,
) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config_with_backend(|key| std::env::var(key), backend)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Pure parsing/validation, decoupled from the process environment so it can
/// be tested with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    build_app_config_with_backend(lookup, None)
}

fn build_app_config_with_backend<F>(
    lookup: F,
    backend: Option<LlmBackend>,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("ENVIRONMENT", "local"))?;

    let bind_addr = or_default("WYKRA_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "WYKRA_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("WYKRA_LOG_LEVEL", "info");

    let brightdata_api_token = require("BRIGHTDATA_API_TOKEN")?;
    let brightdata_dataset_id = require("BRIGHTDATA_INSTAGRAM_DATASET_ID")?;
    let brightdata_base_url = or_default("BRIGHTDATA_BASE_URL", "https://api.brightdata.com");
    let scrape_request_timeout_secs = parse_u64("WYKRA_SCRAPE_REQUEST_TIMEOUT_SECS", "30")?;
    let scrape_poll_initial_ms = parse_u64("WYKRA_SCRAPE_POLL_INITIAL_MS", "1000")?;
    let scrape_poll_max_ms = parse_u64("WYKRA_SCRAPE_POLL_MAX_MS", "10000")?;
    let scrape_total_wait_secs = parse_u64("WYKRA_SCRAPE_TOTAL_WAIT_SECS", "180")?;

    let llm_backend = match backend {
        Some(backend) => backend,
        None => or_default("WYKRA_LLM_BACKEND", "openrouter")
            .parse::<LlmBackend>()
            .map_err(|reason| ConfigError::InvalidEnvVar {
                var: "WYKRA_LLM_BACKEND".to_string(),
                reason,
            })?,
    };
    let llm_api_key = require(llm_backend.api_key_var())?;
    let llm_model = lookup("WYKRA_LLM_MODEL")
        .or_else(|_| lookup("OPENROUTER_MODEL"))
        .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let llm_base_url = lookup("WYKRA_LLM_BASE_URL").ok();
    let llm_site_url = lookup("WYKRA_LLM_SITE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let llm_timeout_secs = parse_u64("WYKRA_LLM_TIMEOUT_SECS", "60")?;
    let llm_max_retries = parse_u32("WYKRA_LLM_MAX_RETRIES", "2")?;
    let llm_retry_backoff_ms = parse_u64("WYKRA_LLM_RETRY_BACKOFF_MS", "500")?;
    let llm_retry_backoff_max_ms = parse_u64("WYKRA_LLM_RETRY_BACKOFF_MAX_MS", "8000")?;
    let llm_repair_attempts = parse_u32("WYKRA_LLM_REPAIR_ATTEMPTS", "1")?;

    for (var, value) in [
        ("WYKRA_SCRAPE_REQUEST_TIMEOUT_SECS", scrape_request_timeout_secs),
        ("WYKRA_SCRAPE_POLL_INITIAL_MS", scrape_poll_initial_ms),
        ("WYKRA_SCRAPE_POLL_MAX_MS", scrape_poll_max_ms),
        ("WYKRA_SCRAPE_TOTAL_WAIT_SECS", scrape_total_wait_secs),
        ("WYKRA_LLM_TIMEOUT_SECS", llm_timeout_secs),
        ("WYKRA_LLM_RETRY_BACKOFF_MS", llm_retry_backoff_ms),
        ("WYKRA_LLM_RETRY_BACKOFF_MAX_MS", llm_retry_backoff_max_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        brightdata_api_token,
        brightdata_dataset_id,
        brightdata_base_url,
        scrape_request_timeout_secs,
        scrape_poll_initial_ms,
        scrape_poll_max_ms,
        scrape_total_wait_secs,
        llm_backend,
        llm_api_key,
        llm_model,
        llm_base_url,
        llm_site_url,
        llm_timeout_secs,
        llm_max_retries,
        llm_retry_backoff_ms,
        llm_retry_backoff_max_ms,
        llm_repair_attempts,
    })
}

/// Parse the `ENVIRONMENT` value. Unknown values are rejected.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "local" | "development" => Ok(Environment::Local),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ENVIRONMENT".to_string(),
            reason: format!("unknown environment {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
