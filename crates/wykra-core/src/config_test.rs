use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("BRIGHTDATA_API_TOKEN", "bd-token");
    m.insert("BRIGHTDATA_INSTAGRAM_DATASET_ID", "gd_l1vikfch901nx3by4");
    m.insert("OPENROUTER_API_KEY", "or-key");
    m
}

#[test]
fn parse_environment_local() {
    assert_eq!(parse_environment("local").unwrap(), Environment::Local);
    assert_eq!(parse_environment("development").unwrap(), Environment::Local);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging-ish").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "ENVIRONMENT"));
}

#[test]
fn build_app_config_fails_without_brightdata_token() {
    let mut map = full_env();
    map.remove("BRIGHTDATA_API_TOKEN");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "BRIGHTDATA_API_TOKEN"),
        "expected MissingEnvVar(BRIGHTDATA_API_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_dataset_id_as_missing() {
    let mut map = full_env();
    map.insert("BRIGHTDATA_INSTAGRAM_DATASET_ID", "  ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "BRIGHTDATA_INSTAGRAM_DATASET_ID"),
        "expected MissingEnvVar(BRIGHTDATA_INSTAGRAM_DATASET_ID), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_all_required_vars() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Local);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.brightdata_base_url, "https://api.brightdata.com");
    assert_eq!(cfg.scrape_request_timeout_secs, 30);
    assert_eq!(cfg.scrape_poll_initial_ms, 1000);
    assert_eq!(cfg.scrape_poll_max_ms, 10_000);
    assert_eq!(cfg.scrape_total_wait_secs, 180);
    assert_eq!(cfg.llm_backend, LlmBackend::OpenRouter);
    assert_eq!(cfg.llm_api_key, "or-key");
    assert_eq!(cfg.llm_model, "anthropic/claude-3.5-sonnet");
    assert!(cfg.llm_base_url.is_none());
    assert_eq!(cfg.llm_timeout_secs, 60);
    assert_eq!(cfg.llm_max_retries, 2);
    assert_eq!(cfg.llm_retry_backoff_ms, 500);
    assert_eq!(cfg.llm_retry_backoff_max_ms, 8000);
    assert_eq!(cfg.llm_repair_attempts, 1);
}

#[test]
fn build_app_config_requires_key_for_selected_backend() {
    let mut map = full_env();
    map.insert("WYKRA_LLM_BACKEND", "anthropic");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "ANTHROPIC_API_KEY"),
        "expected MissingEnvVar(ANTHROPIC_API_KEY), got: {result:?}"
    );

    map.insert("ANTHROPIC_API_KEY", "sk-ant");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_backend, LlmBackend::Anthropic);
    assert_eq!(cfg.llm_api_key, "sk-ant");
}

#[test]
fn build_app_config_rejects_unknown_backend() {
    let mut map = full_env();
    map.insert("WYKRA_LLM_BACKEND", "carrier-pigeon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WYKRA_LLM_BACKEND"),
        "expected InvalidEnvVar(WYKRA_LLM_BACKEND), got: {result:?}"
    );
}

#[test]
fn llm_model_falls_back_to_openrouter_model() {
    let mut map = full_env();
    map.insert("OPENROUTER_MODEL", "openai/gpt-4o-mini");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_model, "openai/gpt-4o-mini");

    map.insert("WYKRA_LLM_MODEL", "meta-llama/llama-3.1-70b-instruct");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_model, "meta-llama/llama-3.1-70b-instruct");
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("WYKRA_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WYKRA_BIND_ADDR"),
        "expected InvalidEnvVar(WYKRA_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn scrape_total_wait_override() {
    let mut map = full_env();
    map.insert("WYKRA_SCRAPE_TOTAL_WAIT_SECS", "45");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.scrape_total_wait_secs, 45);
}

#[test]
fn scrape_total_wait_zero_is_rejected() {
    let mut map = full_env();
    map.insert("WYKRA_SCRAPE_TOTAL_WAIT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WYKRA_SCRAPE_TOTAL_WAIT_SECS"),
        "expected InvalidEnvVar(WYKRA_SCRAPE_TOTAL_WAIT_SECS), got: {result:?}"
    );
}

#[test]
fn zero_intervals_and_timeouts_are_rejected() {
    for var in [
        "WYKRA_SCRAPE_REQUEST_TIMEOUT_SECS",
        "WYKRA_SCRAPE_POLL_INITIAL_MS",
        "WYKRA_SCRAPE_POLL_MAX_MS",
        "WYKRA_LLM_TIMEOUT_SECS",
        "WYKRA_LLM_RETRY_BACKOFF_MS",
        "WYKRA_LLM_RETRY_BACKOFF_MAX_MS",
    ] {
        let mut map = full_env();
        map.insert(var, "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { var: ref v, .. }) if v == var),
            "expected InvalidEnvVar({var}), got: {result:?}"
        );
    }
}

#[test]
fn backend_override_requires_only_its_own_key() {
    let mut map = full_env();
    map.remove("OPENROUTER_API_KEY");
    map.insert("ANTHROPIC_API_KEY", "sk-ant");

    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "OPENROUTER_API_KEY"),
        "expected MissingEnvVar(OPENROUTER_API_KEY), got: {result:?}"
    );

    let cfg =
        build_app_config_with_backend(lookup_from_map(&map), Some(LlmBackend::Anthropic)).unwrap();
    assert_eq!(cfg.llm_backend, LlmBackend::Anthropic);
    assert_eq!(cfg.llm_api_key, "sk-ant");
}

#[test]
fn backend_override_wins_over_env_backend() {
    let mut map = full_env();
    map.insert("WYKRA_LLM_BACKEND", "carrier-pigeon");
    map.insert("OPENAI_API_KEY", "sk-openai");
    let cfg = build_app_config_with_backend(lookup_from_map(&map), Some(LlmBackend::OpenAi))
        .unwrap();
    assert_eq!(cfg.llm_backend, LlmBackend::OpenAi);
    assert_eq!(cfg.llm_api_key, "sk-openai");
}

#[test]
fn llm_site_url_is_optional() {
    let mut map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.llm_site_url.is_none());

    map.insert("WYKRA_LLM_SITE_URL", "https://wykra.example");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_site_url.as_deref(), Some("https://wykra.example"));
}

#[test]
fn llm_max_retries_invalid() {
    let mut map = full_env();
    map.insert("WYKRA_LLM_MAX_RETRIES", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "WYKRA_LLM_MAX_RETRIES"),
        "expected InvalidEnvVar(WYKRA_LLM_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn llm_repair_attempts_override() {
    let mut map = full_env();
    map.insert("WYKRA_LLM_REPAIR_ATTEMPTS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_repair_attempts, 0);
}

#[test]
fn debug_output_redacts_secrets() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("bd-token"));
    assert!(!rendered.contains("or-key"));
    assert!(rendered.contains("[redacted]"));
}
