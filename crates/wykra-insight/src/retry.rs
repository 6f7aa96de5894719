//! Retry with exponential back-off and jitter for gateway calls.
//!
//! Transient gateway errors (429, 5xx, network, per-call timeout) are retried
//! up to `max_retries` times. Configuration-class errors stop immediately.
//! Every call and every back-off sleep is bounded by the request deadline.

use tokio::time::Instant;

use crate::agent::AgentConfig;
use crate::error::{GatewayError, InsightError};
use crate::gateway::{CompletionRequest, LlmGateway};

/// Sends `request`, retrying transient failures.
///
/// | Attempt | Sleep before next attempt          |
/// |---------|------------------------------------|
/// | 1       | backoff.initial × 2⁰ ± 25 % jitter |
/// | 2       | backoff.initial × 2¹ ± 25 % jitter |
/// | n       | capped at backoff.max_interval     |
pub(crate) async fn complete_with_retry(
    gateway: &dyn LlmGateway,
    request: &CompletionRequest,
    config: &AgentConfig,
    deadline: Instant,
) -> Result<String, InsightError> {
    let max_retries = config.max_retries;
    let mut attempt = 0u32;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(InsightError::AnalysisUnavailable {
                attempts: attempt,
                cause: "request deadline reached before the gateway call".to_owned(),
            });
        }

        let call_deadline = (now + config.timeout).min(deadline);
        let outcome = match tokio::time::timeout_at(call_deadline, gateway.complete(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(call_deadline - now)),
        };

        let err = match outcome {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };
        let calls = attempt + 1;

        if err.is_configuration() {
            tracing::error!(gateway = gateway.name(), error = %err, "LLM gateway rejected configuration");
            return Err(InsightError::ConfigurationError(err.to_string()));
        }
        if !err.is_retriable() || attempt >= max_retries {
            return Err(InsightError::AnalysisUnavailable {
                attempts: calls,
                cause: err.to_string(),
            });
        }

        let delay = config
            .retry_backoff
            .delay_for(attempt)
            .mul_f64(rand::random::<f64>() * 0.5 + 0.75);
        if Instant::now() + delay >= deadline {
            return Err(InsightError::AnalysisUnavailable {
                attempts: calls,
                cause: format!("request deadline leaves no room to retry: {err}"),
            });
        }

        tracing::warn!(
            gateway = gateway.name(),
            attempt = calls,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "LLM gateway transient error; retrying after back-off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
