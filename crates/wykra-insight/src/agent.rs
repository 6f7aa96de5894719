//! Insight agent: gateway call, retries, repair pass, result assembly.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use wykra_core::{AppConfig, BackoffPolicy, LlmBackend, ProfileField};

use crate::error::InsightError;
use crate::gateway::{
    build_gateway, excerpt, ChatMessage, CompletionOptions, CompletionRequest, GatewayConfig,
    LlmGateway,
};
use crate::insight::{unavailable_note, Confidence, Insight};
use crate::parse::{parse_reply, ParsedReply};
use crate::prompt::AnalysisPrompt;
use crate::retry::complete_with_retry;

const DEFAULT_MAX_TOKENS: u32 = 2048;

const REPAIR_INSTRUCTION: &str = "\
Your previous reply could not be used. Reply again with exactly one JSON object \
in the shape given in the instructions: a non-empty \"summary\" string and a \
\"tags\" array of strings, plus the optional fields. No markdown, no code \
fences, no text outside the object.";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub backend: LlmBackend,
    pub model: String,
    /// Deadline for a single gateway call.
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: BackoffPolicy,
    /// Re-prompts allowed after an unparseable reply.
    pub repair_attempts: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AgentConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            backend: config.llm_backend,
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
            max_retries: config.llm_max_retries,
            retry_backoff: config.llm_retry_backoff(),
            repair_attempts: config.llm_repair_attempts,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Worst-case time for one analysis: every exchange (the first plus each
    /// repair) exhausting its retries, with the jitter ceiling on back-off.
    #[must_use]
    pub fn stage_budget(&self) -> Duration {
        let per_exchange = self
            .timeout
            .saturating_mul(self.max_retries.saturating_add(1))
            .saturating_add(self.retry_backoff.total_for(self.max_retries).mul_f64(1.25));
        per_exchange.saturating_mul(self.repair_attempts.saturating_add(1))
    }
}

/// Turns an [`AnalysisPrompt`] into an [`Insight`] through an [`LlmGateway`].
pub struct InsightAgent {
    gateway: Arc<dyn LlmGateway>,
    config: AgentConfig,
}

impl InsightAgent {
    #[must_use]
    pub fn new(gateway: Arc<dyn LlmGateway>, config: AgentConfig) -> Self {
        Self { gateway, config }
    }

    /// Builds the agent and its gateway backend from application config.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::ConfigurationError`] if the gateway cannot be
    /// constructed (blank key, bad base URL).
    pub fn from_app_config(app: &AppConfig) -> Result<Self, InsightError> {
        let config = AgentConfig::from_app_config(app);
        let gateway = build_gateway(&GatewayConfig {
            backend: app.llm_backend,
            api_key: app.llm_api_key.clone(),
            base_url: app.llm_base_url.clone(),
            site_url: app.llm_site_url.clone(),
            timeout: config.timeout,
        })
        .map_err(|e| InsightError::ConfigurationError(e.to_string()))?;
        Ok(Self::new(gateway, config))
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Asks the model for an assessment of the prompted profile.
    ///
    /// An unparseable reply triggers up to `repair_attempts` re-prompts that
    /// show the model its own reply and the required shape again.
    ///
    /// # Errors
    ///
    /// - [`InsightError::AnalysisUnavailable`] once transient gateway errors
    ///   exhaust `max_retries`, or `deadline` passes.
    /// - [`InsightError::ConfigurationError`] on auth, unknown-model or
    ///   bad-request responses (never retried).
    /// - [`InsightError::InsightParseError`] when the last repair still fails.
    pub async fn analyze(
        &self,
        prompt: &AnalysisPrompt,
        deadline: Instant,
    ) -> Result<Insight, InsightError> {
        let handle = prompt.metadata.handle.as_str();
        let mut request = CompletionRequest {
            model: self.config.model.clone(),
            system: prompt.system.clone(),
            messages: vec![ChatMessage::user(prompt.text.clone())],
            options: CompletionOptions {
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
                json_mode: true,
            },
        };
        let mut repairs = 0u32;

        loop {
            let reply =
                complete_with_retry(self.gateway.as_ref(), &request, &self.config, deadline)
                    .await?;

            match parse_reply(&reply) {
                Ok(parsed) => {
                    let insight = assemble(parsed, prompt);
                    tracing::info!(
                        handle,
                        backend = %self.config.backend,
                        model = %self.config.model,
                        repairs,
                        tags = insight.tags.len(),
                        "insight produced"
                    );
                    return Ok(insight);
                }
                Err(reason) if repairs < self.config.repair_attempts => {
                    repairs += 1;
                    tracing::warn!(
                        handle,
                        repair = repairs,
                        repair_attempts = self.config.repair_attempts,
                        reason = %reason,
                        "unparseable model reply; asking for a repaired one"
                    );
                    request.messages.push(ChatMessage::assistant(reply));
                    request
                        .messages
                        .push(ChatMessage::user(format!("{REPAIR_INSTRUCTION}\nProblem: {reason}")));
                }
                Err(reason) => {
                    tracing::warn!(handle, repairs, reason = %reason, "model reply still unparseable");
                    return Err(InsightError::InsightParseError {
                        reason,
                        excerpt: excerpt(&reply, 200),
                    });
                }
            }
        }
    }
}

/// Combines the model's reply with facts taken from the prompt.
///
/// The unavailable-field list comes from the prompt, never the model, and a
/// profile without category data cannot yield a high-confidence insight.
fn assemble(parsed: ParsedReply, prompt: &AnalysisPrompt) -> Insight {
    let unavailable_fields = prompt.metadata.unknown_fields.clone();
    let confidence = if prompt.is_unknown(ProfileField::Categories) {
        parsed
            .confidence
            .map(|c| c.capped_at(Confidence::Medium))
    } else {
        parsed.confidence
    };

    Insight {
        handle: prompt.metadata.handle.clone(),
        summary: parsed.summary,
        tags: parsed.tags,
        confidence,
        quality_score: parsed.quality_score,
        topic: parsed.topic,
        niche: parsed.niche,
        sponsored_frequency: parsed.sponsored_frequency,
        content_authenticity: parsed.content_authenticity,
        follower_authenticity: parsed.follower_authenticity,
        engagement_strength: parsed.engagement_strength,
        visible_brands: parsed.visible_brands,
        posts_analysis: parsed.posts_analysis,
        hashtags_statistics: parsed.hashtags_statistics,
        unavailable_note: unavailable_note(&unavailable_fields),
        unavailable_fields,
    }
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;
