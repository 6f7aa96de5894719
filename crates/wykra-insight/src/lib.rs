//! Prompt rendering and LLM-backed profile assessment.
//!
//! [`prompt::build`] renders a [`wykra_core::ProjectedProfile`] into a
//! deterministic [`AnalysisPrompt`]. [`InsightAgent`] sends it through an
//! [`LlmGateway`] backend, retries transient failures, repairs malformed
//! replies once, and returns an [`Insight`].

pub mod agent;
pub mod error;
pub mod gateway;
pub mod insight;
pub mod parse;
pub mod prompt;
pub(crate) mod retry;

pub use agent::{AgentConfig, InsightAgent};
pub use error::{GatewayError, InsightError};
pub use gateway::{
    build_gateway, AnthropicGateway, ChatMessage, ChatRole, CompletionOptions, CompletionRequest,
    GatewayConfig, LlmGateway, OpenAiCompatibleGateway,
};
pub use insight::{Confidence, Insight};
pub use prompt::{build, build_at, AnalysisPrompt, PromptMetadata};
