use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use wykra_core::ErrorKind;

/// Failures of a single gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rate limited the request: {body}")]
    RateLimited { body: String },

    #[error("gateway returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("network error talking to the gateway: {0}")]
    Network(#[source] reqwest::Error),

    #[error("gateway call exceeded {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("gateway rejected credentials (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("model {model:?} not found: {body}")]
    ModelNotFound { model: String, body: String },

    #[error("gateway rejected the request: {body}")]
    BadRequest { body: String },

    #[error("unexpected gateway response: {0}")]
    Decode(String),

    #[error("gateway is not configured: {0}")]
    NotConfigured(String),
}

impl GatewayError {
    /// Classifies a non-2xx gateway response.
    #[must_use]
    pub fn from_status(status: StatusCode, model: &str, body: String) -> Self {
        match status.as_u16() {
            429 => GatewayError::RateLimited { body },
            401 | 403 => GatewayError::Auth {
                status: status.as_u16(),
                body,
            },
            404 => GatewayError::ModelNotFound {
                model: model.to_owned(),
                body,
            },
            s if s >= 500 => GatewayError::Server { status: s, body },
            _ => GatewayError::BadRequest { body },
        }
    }

    /// Rate limits, 5xx, network failures and timeouts are worth another try.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. }
                | GatewayError::Server { .. }
                | GatewayError::Network(_)
                | GatewayError::Timeout(_)
        )
    }

    /// Errors that retrying or repairing cannot fix without operator action.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GatewayError::Auth { .. }
                | GatewayError::ModelNotFound { .. }
                | GatewayError::BadRequest { .. }
                | GatewayError::NotConfigured(_)
        )
    }
}

/// Errors returned by [`crate::InsightAgent`].
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insight agent misconfigured: {0}")]
    ConfigurationError(String),

    #[error("analysis unavailable after {attempts} attempt(s): {cause}")]
    AnalysisUnavailable { attempts: u32, cause: String },

    #[error("model reply could not be parsed: {reason}")]
    InsightParseError { reason: String, excerpt: String },
}

impl InsightError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            InsightError::ConfigurationError(_) => ErrorKind::ConfigurationError,
            InsightError::AnalysisUnavailable { .. } => ErrorKind::AnalysisUnavailable,
            InsightError::InsightParseError { .. } => ErrorKind::InsightParseError,
        }
    }
}
