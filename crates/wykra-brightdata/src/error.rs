use std::time::Duration;

use thiserror::Error;
use wykra_core::ErrorKind;

use crate::job::JobStatus;

/// Errors returned by [`crate::BrightDataClient`].
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Token or dataset id missing, or the client could not be built.
    #[error("Bright Data client is not configured: {0}")]
    NotConfigured(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error during {operation}: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx status other than a handle rejection.
    #[error("Bright Data returned HTTP {status} during {operation}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider refused the handle (HTTP 400/422 on trigger).
    #[error("Bright Data rejected handle {handle:?}: {message}")]
    InvalidHandle { handle: String, message: String },

    /// Snapshot download was attempted before the provider finished building it.
    #[error("snapshot {snapshot_id} is not ready for download")]
    SnapshotNotReady { snapshot_id: String },

    /// The poll budget (or the request deadline) ran out.
    #[error(
        "scrape job {} still {last_status} after {}ms",
        .snapshot_id.as_deref().unwrap_or("<not submitted>"),
        .waited.as_millis()
    )]
    JobTimeout {
        snapshot_id: Option<String>,
        last_status: JobStatus,
        waited: Duration,
    },

    /// The provider reported the job as failed/expired, or returned no usable record.
    #[error("scrape job {snapshot_id} failed: {reason}")]
    ScrapeFailed { snapshot_id: String, reason: String },
}

impl ScrapeError {
    /// Returns `true` for errors worth retrying after a back-off delay.
    ///
    /// Network failures, HTTP 429, HTTP 5xx, and snapshots that are still
    /// building are transient. Everything else is a hard stop.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Http { .. } | ScrapeError::SnapshotNotReady { .. } => true,
            ScrapeError::Status { status, .. } => *status == 429 || *status >= 500,
            ScrapeError::NotConfigured(_)
            | ScrapeError::Deserialize { .. }
            | ScrapeError::InvalidHandle { .. }
            | ScrapeError::JobTimeout { .. }
            | ScrapeError::ScrapeFailed { .. } => false,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::NotConfigured(_) => ErrorKind::ConfigurationError,
            ScrapeError::Http { .. }
            | ScrapeError::Status { .. }
            | ScrapeError::Deserialize { .. }
            | ScrapeError::SnapshotNotReady { .. } => ErrorKind::ProviderUnavailable,
            ScrapeError::InvalidHandle { .. } => ErrorKind::InvalidHandle,
            ScrapeError::JobTimeout { .. } => ErrorKind::JobTimeout,
            ScrapeError::ScrapeFailed { .. } => ErrorKind::ScrapeFailed,
        }
    }
}

/// Raised by [`crate::project`] when a record lacks the minimum shape.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("malformed profile record: {0}")]
    MalformedProfileData(String),
}

impl ProjectionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProjectionError::MalformedProfileData(_) => ErrorKind::MalformedProfileData,
        }
    }
}
