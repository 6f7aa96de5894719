//! Scrape job state and polling budget.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use wykra_core::BackoffPolicy;

/// Lifecycle state of a Bright Data snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Ready,
    Failed,
    Expired,
}

impl JobStatus {
    /// Maps the provider's status string onto the job lifecycle.
    ///
    /// Unrecognised values are treated as [`JobStatus::Running`]: the provider
    /// adds intermediate states from time to time, and the poll budget still
    /// bounds the wait.
    #[must_use]
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "starting" | "pending" | "queued" => JobStatus::Pending,
            "ready" | "done" | "completed" => JobStatus::Ready,
            "failed" | "error" | "canceled" | "cancelled" => JobStatus::Failed,
            "expired" | "deleted" => JobStatus::Expired,
            _ => JobStatus::Running,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed | JobStatus::Expired)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
            JobStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asynchronous collection request. Owned by the client until the
/// snapshot is downloaded or abandoned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeJob {
    pub snapshot_id: String,
    pub handle: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub polls: u32,
    /// Provider-supplied reason once the job failed or expired.
    pub reason: Option<String>,
}

impl ScrapeJob {
    pub(crate) fn submitted(snapshot_id: String, handle: &str) -> Self {
        Self {
            snapshot_id,
            handle: handle.to_owned(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            last_polled_at: None,
            polls: 0,
            reason: None,
        }
    }
}

/// Polling budget: exponential back-off between polls, bounded by `total_wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub backoff: BackoffPolicy,
    pub total_wait: Duration,
}

impl PollSettings {
    #[must_use]
    pub fn new(initial: Duration, max_interval: Duration, total_wait: Duration) -> Self {
        Self {
            backoff: BackoffPolicy::new(initial, max_interval),
            total_wait,
        }
    }
}
