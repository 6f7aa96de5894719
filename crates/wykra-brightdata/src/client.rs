//! HTTP client for the Bright Data dataset API.
//!
//! Drives the trigger → progress → snapshot cycle. Every wait is a
//! `tokio::time::sleep` bounded by both the poll budget and the caller's
//! deadline, and the deadline is re-checked on every poll iteration.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use tokio::time::Instant;
use wykra_core::ProfileHandle;

use crate::error::ScrapeError;
use crate::job::{JobStatus, PollSettings, ScrapeJob};
use crate::types::{ProgressResponse, RawProfileRecord, TriggerInput, TriggerResponse};

const DEFAULT_BASE_URL: &str = "https://api.brightdata.com/";

/// Longest provider error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Client for the Bright Data dataset API.
///
/// Use [`BrightDataClient::new`] for production or
/// [`BrightDataClient::with_base_url`] to point at a mock server in tests.
pub struct BrightDataClient {
    client: Client,
    api_token: String,
    dataset_id: String,
    base_url: Url,
    request_timeout: Duration,
    poll: PollSettings,
}

impl BrightDataClient {
    /// Creates a client pointed at the production Bright Data API.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::NotConfigured`] if the token or dataset id is
    /// blank, or the underlying `reqwest::Client` cannot be constructed.
    pub fn new(
        api_token: &str,
        dataset_id: &str,
        timeout_secs: u64,
        poll: PollSettings,
    ) -> Result<Self, ScrapeError> {
        Self::with_base_url(api_token, dataset_id, timeout_secs, poll, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::NotConfigured`] if the token or dataset id is
    /// blank, `base_url` is not a valid URL, or the HTTP client cannot be built.
    pub fn with_base_url(
        api_token: &str,
        dataset_id: &str,
        timeout_secs: u64,
        poll: PollSettings,
        base_url: &str,
    ) -> Result<Self, ScrapeError> {
        if api_token.trim().is_empty() {
            return Err(ScrapeError::NotConfigured("API token is empty".to_owned()));
        }
        if dataset_id.trim().is_empty() {
            return Err(ScrapeError::NotConfigured("dataset id is empty".to_owned()));
        }

        let request_timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("wykra/0.1 (profile-insight)")
            .build()
            .map_err(|e| ScrapeError::NotConfigured(format!("cannot build HTTP client: {e}")))?;

        // Exactly one trailing slash so `Url::join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            ScrapeError::NotConfigured(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_token: api_token.to_owned(),
            dataset_id: dataset_id.to_owned(),
            base_url,
            request_timeout,
            poll,
        })
    }

    /// Worst-case duration of one [`fetch_profile`](Self::fetch_profile) call:
    /// the trigger request, the poll budget plus one overrunning poll request,
    /// and a snapshot download with its single retry.
    #[must_use]
    pub fn stage_budget(&self) -> Duration {
        self.request_timeout * 4 + self.poll.total_wait + self.poll.backoff.initial
    }

    /// Submits, polls and downloads a profile snapshot for `handle`.
    ///
    /// Every call creates a fresh provider job; nothing is deduplicated.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidHandle`] if the provider rejects the handle.
    /// - [`ScrapeError::JobTimeout`] if the poll budget or `deadline` runs out.
    /// - [`ScrapeError::ScrapeFailed`] if the job fails, expires, or yields no record.
    /// - [`ScrapeError::Http`] / [`ScrapeError::Status`] /
    ///   [`ScrapeError::Deserialize`] when the provider is unreachable or
    ///   answers with something unusable.
    pub async fn fetch_profile(
        &self,
        handle: &ProfileHandle,
        deadline: Instant,
    ) -> Result<RawProfileRecord, ScrapeError> {
        let started = Instant::now();

        let job = tokio::time::timeout_at(deadline, self.submit(handle))
            .await
            .map_err(|_| ScrapeError::JobTimeout {
                snapshot_id: None,
                last_status: JobStatus::Pending,
                waited: started.elapsed(),
            })??;

        let job = self.wait_until_ready(job, deadline).await?;

        let record = tokio::time::timeout_at(deadline, self.retrieve(&job))
            .await
            .map_err(|_| ScrapeError::JobTimeout {
                snapshot_id: Some(job.snapshot_id.clone()),
                last_status: job.status,
                waited: started.elapsed(),
            })??;

        tracing::info!(
            handle = %handle,
            snapshot_id = %job.snapshot_id,
            polls = job.polls,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "profile snapshot retrieved"
        );
        Ok(record)
    }

    /// Triggers a collection job for one handle.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::InvalidHandle`] on HTTP 400/422.
    /// - [`ScrapeError::Status`] on any other non-2xx status (auth failures included).
    /// - [`ScrapeError::Http`] on network failure.
    /// - [`ScrapeError::Deserialize`] if the body has no `snapshot_id`.
    pub async fn submit(&self, handle: &ProfileHandle) -> Result<ScrapeJob, ScrapeError> {
        let mut url = self.endpoint("datasets/v3/trigger")?;
        url.query_pairs_mut()
            .append_pair("dataset_id", &self.dataset_id)
            .append_pair("include_errors", "true")
            .append_pair("type", "discover_new")
            .append_pair("discover_by", "user_name");

        let input = [TriggerInput {
            user_name: handle.as_str(),
        }];
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&input)
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                operation: "submit",
                source,
            })?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(ScrapeError::InvalidHandle {
                handle: handle.to_string(),
                message: truncate_body(&body),
            });
        }

        let body = read_body(response, "submit").await?;
        let trigger: TriggerResponse =
            serde_json::from_str(&body).map_err(|source| ScrapeError::Deserialize {
                context: format!("trigger(handle={handle})"),
                source,
            })?;

        tracing::info!(handle = %handle, snapshot_id = %trigger.snapshot_id, "scrape job submitted");
        Ok(ScrapeJob::submitted(trigger.snapshot_id, handle.as_str()))
    }

    /// Refreshes `job.status` from the provider's progress endpoint.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Status`] on a non-2xx status.
    /// - [`ScrapeError::Http`] on network failure.
    /// - [`ScrapeError::Deserialize`] if the body has no `status`.
    pub async fn poll(&self, job: &mut ScrapeJob) -> Result<JobStatus, ScrapeError> {
        let url = self.endpoint(&format!("datasets/v3/progress/{}", job.snapshot_id))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                operation: "poll",
                source,
            })?;

        let body = read_body(response, "poll").await?;
        let progress: ProgressResponse =
            serde_json::from_str(&body).map_err(|source| ScrapeError::Deserialize {
                context: format!("progress(snapshot_id={})", job.snapshot_id),
                source,
            })?;

        job.status = JobStatus::from_provider(&progress.status);
        job.last_polled_at = Some(Utc::now());
        job.polls += 1;
        if matches!(job.status, JobStatus::Failed | JobStatus::Expired) {
            let fallback = format!("provider reported status {:?}", progress.status);
            job.reason = Some(progress.error.or(progress.message).unwrap_or(fallback));
        }

        tracing::debug!(
            snapshot_id = %job.snapshot_id,
            status = %job.status,
            polls = job.polls,
            "polled scrape job"
        );
        Ok(job.status)
    }

    /// Polls `job` with exponential back-off until it is ready.
    ///
    /// The loop stops at whichever comes first: the poll budget
    /// (`PollSettings::total_wait`) or `deadline`. A single poll request that
    /// fails transiently is logged and retried on the next iteration.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::JobTimeout`] when the budget runs out while the job is
    ///   still pending or running.
    /// - The last transient poll error when the budget runs out before any
    ///   poll succeeded, since no job status was ever observed.
    /// - [`ScrapeError::ScrapeFailed`] when the provider reports `failed` or `expired`.
    /// - Any non-transient poll error, unchanged.
    pub async fn wait_until_ready(
        &self,
        mut job: ScrapeJob,
        deadline: Instant,
    ) -> Result<ScrapeJob, ScrapeError> {
        let started = Instant::now();
        let budget_end = (started + self.poll.total_wait).min(deadline);
        let mut attempt = 0u32;
        let mut last_error: Option<ScrapeError> = None;

        loop {
            if Instant::now() >= budget_end {
                return Err(budget_exhausted(&job, started, last_error));
            }

            match tokio::time::timeout_at(budget_end, self.poll(&mut job)).await {
                Err(_) => return Err(budget_exhausted(&job, started, last_error)),
                Ok(Ok(JobStatus::Ready)) => return Ok(job),
                Ok(Ok(JobStatus::Failed | JobStatus::Expired)) => {
                    return Err(ScrapeError::ScrapeFailed {
                        reason: job
                            .reason
                            .clone()
                            .unwrap_or_else(|| job.status.to_string()),
                        snapshot_id: job.snapshot_id,
                    });
                }
                Ok(Ok(JobStatus::Pending | JobStatus::Running)) => {}
                Ok(Err(err)) if err.is_transient() => {
                    tracing::warn!(
                        snapshot_id = %job.snapshot_id,
                        attempt,
                        error = %err,
                        "transient poll failure; will poll again"
                    );
                    last_error = Some(err);
                }
                Ok(Err(err)) => return Err(err),
            }

            let now = Instant::now();
            if now >= budget_end {
                return Err(budget_exhausted(&job, started, last_error));
            }
            let delay = self.poll.backoff.delay_for(attempt).min(budget_end - now);
            tokio::time::sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Downloads the snapshot of a ready job and picks the profile record.
    ///
    /// A transient download failure (network error, 5xx, 202 still building)
    /// is retried once after the initial poll interval.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::ScrapeFailed`] if the snapshot is empty or only holds
    ///   provider error records.
    /// - The download error, if the retry fails too.
    pub async fn retrieve(&self, job: &ScrapeJob) -> Result<RawProfileRecord, ScrapeError> {
        let records = match self.download(job).await {
            Err(err) if err.is_transient() => {
                let delay = self.poll.backoff.initial;
                tracing::warn!(
                    snapshot_id = %job.snapshot_id,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "snapshot download failed; retrying once"
                );
                tokio::time::sleep(delay).await;
                self.download(job).await?
            }
            other => other?,
        };

        select_record(job, records)
    }

    async fn download(&self, job: &ScrapeJob) -> Result<Vec<RawProfileRecord>, ScrapeError> {
        let mut url = self.endpoint(&format!("datasets/v3/snapshot/{}", job.snapshot_id))?;
        url.query_pairs_mut().append_pair("format", "json");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                operation: "retrieve",
                source,
            })?;

        if response.status() == StatusCode::ACCEPTED {
            return Err(ScrapeError::SnapshotNotReady {
                snapshot_id: job.snapshot_id.clone(),
            });
        }

        let body = read_body(response, "retrieve").await?;
        let payload: serde_json::Value =
            serde_json::from_str(&body).map_err(|source| ScrapeError::Deserialize {
                context: format!("snapshot(snapshot_id={})", job.snapshot_id),
                source,
            })?;

        match payload {
            serde_json::Value::Array(items) => Ok(items.into_iter().map(RawProfileRecord).collect()),
            serde_json::Value::Object(ref obj)
                if obj.contains_key("status") && !obj.contains_key("account") =>
            {
                Err(ScrapeError::SnapshotNotReady {
                    snapshot_id: job.snapshot_id.clone(),
                })
            }
            // Single-record snapshots sometimes come back unwrapped.
            serde_json::Value::Object(_) => Ok(vec![RawProfileRecord(payload)]),
            _ => Err(ScrapeError::ScrapeFailed {
                snapshot_id: job.snapshot_id.clone(),
                reason: "snapshot payload is neither an array nor an object".to_owned(),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ScrapeError> {
        self.base_url
            .join(path)
            .map_err(|e| ScrapeError::NotConfigured(format!("invalid endpoint path {path}: {e}")))
    }
}

/// Picks the record describing the job's handle.
///
/// Preference order: a record whose account matches the handle, then the
/// first record without a provider error. Error-only snapshots fail with the
/// first provider reason.
fn select_record(
    job: &ScrapeJob,
    records: Vec<RawProfileRecord>,
) -> Result<RawProfileRecord, ScrapeError> {
    if records.is_empty() {
        return Err(ScrapeError::ScrapeFailed {
            snapshot_id: job.snapshot_id.clone(),
            reason: "snapshot contained no records".to_owned(),
        });
    }

    let mut first_error = None;
    let mut fallback = None;
    for record in records {
        if record.account().is_none() {
            if let Some(reason) = record.provider_error() {
                first_error.get_or_insert(reason);
                continue;
            }
        }
        if record
            .account()
            .is_some_and(|a| a.eq_ignore_ascii_case(&job.handle))
        {
            return Ok(record);
        }
        if fallback.is_none() {
            fallback = Some(record);
        }
    }

    fallback.ok_or_else(|| ScrapeError::ScrapeFailed {
        snapshot_id: job.snapshot_id.clone(),
        reason: first_error.unwrap_or_else(|| "snapshot held no usable record".to_owned()),
    })
}

/// Error for a poll budget that ran out. A job never observed by a successful
/// poll reports the provider failure instead of a timeout.
fn budget_exhausted(
    job: &ScrapeJob,
    started: Instant,
    last_error: Option<ScrapeError>,
) -> ScrapeError {
    match last_error {
        Some(err) if job.polls == 0 => {
            tracing::warn!(
                snapshot_id = %job.snapshot_id,
                error = %err,
                "scrape job status never observed; provider unavailable"
            );
            err
        }
        _ => timed_out(job, started),
    }
}

fn timed_out(job: &ScrapeJob, started: Instant) -> ScrapeError {
    tracing::warn!(
        snapshot_id = %job.snapshot_id,
        status = %job.status,
        polls = job.polls,
        "scrape job did not finish within its budget"
    );
    ScrapeError::JobTimeout {
        snapshot_id: Some(job.snapshot_id.clone()),
        last_status: job.status,
        waited: started.elapsed(),
    }
}

/// Reads the body and turns non-2xx statuses into [`ScrapeError::Status`].
async fn read_body(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<String, ScrapeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ScrapeError::Http { operation, source })?;
    if !status.is_success() {
        return Err(ScrapeError::Status {
            operation,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }
    Ok(body)
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
