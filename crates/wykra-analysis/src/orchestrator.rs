//! Per-request analysis orchestration.

use std::time::Duration;

use tokio::time::Instant;
use wykra_brightdata::{project, BrightDataClient, PollSettings};
use wykra_core::{AppConfig, ProfileHandle, Stage};
use wykra_insight::{prompt, Insight, InsightAgent};

use crate::error::{AnalysisError, StageError};
use crate::state::AnalysisState;

/// Outcome of one traced run: the states visited, in order, and the result.
#[derive(Debug)]
pub struct AnalysisRun {
    pub states: Vec<AnalysisState>,
    pub result: Result<Insight, AnalysisError>,
}

/// Runs handle → scrape → projection → prompt → insight for one request.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct AnalysisOrchestrator {
    scraper: BrightDataClient,
    agent: InsightAgent,
}

impl AnalysisOrchestrator {
    #[must_use]
    pub fn new(scraper: BrightDataClient, agent: InsightAgent) -> Self {
        Self { scraper, agent }
    }

    /// Builds the scraper and agent from application config.
    ///
    /// # Errors
    ///
    /// Returns a `configuration_error` [`AnalysisError`] (stage `received`) if
    /// either client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        let poll = PollSettings {
            backoff: config.scrape_poll_backoff(),
            total_wait: Duration::from_secs(config.scrape_total_wait_secs),
        };
        let scraper = BrightDataClient::with_base_url(
            &config.brightdata_api_token,
            &config.brightdata_dataset_id,
            config.scrape_request_timeout_secs,
            poll,
            &config.brightdata_base_url,
        )
        .map_err(|e| AnalysisError::new(Stage::Received, e))?;
        let agent =
            InsightAgent::from_app_config(config).map_err(|e| AnalysisError::new(Stage::Received, e))?;
        Ok(Self::new(scraper, agent))
    }

    /// Overall deadline budget: the scrape stage plus the analysis stage.
    /// Projection and prompting are pure and are not budgeted.
    #[must_use]
    pub fn request_budget(&self) -> Duration {
        self.scraper.stage_budget() + self.agent.config().stage_budget()
    }

    /// Analyzes one raw handle.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, tagged with its stage. No partial
    /// insight is ever returned.
    pub async fn analyze(&self, raw_handle: &str) -> Result<Insight, AnalysisError> {
        self.analyze_traced(raw_handle).await.result
    }

    /// Like [`analyze`](Self::analyze), also reporting the visited states.
    pub async fn analyze_traced(&self, raw_handle: &str) -> AnalysisRun {
        let mut trace = Trace::new();
        let result = self.run(raw_handle, &mut trace).await;
        match &result {
            Ok(insight) => {
                trace.enter(AnalysisState::Succeeded);
                tracing::info!(handle = %insight.handle, tags = ?insight.tags, "analysis succeeded");
            }
            Err(err) => {
                trace.enter(AnalysisState::Failed);
                tracing::warn!(
                    handle = raw_handle,
                    stage = %err.stage(),
                    kind = %err.kind(),
                    error = %err.cause(),
                    "analysis failed"
                );
            }
        }
        AnalysisRun {
            states: trace.states,
            result,
        }
    }

    async fn run(&self, raw_handle: &str, trace: &mut Trace) -> Result<Insight, AnalysisError> {
        let handle = ProfileHandle::parse(raw_handle).map_err(|e| trace.fail(e))?;
        let deadline = Instant::now() + self.request_budget();

        trace.enter(AnalysisState::Scraping);
        let record = self
            .scraper
            .fetch_profile(&handle, deadline)
            .await
            .map_err(|e| trace.fail(e))?;

        trace.enter(AnalysisState::Projecting);
        let profile = project(&record).map_err(|e| trace.fail(e))?;
        tracing::debug!(
            handle = %handle,
            unknown = profile.unknown_fields().len(),
            "profile projected"
        );

        trace.enter(AnalysisState::Prompting);
        let prompt = prompt::build(&profile);

        trace.enter(AnalysisState::Analyzing);
        self.agent
            .analyze(&prompt, deadline)
            .await
            .map_err(|e| trace.fail(e))
    }
}

/// Visited states of one request, enforcing legal transitions.
struct Trace {
    states: Vec<AnalysisState>,
}

impl Trace {
    fn new() -> Self {
        Self {
            states: vec![AnalysisState::Received],
        }
    }

    fn current(&self) -> AnalysisState {
        self.states
            .last()
            .copied()
            .unwrap_or(AnalysisState::Received)
    }

    fn enter(&mut self, next: AnalysisState) {
        let current = self.current();
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {current} -> {next}"
        );
        tracing::debug!(from = %current, to = %next, "analysis state");
        self.states.push(next);
    }

    /// Tags `error` with the stage of the current state.
    fn fail(&self, error: impl Into<StageError>) -> AnalysisError {
        let stage = self.current().stage().unwrap_or(Stage::Received);
        AnalysisError::new(stage, error)
    }
}
