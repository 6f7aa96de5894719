use thiserror::Error;
use wykra_brightdata::{ProjectionError, ScrapeError};
use wykra_core::{ErrorKind, HandleError, Stage};
use wykra_insight::InsightError;

/// The stage-local error, passed through unchanged.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Insight(#[from] InsightError),
}

impl StageError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::Handle(_) => ErrorKind::InvalidHandle,
            StageError::Scrape(e) => e.kind(),
            StageError::Projection(e) => e.kind(),
            StageError::Insight(e) => e.kind(),
        }
    }
}

/// Terminal failure of one analysis request.
#[derive(Debug, Error)]
#[error("{} at {stage} stage: {source}", .source.kind())]
pub struct AnalysisError {
    stage: Stage,
    #[source]
    source: StageError,
}

impl AnalysisError {
    pub fn new(stage: Stage, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Human-readable cause, without the kind and stage prefix.
    #[must_use]
    pub fn cause(&self) -> String {
        self.source.to_string()
    }

    #[must_use]
    pub fn source_error(&self) -> &StageError {
        &self.source
    }
}
