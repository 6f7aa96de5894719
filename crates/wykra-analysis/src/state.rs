use std::fmt;

use serde::Serialize;
use wykra_core::Stage;

/// Lifecycle of one analysis request.
///
/// `Received → Scraping → Projecting → Prompting → Analyzing → Succeeded`,
/// with a jump to `Failed` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Received,
    Scraping,
    Projecting,
    Prompting,
    Analyzing,
    Succeeded,
    Failed,
}

impl AnalysisState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisState::Succeeded | AnalysisState::Failed)
    }

    /// The sequential successor, or `None` for terminal states.
    #[must_use]
    pub fn next(self) -> Option<AnalysisState> {
        match self {
            AnalysisState::Received => Some(AnalysisState::Scraping),
            AnalysisState::Scraping => Some(AnalysisState::Projecting),
            AnalysisState::Projecting => Some(AnalysisState::Prompting),
            AnalysisState::Prompting => Some(AnalysisState::Analyzing),
            AnalysisState::Analyzing => Some(AnalysisState::Succeeded),
            AnalysisState::Succeeded | AnalysisState::Failed => None,
        }
    }

    #[must_use]
    pub fn can_transition_to(self, to: AnalysisState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == AnalysisState::Failed || self.next() == Some(to)
    }

    /// Stage an error raised in this state is attributed to.
    #[must_use]
    pub fn stage(self) -> Option<Stage> {
        match self {
            AnalysisState::Received => Some(Stage::Received),
            AnalysisState::Scraping => Some(Stage::Scraping),
            AnalysisState::Projecting => Some(Stage::Projecting),
            AnalysisState::Prompting => Some(Stage::Prompting),
            AnalysisState::Analyzing => Some(Stage::Analyzing),
            AnalysisState::Succeeded | AnalysisState::Failed => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisState::Received => "received",
            AnalysisState::Scraping => "scraping",
            AnalysisState::Projecting => "projecting",
            AnalysisState::Prompting => "prompting",
            AnalysisState::Analyzing => "analyzing",
            AnalysisState::Succeeded => "succeeded",
            AnalysisState::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
