//! Per-request analysis pipeline.
//!
//! [`AnalysisOrchestrator`] runs one handle through scraping, projection,
//! prompting and analysis under a single deadline, and either returns a
//! complete [`wykra_insight::Insight`] or one [`AnalysisError`] tagged with
//! the stage that produced it.

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{AnalysisError, StageError};
pub use orchestrator::{AnalysisOrchestrator, AnalysisRun};
pub use state::AnalysisState;
