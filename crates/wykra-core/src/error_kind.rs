//! Stable external error taxonomy shared by every pipeline stage.

use std::fmt;

use serde::Serialize;

/// The error kinds a caller can observe. Codes are stable snake_case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidHandle,
    ProviderUnavailable,
    JobTimeout,
    ScrapeFailed,
    MalformedProfileData,
    ConfigurationError,
    AnalysisUnavailable,
    InsightParseError,
}

impl ErrorKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidHandle => "invalid_handle",
            ErrorKind::ProviderUnavailable => "provider_unavailable",
            ErrorKind::JobTimeout => "job_timeout",
            ErrorKind::ScrapeFailed => "scrape_failed",
            ErrorKind::MalformedProfileData => "malformed_profile_data",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::AnalysisUnavailable => "analysis_unavailable",
            ErrorKind::InsightParseError => "insight_parse_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Scraping,
    Projecting,
    Prompting,
    Analyzing,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Scraping => "scraping",
            Stage::Projecting => "projecting",
            Stage::Prompting => "prompting",
            Stage::Analyzing => "analyzing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
