//! The structured result of one profile analysis.

use std::fmt;

use serde::Serialize;
use wykra_core::{ProfileField, ProfileHandle};

/// How sure the model is about its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Accepts `"low"`/`"medium"`/`"high"` or a probability in `[0, 1]`.
    #[must_use]
    pub fn from_reply(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "low" => Some(Confidence::Low),
                "medium" | "moderate" => Some(Confidence::Medium),
                "high" => Some(Confidence::High),
                _ => None,
            },
            serde_json::Value::Number(n) => {
                let p = n.as_f64()?;
                if !(0.0..=1.0).contains(&p) {
                    None
                } else if p >= 0.75 {
                    Some(Confidence::High)
                } else if p >= 0.4 {
                    Some(Confidence::Medium)
                } else {
                    Some(Confidence::Low)
                }
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn capped_at(self, ceiling: Confidence) -> Confidence {
        self.min(ceiling)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

/// Final analysis returned to the caller. Never partially filled: either the
/// model produced a valid summary and tags, or no insight exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub handle: ProfileHandle,
    pub summary: String,
    pub tags: Vec<String>,
    pub confidence: Option<Confidence>,
    pub quality_score: Option<u8>,
    pub topic: Option<String>,
    pub niche: Option<String>,
    pub sponsored_frequency: Option<String>,
    pub content_authenticity: Option<String>,
    pub follower_authenticity: Option<String>,
    pub engagement_strength: Option<String>,
    pub visible_brands: Vec<String>,
    pub posts_analysis: Option<String>,
    pub hashtags_statistics: Option<String>,
    /// Profile fields the data provider did not supply.
    pub unavailable_fields: Vec<ProfileField>,
    pub unavailable_note: Option<String>,
}

/// Human-readable note listing `fields`, or `None` if nothing was missing.
#[must_use]
pub fn unavailable_note(fields: &[ProfileField]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let names: Vec<&str> = fields.iter().map(|f| f.label()).collect();
    Some(format!(
        "Not supplied by the data provider: {}. This assessment does not rely on them.",
        names.join(", ")
    ))
}
