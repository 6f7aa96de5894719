//! Deterministic prompt rendering for profile analysis.
//!
//! The user text depends only on the [`ProjectedProfile`]. The render time is
//! kept in [`PromptMetadata`] and never appears in the text, so two builds of
//! the same profile are byte-identical.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use wykra_core::{Field, ProfileField, ProfileHandle, ProjectedProfile};

/// Fixed system instructions: assessment dimensions and the reply shape.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are Wykra, an analytical influencer research agent. Evaluate an Instagram \
profile using only the data given in the user message.

Assess:
1. Topic and niche: the main subject of the account.
2. Sponsored content: how often sponsored content appears.
3. Content authenticity: authentic, artificial or mixed.
4. Follower authenticity: likely real, likely fake or mixed.
5. Visible brands: brands named in the data.
6. Engagement strength: weak, moderate or strong.
7. Posts analysis: posting patterns and content quality.
8. Hashtags: which hashtags appear and whether they fit the niche.

Fields marked \"unknown\" were not supplied by the data provider. Never invent, \
estimate or imply values for them, and do not express high confidence in any \
conclusion that depends on them.

Reply with one JSON object and nothing else:
{
  \"summary\": \"2-3 paragraph assessment\",
  \"tags\": [\"short classification labels\"],
  \"confidence\": \"low | medium | high\",
  \"quality_score\": <integer 1-5>,
  \"topic\": \"main topic\",
  \"niche\": \"specific niche or null\",
  \"sponsored_frequency\": \"low | medium | high\",
  \"content_authenticity\": \"authentic | artificial | mixed\",
  \"follower_authenticity\": \"likely real | likely fake | mixed\",
  \"visible_brands\": [\"brand\"],
  \"engagement_strength\": \"weak | moderate | strong\",
  \"posts_analysis\": \"posting patterns and quality\",
  \"hashtags_statistics\": \"hashtag usage\"
}

Quality score: 1 very poor or likely fake, 2 poor or suspicious, 3 average, \
4 good and authentic, 5 excellent and established.
Use null for any value the data cannot support. No markdown, no code fences.";

/// Rendering facts kept alongside the prompt text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMetadata {
    pub handle: ProfileHandle,
    pub rendered_at: DateTime<Utc>,
    pub present_fields: Vec<ProfileField>,
    pub unknown_fields: Vec<ProfileField>,
}

/// A rendered, immutable analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPrompt {
    pub system: String,
    pub text: String,
    pub metadata: PromptMetadata,
}

impl AnalysisPrompt {
    #[must_use]
    pub fn is_unknown(&self, field: ProfileField) -> bool {
        self.metadata.unknown_fields.contains(&field)
    }
}

/// Renders `profile` with the current time as metadata.
#[must_use]
pub fn build(profile: &ProjectedProfile) -> AnalysisPrompt {
    build_at(profile, Utc::now())
}

/// Renders `profile`, stamping `rendered_at` into metadata only.
#[must_use]
pub fn build_at(profile: &ProjectedProfile, rendered_at: DateTime<Utc>) -> AnalysisPrompt {
    let unknown_fields = profile.unknown_fields();
    let present_fields = ProfileField::ALL
        .into_iter()
        .filter(|f| !unknown_fields.contains(f))
        .collect();

    let mut text = String::new();
    text.push_str(
        "Analyze the Instagram profile below. Text values are JSON-encoded; \
         \"unknown\" means the data provider did not supply the field.\n\nProfile:\n",
    );
    line(&mut text, "handle", &quote(profile.handle.as_str()));
    for field in ProfileField::ALL {
        let value = render_field(profile, field).unwrap_or_else(|| "unknown".to_owned());
        line(&mut text, field.label(), &value);
    }

    text.push('\n');
    if unknown_fields.is_empty() {
        text.push_str("Unknown fields: none.\n");
    } else {
        let names: Vec<&str> = unknown_fields.iter().map(|f| f.label()).collect();
        let _ = writeln!(
            text,
            "Unknown fields: {}. Do not infer, estimate or assert values for these \
             fields; say the data is unavailable where it matters.",
            names.join(", ")
        );
    }

    AnalysisPrompt {
        system: SYSTEM_INSTRUCTIONS.to_owned(),
        text,
        metadata: PromptMetadata {
            handle: profile.handle.clone(),
            rendered_at,
            present_fields,
            unknown_fields,
        },
    }
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "- {label}: {value}");
}

/// Rendered value for `field`, or `None` when it is unknown.
fn render_field(profile: &ProjectedProfile, field: ProfileField) -> Option<String> {
    match field {
        ProfileField::FullName => text(&profile.full_name),
        ProfileField::Bio => text(&profile.bio),
        ProfileField::Followers => count(&profile.followers),
        ProfileField::Following => count(&profile.following),
        ProfileField::Posts => count(&profile.posts),
        ProfileField::EngagementRate => profile
            .engagement_rate
            .as_known()
            .map(|rate| format!("{:.2}%", rate * 100.0)),
        ProfileField::Verified => flag(&profile.verified),
        ProfileField::BusinessAccount => flag(&profile.business_account),
        ProfileField::ProfileUrl => text(&profile.profile_url),
        ProfileField::Categories => list(&profile.categories),
        ProfileField::ContentSignals => list(&profile.content_signals),
    }
}

fn text(field: &Field<String>) -> Option<String> {
    field.as_known().map(|s| quote(s))
}

fn count(field: &Field<u64>) -> Option<String> {
    field.as_known().map(u64::to_string)
}

fn flag(field: &Field<bool>) -> Option<String> {
    field
        .as_known()
        .map(|b| String::from(if *b { "yes" } else { "no" }))
}

fn list(field: &Field<Vec<String>>) -> Option<String> {
    field.as_known().map(|items| {
        if items.is_empty() {
            "none listed".to_owned()
        } else {
            items.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", ")
        }
    })
}

/// JSON string literal, so newlines and quotes in provider text stay inert.
fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
