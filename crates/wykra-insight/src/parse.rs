//! Turning a model reply into validated insight fields.
//!
//! Replies are accepted with or without markdown fences and with leading or
//! trailing chatter; the outermost `{ ... }` is decoded. Keys may be
//! snake_case or camelCase.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::insight::Confidence;

const MAX_TAGS: usize = 12;

/// Raw reply shape. Every value is kept loose so one mistyped optional field
/// does not reject the whole reply.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReplyPayload {
    summary: Option<Value>,
    #[serde(alias = "classificationTags", alias = "classification_tags")]
    tags: Option<Value>,
    confidence: Option<Value>,
    #[serde(alias = "qualityScore")]
    quality_score: Option<Value>,
    topic: Option<Value>,
    niche: Option<Value>,
    #[serde(alias = "sponsoredFrequency")]
    sponsored_frequency: Option<Value>,
    #[serde(alias = "contentAuthenticity")]
    content_authenticity: Option<Value>,
    #[serde(alias = "followerAuthenticity")]
    follower_authenticity: Option<Value>,
    #[serde(alias = "engagementStrength")]
    engagement_strength: Option<Value>,
    #[serde(alias = "visibleBrands")]
    visible_brands: Option<Value>,
    #[serde(alias = "postsAnalysis")]
    posts_analysis: Option<Value>,
    #[serde(alias = "hashtagsStatistics")]
    hashtags_statistics: Option<Value>,
}

/// Validated reply content, before profile-derived fields are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
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
}

/// Removes a surrounding markdown code fence, if any.
#[must_use]
pub fn strip_code_fences(reply: &str) -> &str {
    reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// The slice from the first `{` to the last `}`.
#[must_use]
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parses and validates a model reply.
///
/// # Errors
///
/// Returns a human-readable reason when the reply has no JSON object, the
/// object does not decode, `summary` is missing or blank, or `tags` is not a
/// list of strings.
pub fn parse_reply(reply: &str) -> Result<ParsedReply, String> {
    let body = outermost_object(strip_code_fences(reply))
        .ok_or_else(|| "reply contains no JSON object".to_owned())?;
    let payload: ReplyPayload =
        serde_json::from_str(body).map_err(|e| format!("reply is not valid JSON: {e}"))?;

    let summary = non_empty_text(payload.summary.as_ref())
        .ok_or_else(|| "\"summary\" is missing or empty".to_owned())?;

    let topic = non_empty_text(payload.topic.as_ref());
    let niche = non_empty_text(payload.niche.as_ref());

    let tags = match payload.tags {
        Some(Value::Array(items)) => string_list(&items)
            .ok_or_else(|| "\"tags\" must be a list of strings".to_owned())?,
        Some(Value::Null) | None => {
            let derived: Vec<String> = topic.iter().chain(niche.iter()).cloned().collect();
            if derived.is_empty() {
                return Err("\"tags\" is missing and no topic was given".to_owned());
            }
            dedup(derived)
        }
        Some(_) => return Err("\"tags\" must be a list of strings".to_owned()),
    };

    let visible_brands = match payload.visible_brands {
        Some(Value::Array(items)) => string_list(&items).unwrap_or_default(),
        _ => Vec::new(),
    };

    Ok(ParsedReply {
        summary,
        tags,
        confidence: payload.confidence.as_ref().and_then(Confidence::from_reply),
        quality_score: payload.quality_score.as_ref().and_then(quality_score),
        topic,
        niche,
        sponsored_frequency: non_empty_text(payload.sponsored_frequency.as_ref()),
        content_authenticity: non_empty_text(payload.content_authenticity.as_ref()),
        follower_authenticity: non_empty_text(payload.follower_authenticity.as_ref()),
        engagement_strength: non_empty_text(payload.engagement_strength.as_ref()),
        visible_brands,
        posts_analysis: non_empty_text(payload.posts_analysis.as_ref()),
        hashtags_statistics: non_empty_text(payload.hashtags_statistics.as_ref()),
    })
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// All-strings list, trimmed and deduplicated; `None` if any item is not a string.
fn string_list(items: &[Value]) -> Option<Vec<String>> {
    let strings = items
        .iter()
        .map(|v| v.as_str().map(str::trim).map(str::to_owned))
        .collect::<Option<Vec<_>>>()?;
    Some(dedup(strings))
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .take(MAX_TAGS)
        .collect()
}

fn quality_score(value: &Value) -> Option<u8> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rounded = score.round();
    if !(1.0..=5.0).contains(&rounded) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = rounded as u8;
    Some(score)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
