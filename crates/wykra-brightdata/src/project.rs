//! Projection from a raw Bright Data record to [`wykra_core::ProjectedProfile`].
//!
//! Every field is extracted on its own: a missing, null or mistyped source
//! value makes that one field `Unknown` and never aborts the projection. The
//! only hard failure is a record that does not identify its account.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use wykra_core::{Field, ProfileHandle, ProjectedProfile};

use crate::error::ProjectionError;
use crate::types::RawProfileRecord;

pub const MAX_BIO_CHARS: usize = 1000;
pub const MAX_CATEGORIES: usize = 10;
pub const MAX_CONTENT_SIGNALS: usize = 30;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("valid regex"));

/// Projects a raw snapshot record into a bounded, typed profile.
///
/// # Errors
///
/// Returns [`ProjectionError::MalformedProfileData`] if the record is not a
/// JSON object, or carries no account name that is a valid handle.
pub fn project(record: &RawProfileRecord) -> Result<ProjectedProfile, ProjectionError> {
    let obj = record.0.as_object().ok_or_else(|| {
        ProjectionError::MalformedProfileData(format!(
            "expected a JSON object, got {}",
            json_type(&record.0)
        ))
    })?;

    let account = record.account().ok_or_else(|| {
        ProjectionError::MalformedProfileData(
            "record has no account, username or user_name".to_owned(),
        )
    })?;
    let handle = ProfileHandle::parse(account).map_err(|e| {
        ProjectionError::MalformedProfileData(format!("record account {account:?}: {e}"))
    })?;

    Ok(ProjectedProfile {
        handle,
        full_name: first_text(obj, &["profile_name", "full_name", "name"]).into(),
        bio: first_text(obj, &["biography", "bio"])
            .map(|bio| truncate_chars(&bio, MAX_BIO_CHARS))
            .into(),
        followers: first_count(obj, &["followers", "followers_count"]).into(),
        following: first_count(obj, &["following", "following_count"]).into(),
        posts: first_count(obj, &["posts_count", "posts"]).into(),
        engagement_rate: engagement_rate(obj).into(),
        verified: first_flag(obj, &["is_verified", "verified"]).into(),
        business_account: first_flag(obj, &["is_business_account", "is_professional_account"])
            .into(),
        profile_url: first_text(obj, &["profile_url", "url"]).into(),
        categories: categories(obj),
        content_signals: content_signals(obj),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}

fn first_count(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(parse_count))
}

fn first_flag(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Non-negative whole count from a JSON number or a numeric string.
///
/// Strings may carry thousands separators (`"5,400"`) or a `k`/`m` suffix
/// (`"12.5k"`).
pub(crate) fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(float_to_count)
        }),
        Value::String(s) => parse_count_str(s),
        _ => None,
    }
}

fn parse_count_str(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect::<String>()
        .to_ascii_lowercase();
    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }
    if let Ok(n) = cleaned.parse::<u64>() {
        return Some(n);
    }

    let (digits, multiplier) = match cleaned.chars().last()? {
        'k' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'm' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };
    let value = digits.parse::<f64>().ok()? * multiplier;
    (value.is_finite() && value >= 0.0).then(|| float_to_count(value.round()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(value: f64) -> u64 {
    // Callers guarantee a finite, non-negative value; `as` saturates above u64::MAX.
    value as u64
}

fn engagement_rate(obj: &Map<String, Value>) -> Option<f64> {
    ["avg_engagement", "engagement_rate"].iter().find_map(|key| {
        let rate = match obj.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        (rate.is_finite() && (0.0..=1.0).contains(&rate)).then_some(rate)
    })
}

/// Ordered, case-insensitively deduplicated list capped at `limit`.
struct BoundedSet {
    items: Vec<String>,
    seen: HashSet<String>,
    limit: usize,
}

impl BoundedSet {
    fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            limit,
        }
    }

    fn push(&mut self, item: &str) {
        let item = item.trim();
        if item.is_empty() || self.items.len() >= self.limit {
            return;
        }
        if self.seen.insert(item.to_lowercase()) {
            self.items.push(item.to_owned());
        }
    }
}

fn categories(obj: &Map<String, Value>) -> Field<Vec<String>> {
    let mut set = BoundedSet::new(MAX_CATEGORIES);

    for key in ["business_category_name", "category_name", "category"] {
        if let Some(Value::String(label)) = obj.get(key) {
            set.push(label);
        }
    }
    let explicit_list = match obj.get("categories") {
        Some(Value::Array(items)) => {
            for label in items.iter().filter_map(Value::as_str) {
                set.push(label);
            }
            true
        }
        _ => false,
    };

    // A blank category string says nothing, unlike an explicit empty list.
    if explicit_list || !set.items.is_empty() {
        Field::Known(set.items)
    } else {
        Field::Unknown
    }
}

fn content_signals(obj: &Map<String, Value>) -> Field<Vec<String>> {
    let mut set = BoundedSet::new(MAX_CONTENT_SIGNALS);
    let mut present = false;

    if let Some(Value::Array(tags)) = obj.get("post_hashtags") {
        present = true;
        for tag in tags.iter().filter_map(Value::as_str) {
            let tag = tag.trim().trim_start_matches('#');
            if !tag.is_empty() {
                set.push(&format!("#{}", tag.to_lowercase()));
            }
        }
    }

    if let Some(Value::Array(posts)) = obj.get("posts") {
        present = true;
        for post in posts {
            let caption = ["caption", "description"]
                .iter()
                .find_map(|key| post.get(*key).and_then(Value::as_str));
            let Some(caption) = caption else { continue };
            for capture in HASHTAG_RE.captures_iter(caption) {
                set.push(&format!("#{}", capture[1].to_lowercase()));
            }
        }
    }

    if present {
        Field::Known(set.items)
    } else {
        Field::Unknown
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_owned(),
        None => text.to_owned(),
    }
}

#[cfg(test)]
#[path = "project_test.rs"]
mod tests;
