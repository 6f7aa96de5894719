//! Bright Data dataset API response shapes.
//!
//! Only the fields the client acts on are modelled; everything else in the
//! provider's payloads is ignored so additive schema changes do not break
//! deserialization.
//!
//! ### Trigger (`POST /datasets/v3/trigger`)
//! `{"snapshot_id": "s_m4x7..."}`
//!
//! ### Progress (`GET /datasets/v3/progress/{id}`)
//! `{"snapshot_id": "...", "dataset_id": "...", "status": "running"}`; failed
//! snapshots may add `error` or `message`.
//!
//! ### Snapshot (`GET /datasets/v3/snapshot/{id}?format=json`)
//! A JSON array of profile records. While the snapshot is still building the
//! API answers 202 with `{"status": "building", "message": "..."}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TriggerResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TriggerInput<'a> {
    pub user_name: &'a str,
}

/// One unprocessed profile record from a snapshot. Opaque outside
/// [`crate::project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProfileRecord(pub serde_json::Value);

impl RawProfileRecord {
    /// Provider error attached to the record (`include_errors=true`), if any.
    #[must_use]
    pub fn provider_error(&self) -> Option<String> {
        let obj = self.0.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        match (text("error_code"), text("error")) {
            (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
            (Some(code), None) => Some(code),
            (None, Some(msg)) => Some(msg),
            (None, None) => None,
        }
    }

    /// Account name the record describes, if present.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        let obj = self.0.as_object()?;
        ["account", "username", "user_name"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
