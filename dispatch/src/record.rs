use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Arbitrary event fields as produced by a tracking call, before any
/// identity or timestamp fields have been assigned.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawEvent {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Identity fields attached to every record. `user_id` is empty for
/// anonymous traffic; `anonymous_id` is the stable per-device id.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Identity {
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(rename = "anonymousId")]
    pub anonymous_id: String,
}

/// A record ready for submission. `message_id` and `sent_at` are
/// assigned exactly once, here, never at submission time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "anonymousId")]
    pub anonymous_id: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NormalizedRecord {
    pub fn normalize(event: RawEvent, identity: Identity, app_id: &str) -> Self {
        NormalizedRecord {
            user_id: identity.user_id,
            anonymous_id: identity.anonymous_id,
            message_id: Uuid::new_v4().to_string(),
            sent_at: Utc::now(),
            app_id: app_id.to_string(),
            fields: event.fields,
        }
    }

    /// Wire payload submitted to the destination stream.
    pub fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
