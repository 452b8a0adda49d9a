//! Offline domain models as persisted in the key-value store.

use serde::{Deserialize, Deserializer, Serialize};

/// Role assigned to users enrolled offline.
pub const DEFAULT_ROLE: &str = "user";

/// Prefix of session tokens synthesized by offline login.
pub const OFFLINE_TOKEN_PREFIX: &str = "offline:";

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Accept any JSON scalar where text is expected; `null` reads as empty.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Locally enrolled user. The registry maps enrollment id to this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineUserRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub salt: String,
    pub hash: String,
}

/// Authenticated session, either synthesized offline or issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: String,
    pub name: String,
}

impl Session {
    /// Session for a user verified against the local registry.
    pub fn offline(enrollment_id: &str, record: &OfflineUserRecord) -> Self {
        let role = if record.role.is_empty() {
            default_role()
        } else {
            record.role.clone()
        };
        let name = if record.name.is_empty() {
            enrollment_id.to_string()
        } else {
            record.name.clone()
        };
        Self {
            token: format!("{}{}", OFFLINE_TOKEN_PREFIX, enrollment_id),
            role,
            name,
        }
    }

    /// Offline tokens are never accepted by the backend.
    pub fn is_offline(&self) -> bool {
        self.token.starts_with(OFFLINE_TOKEN_PREFIX)
    }
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOutcome {
    pub ok: bool,
    pub message: String,
}

impl RegisterOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Attendance event waiting to be replayed against the backend.
///
/// Only `type` is required; a missing or non-text timestamp still decodes so
/// the event keeps showing in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    #[serde(rename = "type")]
    pub punch_type: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub neighborhood: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: String,
}

/// Pending event as shown in the attendance history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub event: PendingEvent,
    pub pending: bool,
}

impl From<PendingEvent> for HistoryEntry {
    fn from(event: PendingEvent) -> Self {
        Self {
            event,
            pending: true,
        }
    }
}

/// Result of appending a punch to the offline queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueOutcome {
    pub ok: bool,
}
