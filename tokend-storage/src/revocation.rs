use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Denylist record stored under a revoked token identifier.
///
/// Any non-empty stored value reads as a revocation. Records written by
/// other tools may carry no usable `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Revocation {
    /// Revocation time, milliseconds since the unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
}

impl Revocation {
    pub fn now() -> Self {
        Self {
            date: Some(Utc::now().timestamp_millis()),
        }
    }
}

impl From<Value> for Revocation {
    fn from(value: Value) -> Self {
        let date = value
            .get("date")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
        Self { date }
    }
}
