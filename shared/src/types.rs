use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One row of the top-rankings response.
///
/// `synthetic_ts` is set when the user's metadata record had no usable `ts`
/// and the wall-clock time was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: i64,
    pub ts: i64,
    #[serde(skip)]
    pub synthetic_ts: bool,
}

impl ScoreEntry {
    pub fn new(user_id: impl Into<String>, score: i64, ts: i64) -> Self {
        Self {
            user_id: user_id.into(),
            score,
            ts,
            synthetic_ts: false,
        }
    }

    pub fn with_synthetic_ts(user_id: impl Into<String>, score: i64) -> Self {
        Self {
            user_id: user_id.into(),
            score,
            ts: now_millis(),
            synthetic_ts: true,
        }
    }
}

/// Payload served by the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

impl HealthStatus {
    pub fn healthy(service: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
        }
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Truncates a store score to an integer. Out-of-range values saturate, NaN becomes 0.
pub fn truncate_score(score: f64) -> i64 {
    score as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_entry_serializes_wire_names() {
        let entry = ScoreEntry::new("u1", 100, 1_700_000_000_000);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"userId": "u1", "score": 100, "ts": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn test_synthetic_entry_uses_current_time() {
        let before = now_millis();
        let entry = ScoreEntry::with_synthetic_ts("u2", 5);
        let after = now_millis();
        assert!(entry.synthetic_ts);
        assert!(entry.ts >= before && entry.ts <= after);
    }

    #[test]
    fn test_truncate_score() {
        assert_eq!(truncate_score(99.9), 99);
        assert_eq!(truncate_score(-3.7), -3);
        assert_eq!(truncate_score(f64::NAN), 0);
        assert_eq!(truncate_score(f64::INFINITY), i64::MAX);
    }
}
