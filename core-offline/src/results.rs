//! Quiz results recorded while offline

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys the queue owns; the same keys in a result are replaced.
const RESERVED_KEYS: &[&str] = &["offlineId", "savedOffline", "timestamp"];

/// A quiz result waiting to be synced.
///
/// Serialized flat: the result's own fields sit next to `offlineId`,
/// `savedOffline` and `timestamp`. A result that is not a JSON object is
/// kept under a single `value` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedResult {
    /// Queue-local id used to drop the entry once it is synced
    pub offline_id: String,
    /// The result's fields as the quiz screen produced them
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub saved_offline: bool,
    /// When the result was queued, Unix milliseconds
    pub timestamp: i64,
}

impl QueuedResult {
    /// Queue `payload` at `timestamp` under a fresh id.
    pub fn new(payload: Value, timestamp: i64) -> Self {
        let mut payload = match payload {
            Value::Object(fields) => fields,
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                fields
            }
        };
        for key in RESERVED_KEYS {
            payload.remove(*key);
        }

        Self {
            offline_id: Uuid::new_v4().to_string(),
            payload,
            saved_offline: true,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_result_is_marked_offline() {
        let result = QueuedResult::new(json!({"quizId": "geo-1", "score": 8}), 99);

        assert!(result.saved_offline);
        assert_eq!(result.timestamp, 99);
        assert!(Uuid::parse_str(&result.offline_id).is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = QueuedResult::new(json!(1), 0);
        let b = QueuedResult::new(json!(1), 0);
        assert_ne!(a.offline_id, b.offline_id);
    }

    #[test]
    fn test_result_fields_are_spread_into_entry() {
        let result = QueuedResult::new(json!({"id": "r-7", "score": 3}), 5);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["savedOffline"], true);
        assert_eq!(json["timestamp"], 5);
        assert_eq!(json["score"], 3);
        assert_eq!(json["id"], "r-7");
        assert!(json.get("payload").is_none());

        let back: QueuedResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_queue_fields_override_result_fields() {
        let result = QueuedResult::new(json!({"timestamp": 1, "savedOffline": false}), 5);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["timestamp"], 5);
        assert_eq!(json["savedOffline"], true);
        assert!(result.payload.is_empty());
    }

    #[test]
    fn test_scalar_result_is_kept_under_value() {
        let result = QueuedResult::new(json!(42), 0);
        assert_eq!(result.payload["value"], 42);
    }
}
