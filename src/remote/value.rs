//! Remote document field values
//!
//! Documents in the remote store are untyped maps. `FieldValue` models the
//! value types the store understands, including its native timestamp and the
//! server-timestamp sentinel that the store resolves at write time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A document's field map, ordered by field name
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single field value in a remote document or local record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    /// Native store timestamp
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(FieldMap),
    /// Placeholder replaced by the store's clock when the document is written
    ServerTimestamp,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Integer view, accepting integral doubles
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Double(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a point in time, in epoch milliseconds.
    ///
    /// Native timestamps, integer/double epoch millis and RFC 3339 or numeric
    /// strings are accepted.
    pub fn timestamp_millis(&self) -> Option<i64> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts.timestamp_millis()),
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Double(v) if v.is_finite() => Some(*v as i64),
            FieldValue::String(s) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.timestamp_millis())
                    .ok()
                    .or_else(|| s.parse::<i64>().ok())
            }
            _ => None,
        }
    }

    /// Equality used by filtered fetches: numbers compare by value
    /// regardless of integer/double representation.
    pub fn loosely_equals(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Integer(_) | FieldValue::Double(_), FieldValue::Integer(_) | FieldValue::Double(_)) => {
                match (self.as_i64(), other.as_i64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => matches!((self, other), (FieldValue::Double(a), FieldValue::Double(b)) if a == b),
                }
            }
            _ => self == other,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Whether a field name marks a time-valued field on the wire
pub fn is_time_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("date") || lower.contains("timestamp") || lower.contains("time")
}

/// Convert a local value into its remote representation.
///
/// Integers stored under a time-like field name are epoch millis and become
/// native timestamps. Everything else passes through.
pub fn encode_for_remote(name: &str, value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Integer(millis) if is_time_field(name) => DateTime::from_timestamp_millis(*millis)
            .map(FieldValue::Timestamp)
            .unwrap_or(FieldValue::Integer(*millis)),
        other => other.clone(),
    }
}

/// Replace every server-timestamp sentinel with `now`
pub fn resolve_server_timestamps(fields: &mut FieldMap, now: DateTime<Utc>) {
    for value in fields.values_mut() {
        resolve_value(value, now);
    }
}

fn resolve_value(value: &mut FieldValue, now: DateTime<Utc>) {
    match value {
        FieldValue::ServerTimestamp => *value = FieldValue::Timestamp(now),
        FieldValue::Map(inner) => resolve_server_timestamps(inner, now),
        FieldValue::Array(items) => items.iter_mut().for_each(|item| resolve_value(item, now)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_field_detection() {
        assert!(is_time_field("updatedAt"));
        assert!(is_time_field("settlementDate"));
        assert!(is_time_field("syncTimestamp"));
        assert!(is_time_field("lastAccessTime"));
        assert!(!is_time_field("routeId"));
        assert!(!is_time_field("amount"));
    }

    #[test]
    fn test_encode_converts_time_integers_only() {
        let millis = 1_700_000_000_123;
        let encoded = encode_for_remote("updatedAt", &FieldValue::Integer(millis));
        assert_eq!(
            encoded,
            FieldValue::Timestamp(Utc.timestamp_millis_opt(millis).unwrap())
        );

        let untouched = encode_for_remote("routeId", &FieldValue::Integer(9));
        assert_eq!(untouched, FieldValue::Integer(9));

        let text = encode_for_remote("dateLabel", &FieldValue::from("monday"));
        assert_eq!(text, FieldValue::from("monday"));
    }

    #[test]
    fn test_timestamp_millis_sources() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(FieldValue::Timestamp(ts).timestamp_millis(), Some(ts.timestamp_millis()));
        assert_eq!(FieldValue::Integer(200).timestamp_millis(), Some(200));
        assert_eq!(
            FieldValue::from("2024-01-02T03:04:05Z").timestamp_millis(),
            Some(ts.timestamp_millis())
        );
        assert_eq!(FieldValue::from("1500").timestamp_millis(), Some(1500));
        assert_eq!(FieldValue::Bool(true).timestamp_millis(), None);
    }

    #[test]
    fn test_server_timestamps_resolved_recursively() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut nested = FieldMap::new();
        nested.insert("at".to_string(), FieldValue::ServerTimestamp);

        let mut fields = FieldMap::new();
        fields.insert("lastModified".to_string(), FieldValue::ServerTimestamp);
        fields.insert("meta".to_string(), FieldValue::Map(nested));
        fields.insert("name".to_string(), FieldValue::from("North"));

        resolve_server_timestamps(&mut fields, now);

        assert_eq!(fields["lastModified"], FieldValue::Timestamp(now));
        match &fields["meta"] {
            FieldValue::Map(inner) => assert_eq!(inner["at"], FieldValue::Timestamp(now)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(fields["name"], FieldValue::from("North"));
    }

    #[test]
    fn test_loose_numeric_equality() {
        assert!(FieldValue::Integer(5).loosely_equals(&FieldValue::Double(5.0)));
        assert!(!FieldValue::Integer(5).loosely_equals(&FieldValue::Integer(6)));
        assert!(!FieldValue::Integer(5).loosely_equals(&FieldValue::from("5")));
    }

    #[test]
    fn test_json_shape_is_stable() {
        let json = serde_json::to_string(&FieldValue::Integer(7)).unwrap();
        assert_eq!(json, r#"{"type":"integer","value":7}"#);
        let null = serde_json::to_string(&FieldValue::Null).unwrap();
        assert_eq!(null, r#"{"type":"null"}"#);
    }
}
