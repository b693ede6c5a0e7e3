// Lenient field decoders for schemaless store payloads.
// Every decoder accepts any JSON value and falls back to an empty/absent result.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::post::SeriesInfo;
use crate::infrastructure::document_store::counter_from_text;

pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_from(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_from(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
}

fn string_from(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-negative counter; negative, fractional or non-numeric input is clamped
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from(&Value::deserialize(deserializer)?))
}

pub fn lenient_minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count = count_from(&Value::deserialize(deserializer)?);
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

pub(crate) fn count_from(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f.floor() as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        Value::String(s) => counter_from_text(s).map_or(0, |n| n as u64),
        _ => 0,
    }
}

/// String array with non-string members dropped and duplicates removed
pub fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut out: Vec<String> = Vec::new();
    if let Value::Array(items) = Value::deserialize(deserializer)? {
        for item in items {
            if let Value::String(s) = item {
                if !s.is_empty() && !out.contains(&s) {
                    out.push(s);
                }
            }
        }
    }
    Ok(out)
}

/// Accepts RFC 3339 strings, `{seconds, nanoseconds}` objects and epoch seconds
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(timestamp_from(&Value::deserialize(deserializer)?))
}

pub(crate) fn timestamp_from(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}

/// Series descriptor; anything without a name and an integral order means "no series"
pub fn lenient_series<'de, D>(deserializer: D) -> Result<Option<SeriesInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(None);
    };

    let name = match map.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => return Ok(None),
    };
    let order = match map.get("order") {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(order) => order,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.is_finite() => f as i64,
                _ => return Ok(None),
            },
        },
        _ => return Ok(None),
    };

    Ok(Some(SeriesInfo { name, order }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_coercion() {
        assert_eq!(count_from(&json!(12)), 12);
        assert_eq!(count_from(&json!(-3)), 0);
        assert_eq!(count_from(&json!(4.9)), 4);
        assert_eq!(count_from(&json!("7")), 7);
        assert_eq!(count_from(&json!("+7")), 0);
        assert_eq!(count_from(&json!(null)), 0);
    }

    #[test]
    fn test_timestamp_shapes() {
        let from_object = timestamp_from(&json!({"seconds": 1_700_000_000, "nanoseconds": 0}));
        let from_string = timestamp_from(&json!("2023-11-14T22:13:20Z"));
        let from_number = timestamp_from(&json!(1_700_000_000));
        assert!(from_object.is_some());
        assert_eq!(from_object, from_string);
        assert_eq!(from_object, from_number);
        assert_eq!(timestamp_from(&json!("yesterday")), None);
    }
}
