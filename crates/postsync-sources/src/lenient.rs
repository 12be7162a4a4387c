//! `deserialize_with` helpers for upstream fields whose type drifts.
//!
//! Each helper accepts any JSON value and yields `None` when it is absent,
//! `null`, or of an unusable type, so one odd field leaves that field to the
//! normalizer's defaults instead of rejecting the whole record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// An integer counter. Accepts integers, finite floats (truncated), and
/// numeric strings.
pub(crate) fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| as_int(&v)))
}

/// A unix timestamp in seconds. Accepts numbers and numeric strings.
pub(crate) fn seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| as_seconds(&v)))
}

/// A string field; anything other than a JSON string is treated as absent.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < 9.0e18)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_seconds(value: &Value) -> Option<f64> {
    let secs = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    secs.is_finite().then_some(secs)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "int")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "seconds")]
        at: Option<f64>,
        #[serde(default, deserialize_with = "text")]
        label: Option<String>,
    }

    fn parse(value: serde_json::Value) -> Sample {
        serde_json::from_value(value).expect("lenient fields never reject a record")
    }

    #[test]
    fn well_typed_values_pass_through() {
        let p = parse(json!({ "count": 7, "at": 1_700_000_000.5, "label": "hi" }));
        assert_eq!(p.count, Some(7));
        assert_eq!(p.at, Some(1_700_000_000.5));
        assert_eq!(p.label.as_deref(), Some("hi"));
    }

    #[test]
    fn numeric_strings_and_floats_are_coerced() {
        let p = parse(json!({ "count": "12", "at": "1700000000" }));
        assert_eq!(p.count, Some(12));
        assert_eq!(p.at, Some(1_700_000_000.0));
        assert_eq!(parse(json!({ "count": 5.9 })).count, Some(5));
    }

    #[test]
    fn unusable_values_become_none() {
        let p = parse(json!({ "count": "lots", "at": "yesterday", "label": 42 }));
        assert!(p.count.is_none());
        assert!(p.at.is_none());
        assert!(p.label.is_none());

        let p = parse(json!({ "count": [1], "at": { "s": 1 }, "label": null }));
        assert!(p.count.is_none());
        assert!(p.at.is_none());
        assert!(p.label.is_none());
    }

    #[test]
    fn missing_fields_are_none() {
        let p = parse(json!({}));
        assert!(p.count.is_none() && p.at.is_none() && p.label.is_none());
    }
}
