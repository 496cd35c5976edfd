use chrono::{DateTime, Utc};
use cryptix_time::{Millisecs, Unix};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Dated<T> {
    date: T,
}

fn at_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).expect("valid timestamp")
}

#[test]
fn unix_unmarshal() {
    let v: Dated<Unix> = serde_json::from_str(r#"{"Date":12345}"#).unwrap();
    assert_eq!(v.date.0, at_millis(12_345_000));
}

#[test]
fn unix_marshal() {
    let v = Dated { date: Unix(at_millis(12_345_000)) };
    assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"Date":12345}"#);
}

#[test]
fn millisecs_unmarshal() {
    let v: Dated<Millisecs> = serde_json::from_str(r#"{"Date":1449808143436}"#).unwrap();
    assert_eq!(v.date.0, at_millis(1_449_808_143_436));
}

#[test]
fn millisecs_marshal() {
    let v = Dated { date: Millisecs(at_millis(12_345_000)) };
    assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"Date":12345000}"#);
}

#[test]
fn fractional_millisecs_are_truncated() {
    let v: Dated<Millisecs> = serde_json::from_str(r#"{"Date":1553708494043.0059}"#).unwrap();
    assert_eq!(v.date.0, at_millis(1_553_708_494_043));
}

#[test]
fn millisecs_roundtrip_same_instant() {
    let original = Millisecs(at_millis(1_700_000_000_123));
    let encoded = serde_json::to_string(&original).unwrap();
    let decoded: Millisecs = serde_json::from_str(&encoded).unwrap();
    assert_eq!(original, decoded);
}
