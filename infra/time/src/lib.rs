//! Instants encoded as plain JSON numbers.
//!
//! * [`Unix`]: whole seconds since the epoch (`{"Date":12345}`).
//! * [`Millisecs`]: milliseconds since the epoch, as emitted by JavaScript's `Date.now()`.
//!
//! Some producers send milliseconds with a fractional part
//! (`1553708494043.0059`). Those are accepted and truncated to whole milliseconds.

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An instant serialized as unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unix(pub DateTime<Utc>);

/// An instant serialized as unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millisecs(pub DateTime<Utc>);

impl From<DateTime<Utc>> for Unix {
    fn from(t: DateTime<Utc>) -> Self {
        Self(t)
    }
}

impl From<Unix> for DateTime<Utc> {
    fn from(t: Unix) -> Self {
        t.0
    }
}

impl From<DateTime<Utc>> for Millisecs {
    fn from(t: DateTime<Utc>) -> Self {
        Self(t)
    }
}

impl From<Millisecs> for DateTime<Utc> {
    fn from(t: Millisecs) -> Self {
        t.0
    }
}

impl Serialize for Unix {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(self.0.timestamp())
    }
}

impl Serialize for Millisecs {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(self.0.timestamp_millis())
    }
}

impl<'de> Deserialize<'de> for Unix {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let secs = d.deserialize_any(WholeNumber("unix seconds"))?;
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| de::Error::custom(format!("unix seconds out of range: {secs}")))
    }
}

impl<'de> Deserialize<'de> for Millisecs {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let ms = d.deserialize_any(WholeNumber("unix milliseconds"))?;
        DateTime::from_timestamp_millis(ms)
            .map(Self)
            .ok_or_else(|| de::Error::custom(format!("unix milliseconds out of range: {ms}")))
    }
}

/// Accepts any JSON number, dropping the fraction of floats.
struct WholeNumber(&'static str);

impl Visitor<'_> for WholeNumber {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number of {}", self.0)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("{} out of range: {v}", self.0)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if !v.is_finite() || v.abs() >= 9.2e18 {
            return Err(E::custom(format!("{} out of range: {v}", self.0)));
        }
        Ok(v.trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_values_before_epoch() {
        let t: Unix = serde_json::from_str("-60").unwrap();
        assert_eq!(t.0.timestamp(), -60);
    }

    #[test]
    fn test_rejects_strings() {
        assert!(serde_json::from_str::<Millisecs>("\"12\"").is_err());
    }
}
