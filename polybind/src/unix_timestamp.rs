//! UNIX-seconds fields read from and written as dates.
//!
//! Use with `#[serde(with = "polybind::unix_timestamp")]` on an `i64`
//! field holding seconds since the epoch. The JSON side carries a date:
//! either epoch milliseconds or RFC 3339 text on input, always epoch
//! milliseconds on output. Sub-second precision is floored away.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Event {
//!     #[serde(with = "polybind::unix_timestamp")]
//!     at: i64,
//! }
//!
//! let a: Event = serde_json::from_str(r#"{"at":"2024-03-01T12:00:00.250Z"}"#).unwrap();
//! let b: Event = serde_json::from_str(r#"{"at":1709294400250}"#).unwrap();
//! assert_eq!(a.at, 1_709_294_400);
//! assert_eq!(a.at, b.at);
//! assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"at":1709294400000}"#);
//! ```

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Write `seconds` as epoch milliseconds.
pub fn serialize<S: Serializer>(seconds: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = seconds.checked_mul(1000).ok_or_else(|| {
        <S::Error as serde::ser::Error>::custom(format_args!(
            "{seconds} seconds does not fit in epoch milliseconds"
        ))
    })?;
    serializer.serialize_i64(millis)
}

/// Read epoch milliseconds or RFC 3339 text as whole UNIX seconds.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(SecondsVisitor)
}

struct SecondsVisitor;

impl Visitor<'_> for SecondsVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp or Unix epoch milliseconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        // `unix_timestamp` floors, so 23:59:58.5 before the epoch is -2
        OffsetDateTime::parse(v, &Rfc3339)
            .map(OffsetDateTime::unix_timestamp)
            .map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.div_euclid(1000))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v / 1000).map_err(E::custom)
    }
}
