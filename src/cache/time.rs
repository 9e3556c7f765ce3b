//! Expiration Time Module
//!
//! Turns memcache-style time values into absolute expiration timestamps.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::cache::MAX_RELATIVE_TTL_SECS;
use crate::error::{CacheError, Result};

/// Unix timestamp of 9999-12-31T00:00:00Z, used as the "never expires" marker.
const NEVER_EXPIRES_EPOCH_SECS: i64 = 253_402_214_400;

// == Ttl ==
/// A numeric time value as accepted by memcache clients.
///
/// `0` means no expiration, values up to 31 days are relative seconds and
/// anything larger is an absolute Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ttl(f64);

impl Ttl {
    /// No expiration.
    pub const NEVER: Ttl = Ttl(0.0);

    /// Returns the raw number of seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }
}

macro_rules! ttl_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Ttl {
                fn from(secs: $ty) -> Self {
                    Ttl(secs as f64)
                }
            }
        )*
    };
}

ttl_from!(i32, i64, u32, u64, f32, f64);

impl TryFrom<&Value> for Ttl {
    type Error = CacheError;

    fn try_from(value: &Value) -> Result<Self> {
        value
            .as_f64()
            .map(Ttl)
            .ok_or(CacheError::InvalidTimeType)
    }
}

// == Never Expires ==
/// Returns the far-future timestamp stored for entries without expiration.
pub fn never_expires() -> DateTime<Utc> {
    DateTime::from_timestamp(NEVER_EXPIRES_EPOCH_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// == Parse Time ==
/// Computes the absolute expiration for `ttl` relative to `now`.
///
/// Negative values land in the relative branch and therefore produce a
/// timestamp in the past.
pub fn parse_time(ttl: Ttl, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let secs = ttl.as_secs_f64();
    if !secs.is_finite() {
        return Err(CacheError::InvalidTimeType);
    }

    if secs == 0.0 {
        return Ok(never_expires());
    }

    if secs <= MAX_RELATIVE_TTL_SECS as f64 {
        let offset = Duration::try_milliseconds((secs * 1000.0) as i64)
            .ok_or(CacheError::InvalidTimeType)?;
        return now
            .checked_add_signed(offset)
            .ok_or(CacheError::InvalidTimeType);
    }

    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
    if whole > i64::MAX as f64 {
        return Err(CacheError::InvalidTimeType);
    }
    DateTime::from_timestamp(whole as i64, nanos).ok_or(CacheError::InvalidTimeType)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_zero_never_expires() {
        let expires = parse_time(Ttl::from(0), fixed_now()).unwrap();
        assert_eq!(expires, never_expires());
        assert_eq!(expires.to_rfc3339(), "9999-12-31T00:00:00+00:00");
    }

    #[test]
    fn test_fourteen_days_is_relative() {
        let seconds = 14 * 24 * 60 * 60;
        let now = fixed_now();

        let expires = parse_time(Ttl::from(seconds), now).unwrap();
        assert_eq!(expires, now + Duration::seconds(seconds as i64));
    }

    #[test]
    fn test_thirty_one_days_is_still_relative() {
        let now = fixed_now();
        let expires = parse_time(Ttl::from(MAX_RELATIVE_TTL_SECS), now).unwrap();
        assert_eq!(expires, now + Duration::seconds(MAX_RELATIVE_TTL_SECS as i64));
    }

    #[test]
    fn test_thirty_two_days_is_absolute() {
        // Beyond 31 days the value is a Unix timestamp
        let seconds: i64 = 32 * 24 * 60 * 60;
        let expires = parse_time(Ttl::from(seconds), fixed_now()).unwrap();
        assert_eq!(expires, DateTime::from_timestamp(seconds, 0).unwrap());
    }

    #[test]
    fn test_fractional_relative_seconds() {
        let now = fixed_now();
        let expires = parse_time(Ttl::from(1.5), now).unwrap();
        assert_eq!(expires, now + Duration::milliseconds(1500));
    }

    #[test]
    fn test_negative_value_lands_in_the_past() {
        let now = fixed_now();
        let expires = parse_time(Ttl::from(-10), now).unwrap();
        assert_eq!(expires, now - Duration::seconds(10));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        for secs in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                parse_time(Ttl::from(secs), fixed_now()),
                Err(CacheError::InvalidTimeType)
            ));
        }
    }

    #[test]
    fn test_out_of_range_timestamp_is_rejected() {
        let result = parse_time(Ttl::from(1e300), fixed_now());
        assert!(matches!(result, Err(CacheError::InvalidTimeType)));
    }

    #[test]
    fn test_ttl_from_json_number() {
        assert_eq!(Ttl::try_from(&json!(60)).unwrap(), Ttl::from(60));
        assert_eq!(Ttl::try_from(&json!(0.5)).unwrap(), Ttl::from(0.5));
    }

    #[test]
    fn test_ttl_from_json_string_is_rejected() {
        let result = Ttl::try_from(&json!("1033523"));
        assert!(matches!(result, Err(CacheError::InvalidTimeType)));
    }
}
