use chrono::{NaiveDateTime, Timelike, Utc};
use uuid::Uuid;

use crate::errors::ModelError;

/// Canonical wire format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Formats accepted on read; documents written by older tooling used a
/// `T` separator.
const TIMESTAMP_READ_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC time truncated to microseconds, the resolution of the wire
/// format, so a serialize/reconstruct round trip is lossless.
pub fn now() -> NaiveDateTime {
    let t = Utc::now().naive_utc();
    t.with_nanosecond(t.nanosecond() / 1_000 * 1_000).unwrap_or(t)
}

pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, ModelError> {
    for fmt in TIMESTAMP_READ_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    Err(ModelError::InvalidTimestamp { value: s.to_string() })
}

/// Identity block shared by every entity: opaque id plus audit timestamps.
/// `id` is immutable after creation; `created_at <= updated_at` always.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Meta {
    pub fn generate() -> Self {
        let t = now();
        Self { id: fresh_id(), created_at: t, updated_at: t }
    }

    /// Refresh `updated_at`. Strictly monotonic even when two persists land
    /// inside the same microsecond.
    pub fn touch(&mut self) {
        let t = now();
        self.updated_at = if t > self.updated_at {
            t
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_sets_equal_timestamps_and_unique_ids() {
        let a = Meta::generate();
        let b = Meta::generate();
        assert_eq!(a.created_at, a.updated_at);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn touch_is_strictly_monotonic() {
        let mut m = Meta::generate();
        let mut prev = m.updated_at;
        for _ in 0..100 {
            m.touch();
            assert!(m.updated_at > prev);
            assert!(m.created_at <= m.updated_at);
            prev = m.updated_at;
        }
    }

    #[test]
    fn timestamp_round_trip_is_lossless() {
        let t = now();
        let parsed = parse_timestamp(&format_timestamp(&t)).unwrap();
        assert_eq!(t, parsed);
    }

    #[test]
    fn legacy_iso_separator_is_accepted() {
        let t = parse_timestamp("2024-05-17T09:30:00.000001").unwrap();
        assert_eq!(format_timestamp(&t), "2024-05-17 09:30:00.000001");
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ModelError::InvalidTimestamp { .. })
        ));
    }
}
