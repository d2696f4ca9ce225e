//! Access timing and interval resolution
//!
//! A `Timing` is a duration plus an optional fixed start. Without a start the
//! timing is "as soon as possible" and its start is only known when it is
//! resolved against a clock reading.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AccessError, Result};

/// The latest instant the engine can represent.
///
/// Used as the end time of ASAP requests that have not been provisioned yet,
/// and as the saturation point for interval arithmetic.
pub fn max_instant() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC
}

/// Requested access timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// How long access lasts once it starts
    #[serde(rename = "duration_seconds", with = "duration_seconds")]
    pub duration: Duration,

    /// Fixed start; `None` means ASAP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
}

impl Timing {
    /// Timing that starts whenever access is provisioned
    pub fn asap(duration: Duration) -> Self {
        Self {
            duration,
            start: None,
        }
    }

    /// Timing with a fixed start instant
    pub fn scheduled(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            duration,
            start: Some(start),
        }
    }

    /// True iff a fixed start instant is present
    pub fn is_scheduled(&self) -> bool {
        self.start.is_some()
    }

    /// Reject zero or negative durations
    ///
    /// # Errors
    ///
    /// Returns `InvalidTiming` when the duration is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.duration <= Duration::zero() {
            return Err(AccessError::InvalidTiming {
                reason: format!(
                    "duration must be positive, got {}s",
                    self.duration.num_seconds()
                ),
            });
        }
        Ok(())
    }

    /// Resolve this timing on its own (no override)
    pub fn interval(&self, now: DateTime<Utc>) -> Interval {
        let start = self.start.unwrap_or(now);
        Interval {
            start,
            end: saturating_add(start, self.duration),
        }
    }
}

/// A concrete access window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolve the effective access window.
///
/// An override replaces the requested timing entirely (start and duration),
/// it does not just stretch the duration.
pub fn resolve_interval(
    timing: &Timing,
    override_timing: Option<&Timing>,
    now: DateTime<Utc>,
) -> Interval {
    override_timing.unwrap_or(timing).interval(now)
}

fn saturating_add(start: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    start
        .checked_add_signed(duration)
        .unwrap_or_else(max_instant)
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("duration out of range: {}s", secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_asap_starts_now() {
        let timing = Timing::asap(Duration::minutes(5));
        let interval = resolve_interval(&timing, None, at(10, 0));
        assert_eq!(interval.start, at(10, 0));
        assert_eq!(interval.end, at(10, 5));
        assert!(!timing.is_scheduled());
    }

    #[test]
    fn test_scheduled_ignores_now() {
        let timing = Timing::scheduled(at(12, 0), Duration::hours(1));
        let interval = resolve_interval(&timing, None, at(10, 0));
        assert_eq!(interval.start, at(12, 0));
        assert_eq!(interval.end, at(13, 0));
        assert!(timing.is_scheduled());
    }

    #[test]
    fn test_end_saturates_at_max_instant() {
        let timing = Timing::scheduled(max_instant(), Duration::days(1));
        assert_eq!(timing.interval(at(10, 0)).end, max_instant());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let timing = Timing::asap(Duration::zero());
        assert!(matches!(
            timing.validate(),
            Err(AccessError::InvalidTiming { .. })
        ));
    }

    #[test]
    fn test_duration_serializes_as_seconds() {
        let timing = Timing::asap(Duration::minutes(5));
        let json = serde_json::to_value(timing).unwrap();
        assert_eq!(json["duration_seconds"], 300);
        assert!(json.get("start").is_none());

        let back: Timing = serde_json::from_value(json).unwrap();
        assert_eq!(back, timing);
    }
}
