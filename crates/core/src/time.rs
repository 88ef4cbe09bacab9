//! Timestamp helpers shared by every record.
//!
//! Timestamps are stored as strings in `YYYY-MM-DD HH:MM:SS.ffffff` form (UTC)
//! so that lexical order equals chronological order.

#[cfg(any(test, feature = "test-clock"))]
use std::sync::atomic::{AtomicI64, Ordering};

#[cfg(any(test, feature = "test-clock"))]
use chrono::TimeDelta;
use chrono::{DateTime, Utc};

/// Sentinel for "never happened" (`tm_update` before the first update,
/// `tm_delete` while a record is live).
pub const DEFAULT_TIMESTAMP: &str = "9999-01-01 00:00:00.000000";

/// chrono format string for persisted timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that starts at a fixed instant and advances by `step` on every read.
///
/// Gives strictly increasing, reproducible timestamps in tests.
#[cfg(any(test, feature = "test-clock"))]
#[derive(Debug)]
pub struct SteppingClock {
    next_micros: AtomicI64,
    step_micros: i64,
}

#[cfg(any(test, feature = "test-clock"))]
impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            next_micros: AtomicI64::new(start.timestamp_micros()),
            step_micros: step.num_microseconds().unwrap_or(1).max(1),
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let micros = self.next_micros.fetch_add(self.step_micros, Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or_default()
    }
}

/// Formats a timestamp in the persisted layout.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_timestamp_uses_six_fraction_digits() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap() + TimeDelta::microseconds(42);
        assert_eq!(format_timestamp(&at), "2024-03-05 07:08:09.000042");
    }

    #[test]
    fn test_real_timestamps_sort_before_sentinel() {
        let now = format_timestamp(&Utc::now());
        assert!(now.as_str() < DEFAULT_TIMESTAMP);
    }

    #[test]
    fn test_stepping_clock_is_strictly_increasing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = SteppingClock::new(start, TimeDelta::milliseconds(1));

        let first = clock.now();
        let second = clock.now();

        assert_eq!(first, start);
        assert_eq!(second - first, TimeDelta::milliseconds(1));
        assert!(format_timestamp(&first) < format_timestamp(&second));
    }
}
