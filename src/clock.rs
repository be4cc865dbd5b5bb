//! Timestamp source for ledger entries.

use chrono::{DateTime, Local, NaiveDateTime};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of ledger entry timestamps.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

// Shared by every `SystemClock` so ordering holds process-wide.
static LAST_ISSUED_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Local wall clock that never goes backwards within the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let wall = Local::now().naive_local().and_utc().timestamp_micros();
        let issued = LAST_ISSUED_MICROS
            .fetch_max(wall, Ordering::AcqRel)
            .max(wall);
        DateTime::from_timestamp_micros(issued)
            .map(|t| t.naive_utc())
            .unwrap_or_default()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock;
        let mut previous = clock.now();
        for _ in 0..1_000 {
            let next = clock.now();
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn fixed_clock_returns_its_instant() {
        let instant = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(FixedClock(instant).now(), instant);
    }
}
