//! Wall-clock abstraction.
//!
//! # Responsibility
//! - Provide epoch-millisecond timestamps to the task service.
//! - Let tests pin "now" so due-date ordering is deterministic.

use chrono::{NaiveDate, NaiveTime};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Source of the current time in Unix epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Production clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Manually driven clock.
///
/// Clones share the same instant, so a test can keep one handle and advance
/// the clock owned by a service.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Starts at midnight UTC of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date_start_ms(date))
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

/// Epoch milliseconds of midnight UTC on `date`.
pub fn date_start_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::{date_start_ms, Clock, ManualClock, MS_PER_DAY};
    use chrono::NaiveDate;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now_ms(), 150);
    }

    #[test]
    fn date_start_is_midnight_utc() {
        let day = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(date_start_ms(day), MS_PER_DAY);
    }
}
