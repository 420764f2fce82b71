//! # Clocks
//!
//! `TimeSource` implementations.

use crate::ports::TimeSource;
use chrono::{DateTime, Utc};

/// Wall clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format `at` like the Unix `date` command: `Mon Jan  2 15:04:05 UTC 2006`.
#[must_use]
pub fn unix_date(at: DateTime<Utc>) -> String {
    at.format("%a %b %e %H:%M:%S UTC %Y").to_string()
}
