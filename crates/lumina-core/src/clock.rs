//! Time source used for every persisted timestamp.

use chrono::{DateTime, Utc};

/// Source of "now". Tests substitute a fixed instant.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
