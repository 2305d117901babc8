//! Wall-clock source used to compare credential expiry against "now".

use chrono::{DateTime, Utc};

/// A source of the current time.
///
/// The session manager reads the wall clock to decide whether a credential
/// has expired and how long to wait before renewing it. Tests substitute a
/// clock that follows tokio's paused time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
