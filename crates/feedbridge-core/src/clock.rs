//! Clock abstraction for stamping recorded-on times.

use chrono::{DateTime, SubsecRound, Utc};

/// Abstraction over system time so that recorded-on stamps are deterministic
/// in tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
///
/// Readings are truncated to microseconds, the precision the recorded-on
/// field is persisted with, so a message survives a store round trip intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}
