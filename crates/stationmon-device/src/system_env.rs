//! Production Environment implementation using system time.
//!
//! `SystemEnv` is the production implementation of the Environment trait using
//! the real monotonic clock, the OS wall clock and tokio timers.
//!
//! # Capabilities
//!
//! - Real system time (`std::time::Instant`) that advances naturally
//! - OS wall clock, which may jump when the host synchronizes
//! - Tokio async sleep for actual wall-clock delays

use std::time::Duration;

use stationmon_core::Environment;

/// Production environment using system time.
///
/// Uses `std::time::Instant::now()` for time, `tokio::time::sleep()` for async
/// sleeping and `SystemTime` for the calendar clock.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    /// A clock set before the Unix epoch reads as zero, which the time-sync
    /// stage treats as implausible.
    #[allow(clippy::disallowed_methods)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}
