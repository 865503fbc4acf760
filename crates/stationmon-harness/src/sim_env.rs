//! Simulated environment on tokio's virtual clock.
//!
//! Tests run under a paused runtime (`#[tokio::test(start_paused = true)]`),
//! so sleeps complete instantly in wall time while `now()` advances exactly
//! by the slept duration. The wall clock is a plain settable value.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use stationmon_core::Environment;

/// Deterministic environment for simulation.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    wall_clock: Arc<AtomicU64>,
}

impl SimEnv {
    /// Environment whose wall clock reads the Unix epoch, like an RTC that
    /// was never set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment whose wall clock reads `secs`.
    pub fn with_wall_clock(secs: u64) -> Self {
        let env = Self::new();
        env.set_wall_clock(secs);
        env
    }

    /// Jump the wall clock. Shared across clones.
    pub fn set_wall_clock(&self, secs: u64) {
        self.wall_clock.store(secs, Ordering::Relaxed);
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn wall_clock_secs(&self) -> u64 {
        self.wall_clock.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_advances_virtual_time_exactly() {
        let env = SimEnv::new();
        let start = env.now();

        env.sleep(Duration::from_secs(10)).await;

        assert_eq!(env.now() - start, Duration::from_secs(10));
    }

    #[test]
    fn wall_clock_is_shared_between_clones() {
        let env = SimEnv::with_wall_clock(5);
        let clone = env.clone();
        clone.set_wall_clock(1_770_356_355);
        assert_eq!(env.wall_clock_secs(), 1_770_356_355);
    }
}
