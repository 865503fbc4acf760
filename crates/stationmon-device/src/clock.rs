//! Host time-sync client.
//!
//! On a host the OS disciplines the clock itself. Starting records the
//! configured server for the log and polling reports synchronized once the
//! wall clock reads a plausible calendar year.

use chrono::Datelike;
use stationmon_app::TimeSync;
use stationmon_core::{Environment, SyncStatus, connectivity::calendar_date};

use crate::DeviceError;

/// Time-sync client that trusts the OS clock once it looks plausible.
#[derive(Debug, Clone)]
pub struct HostClock<E: Environment> {
    env: E,
    plausible_year: i32,
}

impl<E: Environment> HostClock<E> {
    /// Clock reading `env`'s wall clock.
    pub fn new(env: E, plausible_year: i32) -> Self {
        Self { env, plausible_year }
    }
}

impl<E: Environment> TimeSync for HostClock<E> {
    type Error = DeviceError;

    fn start(&mut self, server: &str) -> Result<(), DeviceError> {
        tracing::info!(%server, "host clock is managed by the OS");
        Ok(())
    }

    fn status(&mut self) -> SyncStatus {
        match calendar_date(self.env.wall_clock_secs()) {
            Some(date) if date.year() >= self.plausible_year => SyncStatus::Synced,
            _ => SyncStatus::NotSynced,
        }
    }
}

#[cfg(test)]
mod tests {
    use stationmon_harness::SimEnv;

    use super::*;

    #[test]
    fn synced_once_wall_clock_is_plausible() {
        let env = SimEnv::new();
        let mut clock = HostClock::new(env.clone(), 2025);
        assert_eq!(clock.status(), SyncStatus::NotSynced);

        // 2025-01-01T00:00:00Z
        env.set_wall_clock(1_735_689_600);
        assert_eq!(clock.status(), SyncStatus::Synced);
    }
}
