//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the runtimes at a point in
//! time. Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::{net::IpAddr, ops::Sub, time::Duration};

use stationmon_core::{
    ConnectivityCoordinator, LineFramer, Phase, Readiness, RestartSignal, StageOutcome,
    framer::LINE_TERMINATOR,
};

/// Snapshot of the whole device.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Connectivity coordinator state, if captured.
    pub connectivity: Option<ConnectivitySnapshot>,
    /// Serial monitor state, if captured.
    pub serial: Option<SerialSnapshot>,
}

impl SystemSnapshot {
    /// Snapshot with nothing captured.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach coordinator state.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: ConnectivitySnapshot) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Attach serial monitor state.
    #[must_use]
    pub fn with_serial(mut self, serial: SerialSnapshot) -> Self {
        self.serial = Some(serial);
        self
    }
}

/// Observable coordinator state.
#[derive(Debug, Clone)]
pub struct ConnectivitySnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Current address.
    pub address: Option<IpAddr>,
    /// Association losses seen.
    pub retry_count: u64,
    /// Association attempts the coordinator asked for.
    pub association_attempts: u64,
    /// Association attempts the station actually received, if known.
    pub station_attempts: Option<u64>,
    /// Time-sync polls observed.
    pub time_sync_polls: u32,
    /// Configured time-sync retry budget.
    pub max_time_sync_retries: u32,
    /// Address stage outcome.
    pub network: Option<StageOutcome>,
    /// Time-sync stage outcome.
    pub time: Option<StageOutcome>,
    /// Combined outcome.
    pub readiness: Option<Readiness>,
}

impl ConnectivitySnapshot {
    /// Capture a coordinator.
    pub fn from_coordinator<I>(coordinator: &ConnectivityCoordinator<I>) -> Self
    where
        I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
    {
        Self {
            phase: coordinator.phase(),
            address: coordinator.address(),
            retry_count: coordinator.retry_count(),
            association_attempts: coordinator.association_attempts(),
            station_attempts: None,
            time_sync_polls: coordinator.time_sync_polls(),
            max_time_sync_retries: coordinator.config().max_time_sync_retries,
            network: coordinator.network_outcome(),
            time: coordinator.time_outcome(),
            readiness: coordinator.readiness(),
        }
    }

    /// Record how many attempts the station received.
    #[must_use]
    pub fn with_station_attempts(mut self, attempts: u64) -> Self {
        self.station_attempts = Some(attempts);
        self
    }
}

/// Observable serial monitor state.
#[derive(Debug, Clone)]
pub struct SerialSnapshot {
    /// Bytes pending in the reassembly buffer.
    pub pending: usize,
    /// Reassembly buffer capacity.
    pub capacity: usize,
    /// Whether the pending bytes contain a terminator.
    pub pending_has_terminator: bool,
    /// Restart requested.
    pub restart_requested: bool,
    /// Restart requests counted.
    pub restart_requests: u64,
}

impl SerialSnapshot {
    /// Capture a framer and restart flag.
    pub fn capture(framer: &LineFramer, restart: &RestartSignal) -> Self {
        Self {
            pending: framer.len(),
            capacity: framer.capacity(),
            pending_has_terminator: framer.pending().contains(&LINE_TERMINATOR),
            restart_requested: restart.is_requested(),
            restart_requests: restart.request_count(),
        }
    }
}
