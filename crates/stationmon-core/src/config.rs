//! Tunables for the framer, the serial monitor loop and the connectivity
//! coordinator.
//!
//! Defaults match the firmware constants the monitor was built around.

use std::time::Duration;

/// Capacity of the line reassembly buffer in bytes.
pub const DEFAULT_LINE_CAPACITY: usize = 2048;

/// Largest chunk requested from the serial source per poll.
pub const DEFAULT_READ_CHUNK: usize = 1023;

/// Bounded wait for one serial poll.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Pause between serial loop iterations.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(10);

/// Delay between accepting a restart request and performing the restart.
pub const DEFAULT_RESTART_GRACE: Duration = Duration::from_millis(200);

/// Line content (substring, case-sensitive) that requests a restart.
pub const DEFAULT_RESTART_KEYWORD: &str = "REBOOT";

/// Time allowed for acquiring an address, measured from the first
/// association attempt.
pub const DEFAULT_ADDRESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between time-sync status polls.
pub const DEFAULT_TIME_SYNC_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Number of "not yet synced" polls tolerated before giving up.
pub const DEFAULT_MAX_TIME_SYNC_RETRIES: u32 = 30;

/// Calendar year from which the local clock is trusted without syncing.
pub const DEFAULT_PLAUSIBLE_YEAR: i32 = 2025;

/// Serial input configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Reassembly buffer capacity (bytes)
    pub line_capacity: usize,
    /// Maximum bytes read per poll
    pub read_chunk: usize,
    /// Bounded wait per poll
    pub poll_timeout: Duration,
    /// Pause between loop iterations
    pub idle_interval: Duration,
    /// Grace delay before restarting
    pub restart_grace: Duration,
    /// Restart keyword
    pub restart_keyword: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            line_capacity: DEFAULT_LINE_CAPACITY,
            read_chunk: DEFAULT_READ_CHUNK,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            restart_grace: DEFAULT_RESTART_GRACE,
            restart_keyword: DEFAULT_RESTART_KEYWORD.to_string(),
        }
    }
}

/// Connectivity coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityConfig {
    /// Network name shown while associating. Credentials stay with the
    /// station implementation.
    pub ssid: String,
    /// Time-sync server handed to the sync collaborator
    pub time_server: String,
    /// Address acquisition deadline
    pub address_timeout: Duration,
    /// Interval between time-sync polls
    pub time_sync_poll_interval: Duration,
    /// Not-yet-synced polls tolerated before degrading
    pub max_time_sync_retries: u32,
    /// Earliest calendar year treated as a trustworthy clock
    pub plausible_year: i32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            time_server: "pool.ntp.org".to_string(),
            address_timeout: DEFAULT_ADDRESS_TIMEOUT,
            time_sync_poll_interval: DEFAULT_TIME_SYNC_POLL_INTERVAL,
            max_time_sync_retries: DEFAULT_MAX_TIME_SYNC_RETRIES,
            plausible_year: DEFAULT_PLAUSIBLE_YEAR,
        }
    }
}
