//! Human-readable status lines.
//!
//! State machines never print. They return [`StatusLine`]s inside their
//! actions and the runtime forwards them to the log. The rendered text keeps
//! the bracketed markers (`[WIFI]`, `[NTP]`, `[TIME_SYNC_OK]`) that host-side
//! console tooling greps for.

use std::{fmt, net::IpAddr};

use chrono::NaiveDate;

/// Severity attached to a status line or log action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
}

/// Status reported at phase transitions and retry ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// Association started for the configured network.
    Connecting {
        /// Network name
        ssid: String,
    },
    /// Waiting for an address, bounded by the address deadline.
    WaitingForConnection,
    /// Association lost; a new attempt was issued.
    Disconnected,
    /// Address acquired.
    Connected {
        /// Assigned address
        address: IpAddr,
    },
    /// Address stage finished successfully.
    ConnectedSuccessfully,
    /// Address deadline elapsed; continuing without a network.
    ConnectionTimeout,
    /// Time-sync client is being started.
    InitializingTimeSync,
    /// Clock already plausible; no waiting.
    TimeAlreadySet {
        /// Current calendar date
        date: NaiveDate,
    },
    /// Clock not plausible; polling starts.
    WaitingForTimeSync,
    /// One not-yet-synced poll.
    TimeSyncWaiting {
        /// Poll number, starting at 1
        attempt: u32,
        /// Polls tolerated before giving up
        max: u32,
    },
    /// Poll budget exhausted; continuing without a trusted clock.
    TimeSyncTimeout,
    /// Clock synchronized.
    TimeSynchronized,
}

impl StatusLine {
    /// Severity of this line.
    pub fn level(&self) -> LogLevel {
        match self {
            Self::Disconnected | Self::ConnectionTimeout | Self::TimeSyncTimeout => LogLevel::Warn,
            _ => LogLevel::Info,
        }
    }

    /// True for lines reporting that a bounded wait gave up.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout | Self::TimeSyncTimeout)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting { ssid } => write!(f, "[WIFI] Connecting to {ssid}..."),
            Self::WaitingForConnection => write!(f, "[WIFI] Waiting for connection..."),
            Self::Disconnected => write!(f, "[WIFI] Disconnected, retrying..."),
            Self::Connected { address } => write!(f, "[WIFI] Connected! IP: {address}"),
            Self::ConnectedSuccessfully => write!(f, "[WIFI] Connected successfully!"),
            Self::ConnectionTimeout => {
                write!(f, "[WIFI] Connection timeout, continuing anyway...")
            },
            Self::InitializingTimeSync => write!(f, "[NTP] Initializing SNTP..."),
            Self::TimeAlreadySet { date } => {
                write!(f, "[NTP] Time is already set ({date}). Skipping sync wait.")
            },
            Self::WaitingForTimeSync => write!(f, "[NTP] Waiting for time sync..."),
            Self::TimeSyncWaiting { attempt, max } => {
                write!(f, "[NTP] Waiting... ({attempt}/{max})")
            },
            Self::TimeSyncTimeout => write!(f, "[NTP] Time sync timeout!"),
            Self::TimeSynchronized => write!(f, "[TIME_SYNC_OK] NTP time synchronized!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn markers_are_preserved() {
        let line = StatusLine::Connected { address: IpAddr::V4(Ipv4Addr::new(192, 168, 0, 7)) };
        assert_eq!(line.to_string(), "[WIFI] Connected! IP: 192.168.0.7");
        assert_eq!(StatusLine::TimeSynchronized.to_string(), "[TIME_SYNC_OK] NTP time synchronized!");
        assert_eq!(
            StatusLine::TimeSyncWaiting { attempt: 3, max: 30 }.to_string(),
            "[NTP] Waiting... (3/30)"
        );
    }

    #[test]
    fn already_set_renders_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 6).unwrap();
        assert_eq!(
            StatusLine::TimeAlreadySet { date }.to_string(),
            "[NTP] Time is already set (2026-02-06). Skipping sync wait."
        );
    }

    #[test]
    fn timeouts_are_warnings() {
        assert_eq!(StatusLine::ConnectionTimeout.level(), LogLevel::Warn);
        assert_eq!(StatusLine::TimeSyncTimeout.level(), LogLevel::Warn);
        assert!(StatusLine::TimeSyncTimeout.is_timeout());
        assert_eq!(StatusLine::TimeSynchronized.level(), LogLevel::Info);
        assert!(!StatusLine::TimeSynchronized.is_timeout());
    }
}
