//! Platform traits for abstracting device I/O.
//!
//! The runtimes in this crate never touch hardware directly. Each platform
//! (firmware, host binary, simulation) implements these traits and the same
//! orchestration code runs everywhere.
//!
//! # Implementations
//!
//! - **Host**: stdin or a tty device, the OS network stack and clock, process
//!   re-exec for restarts
//! - **Simulation**: scripted chunks, scripted association outcomes, a
//!   paused virtual clock, a restarter that only records

use std::{future::Future, time::Duration};

use stationmon_core::SyncStatus;

/// Raw byte source for serial input.
pub trait SerialSource: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Read whatever bytes are available into `buf`, waiting at most
    /// `timeout`.
    ///
    /// Returns the number of bytes read; `0` means nothing arrived in time.
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}

/// Wireless station control.
///
/// Outcomes of an attempt are not returned here: the network stack reports
/// them later as [`stationmon_core::NetworkEvent`]s through a
/// [`crate::NetworkEventSender`].
pub trait Station: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Issue an association attempt. Must not block.
    fn associate(&mut self) -> Result<(), Self::Error>;
}

/// Time-sync client control.
pub trait TimeSync: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Start synchronizing against `server`.
    fn start(&mut self, server: &str) -> Result<(), Self::Error>;

    /// Current synchronization status.
    fn status(&mut self) -> SyncStatus;
}

/// Performs the device restart.
pub trait Restarter: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Restart the device or process.
    ///
    /// On real targets this does not return on success. Simulation
    /// implementations record the call and return `Ok`.
    fn restart(&mut self) -> Result<(), Self::Error>;
}
