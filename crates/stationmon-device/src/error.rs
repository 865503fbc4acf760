//! Device error types.

use std::{io, path::PathBuf};

use stationmon_core::CoordinatorError;
use thiserror::Error;

/// Errors that can stop the device runtime.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The serial device could not be opened.
    ///
    /// Fatal at startup. After a read failure the port is retried instead.
    #[error("cannot open serial port {}: {source}", path.display())]
    SerialOpen {
        /// Requested device path
        path: PathBuf,
        /// Underlying port error
        #[source]
        source: tokio_serial::Error,
    },

    /// A serial read failed.
    ///
    /// Transient. The serial loop logs it and keeps polling while the port
    /// is reopened.
    #[error("serial read failed: {0}")]
    SerialRead(#[source] io::Error),

    /// Re-executing the process failed.
    #[error("restart failed: {0}")]
    Restart(#[source] io::Error),

    /// The startup sequence was driven out of order.
    ///
    /// Indicates a bug in the runtime. Fatal - report as issue.
    #[error("startup sequencing: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// A runtime task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
