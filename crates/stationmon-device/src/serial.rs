//! Host serial input.
//!
//! Reads from a serial port opened through `tokio-serial` (raw mode, 8N1 at
//! the configured baud rate) or from stdin. Each read waits at most the poll
//! timeout; an elapsed timeout is an empty read, not an error.
//!
//! A port that fails a read is dropped and reopened after
//! [`DEFAULT_REOPEN_DELAY`], so a board that resets and re-enumerates is
//! picked up again. A stream with no way to reopen it goes idle instead.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use stationmon_app::SerialSource;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};

use crate::DeviceError;

/// Line speed used when none is configured.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Wait between a failed read and the next attempt to open the port.
pub const DEFAULT_REOPEN_DELAY: Duration = Duration::from_secs(2);

/// Boxed byte stream behind a [`HostSerial`].
pub type SerialStream = Box<dyn AsyncRead + Unpin + Send>;

type Reopen = Box<dyn FnMut() -> Result<SerialStream, DeviceError> + Send>;

/// Serial source over any async byte stream.
pub struct HostSerial {
    stream: Option<SerialStream>,
    reopen: Option<Reopen>,
    reopen_delay: Duration,
}

impl HostSerial {
    /// Wrap an already opened stream that cannot be reopened.
    pub fn new(stream: SerialStream) -> Self {
        Self { stream: Some(stream), reopen: None, reopen_delay: DEFAULT_REOPEN_DELAY }
    }

    /// Wrap a stream that `reopen` can replace after it fails.
    pub fn with_reopen<F>(stream: SerialStream, reopen_delay: Duration, reopen: F) -> Self
    where
        F: FnMut() -> Result<SerialStream, DeviceError> + Send + 'static,
    {
        Self { stream: Some(stream), reopen: Some(Box::new(reopen)), reopen_delay }
    }

    /// Open `port` at `baud`, or stdin when no port is given.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(port: Option<&Path>, baud: u32) -> Result<Self, DeviceError> {
        let Some(path) = port else {
            tracing::info!("reading serial input from stdin");
            return Ok(Self::new(Box::new(tokio::io::stdin())));
        };

        let path = path.to_path_buf();
        let stream = open_port(&path, baud)?;
        tracing::info!(baud, "reading serial input from {}", path.display());
        Ok(Self::with_reopen(stream, DEFAULT_REOPEN_DELAY, move || open_port(&path, baud)))
    }

    async fn reconnect(&mut self, timeout: Duration) -> Result<usize, DeviceError> {
        let Some(reopen) = self.reopen.as_mut() else {
            // Nothing to reopen: stay idle instead of spinning on a dead stream
            tokio::time::sleep(timeout).await;
            return Ok(0);
        };

        tokio::time::sleep(self.reopen_delay).await;
        let stream = reopen()?;
        tracing::info!("serial input reopened");
        self.stream = Some(stream);
        Ok(0)
    }
}

fn open_port(path: &Path, baud: u32) -> Result<SerialStream, DeviceError> {
    let port = tokio_serial::new(path.to_string_lossy(), baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(|source| DeviceError::SerialOpen { path: PathBuf::from(path), source })?;
    Ok(Box::new(port))
}

impl SerialSource for HostSerial {
    type Error = DeviceError;

    async fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        if self.stream.is_none() {
            return self.reconnect(timeout).await;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };

        match tokio::time::timeout(timeout, stream.read(buf)).await {
            Ok(Ok(0)) => {
                tracing::info!("serial input closed");
                self.stream = None;
                Ok(0)
            },
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => {
                self.stream = None;
                Err(DeviceError::SerialRead(e))
            },
            Err(_elapsed) => Ok(0),
        }
    }
}
