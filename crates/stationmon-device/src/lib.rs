//! Station monitor host runtime.
//!
//! Production glue that runs the `stationmon-app` runtimes against the host:
//! serial input from a tty or stdin, the OS network stack, the OS clock and
//! process re-exec for restarts.
//!
//! # Components
//!
//! - [`Device`]: wires everything together and runs until restart
//! - [`HostSerial`]: serial source over a serial port or stdin
//! - [`HostStation`]: route-probe station
//! - [`HostClock`]: OS-managed clock as a time-sync client
//! - [`ExecRestarter`]: re-executes the process
//! - [`SystemEnv`]: production environment (real time)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod error;
mod restart;
mod serial;
mod station;
mod system_env;

use std::{net::SocketAddr, ops::ControlFlow, path::PathBuf};

pub use clock::HostClock;
pub use error::DeviceError;
pub use restart::ExecRestarter;
pub use serial::{DEFAULT_BAUD_RATE, DEFAULT_REOPEN_DELAY, HostSerial, SerialStream};
use stationmon_app::{
    DEFAULT_EVENT_QUEUE, MonitorError, SerialMonitor, StartupSequencer, network_events,
};
use stationmon_core::{ConnectivityConfig, CoordinatorError, MonitorConfig, RestartSignal};
pub use station::{DEFAULT_PROBE, DEFAULT_RETRY_DELAY, HostStation};
pub use system_env::SystemEnv;
use tokio::task::{JoinError, JoinHandle};

/// Device runtime configuration.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Serial device path. `None` reads stdin.
    pub port: Option<PathBuf>,
    /// Serial line speed. Ignored for stdin.
    pub baud: u32,
    /// Serial loop settings
    pub monitor: MonitorConfig,
    /// Startup settings
    pub connectivity: ConnectivityConfig,
    /// Route probe target for the host station
    pub probe: SocketAddr,
    /// Network event queue depth
    pub event_queue: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD_RATE,
            monitor: MonitorConfig::default(),
            connectivity: ConnectivityConfig::default(),
            probe: DEFAULT_PROBE,
            event_queue: DEFAULT_EVENT_QUEUE,
        }
    }
}

/// Outcome of the serial task.
type SerialResult = Result<(), MonitorError<DeviceError>>;

/// Host device.
///
/// Starts the serial loop first, then runs startup sequencing alongside it,
/// then keeps supervising the link until the serial loop restarts the
/// process.
pub struct Device {
    config: DeviceConfig,
    env: SystemEnv,
}

impl Device {
    /// Create a device with the given configuration.
    pub fn new(config: DeviceConfig) -> Self {
        Self { config, env: SystemEnv::new() }
    }

    /// Run until a restart is requested.
    ///
    /// On Unix a successful restart replaces the process and never returns.
    /// A failed restart is reported as soon as it happens, even while
    /// startup is still running.
    pub async fn run(self) -> Result<(), DeviceError> {
        let DeviceConfig { port, baud, monitor, connectivity, probe, event_queue } = self.config;

        let source = HostSerial::open(port.as_deref(), baud)?;
        let serial = SerialMonitor::new(
            source,
            ExecRestarter::new(),
            self.env.clone(),
            monitor,
            RestartSignal::new(),
        );
        let mut serial_task = tokio::spawn(serial.run());

        let (events, rx) = network_events(event_queue);
        let station = HostStation::new(events, probe);
        let clock = HostClock::new(self.env.clone(), connectivity.plausible_year);
        let mut sequencer = StartupSequencer::new(station, clock, self.env, rx, connectivity);

        let readiness = match startup_or_serial_exit(sequencer.run(), &mut serial_task).await? {
            ControlFlow::Continue(readiness) => readiness,
            ControlFlow::Break(()) => return Ok(()),
        };
        if readiness.is_ready() {
            tracing::info!("device ready");
        } else {
            tracing::warn!(
                network = ?readiness.network,
                time = ?readiness.time,
                "continuing without full readiness"
            );
        }

        let supervisor = tokio::spawn(sequencer.supervise());
        let result = serial_task.await;
        supervisor.abort();

        serial_exit(result)
    }
}

/// Drive `startup` to completion unless the serial task ends first.
async fn startup_or_serial_exit<T, F>(
    startup: F,
    serial_task: &mut JoinHandle<SerialResult>,
) -> Result<ControlFlow<(), T>, DeviceError>
where
    F: Future<Output = Result<T, CoordinatorError>>,
{
    tokio::select! {
        outcome = startup => Ok(ControlFlow::Continue(outcome?)),
        result = serial_task => serial_exit(result).map(ControlFlow::Break),
    }
}

fn serial_exit(result: Result<SerialResult, JoinError>) -> Result<(), DeviceError> {
    match result? {
        Ok(()) => Ok(()),
        Err(MonitorError::Restart(e)) => Err(e),
    }
}
