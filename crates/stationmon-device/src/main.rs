//! Station monitor host binary.
//!
//! # Usage
//!
//! ```bash
//! # Read commands from stdin
//! stationmon --ssid lab
//!
//! # Read commands from a serial device
//! stationmon --port /dev/ttyUSB0 --baud 115200 --ssid lab --log-level debug
//! ```

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use stationmon_core::{
    ConnectivityConfig, MonitorConfig,
    config::{
        DEFAULT_ADDRESS_TIMEOUT, DEFAULT_MAX_TIME_SYNC_RETRIES, DEFAULT_PLAUSIBLE_YEAR,
        DEFAULT_RESTART_KEYWORD,
    },
};
use stationmon_device::{DEFAULT_BAUD_RATE, DEFAULT_PROBE, Device, DeviceConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Station monitor
#[derive(Parser, Debug)]
#[command(name = "stationmon")]
#[command(about = "Serial command monitor with network and clock readiness tracking")]
#[command(version)]
struct Args {
    /// Serial device to read commands from (stdin when omitted)
    #[arg(short, long)]
    port: Option<PathBuf>,

    /// Serial line speed
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Network name shown while associating
    #[arg(long, default_value = "")]
    ssid: String,

    /// Time-sync server
    #[arg(long, default_value = "pool.ntp.org")]
    time_server: String,

    /// Seconds to wait for an address before continuing without one
    #[arg(long, default_value_t = DEFAULT_ADDRESS_TIMEOUT.as_secs())]
    address_timeout: u64,

    /// Not-yet-synced polls tolerated before continuing without a trusted clock
    #[arg(long, default_value_t = DEFAULT_MAX_TIME_SYNC_RETRIES)]
    max_time_sync_retries: u32,

    /// Earliest calendar year treated as a trustworthy clock
    #[arg(long, default_value_t = DEFAULT_PLAUSIBLE_YEAR)]
    plausible_year: i32,

    /// Keyword that triggers a restart when it appears in a line
    #[arg(long, default_value = DEFAULT_RESTART_KEYWORD)]
    restart_keyword: String,

    /// Route probe target used to discover the local address
    #[arg(long, default_value_t = DEFAULT_PROBE)]
    probe: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> DeviceConfig {
        DeviceConfig {
            port: self.port,
            baud: self.baud,
            monitor: MonitorConfig {
                restart_keyword: self.restart_keyword,
                ..MonitorConfig::default()
            },
            connectivity: ConnectivityConfig {
                ssid: self.ssid,
                time_server: self.time_server,
                address_timeout: Duration::from_secs(self.address_timeout),
                max_time_sync_retries: self.max_time_sync_retries,
                plausible_year: self.plausible_year,
                ..ConnectivityConfig::default()
            },
            probe: self.probe,
            ..DeviceConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("stationmon starting");

    Device::new(args.into_config()).run().await?;

    Ok(())
}
