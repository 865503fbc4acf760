//! Host network station.
//!
//! The host OS owns the actual link, so an association attempt is a route
//! probe: a UDP socket connected toward the probe address reveals the local
//! address the OS would use, without sending any traffic. A usable address
//! is reported as association plus address acquisition; no route is
//! reported as association loss after a short delay, which makes the
//! coordinator retry.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use stationmon_app::{NetworkEventSender, Station};
use stationmon_core::NetworkEvent;
use tokio::net::UdpSocket;

use crate::DeviceError;

/// Default route probe target (a public resolver; never contacted).
pub const DEFAULT_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);

/// Delay before a failed probe is reported as association loss.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Station backed by the host routing table.
#[derive(Debug, Clone)]
pub struct HostStation {
    events: NetworkEventSender,
    probe: SocketAddr,
    retry_delay: Duration,
}

impl HostStation {
    /// Station probing toward `probe` and reporting through `events`.
    pub fn new(events: NetworkEventSender, probe: SocketAddr) -> Self {
        Self { events, probe, retry_delay: DEFAULT_RETRY_DELAY }
    }

    /// Override the delay before a failed probe reports loss.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

impl Station for HostStation {
    type Error = DeviceError;

    fn associate(&mut self) -> Result<(), DeviceError> {
        let events = self.events.clone();
        let probe = self.probe;
        let retry_delay = self.retry_delay;

        tokio::spawn(async move {
            match local_address(probe).await {
                Ok(address) => {
                    events.notify(NetworkEvent::AssociationStarted);
                    events.notify(NetworkEvent::AddressAcquired(address));
                },
                Err(e) => {
                    tracing::debug!(%probe, "no route: {}", e);
                    tokio::time::sleep(retry_delay).await;
                    events.notify(NetworkEvent::AssociationLost);
                },
            }
        });

        Ok(())
    }
}

/// Local address the OS would use to reach `probe`.
async fn local_address(probe: SocketAddr) -> io::Result<IpAddr> {
    let bind: SocketAddr = match probe {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };

    let socket = UdpSocket::bind(bind).await?;
    socket.connect(probe).await?;
    let address = socket.local_addr()?.ip();

    if address.is_unspecified() {
        return Err(io::Error::new(io::ErrorKind::AddrNotAvailable, "unspecified local address"));
    }
    Ok(address)
}
