//! Bounded queue carrying network events from platform callbacks to the
//! startup sequencer.
//!
//! Network stacks deliver events on their own dispatch context. Callbacks
//! only push a typed [`NetworkEvent`] here; they never touch coordinator
//! state and never block.

use stationmon_core::NetworkEvent;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default queue depth.
pub const DEFAULT_EVENT_QUEUE: usize = 16;

/// Receiving half, owned by the [`crate::StartupSequencer`].
pub type NetworkEventReceiver = mpsc::Receiver<NetworkEvent>;

/// Non-blocking sending half, handed to platform callbacks.
#[derive(Debug, Clone)]
pub struct NetworkEventSender {
    tx: mpsc::Sender<NetworkEvent>,
}

impl NetworkEventSender {
    /// Push an event without waiting.
    ///
    /// Returns `false` if the event was dropped because the queue is full or
    /// the sequencer is gone.
    pub fn notify(&self, event: NetworkEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "network event queue full, dropping event");
                false
            },
            Err(TrySendError::Closed(event)) => {
                tracing::debug!(?event, "network event receiver closed");
                false
            },
        }
    }
}

/// Create a bounded network event queue.
///
/// A capacity of zero is raised to one.
pub fn network_events(capacity: usize) -> (NetworkEventSender, NetworkEventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (NetworkEventSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_drops_without_blocking() {
        let (tx, mut rx) = network_events(1);

        assert!(tx.notify(NetworkEvent::AssociationStarted));
        assert!(!tx.notify(NetworkEvent::AssociationLost));

        assert_eq!(rx.try_recv().ok(), Some(NetworkEvent::AssociationStarted));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_reports_drop() {
        let (tx, rx) = network_events(4);
        drop(rx);
        assert!(!tx.notify(NetworkEvent::AssociationLost));
    }
}
