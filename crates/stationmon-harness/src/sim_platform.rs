//! Scripted platform collaborators.
//!
//! Implement the `stationmon-app` platform traits for deterministic testing,
//! so the same [`stationmon_app::SerialMonitor`] and
//! [`stationmon_app::StartupSequencer`] code runs in production and in
//! simulation. Every type is a cheap cloneable handle: keep a clone in the
//! test to script behaviour and inspect what the runtime did.

use std::{
    collections::VecDeque,
    net::IpAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use stationmon_app::{NetworkEventSender, Restarter, SerialSource, Station, TimeSync};
use stationmon_core::{NetworkEvent, SyncStatus};
use thiserror::Error;
use tokio::time::Instant;

/// Error type for simulated collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("simulated failure: {0}")]
pub struct SimError(pub String);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted serial read.
#[derive(Debug, Clone)]
enum SourceStep {
    Chunk(Vec<u8>),
    Fail(String),
}

#[derive(Debug, Default)]
struct SourceState {
    steps: VecDeque<SourceStep>,
    reads: u64,
}

/// Serial source replaying scripted chunks.
///
/// Each read returns the next chunk (split across reads if larger than the
/// caller's buffer). Once the script is drained a read waits out its full
/// timeout and returns zero bytes, like an idle line.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
}

impl ScriptedSource {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a chunk.
    pub fn push_chunk(&self, chunk: impl Into<Vec<u8>>) {
        lock(&self.state).steps.push_back(SourceStep::Chunk(chunk.into()));
    }

    /// Queue a failed read.
    pub fn push_failure(&self, reason: impl Into<String>) {
        lock(&self.state).steps.push_back(SourceStep::Fail(reason.into()));
    }

    /// True once every scripted step has been consumed.
    pub fn is_drained(&self) -> bool {
        lock(&self.state).steps.is_empty()
    }

    /// Reads performed so far, including idle ones.
    pub fn reads(&self) -> u64 {
        lock(&self.state).reads
    }

    fn next_step(&self, max: usize) -> Option<SourceStep> {
        let mut state = lock(&self.state);
        state.reads += 1;
        match state.steps.pop_front()? {
            SourceStep::Chunk(mut chunk) if chunk.len() > max => {
                let rest = chunk.split_off(max);
                state.steps.push_front(SourceStep::Chunk(rest));
                Some(SourceStep::Chunk(chunk))
            },
            step => Some(step),
        }
    }
}

impl SerialSource for ScriptedSource {
    type Error = SimError;

    async fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SimError> {
        match self.next_step(buf.len()) {
            Some(SourceStep::Chunk(chunk)) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            },
            Some(SourceStep::Fail(reason)) => Err(SimError(reason)),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(0)
            },
        }
    }
}

/// Scripted outcome of one association attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// Attach after `after`, then acquire `address` immediately.
    Connect {
        /// Delay before the station attaches
        after: Duration,
        /// Address handed out
        address: IpAddr,
    },
    /// Report association loss after `after`.
    Fail {
        /// Delay before the loss is reported
        after: Duration,
    },
    /// Never report anything.
    Silent,
}

#[derive(Debug, Default)]
struct StationState {
    script: VecDeque<Association>,
    attempts: u64,
}

/// Station replaying scripted association outcomes.
///
/// Outcomes are delivered through the event queue from a spawned task after
/// the scripted delay, the way a real network stack reports them from its
/// own context. Attempts beyond the script stay [`Association::Silent`].
#[derive(Debug, Clone)]
pub struct SimStation {
    events: NetworkEventSender,
    state: Arc<Mutex<StationState>>,
}

impl SimStation {
    /// Station reporting through `events`.
    pub fn new(events: NetworkEventSender) -> Self {
        Self { events, state: Arc::default() }
    }

    /// Script the next attempt.
    #[must_use]
    pub fn then(self, outcome: Association) -> Self {
        lock(&self.state).script.push_back(outcome);
        self
    }

    /// Report an association loss now, independent of any attempt.
    pub fn drop_link(&self) {
        self.events.notify(NetworkEvent::AssociationLost);
    }

    /// Association attempts issued by the runtime.
    pub fn attempts(&self) -> u64 {
        lock(&self.state).attempts
    }
}

impl Station for SimStation {
    type Error = SimError;

    fn associate(&mut self) -> Result<(), SimError> {
        let outcome = {
            let mut state = lock(&self.state);
            state.attempts += 1;
            state.script.pop_front().unwrap_or(Association::Silent)
        };

        let events = self.events.clone();
        match outcome {
            Association::Connect { after, address } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    events.notify(NetworkEvent::AssociationStarted);
                    events.notify(NetworkEvent::AddressAcquired(address));
                });
            },
            Association::Fail { after } => {
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    events.notify(NetworkEvent::AssociationLost);
                });
            },
            Association::Silent => {},
        }

        tracing::trace!(?outcome, "simulated association attempt");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TimeSyncState {
    synced_on_poll: Option<u32>,
    polls: u32,
    servers: Vec<String>,
}

/// Time-sync client that reports synchronized on a chosen poll.
#[derive(Debug, Clone, Default)]
pub struct SimTimeSync {
    state: Arc<Mutex<TimeSyncState>>,
}

impl SimTimeSync {
    /// Reports [`SyncStatus::Synced`] from poll `poll` onwards (1-based).
    pub fn synced_on_poll(poll: u32) -> Self {
        let sync = Self::default();
        lock(&sync.state).synced_on_poll = Some(poll);
        sync
    }

    /// Never synchronizes.
    pub fn never() -> Self {
        Self::default()
    }

    /// Status polls answered so far.
    pub fn polls(&self) -> u32 {
        lock(&self.state).polls
    }

    /// Servers the client was started against, in order.
    pub fn servers(&self) -> Vec<String> {
        lock(&self.state).servers.clone()
    }
}

impl TimeSync for SimTimeSync {
    type Error = SimError;

    fn start(&mut self, server: &str) -> Result<(), SimError> {
        lock(&self.state).servers.push(server.to_string());
        Ok(())
    }

    fn status(&mut self) -> SyncStatus {
        let mut state = lock(&self.state);
        state.polls += 1;
        match state.synced_on_poll {
            Some(poll) if state.polls >= poll => SyncStatus::Synced,
            _ => SyncStatus::NotSynced,
        }
    }
}

#[derive(Debug, Default)]
struct RestarterState {
    restarts: Vec<Instant>,
    failure: Option<String>,
}

/// Restarter that records when it was invoked instead of restarting.
#[derive(Debug, Clone, Default)]
pub struct RecordingRestarter {
    state: Arc<Mutex<RestarterState>>,
}

impl RecordingRestarter {
    /// Restarter that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarter whose every call fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        let restarter = Self::default();
        lock(&restarter.state).failure = Some(reason.into());
        restarter
    }

    /// Virtual times at which a restart was performed.
    pub fn restarts(&self) -> Vec<Instant> {
        lock(&self.state).restarts.clone()
    }
}

impl Restarter for RecordingRestarter {
    type Error = SimError;

    fn restart(&mut self) -> Result<(), SimError> {
        let mut state = lock(&self.state);
        state.restarts.push(Instant::now());
        match &state.failure {
            Some(reason) => Err(SimError(reason.clone())),
            None => Ok(()),
        }
    }
}
