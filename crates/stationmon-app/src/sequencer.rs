//! Startup sequencer.
//!
//! Drives a [`ConnectivityCoordinator`] against real collaborators: feeds it
//! network events from the bounded queue, wakes it when the address
//! deadline passes, polls the time-sync client on the interval it asks for
//! and executes every returned action.

use std::{fmt::Display, time::Duration};

use stationmon_core::{
    ConnectivityConfig, ConnectivityCoordinator, CoordinatorAction, CoordinatorError,
    Environment, LogLevel, NetworkEvent, Readiness,
};

use crate::{NetworkEventReceiver, Station, TimeSync};

/// Runs startup to a single readiness outcome, then keeps handling
/// association loss.
///
/// # Type Parameters
///
/// - `St`: Wireless station
/// - `T`: Time-sync client
/// - `E`: Environment for time
pub struct StartupSequencer<St, T, E>
where
    St: Station,
    T: TimeSync,
    E: Environment,
{
    station: St,
    time_sync: T,
    env: E,
    events: NetworkEventReceiver,
    events_open: bool,
    coordinator: ConnectivityCoordinator<E::Instant>,
}

impl<St, T, E> StartupSequencer<St, T, E>
where
    St: Station,
    T: TimeSync,
    E: Environment,
{
    /// Create a sequencer. The coordinator starts in Idle.
    pub fn new(
        station: St,
        time_sync: T,
        env: E,
        events: NetworkEventReceiver,
        config: ConnectivityConfig,
    ) -> Self {
        Self {
            station,
            time_sync,
            env,
            events,
            events_open: true,
            coordinator: ConnectivityCoordinator::new(config),
        }
    }

    /// Run startup until both bounded stages resolve.
    ///
    /// Always returns within the address timeout plus
    /// `(max_time_sync_retries + 1)` poll intervals. Network events are
    /// still processed while time sync is polled.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidState`] if called more than once.
    pub async fn run(&mut self) -> Result<Readiness, CoordinatorError> {
        let actions = self.coordinator.start(self.env.now())?;
        self.execute(actions);

        while self.coordinator.network_outcome().is_none() {
            let Some(remaining) = self.coordinator.address_deadline(self.env.now()) else {
                break;
            };

            tokio::select! {
                event = self.events.recv(), if self.events_open => self.on_event(event),
                () = self.env.sleep(remaining) => {
                    let actions = self.coordinator.tick(self.env.now());
                    self.execute(actions);
                },
            }
        }

        let actions = self.coordinator.begin_time_sync(self.env.wall_clock_secs())?;
        let mut next_poll = self.execute(actions);

        while let Some(after) = next_poll {
            self.wait_handling_events(after).await;
            let status = self.time_sync.status();
            let actions = self.coordinator.observe_time_sync(status)?;
            next_poll = self.execute(actions);
        }

        self.coordinator.readiness().ok_or_else(|| CoordinatorError::InvalidState {
            phase: self.coordinator.phase(),
            operation: "run".to_string(),
        })
    }

    /// Keep handling network events after startup, reissuing association on
    /// every loss. Returns once every event sender is gone.
    pub async fn supervise(mut self) {
        while self.events_open {
            let event = self.events.recv().await;
            self.on_event(event);
        }
        tracing::debug!("network event queue closed, supervisor exiting");
    }

    /// Coordinator state.
    pub fn coordinator(&self) -> &ConnectivityCoordinator<E::Instant> {
        &self.coordinator
    }

    async fn wait_handling_events(&mut self, duration: Duration) {
        let env = self.env.clone();
        let sleep = env.sleep(duration);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return,
                event = self.events.recv(), if self.events_open => self.on_event(event),
            }
        }
    }

    fn on_event(&mut self, event: Option<NetworkEvent>) {
        match event {
            Some(event) => {
                let actions = self.coordinator.handle_event(event, self.env.now());
                self.execute(actions);
            },
            None => self.events_open = false,
        }
    }

    /// Execute coordinator actions. Returns the requested poll delay, if any.
    fn execute(&mut self, actions: Vec<CoordinatorAction>) -> Option<Duration> {
        let mut next_poll = None;

        for action in actions {
            match action {
                CoordinatorAction::IssueAssociation => {
                    if let Err(e) = self.station.associate() {
                        tracing::warn!("association attempt failed: {}", e);
                    }
                },
                CoordinatorAction::StartTimeSync { server } => {
                    if let Err(e) = self.time_sync.start(&server) {
                        tracing::warn!(%server, "time sync start failed: {}", e);
                    }
                },
                CoordinatorAction::PollTimeSync { after } => next_poll = Some(after),
                CoordinatorAction::Status(line) => log(line.level(), &line),
                CoordinatorAction::Log { level, message } => log(level, &message),
                CoordinatorAction::Ready(readiness) => {
                    tracing::info!(
                        network = ?readiness.network,
                        time = ?readiness.time,
                        "startup converged"
                    );
                },
            }
        }

        next_poll
    }
}

fn log(level: LogLevel, message: &dyn Display) {
    match level {
        LogLevel::Debug => tracing::debug!("{}", message),
        LogLevel::Info => tracing::info!("{}", message),
        LogLevel::Warn => tracing::warn!("{}", message),
    }
}
