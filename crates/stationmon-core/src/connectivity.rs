//! Network readiness state machine.
//!
//! Sequences association → address acquisition → time synchronization and
//! decides when the device is ready. Uses the action pattern: methods take
//! time (and the wall clock) as input and return [`CoordinatorAction`]s for
//! the runtime to execute. The coordinator itself performs no I/O.
//!
//! # State Machine
//!
//! ```text
//!                 lost (retry forever)
//!               ┌───────────────────────┐
//!               ↓                       │
//! ┌──────┐ start ┌─────────────┐ started ┌─────────────────┐
//! │ Idle │──────>│ Associating │────────>│ AwaitingAddress │
//! └──────┘       └─────────────┘         └─────────────────┘
//!                    │      │ address          │      │
//!           deadline │      └─────────┬────────┘      │ deadline
//!                    ↓                ↓               ↓
//!               ┌──────────┐    ┌────────────┐   ┌──────────┐
//!               │ Degraded │    │ Associated │   │ Degraded │
//!               └──────────┘    └────────────┘   └──────────┘
//!                    │ begin_time_sync  │
//!                    └────────┬─────────┘
//!                             ↓
//!       plausible clock ┌──────────────────┐ not synced (bounded)
//!          ┌────────────│ AwaitingTimeSync │<──────┐
//!          │            └──────────────────┘───────┘
//!          ↓               │ synced   │ retries exhausted
//!   ┌─────────────┐        ↓          ↓
//!   │ Ready or    │<─── Ready  /  Degraded
//!   │ Degraded    │
//!   └─────────────┘
//! ```
//!
//! Association loss is retried forever with no backoff. Address acquisition
//! and time sync are each bounded so startup always converges. Once the
//! readiness outcome is reached it is never revisited, even though later
//! association losses keep triggering new attempts.

use std::{
    net::IpAddr,
    ops::Sub,
    time::{Duration, Instant},
};

use chrono::{DateTime, Datelike, NaiveDate};

use crate::{
    config::ConnectivityConfig,
    error::CoordinatorError,
    status::{LogLevel, StatusLine},
};

/// Coordinator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not started
    Idle,
    /// Association attempt issued, not yet attached to the access point
    Associating,
    /// Attached to the access point, waiting for an address
    AwaitingAddress,
    /// Address acquired
    Associated,
    /// Polling the time-sync collaborator
    AwaitingTimeSync,
    /// Network and clock both established
    Ready,
    /// A bounded wait gave up; running without its guarantee
    Degraded,
}

/// Result of one bounded startup stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageOutcome {
    /// The stage succeeded.
    Ready,
    /// The stage timed out and startup continued without it.
    Degraded,
}

/// Combined startup outcome, emitted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Readiness {
    /// Address stage outcome
    pub network: StageOutcome,
    /// Time-sync stage outcome
    pub time: StageOutcome,
}

impl Readiness {
    /// True when both network and clock are established.
    pub fn is_ready(&self) -> bool {
        self.network == StageOutcome::Ready && self.time == StageOutcome::Ready
    }
}

/// Events delivered asynchronously by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Station attached to the access point; address pending.
    AssociationStarted,
    /// Association lost or attempt failed.
    AssociationLost,
    /// Address assigned.
    AddressAcquired(IpAddr),
}

/// Answer to a time-sync status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No synchronization has completed yet.
    NotSynced,
    /// The clock has been synchronized.
    Synced,
}

/// Actions returned by the coordinator.
///
/// The runtime executes these:
/// - `IssueAssociation`: ask the station to (re)associate
/// - `StartTimeSync`: start the time-sync client
/// - `PollTimeSync`: query sync status after the given delay and feed it to
///   [`ConnectivityCoordinator::observe_time_sync`]
/// - `Status` / `Log`: report progress
/// - `Ready`: startup has converged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// Issue an association attempt.
    IssueAssociation,
    /// Start the time-sync client against this server.
    StartTimeSync {
        /// Time server name
        server: String,
    },
    /// Poll time-sync status after this delay.
    PollTimeSync {
        /// Delay before polling
        after: Duration,
    },
    /// User-visible status line.
    Status(StatusLine),
    /// Diagnostic message.
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
    /// Startup converged with this outcome.
    Ready(Readiness),
}

/// Calendar date for a Unix timestamp, `None` if out of range.
pub fn calendar_date(wall_clock_secs: u64) -> Option<NaiveDate> {
    let secs = i64::try_from(wall_clock_secs).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Connectivity state machine.
///
/// Pure state machine: no I/O, no Environment storage. Time is passed to the
/// methods that need it. Generic over `Instant` to support both real time and
/// virtual time for deterministic testing.
#[derive(Debug, Clone)]
pub struct ConnectivityCoordinator<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    phase: Phase,
    config: ConnectivityConfig,
    /// First entry into Associating; the address deadline runs from here
    associating_since: Option<I>,
    /// Readiness bit. Cleared on association loss
    address: Option<IpAddr>,
    retry_count: u64,
    association_attempts: u64,
    time_sync_started: bool,
    time_sync_retry: u32,
    time_sync_polls: u32,
    network_outcome: Option<StageOutcome>,
    time_outcome: Option<StageOutcome>,
}

impl<I> ConnectivityCoordinator<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a coordinator in [`Phase::Idle`].
    pub fn new(config: ConnectivityConfig) -> Self {
        Self {
            phase: Phase::Idle,
            config,
            associating_since: None,
            address: None,
            retry_count: 0,
            association_attempts: 0,
            time_sync_started: false,
            time_sync_retry: 0,
            time_sync_polls: 0,
            network_outcome: None,
            time_outcome: None,
        }
    }

    /// Start association. Starts the address deadline.
    ///
    /// # Errors
    ///
    /// - `CoordinatorError::InvalidState` if not in Idle
    pub fn start(&mut self, now: I) -> Result<Vec<CoordinatorAction>, CoordinatorError> {
        if self.phase != Phase::Idle {
            return Err(self.invalid("start"));
        }

        self.phase = Phase::Associating;
        self.associating_since = Some(now);
        self.association_attempts += 1;

        Ok(vec![
            CoordinatorAction::Status(StatusLine::Connecting { ssid: self.config.ssid.clone() }),
            CoordinatorAction::IssueAssociation,
            CoordinatorAction::Status(StatusLine::WaitingForConnection),
        ])
    }

    /// Process a network event.
    ///
    /// The address deadline is checked first, so an address that arrives
    /// after the deadline is recorded but does not undo the timeout.
    pub fn handle_event(&mut self, event: NetworkEvent, now: I) -> Vec<CoordinatorAction> {
        if self.phase == Phase::Idle {
            return vec![CoordinatorAction::Log {
                level: LogLevel::Debug,
                message: format!("ignoring {event:?} before start"),
            }];
        }

        let mut actions = self.tick(now);

        match event {
            NetworkEvent::AssociationStarted => {
                if self.phase == Phase::Associating {
                    self.phase = Phase::AwaitingAddress;
                    actions.push(CoordinatorAction::Log {
                        level: LogLevel::Debug,
                        message: "associated, awaiting address".to_string(),
                    });
                }
            },
            NetworkEvent::AssociationLost => {
                self.address = None;
                self.retry_count += 1;
                self.association_attempts += 1;
                if self.phase == Phase::AwaitingAddress {
                    self.phase = Phase::Associating;
                }
                actions.push(CoordinatorAction::Status(StatusLine::Disconnected));
                actions.push(CoordinatorAction::IssueAssociation);
            },
            NetworkEvent::AddressAcquired(address) => {
                self.address = Some(address);
                actions.push(CoordinatorAction::Status(StatusLine::Connected { address }));
                if self.is_awaiting_address() {
                    self.phase = Phase::Associated;
                    self.network_outcome = Some(StageOutcome::Ready);
                    actions.push(CoordinatorAction::Status(StatusLine::ConnectedSuccessfully));
                }
            },
        }

        actions
    }

    /// Check the address deadline.
    ///
    /// Call whenever the deadline reported by [`Self::address_deadline`]
    /// elapses (or periodically). Gives up on the address stage once the
    /// configured timeout has passed since the first association attempt.
    pub fn tick(&mut self, now: I) -> Vec<CoordinatorAction> {
        match self.address_deadline(now) {
            Some(remaining) if remaining.is_zero() => {
                self.phase = Phase::Degraded;
                self.network_outcome = Some(StageOutcome::Degraded);
                vec![CoordinatorAction::Status(StatusLine::ConnectionTimeout)]
            },
            _ => vec![],
        }
    }

    /// Time left before the address stage gives up. `None` when the stage is
    /// not being waited on.
    pub fn address_deadline(&self, now: I) -> Option<Duration> {
        if !self.is_awaiting_address() {
            return None;
        }
        let since = self.associating_since?;
        let elapsed = if now > since { now - since } else { Duration::ZERO };
        Some(self.config.address_timeout.saturating_sub(elapsed))
    }

    /// Enter the time-sync stage.
    ///
    /// Runs the one-shot plausibility check on `wall_clock_secs`: a clock
    /// already in or after the configured year resolves the stage
    /// immediately without a single poll.
    ///
    /// # Errors
    ///
    /// - `CoordinatorError::InvalidState` if the address stage has not
    ///   resolved or the time-sync stage already began
    pub fn begin_time_sync(
        &mut self,
        wall_clock_secs: u64,
    ) -> Result<Vec<CoordinatorAction>, CoordinatorError> {
        if self.network_outcome.is_none() || self.time_sync_started {
            return Err(self.invalid("begin_time_sync"));
        }

        self.time_sync_started = true;

        let mut actions = vec![
            CoordinatorAction::Status(StatusLine::InitializingTimeSync),
            CoordinatorAction::StartTimeSync { server: self.config.time_server.clone() },
        ];

        match calendar_date(wall_clock_secs) {
            Some(date) if date.year() >= self.config.plausible_year => {
                self.time_outcome = Some(StageOutcome::Ready);
                actions.push(CoordinatorAction::Status(StatusLine::TimeAlreadySet { date }));
                actions.push(self.converge());
            },
            _ => {
                self.phase = Phase::AwaitingTimeSync;
                actions.push(CoordinatorAction::Status(StatusLine::WaitingForTimeSync));
                actions.push(CoordinatorAction::PollTimeSync { after: Duration::ZERO });
            },
        }

        Ok(actions)
    }

    /// Feed the result of a time-sync status poll.
    ///
    /// # Errors
    ///
    /// - `CoordinatorError::InvalidState` if not in AwaitingTimeSync
    pub fn observe_time_sync(
        &mut self,
        status: SyncStatus,
    ) -> Result<Vec<CoordinatorAction>, CoordinatorError> {
        if self.phase != Phase::AwaitingTimeSync {
            return Err(self.invalid("observe_time_sync"));
        }

        self.time_sync_polls += 1;

        let actions = match status {
            SyncStatus::Synced => {
                self.time_outcome = Some(StageOutcome::Ready);
                vec![CoordinatorAction::Status(StatusLine::TimeSynchronized), self.converge()]
            },
            SyncStatus::NotSynced => {
                self.time_sync_retry += 1;
                let max = self.config.max_time_sync_retries;
                if self.time_sync_retry > max {
                    self.time_outcome = Some(StageOutcome::Degraded);
                    vec![CoordinatorAction::Status(StatusLine::TimeSyncTimeout), self.converge()]
                } else {
                    vec![
                        CoordinatorAction::Status(StatusLine::TimeSyncWaiting {
                            attempt: self.time_sync_retry,
                            max,
                        }),
                        CoordinatorAction::PollTimeSync {
                            after: self.config.time_sync_poll_interval,
                        },
                    ]
                }
            },
        };

        Ok(actions)
    }

    fn converge(&mut self) -> CoordinatorAction {
        let readiness = Readiness {
            network: self.network_outcome.unwrap_or(StageOutcome::Degraded),
            time: self.time_outcome.unwrap_or(StageOutcome::Degraded),
        };
        self.phase = if readiness.is_ready() { Phase::Ready } else { Phase::Degraded };
        CoordinatorAction::Ready(readiness)
    }

    fn is_awaiting_address(&self) -> bool {
        matches!(self.phase, Phase::Associating | Phase::AwaitingAddress)
    }

    fn invalid(&self, operation: &str) -> CoordinatorError {
        CoordinatorError::InvalidState { phase: self.phase, operation: operation.to_string() }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Configuration in use.
    pub fn config(&self) -> &ConnectivityConfig {
        &self.config
    }

    /// Current address. `None` until acquired and after association loss.
    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    /// Association losses seen so far.
    pub fn retry_count(&self) -> u64 {
        self.retry_count
    }

    /// Association attempts issued, including the first.
    pub fn association_attempts(&self) -> u64 {
        self.association_attempts
    }

    /// Not-yet-synced polls counted against the retry budget.
    pub fn time_sync_retry(&self) -> u32 {
        self.time_sync_retry
    }

    /// Time-sync polls observed.
    pub fn time_sync_polls(&self) -> u32 {
        self.time_sync_polls
    }

    /// Address stage outcome. `None` while waiting.
    pub fn network_outcome(&self) -> Option<StageOutcome> {
        self.network_outcome
    }

    /// Time-sync stage outcome. `None` while waiting or not started.
    pub fn time_outcome(&self) -> Option<StageOutcome> {
        self.time_outcome
    }

    /// Combined outcome once both stages resolved.
    pub fn readiness(&self) -> Option<Readiness> {
        Some(Readiness { network: self.network_outcome?, time: self.time_outcome? })
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    /// 2026-02-06T05:39:15Z
    const PLAUSIBLE_CLOCK: u64 = 1_770_356_355;
    /// 1970-01-01T00:00:10Z, an unsynced RTC
    const UNSET_CLOCK: u64 = 10;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50))
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn coordinator() -> ConnectivityCoordinator<Duration> {
        ConnectivityCoordinator::new(ConnectivityConfig {
            ssid: "lab".to_string(),
            ..ConnectivityConfig::default()
        })
    }

    fn associated() -> ConnectivityCoordinator<Duration> {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        coord.handle_event(NetworkEvent::AddressAcquired(addr()), secs(1));
        coord
    }

    fn count_issues(actions: &[CoordinatorAction]) -> usize {
        actions.iter().filter(|a| matches!(a, CoordinatorAction::IssueAssociation)).count()
    }

    #[test]
    fn start_issues_association() {
        let mut coord = coordinator();
        let actions = coord.start(secs(0)).unwrap();

        assert_eq!(coord.phase(), Phase::Associating);
        assert_eq!(actions, vec![
            CoordinatorAction::Status(StatusLine::Connecting { ssid: "lab".to_string() }),
            CoordinatorAction::IssueAssociation,
            CoordinatorAction::Status(StatusLine::WaitingForConnection),
        ]);
        assert_eq!(coord.association_attempts(), 1);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        let result = coord.start(secs(1));
        assert!(matches!(result, Err(CoordinatorError::InvalidState { phase: Phase::Associating, .. })));
    }

    #[test]
    fn events_before_start_are_ignored() {
        let mut coord = coordinator();
        let actions = coord.handle_event(NetworkEvent::AddressAcquired(addr()), secs(0));

        assert_eq!(coord.phase(), Phase::Idle);
        assert_eq!(coord.address(), None);
        assert!(matches!(actions.as_slice(), [CoordinatorAction::Log { level: LogLevel::Debug, .. }]));
    }

    #[test]
    fn association_started_awaits_address() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        coord.handle_event(NetworkEvent::AssociationStarted, secs(1));
        assert_eq!(coord.phase(), Phase::AwaitingAddress);

        coord.handle_event(NetworkEvent::AssociationLost, secs(2));
        assert_eq!(coord.phase(), Phase::Associating);
    }

    #[test]
    fn address_acquired_marks_network_ready() {
        let coord = associated();

        assert_eq!(coord.phase(), Phase::Associated);
        assert_eq!(coord.address(), Some(addr()));
        assert_eq!(coord.network_outcome(), Some(StageOutcome::Ready));
        assert_eq!(coord.address_deadline(secs(2)), None);
    }

    #[test]
    fn five_losses_then_address() {
        let mut coord = coordinator();
        let mut issued = count_issues(&coord.start(secs(0)).unwrap());

        for i in 1..=5 {
            issued += count_issues(&coord.handle_event(NetworkEvent::AssociationLost, secs(i)));
        }
        coord.handle_event(NetworkEvent::AddressAcquired(addr()), secs(6));

        assert_eq!(issued, 6, "initial attempt plus one per loss");
        assert_eq!(coord.retry_count(), 5);
        assert_eq!(coord.phase(), Phase::Associated);

        coord.begin_time_sync(UNSET_CLOCK).unwrap();
        assert_eq!(coord.phase(), Phase::AwaitingTimeSync);
    }

    #[test]
    fn loss_clears_address() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        coord.handle_event(NetworkEvent::AssociationStarted, secs(1));
        coord.handle_event(NetworkEvent::AssociationLost, secs(2));
        assert_eq!(coord.address(), None);
    }

    #[test]
    fn retries_do_not_move_deadline() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        coord.handle_event(NetworkEvent::AssociationLost, secs(8));

        assert_eq!(coord.address_deadline(secs(8)), Some(secs(2)));
    }

    #[test]
    fn address_timeout_degrades_network_stage() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();

        assert!(coord.tick(secs(9)).is_empty());
        let actions = coord.tick(secs(10));

        assert_eq!(actions, vec![CoordinatorAction::Status(StatusLine::ConnectionTimeout)]);
        assert_eq!(coord.phase(), Phase::Degraded);
        assert_eq!(coord.network_outcome(), Some(StageOutcome::Degraded));
        assert!(coord.tick(secs(11)).is_empty(), "timeout fires once");
    }

    #[test]
    fn late_address_does_not_undo_timeout() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();

        let actions = coord.handle_event(NetworkEvent::AddressAcquired(addr()), secs(12));

        assert_eq!(actions[0], CoordinatorAction::Status(StatusLine::ConnectionTimeout));
        assert_eq!(coord.network_outcome(), Some(StageOutcome::Degraded));
        assert_eq!(coord.address(), Some(addr()));
        assert_eq!(coord.phase(), Phase::Degraded);
    }

    #[test]
    fn degraded_network_still_enters_time_sync() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        coord.tick(secs(10));

        coord.begin_time_sync(UNSET_CLOCK).unwrap();
        assert_eq!(coord.phase(), Phase::AwaitingTimeSync);
    }

    #[test]
    fn time_sync_before_address_stage_is_rejected() {
        let mut coord = coordinator();
        coord.start(secs(0)).unwrap();
        assert!(coord.begin_time_sync(PLAUSIBLE_CLOCK).is_err());
    }

    #[test]
    fn plausible_clock_skips_polling() {
        let mut coord = associated();
        let actions = coord.begin_time_sync(PLAUSIBLE_CLOCK).unwrap();

        let ready = Readiness { network: StageOutcome::Ready, time: StageOutcome::Ready };
        assert_eq!(actions.last(), Some(&CoordinatorAction::Ready(ready)));
        assert!(!actions.iter().any(|a| matches!(a, CoordinatorAction::PollTimeSync { .. })));
        assert_eq!(coord.phase(), Phase::Ready);
        assert_eq!(coord.time_sync_polls(), 0);
    }

    #[test]
    fn plausible_year_boundary() {
        // 2025-01-01T00:00:00Z
        let mut coord = associated();
        coord.begin_time_sync(1_735_689_600).unwrap();
        assert_eq!(coord.phase(), Phase::Ready);

        // 2024-12-31T23:59:59Z
        let mut coord = associated();
        coord.begin_time_sync(1_735_689_599).unwrap();
        assert_eq!(coord.phase(), Phase::AwaitingTimeSync);
    }

    #[test]
    fn time_sync_succeeds_after_polls() {
        let mut coord = associated();
        let actions = coord.begin_time_sync(UNSET_CLOCK).unwrap();
        assert!(actions.contains(&CoordinatorAction::PollTimeSync { after: Duration::ZERO }));

        let actions = coord.observe_time_sync(SyncStatus::NotSynced).unwrap();
        assert_eq!(actions, vec![
            CoordinatorAction::Status(StatusLine::TimeSyncWaiting { attempt: 1, max: 30 }),
            CoordinatorAction::PollTimeSync { after: secs(1) },
        ]);

        let actions = coord.observe_time_sync(SyncStatus::Synced).unwrap();
        assert_eq!(actions[0], CoordinatorAction::Status(StatusLine::TimeSynchronized));
        assert_eq!(coord.phase(), Phase::Ready);
        assert_eq!(coord.time_sync_polls(), 2);
        assert!(coord.readiness().is_some_and(|r| r.is_ready()));
    }

    #[test]
    fn time_sync_gives_up_after_budget() {
        let mut coord = associated();
        coord.begin_time_sync(UNSET_CLOCK).unwrap();

        for attempt in 1..=30 {
            let actions = coord.observe_time_sync(SyncStatus::NotSynced).unwrap();
            assert_eq!(
                actions[0],
                CoordinatorAction::Status(StatusLine::TimeSyncWaiting { attempt, max: 30 })
            );
        }
        assert_eq!(coord.phase(), Phase::AwaitingTimeSync);

        let actions = coord.observe_time_sync(SyncStatus::NotSynced).unwrap();
        let degraded = Readiness { network: StageOutcome::Ready, time: StageOutcome::Degraded };
        assert_eq!(actions, vec![
            CoordinatorAction::Status(StatusLine::TimeSyncTimeout),
            CoordinatorAction::Ready(degraded),
        ]);
        assert_eq!(coord.phase(), Phase::Degraded);
        assert!(coord.observe_time_sync(SyncStatus::Synced).is_err());
    }

    #[test]
    fn loss_after_ready_keeps_readiness() {
        let mut coord = associated();
        coord.begin_time_sync(PLAUSIBLE_CLOCK).unwrap();

        let actions = coord.handle_event(NetworkEvent::AssociationLost, secs(100));

        assert_eq!(count_issues(&actions), 1);
        assert_eq!(coord.phase(), Phase::Ready);
        assert_eq!(coord.address(), None);
        assert!(coord.readiness().is_some_and(|r| r.is_ready()));

        coord.handle_event(NetworkEvent::AddressAcquired(addr()), secs(101));
        assert_eq!(coord.phase(), Phase::Ready);
        assert_eq!(coord.address(), Some(addr()));
    }

    #[test]
    fn begin_time_sync_only_once() {
        let mut coord = associated();
        coord.begin_time_sync(PLAUSIBLE_CLOCK).unwrap();
        assert!(coord.begin_time_sync(PLAUSIBLE_CLOCK).is_err());
    }

    #[test]
    fn calendar_date_handles_out_of_range() {
        assert_eq!(calendar_date(u64::MAX), None);
        assert_eq!(calendar_date(0), NaiveDate::from_ymd_opt(1970, 1, 1));
    }
}
