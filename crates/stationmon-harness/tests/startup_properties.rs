//! Property-based tests for the full startup sequence.
//!
//! Each case drives a real [`StartupSequencer`] against scripted
//! collaborators on a fresh paused runtime, so network delays and poll
//! intervals cost no wall time.

use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use proptest::prelude::*;
use stationmon_app::{StartupSequencer, network_events};
use stationmon_core::{ConnectivityConfig, Readiness, StageOutcome};
use stationmon_harness::{
    Association, ConnectivitySnapshot, InvariantRegistry, SimEnv, SimStation, SimTimeSync,
    SystemSnapshot,
};
use tokio::time::Instant;

/// 2026-02-06T05:39:15Z
const PLAUSIBLE_CLOCK: u64 = 1_770_356_355;

#[derive(Debug, Clone)]
struct Scenario {
    /// Delay of each failed attempt before the loss is reported
    losses: Vec<u64>,
    /// Delay of the successful attempt
    connect_after: u64,
    /// Poll on which time sync succeeds, `None` for never
    synced_on_poll: Option<u32>,
    max_time_sync_retries: u32,
    plausible_clock: bool,
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (
        prop::collection::vec(1u64..3000, 0..8),
        1u64..4000,
        prop::option::of(1u32..20),
        0u32..12,
        any::<bool>(),
    )
        .prop_map(|(losses, connect_after, synced_on_poll, max_time_sync_retries, plausible_clock)| {
            Scenario { losses, connect_after, synced_on_poll, max_time_sync_retries, plausible_clock }
        })
}

struct Outcome {
    readiness: Readiness,
    elapsed: Duration,
    polls: u32,
    snapshot: SystemSnapshot,
}

fn run_scenario(scenario: &Scenario) -> Outcome {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let (tx, rx) = network_events(16);
        let address = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let station = scenario
            .losses
            .iter()
            .map(|&after| Association::Fail { after: Duration::from_millis(after) })
            .chain([Association::Connect {
                after: Duration::from_millis(scenario.connect_after),
                address,
            }])
            .fold(SimStation::new(tx), SimStation::then);

        let sync = match scenario.synced_on_poll {
            Some(poll) => SimTimeSync::synced_on_poll(poll),
            None => SimTimeSync::never(),
        };
        let env = if scenario.plausible_clock {
            SimEnv::with_wall_clock(PLAUSIBLE_CLOCK)
        } else {
            SimEnv::new()
        };
        let config = ConnectivityConfig {
            ssid: "lab".to_string(),
            max_time_sync_retries: scenario.max_time_sync_retries,
            ..ConnectivityConfig::default()
        };

        let mut sequencer = StartupSequencer::new(station.clone(), sync.clone(), env, rx, config);
        let start = Instant::now();
        let readiness = sequencer.run().await.unwrap();
        let elapsed = start.elapsed();

        let snapshot = SystemSnapshot::empty().with_connectivity(
            ConnectivitySnapshot::from_coordinator(sequencer.coordinator())
                .with_station_attempts(station.attempts()),
        );

        Outcome { readiness, elapsed, polls: sync.polls(), snapshot }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// INVARIANT: Startup converges within the address timeout plus the
    /// time-sync poll budget, whatever the network and clock do.
    #[test]
    fn prop_startup_is_bounded(scenario in scenario_strategy()) {
        let outcome = run_scenario(&scenario);
        let config = ConnectivityConfig::default();
        let bound = config.address_timeout
            + config.time_sync_poll_interval * scenario.max_time_sync_retries;

        prop_assert!(outcome.elapsed <= bound, "{:?} exceeds {:?}", outcome.elapsed, bound);
        prop_assert!(outcome.polls <= scenario.max_time_sync_retries + 1);
        InvariantRegistry::standard().assert_all(&outcome.snapshot, "after startup");
    }

    /// INVARIANT: The address stage is Ready exactly when the address
    /// arrives before the deadline.
    #[test]
    fn prop_network_outcome_matches_deadline(scenario in scenario_strategy()) {
        let outcome = run_scenario(&scenario);
        let arrival: u64 = scenario.losses.iter().sum::<u64>() + scenario.connect_after;
        let expected = if arrival < 10_000 { StageOutcome::Ready } else { StageOutcome::Degraded };

        prop_assert_eq!(outcome.readiness.network, expected);
    }

    /// INVARIANT: A plausible clock never waits on time sync.
    #[test]
    fn prop_plausible_clock_skips_polling(scenario in scenario_strategy()) {
        let outcome = run_scenario(&scenario);

        if scenario.plausible_clock {
            prop_assert_eq!(outcome.polls, 0);
            prop_assert_eq!(outcome.readiness.time, StageOutcome::Ready);
        } else {
            let synced_in_budget = scenario
                .synced_on_poll
                .is_some_and(|poll| poll <= scenario.max_time_sync_retries + 1);
            let expected = if synced_in_budget { StageOutcome::Ready } else { StageOutcome::Degraded };
            prop_assert_eq!(outcome.readiness.time, expected);
        }
    }
}
