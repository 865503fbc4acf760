//! Fuzz target for ConnectivityCoordinator state machine
//!
//! Ensure startup always converges and readiness is never revisited (HIGH
//! priority)
//!
//! # Strategy
//!
//! - Arbitrary network event orderings, including events before start and
//!   after convergence
//! - Arbitrary time advances around the address deadline
//! - Arbitrary sync answers and wall clocks around the plausible year
//! - Out-of-order operations (begin twice, observe before begin)
//!
//! # Invariants
//!
//! - Attempts always equal losses plus one after start
//! - Ready is emitted at most once
//! - Time sync is never polled more than max retries plus one
//! - Once readiness is reached it never changes
//! - NEVER panic

#![no_main]

use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stationmon_core::{
    ConnectivityConfig, ConnectivityCoordinator, CoordinatorAction, NetworkEvent, Phase,
    SyncStatus,
};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Start,
    Lost,
    Started,
    Address(u8),
    Advance(u16),
    Tick,
    BeginTimeSync(WallClock),
    Observe(bool),
}

#[derive(Debug, Clone, Arbitrary)]
enum WallClock {
    Unset,
    EndOf2024,
    StartOf2025,
    Arbitrary(u64),
}

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    max_retries: u8,
    ops: Vec<Op>,
}

fuzz_target!(|scenario: Scenario| {
    let config = ConnectivityConfig {
        max_time_sync_retries: u32::from(scenario.max_retries % 40),
        ..ConnectivityConfig::default()
    };
    let max = config.max_time_sync_retries;
    let mut coord: ConnectivityCoordinator<Duration> = ConnectivityCoordinator::new(config);
    let mut now = Duration::ZERO;
    let mut ready_emitted = 0;
    let mut converged = None;

    for op in scenario.ops {
        let actions = match op {
            Op::Start => coord.start(now).unwrap_or_default(),
            Op::Lost => coord.handle_event(NetworkEvent::AssociationLost, now),
            Op::Started => coord.handle_event(NetworkEvent::AssociationStarted, now),
            Op::Address(host) => coord.handle_event(
                NetworkEvent::AddressAcquired(IpAddr::V4(Ipv4Addr::new(10, 0, 0, host))),
                now,
            ),
            Op::Advance(ms) => {
                now += Duration::from_millis(u64::from(ms));
                Vec::new()
            },
            Op::Tick => coord.tick(now),
            Op::BeginTimeSync(clock) => {
                coord.begin_time_sync(wall_clock(&clock)).unwrap_or_default()
            },
            Op::Observe(synced) => {
                let status = if synced { SyncStatus::Synced } else { SyncStatus::NotSynced };
                coord.observe_time_sync(status).unwrap_or_default()
            },
        };

        ready_emitted +=
            actions.iter().filter(|a| matches!(a, CoordinatorAction::Ready(_))).count();
        assert!(ready_emitted <= 1, "readiness emitted twice");

        if coord.phase() != Phase::Idle {
            assert_eq!(coord.association_attempts(), coord.retry_count() + 1);
        }
        assert!(coord.time_sync_polls() <= max + 1);

        match (converged, coord.readiness()) {
            (Some(before), Some(after)) => assert_eq!(before, after, "readiness revisited"),
            (Some(_), None) => panic!("readiness lost"),
            (None, now_ready) => converged = now_ready,
        }
    }
});

fn wall_clock(clock: &WallClock) -> u64 {
    match clock {
        WallClock::Unset => 0,
        WallClock::EndOf2024 => 1_735_689_599,
        WallClock::StartOf2025 => 1_735_689_600,
        WallClock::Arbitrary(secs) => *secs,
    }
}
