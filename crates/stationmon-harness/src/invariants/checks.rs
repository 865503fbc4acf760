//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use stationmon_core::{Phase, StageOutcome};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Every association loss triggers exactly one new attempt.
///
/// After start, attempts equal losses plus the initial attempt. When the
/// station's own count is known it must agree.
pub struct AttemptsTrackLosses;

impl Invariant for AttemptsTrackLosses {
    fn name(&self) -> &'static str {
        "attempts_track_losses"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(conn) = &state.connectivity else { return Ok(()) };
        if conn.phase == Phase::Idle {
            return Ok(());
        }

        if conn.association_attempts != conn.retry_count + 1 {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} attempts for {} losses",
                    conn.association_attempts, conn.retry_count
                ),
            });
        }

        if let Some(station) = conn.station_attempts
            && station != conn.association_attempts
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "station saw {station} attempts, coordinator issued {}",
                    conn.association_attempts
                ),
            });
        }

        Ok(())
    }
}

/// Time sync is polled at most `max_time_sync_retries + 1` times.
pub struct TimeSyncBounded;

impl Invariant for TimeSyncBounded {
    fn name(&self) -> &'static str {
        "time_sync_bounded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(conn) = &state.connectivity else { return Ok(()) };
        let bound = conn.max_time_sync_retries.saturating_add(1);
        if conn.time_sync_polls > bound {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} polls exceeds bound {bound}", conn.time_sync_polls),
            });
        }
        Ok(())
    }
}

/// The final phase agrees with the readiness outcome.
///
/// Once both stages resolved the phase is Ready exactly when both stages
/// succeeded, and Degraded otherwise. A network outcome of Ready also
/// implies an address was acquired at some point, so it cannot coexist with
/// zero attempts.
pub struct ReadinessMatchesPhase;

impl Invariant for ReadinessMatchesPhase {
    fn name(&self) -> &'static str {
        "readiness_matches_phase"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(conn) = &state.connectivity else { return Ok(()) };

        if let Some(readiness) = conn.readiness {
            let expected = if readiness.is_ready() { Phase::Ready } else { Phase::Degraded };
            if conn.phase != expected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("readiness {readiness:?} but phase {:?}", conn.phase),
                });
            }
        }

        if conn.network == Some(StageOutcome::Ready) && conn.association_attempts == 0 {
            return Err(Violation {
                invariant: self.name(),
                message: "network ready without any association attempt".to_string(),
            });
        }

        Ok(())
    }
}

/// The reassembly buffer never exceeds capacity and never holds a complete
/// line between reads.
pub struct FramerWithinCapacity;

impl Invariant for FramerWithinCapacity {
    fn name(&self) -> &'static str {
        "framer_within_capacity"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(serial) = &state.serial else { return Ok(()) };

        if serial.pending > serial.capacity {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} pending bytes exceeds {}", serial.pending, serial.capacity),
            });
        }

        if serial.pending_has_terminator {
            return Err(Violation {
                invariant: self.name(),
                message: "complete line left in buffer".to_string(),
            });
        }

        if serial.restart_requested != (serial.restart_requests > 0) {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "restart flag {} with {} requests",
                    serial.restart_requested, serial.restart_requests
                ),
            });
        }

        Ok(())
    }
}
