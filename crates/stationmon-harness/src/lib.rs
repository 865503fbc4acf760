//! Deterministic simulation harness for the station monitor.
//!
//! Implementations of the Environment and platform traits on tokio's paused
//! clock, so startup and serial scenarios that take minutes of device time
//! run instantly and reproducibly.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the stock
//! device invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_env;
pub mod sim_platform;

pub use invariants::{
    AttemptsTrackLosses, ConnectivitySnapshot, FramerWithinCapacity, Invariant,
    InvariantRegistry, InvariantResult, ReadinessMatchesPhase, SerialSnapshot, SystemSnapshot,
    TimeSyncBounded, Violation,
};
pub use sim_env::SimEnv;
pub use sim_platform::{
    Association, RecordingRestarter, ScriptedSource, SimError, SimStation, SimTimeSync,
};
