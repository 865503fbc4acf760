//! Runtimes for the station monitor.
//!
//! Generic async loops that drive the sans-IO state machines from
//! `stationmon-core` against platform collaborators, so the same
//! orchestration runs on the device and under deterministic simulation.
//!
//! # Components
//!
//! - [`SerialMonitor`]: serial read, line dispatch and deferred restart
//! - [`StartupSequencer`]: network and clock readiness, then supervision
//! - [`SerialSource`], [`Station`], [`TimeSync`], [`Restarter`]: platform
//!   traits
//! - [`network_events`]: bounded queue from network callbacks to the
//!   sequencer

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod event;
mod monitor;
mod sequencer;

pub use driver::{Restarter, SerialSource, Station, TimeSync};
pub use event::{DEFAULT_EVENT_QUEUE, NetworkEventReceiver, NetworkEventSender, network_events};
pub use monitor::{MonitorError, SerialMonitor};
pub use sequencer::StartupSequencer;
