//! Station monitor core.
//!
//! Sans-IO state machines for a device monitor task:
//!
//! - [`framer::LineFramer`] reassembles chunked serial input into command
//!   lines; [`command::CommandDispatcher`] turns them into side effects.
//! - [`connectivity::ConnectivityCoordinator`] sequences association, address
//!   acquisition and time sync into a single readiness outcome.
//!
//! Nothing here performs I/O or reads the clock. Runtimes feed time in
//! through [`env::Environment`] and execute the returned actions.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod config;
pub mod connectivity;
pub mod env;
pub mod error;
pub mod framer;
pub mod restart;
pub mod status;

pub use command::{Command, CommandDispatcher, CommandInterpreter};
pub use config::{ConnectivityConfig, MonitorConfig};
pub use connectivity::{
    ConnectivityCoordinator, CoordinatorAction, NetworkEvent, Phase, Readiness, StageOutcome,
    SyncStatus,
};
pub use env::Environment;
pub use error::CoordinatorError;
pub use framer::LineFramer;
pub use restart::RestartSignal;
pub use status::{LogLevel, StatusLine};
