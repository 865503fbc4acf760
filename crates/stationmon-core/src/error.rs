//! Error types for the station monitor core.
//!
//! The core has no fatal conditions: framing degrades through its reset
//! policy and every bounded wait falls through to a degraded state. The only
//! errors left are driver bugs, i.e. asking the coordinator for an operation
//! its current phase does not allow.

use thiserror::Error;

use crate::connectivity::Phase;

/// Errors returned by [`crate::connectivity::ConnectivityCoordinator`]
/// operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Operation not valid in the current phase
    #[error("invalid state transition: cannot {operation} from {phase:?}")]
    InvalidState {
        /// Phase when the operation was attempted
        phase: Phase,
        /// Operation that was attempted
        operation: String,
    },
}
