//! Deferred restart request shared between line processing and the serial
//! run loop.
//!
//! Line processing only *decides* to restart; the run loop *performs* the
//! restart after a grace delay so acknowledgement output can flush. The two
//! sides share a [`RestartSignal`] handle instead of a global flag.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct RestartState {
    requested: AtomicBool,
    requests: AtomicU64,
}

/// Cloneable single-writer/single-reader restart flag.
///
/// Once requested the flag stays set: a restart is one-way and cannot be
/// cancelled.
#[derive(Debug, Clone, Default)]
pub struct RestartSignal {
    state: Arc<RestartState>,
}

impl RestartSignal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a restart. Each call is counted.
    pub fn request(&self) {
        self.state.requests.fetch_add(1, Ordering::Relaxed);
        self.state.requested.store(true, Ordering::Release);
    }

    /// Whether a restart has been requested.
    pub fn is_requested(&self) -> bool {
        self.state.requested.load(Ordering::Acquire)
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }
}
