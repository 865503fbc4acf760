//! Environment abstraction for deterministic testing.
//!
//! Decouples monitor logic from system resources (monotonic time, wall clock,
//! sleeping). Enables deterministic simulation on a paused virtual clock and
//! production use with real system resources.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `wall_clock_secs()` reports seconds since the Unix epoch as currently
///   believed by the device. It MAY jump (time sync) and MAY be implausibly
///   small before the first synchronization.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time (e.g., `tokio::time::Instant` with a
    /// paused clock).
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - This method MUST return values that never decrease within a single
    ///   execution context. Subsequent calls must return times >= previous
    ///   calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by runtime code (not state machine logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Current calendar time as seconds since the Unix epoch.
    ///
    /// Used for the one-shot "is the clock already plausible" check; never
    /// for measuring timeouts.
    fn wall_clock_secs(&self) -> u64;
}
