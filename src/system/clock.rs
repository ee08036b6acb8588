//! Time source for the control loop
//!
//! Every delay in the hunt (settle time, drive bursts, the strike) goes
//! through a [`Clock`] so timing can be replaced by a virtual clock in tests.
//! On the robot the clock is backed by `embassy_time`.

use embassy_time::{Duration, Instant};

/// Monotonic time plus the ability to wait
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;

    /// Suspends the caller for `duration`
    async fn sleep(&mut self, duration: Duration);

    /// Time elapsed since `earlier`, saturating at zero
    fn since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}
