//! Operator Stop
//!
//! The only graceful way to end a hunt. Raising the signal never interrupts
//! a knock or a backup maneuver; the control loop notices it at the top of
//! its next cycle, parks the robot and returns.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Signal type the hunt loop polls for an operator stop
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Stop signal raised by the firmware's stop button
pub static OPERATOR_STOP: StopSignal = Signal::new();

/// Requests the hunt to stop
///
/// Synchronous and safe to call from any task.
pub fn request_stop(signal: &StopSignal) {
    signal.signal(());
}

/// Checks for a pending stop request without consuming it
pub fn stop_requested(signal: &StopSignal) -> bool {
    signal.signaled()
}
