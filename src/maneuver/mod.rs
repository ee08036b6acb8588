//! Maneuvers
//!
//! Fixed, non-interruptible actuator sequences: the knock, the cliff escape
//! and the short drive pulses used while approaching. A [`Maneuver`] is a
//! list of [`Step`]s, each a command followed by a hold time.
//!
//! Sequences are plain data so they can be inspected without running them:
//! [`Maneuver::progress_at`] tells which phase is active a given time after
//! the start. [`Maneuver::run`] executes them against an actuation adapter
//! and a [`Clock`], which makes them deterministic under a virtual clock.

pub mod cliff;
pub mod strike;

use embassy_time::Duration;

use crate::adapter::actuation::Actuation;
use crate::system::clock::Clock;
use crate::system::config::DrivePulse;
use crate::system::platform::ActuatorDriver;

const NO_HOLD: Duration = Duration::from_ticks(0);

/// A single actuator command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Signed drive power
    Drive(f32),
    /// Steering angle
    Steer(f32),
    /// Arm servo angle
    Arm(f32),
}

/// A command and how long to hold it before the next one
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    pub command: Command,
    pub hold: Duration,
}

impl Step {
    pub const fn hold(command: Command, hold: Duration) -> Self {
        Self { command, hold }
    }

    /// A command followed directly by the next one
    pub const fn instant(command: Command) -> Self {
        Self {
            command,
            hold: NO_HOLD,
        }
    }
}

/// Position inside a running maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Progress {
    /// Index of the active step
    pub phase: usize,
    /// Time spent in the active step
    pub elapsed: Duration,
}

/// A fixed sequence of `N` steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maneuver<const N: usize> {
    steps: [Step; N],
}

impl<const N: usize> Maneuver<N> {
    pub const fn new(steps: [Step; N]) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step; N] {
        &self.steps
    }

    /// Total hold time
    pub fn duration(&self) -> Duration {
        self.steps.iter().fold(NO_HOLD, |total, step| total + step.hold)
    }

    /// Active step `elapsed` after the start, `None` once complete
    ///
    /// Steps without a hold are never active; their command is issued on the
    /// way into the next step.
    pub fn progress_at(&self, elapsed: Duration) -> Option<Progress> {
        let mut start = NO_HOLD;
        for (phase, step) in self.steps.iter().enumerate() {
            let end = start + step.hold;
            if elapsed < end {
                return Some(Progress {
                    phase,
                    elapsed: elapsed - start,
                });
            }
            start = end;
        }
        None
    }

    /// Issues every step in order, sleeping through the holds
    pub async fn run<D: ActuatorDriver, C: Clock>(&self, actuation: &mut Actuation<D>, clock: &mut C) {
        for step in &self.steps {
            actuation.apply(step.command);
            if step.hold > NO_HOLD {
                clock.sleep(step.hold).await;
            }
        }
    }
}

/// Drive at `pulse.power` for `pulse.duration`, then stop
pub fn pulse(pulse: DrivePulse) -> Maneuver<2> {
    Maneuver::new([
        Step::hold(Command::Drive(pulse.power), pulse.duration),
        Step::instant(Command::Drive(0.0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn pulse_holds_then_stops() {
        let m = pulse(DrivePulse::new(-0.5, 300));
        assert_eq!(m.steps()[0], Step::hold(Command::Drive(-0.5), ms(300)));
        assert_eq!(m.steps()[1], Step::instant(Command::Drive(0.0)));
        assert_eq!(m.duration(), ms(300));
    }

    #[test]
    fn progress_walks_the_phases() {
        let m = Maneuver::new([
            Step::hold(Command::Arm(10.0), ms(100)),
            Step::instant(Command::Arm(0.0)),
            Step::hold(Command::Arm(-10.0), ms(50)),
        ]);
        assert_eq!(
            m.progress_at(ms(0)),
            Some(Progress {
                phase: 0,
                elapsed: ms(0)
            })
        );
        assert_eq!(
            m.progress_at(ms(120)),
            Some(Progress {
                phase: 2,
                elapsed: ms(20)
            })
        );
        assert_eq!(m.progress_at(ms(150)), None);
    }
}
