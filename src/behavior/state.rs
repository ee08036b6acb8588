//! Behavior states
//!
//! Exactly one [`BehaviorState`] is active at a time. Each variant carries
//! only the fields its handler needs to carry into the next cycle.

use embassy_time::Instant;

use crate::system::config::SweepConfig;

/// Position in the sweep pattern, pan outer and tilt inner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepCursor {
    pub pan_index: usize,
    pub tilt_index: usize,
}

impl SweepCursor {
    pub const fn start() -> Self {
        Self {
            pan_index: 0,
            tilt_index: 0,
        }
    }

    /// Camera pose `(pan, tilt)` under the cursor
    pub fn pose(&self, sweep: &SweepConfig) -> (f32, f32) {
        (sweep.pans[self.pan_index], sweep.tilts[self.tilt_index])
    }

    /// Next cursor position, wrapping tilt into pan and pan back to the start
    pub fn advance(self, pans: usize, tilts: usize) -> Self {
        let tilt_index = self.tilt_index + 1;
        if tilt_index < tilts {
            return Self { tilt_index, ..self };
        }
        let pan_index = self.pan_index + 1;
        Self {
            pan_index: if pan_index < pans { pan_index } else { 0 },
            tilt_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BehaviorState {
    /// Looking around for a target
    Sweep(SweepCursor),
    /// One aiming step toward a fresh sighting
    Track,
    /// Driving up to the target
    Approach {
        /// Consecutive cycles with neither a sighting nor a close range
        lost_frames: u8,
    },
    /// Parked at the target, looking for a person
    Wait {
        deadline: Instant,
        centered_frames: u8,
    },
    /// Reversing away after a knock
    Backup { deadline: Instant },
}

impl BehaviorState {
    pub const fn initial() -> Self {
        BehaviorState::Sweep(SweepCursor::start())
    }

    pub const fn name(&self) -> &'static str {
        match self {
            BehaviorState::Sweep(_) => "SWEEP",
            BehaviorState::Track => "TRACK",
            BehaviorState::Approach { .. } => "APPROACH",
            BehaviorState::Wait { .. } => "WAIT",
            BehaviorState::Backup { .. } => "BACKUP",
        }
    }

    /// Same variant, transient fields ignored
    pub fn same_kind(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilt_runs_before_pan_advances() {
        let c = SweepCursor::start().advance(10, 3);
        assert_eq!((c.pan_index, c.tilt_index), (0, 1));
        let c = c.advance(10, 3).advance(10, 3);
        assert_eq!((c.pan_index, c.tilt_index), (1, 0));
    }

    #[test]
    fn sweep_visits_every_pose_then_wraps() {
        let mut cursor = SweepCursor::start();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..30 {
            assert!(seen.insert((cursor.pan_index, cursor.tilt_index)));
            cursor = cursor.advance(10, 3);
        }
        assert_eq!(cursor, SweepCursor::start());
    }

    #[test]
    fn pose_reads_the_configured_angles() {
        let sweep = SweepConfig::default();
        let cursor = SweepCursor {
            pan_index: 3,
            tilt_index: 2,
        };
        assert_eq!(cursor.pose(&sweep), (-15.0, 25.0));
    }

    #[test]
    fn transient_fields_do_not_change_the_kind() {
        let a = BehaviorState::Approach { lost_frames: 0 };
        let b = BehaviorState::Approach { lost_frames: 1 };
        assert!(a.same_kind(&b));
        assert!(!a.same_kind(&BehaviorState::Track));
        assert_eq!(BehaviorState::initial().name(), "SWEEP");
    }
}
