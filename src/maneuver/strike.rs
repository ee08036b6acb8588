//! The knock
//!
//! Six phases on the arm servo: swing one way and hold, brake against the
//! coast, rest at neutral, swing the other way and hold, brake, rest. The
//! servo takes pulse widths around a neutral; offsets inside the dead band
//! are sent as exactly neutral so the arm does not twitch.

use crate::maneuver::{Command, Maneuver, Step};
use crate::system::config::StrikeConfig;

/// Pulse width of the servo's mechanical centre
const SERVO_CENTRE_US: f32 = 1500.0;

/// Pulse width change per degree of servo travel
const US_PER_DEGREE: f32 = 11.11;

/// Arm angle for a pulse offset from the calibrated neutral
pub fn arm_angle(offset_us: f32, config: &StrikeConfig) -> f32 {
    let offset = if libm::fabsf(offset_us) <= config.gate_us {
        0.0
    } else {
        offset_us
    };
    (config.neutral_us + offset - SERVO_CENTRE_US) / US_PER_DEGREE
}

/// The full strike sequence
pub fn plan(config: &StrikeConfig) -> Maneuver<6> {
    let arm = |offset_us: f32| Command::Arm(arm_angle(offset_us, config));
    Maneuver::new([
        Step::hold(arm(-config.offset_us), config.swing_hold),
        Step::hold(arm(config.brake_us), config.brake_hold),
        Step::hold(arm(0.0), config.settle),
        Step::hold(arm(config.offset_us), config.swing_hold),
        Step::hold(arm(-config.brake_us), config.brake_hold),
        Step::hold(arm(0.0), config.settle),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_time::Duration;

    fn angle(step: &Step) -> f32 {
        match step.command {
            Command::Arm(angle) => angle,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn swings_mirror_around_neutral() {
        let config = StrikeConfig::default();
        let plan = plan(&config);
        let neutral = arm_angle(0.0, &config);
        let first = angle(&plan.steps()[0]) - neutral;
        let second = angle(&plan.steps()[3]) - neutral;
        assert!((first + second).abs() < 1e-4);
        assert!(first < 0.0);
    }

    #[test]
    fn brakes_push_against_the_swing() {
        let plan = plan(&StrikeConfig::default());
        let neutral = angle(&plan.steps()[2]);
        assert!(angle(&plan.steps()[1]) > neutral);
        assert!(angle(&plan.steps()[4]) < neutral);
    }

    #[test]
    fn offsets_inside_the_gate_are_neutral() {
        let config = StrikeConfig::default();
        assert_eq!(arm_angle(60.0, &config), arm_angle(0.0, &config));
        assert_eq!(arm_angle(-45.0, &config), arm_angle(0.0, &config));
        assert_ne!(arm_angle(61.0, &config), arm_angle(0.0, &config));
    }

    #[test]
    fn default_neutral_sits_just_left_of_centre() {
        let neutral = arm_angle(0.0, &StrikeConfig::default());
        assert!((neutral - (-50.0 / 11.11)).abs() < 1e-4);
    }

    #[test]
    fn strike_takes_two_swings_two_brakes_two_rests() {
        let plan = plan(&StrikeConfig::default());
        assert_eq!(plan.duration(), Duration::from_millis(1450));
        assert_eq!(plan.progress_at(Duration::from_millis(600)).map(|p| p.phase), Some(1));
        assert_eq!(plan.progress_at(Duration::from_millis(700)).map(|p| p.phase), Some(2));
        assert_eq!(plan.progress_at(Duration::from_millis(1449)).map(|p| p.phase), Some(5));
    }
}
