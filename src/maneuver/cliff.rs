//! Cliff escape
//!
//! Reverse away from the edge, stop, turn the wheels to one side, creep
//! forward on the new heading, stop and straighten the wheels.

use crate::maneuver::{Command, Maneuver, Step};
use crate::system::config::CliffConfig;

/// Side the escape turns to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Backup-and-reorient sequence turning to `side`
pub fn escape(config: &CliffConfig, side: Side) -> Maneuver<6> {
    Maneuver::new([
        Step::hold(Command::Drive(config.reverse.power), config.reverse.duration),
        Step::instant(Command::Drive(0.0)),
        Step::instant(Command::Steer(side.sign() * config.turn_angle)),
        Step::hold(Command::Drive(config.forward.power), config.forward.duration),
        Step::instant(Command::Drive(0.0)),
        Step::instant(Command::Steer(0.0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_time::Duration;

    #[test]
    fn escape_reverses_turns_and_straightens() {
        let plan = escape(&CliffConfig::default(), Side::Left);
        let commands: Vec<Command> = plan.steps().iter().map(|s| s.command).collect();
        assert_eq!(
            commands,
            vec![
                Command::Drive(-1.0),
                Command::Drive(0.0),
                Command::Steer(-40.0),
                Command::Drive(1.0),
                Command::Drive(0.0),
                Command::Steer(0.0),
            ]
        );
        assert_eq!(plan.duration(), Duration::from_millis(1900));
    }

    #[test]
    fn right_turn_mirrors_left() {
        let plan = escape(&CliffConfig::default(), Side::Right);
        assert_eq!(plan.steps()[2].command, Command::Steer(40.0));
    }
}
