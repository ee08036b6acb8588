//! Actuation Adapter
//!
//! Owns the actuator driver and remembers what was last commanded. There is
//! no readback from the servos, so [`AimState`] and [`DriveState`] are
//! exactly the last values sent, after clamping.
//!
//! # Limits
//! - Camera pan/tilt and steering: `±limit` degrees (80 by default)
//! - Arm servo: ±90 degrees
//! - Drive power: -1.0..=1.0

use crate::maneuver::{strike, Command, Maneuver};
use crate::system::clock::Clock;
use crate::system::config::StrikeConfig;
use crate::system::geometry::clamp;
use crate::system::platform::ActuatorDriver;

/// Arm servo travel either side of its centre
const ARM_LIMIT: f32 = 90.0;

/// Last commanded camera pose
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AimState {
    pub pan: f32,
    pub tilt: f32,
}

/// Last commanded chassis state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveState {
    pub steering_angle: f32,
    pub power: f32,
}

impl DriveState {
    pub fn moving(&self) -> bool {
        self.power != 0.0
    }
}

pub struct Actuation<D> {
    driver: D,
    limit: f32,
    aim: AimState,
    drive: DriveState,
    arm: f32,
}

impl<D: ActuatorDriver> Actuation<D> {
    /// Wraps `driver`; nothing is commanded until the first call
    pub fn new(driver: D, limit: f32) -> Self {
        Self {
            driver,
            limit,
            aim: AimState::default(),
            drive: DriveState::default(),
            arm: 0.0,
        }
    }

    /// Points the camera, both angles clamped to the limit
    pub fn set_cam_angle(&mut self, pan: f32, tilt: f32) {
        self.aim = AimState {
            pan: clamp(pan, -self.limit, self.limit),
            tilt: clamp(tilt, -self.limit, self.limit),
        };
        self.driver.set_cam_pan(self.aim.pan);
        self.driver.set_cam_tilt(self.aim.tilt);
    }

    /// Sets drive power, negative reverses and 0 stops
    pub fn drive(&mut self, power: f32) {
        self.drive.power = clamp(power, -1.0, 1.0);
        self.driver.set_drive(self.drive.power);
    }

    pub fn stop(&mut self) {
        self.drive(0.0);
    }

    /// Sets the steering angle, clamped to the limit
    pub fn set_steering(&mut self, angle: f32) {
        self.drive.steering_angle = clamp(angle, -self.limit, self.limit);
        self.driver.set_steering(self.drive.steering_angle);
    }

    /// Sets the arm servo angle
    pub fn set_arm(&mut self, angle: f32) {
        self.arm = clamp(angle, -ARM_LIMIT, ARM_LIMIT);
        self.driver.set_arm(self.arm);
    }

    /// Camera and steering to centre, drive stopped
    pub fn centre(&mut self) {
        self.stop();
        self.set_steering(0.0);
        self.set_cam_angle(0.0, 0.0);
    }

    /// Applies a single maneuver command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Drive(power) => self.drive(power),
            Command::Steer(angle) => self.set_steering(angle),
            Command::Arm(angle) => self.set_arm(angle),
        }
    }

    /// Runs `maneuver` to completion
    pub async fn perform<C: Clock, const N: usize>(&mut self, maneuver: &Maneuver<N>, clock: &mut C) {
        maneuver.run(self, clock).await;
    }

    /// The knock: a blocking six-phase swing of the arm servo
    ///
    /// Runs to completion once started; nothing can interrupt it.
    pub async fn strike<C: Clock>(&mut self, clock: &mut C, config: &StrikeConfig) {
        info!("strike");
        self.perform(&strike::plan(config), clock).await;
    }

    pub fn aim(&self) -> AimState {
        self.aim
    }

    pub fn drive_state(&self) -> DriveState {
        self.drive
    }

    pub fn arm_angle(&self) -> f32 {
        self.arm
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
