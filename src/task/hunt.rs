//! Hunt Task
//!
//! Binds the control core to the robot: [`Robot`] names the concrete
//! drivers, [`robot_config`] adjusts the calibrated defaults to the
//! co-processor's smaller frames and the measured floor, and [`hunt`] arms
//! and runs the state machine until the operator stops it.

use bottle_toppler::behavior::hunt::Hunt;
use bottle_toppler::system::clock::Clock;
use bottle_toppler::system::config::{
    AimConfig, CliffConfig, HuntConfig, PerceptionConfig, WaitConfig,
};
use bottle_toppler::system::operator::OPERATOR_STOP;
use bottle_toppler::system::platform::{Platform, GRAYSCALE_CHANNELS};
use defmt::{error, info};
use embassy_time::{Duration, Instant, Timer};

use crate::task::chassis::Chassis;
use crate::task::grayscale::Grayscale;
use crate::task::music::Music;
use crate::task::ultrasonic::Ultrasonic;
use crate::task::vision_link::{VisionCamera, VisionEngine};

/// Frame edge delivered by the co-processor camera (160 x 120)
pub const FRAME_WIDTH: usize = 160;
pub const FRAME_HEIGHT: usize = 120;

/// Edge of the letterboxed detector input
pub const INPUT_SIZE: u16 = 160;

/// Frame edge the default gains and tolerances were tuned for
const TUNED_FRAME_EDGE: f32 = 480.0;

/// Floor readings at or below this share of the calibrated floor are a drop-off
const CLIFF_TOLERANCE: f32 = 0.5;

pub struct Robot;

impl Platform for Robot {
    type Camera = VisionCamera;
    type Engine = VisionEngine;
    type InputBuffer = &'static mut [u8];
    type Ranger = Ultrasonic;
    type Grayscale = Grayscale;
    type Actuators = Chassis;
    type Audio = Music;
    type Clock = EmbassyClock;
}

/// Wall clock backed by the embassy time driver
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&mut self, duration: Duration) {
        Timer::after(duration).await;
    }
}

/// Calibrated defaults scaled to the robot's frame size and floor
pub fn robot_config(floor: [u16; GRAYSCALE_CHANNELS]) -> HuntConfig {
    let scale = TUNED_FRAME_EDGE / FRAME_WIDTH as f32;
    let aim = AimConfig::default();
    let wait = WaitConfig::default();
    HuntConfig {
        perception: PerceptionConfig {
            input_size: INPUT_SIZE,
            ..PerceptionConfig::default()
        },
        aim: AimConfig {
            pan_gain: aim.pan_gain * scale,
            tilt_gain: aim.tilt_gain * scale,
            ..aim
        },
        wait: WaitConfig {
            face_pan_gain: wait.face_pan_gain * scale,
            face_tilt_gain: wait.face_tilt_gain * scale,
            center_tolerance_px: wait.center_tolerance_px / scale,
            ..wait
        },
        cliff: CliffConfig {
            reference: floor,
            tolerance: CLIFF_TOLERANCE,
            ..CliffConfig::default()
        },
        ..HuntConfig::default()
    }
}

#[embassy_executor::task]
pub async fn hunt(mut hunt: Hunt<Robot>) {
    if let Err(e) = hunt.arm().await {
        error!("refusing to arm: {:?}", e);
        return;
    }
    match hunt.run(&OPERATOR_STOP).await {
        Ok(()) => info!("hunt stopped, {:?}", hunt.stats()),
        Err(e) => error!("hunt failed: {:?}", e),
    }
}
