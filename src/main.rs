//! Robot firmware entry point
//!
//! Brings up the drivers, calibrates the cliff sensors on the floor the
//! robot starts on and spawns the hunt and the stop button.

#![no_std]
#![no_main]

use bottle_toppler::behavior::hunt::{Hunt, Parts};
use bottle_toppler::system::geometry::Letterbox;
use bottle_toppler::system::platform::GrayscaleSensor;
use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_time::Instant;
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::task::chassis::Chassis;
use crate::task::grayscale::Grayscale;
use crate::task::hunt::{hunt, robot_config, EmbassyClock, Robot, FRAME_HEIGHT, FRAME_WIDTH, INPUT_SIZE};
use crate::task::music::Music;
use crate::task::operator_button::operator_button;
use crate::task::resources::{
    AssignedResources, CameraServoResources, ChassisServoResources, GrayscaleResources,
    MotorDriverResources, MusicResources, StopButtonResources, UltrasonicResources,
    VisionLinkResources,
};
use crate::task::ultrasonic::Ultrasonic;
use crate::task::vision_link::{self, VisionCamera, VisionEngine};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Task implementations
mod task;

const FRAME_BYTES: usize = FRAME_WIDTH * FRAME_HEIGHT * 3;
const INPUT_BYTES: usize = Letterbox::buffer_len(INPUT_SIZE);

static FRAME: ConstStaticCell<[u8; FRAME_BYTES]> = ConstStaticCell::new([0; FRAME_BYTES]);
static INPUT: ConstStaticCell<[u8; INPUT_BYTES]> = ConstStaticCell::new([0; INPUT_BYTES]);

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());
    let r = split_resources!(p);
    info!("bottle toppler booting");

    // The robot must start on safe floor; that floor becomes the cliff reference.
    let mut grayscale = Grayscale::new(r.grayscale);
    let floor = grayscale.read_grayscale().await;
    info!("floor reference {}", floor);

    let link = vision_link::init(r.vision_link);
    let parts = Parts::<Robot> {
        camera: VisionCamera::new(link, FRAME.take()),
        engine: VisionEngine::new(link),
        input: INPUT.take(),
        ranger: Ultrasonic::new(r.ultrasonic),
        grayscale,
        actuators: Chassis::new(r.camera_servos, r.chassis_servos, r.motor_driver),
        audio: Music::new(r.music),
        clock: EmbassyClock,
    };

    let floor_bits = floor.iter().fold(0u64, |acc, v| acc << 16 | u64::from(*v));
    let seed = Instant::now().as_ticks() ^ floor_bits;
    let hunt_context = match Hunt::new(parts, robot_config(floor), seed) {
        Ok(hunt_context) => hunt_context,
        Err(e) => {
            error!("bad configuration: {:?}", e);
            return;
        }
    };

    spawner.spawn(operator_button(r.stop_button)).unwrap();
    spawner.spawn(hunt(hunt_context)).unwrap();
}
