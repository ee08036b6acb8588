//! Platform traits
//!
//! Platform-agnostic interface to every piece of hardware the hunt touches.
//! The control core never names a peripheral; the firmware implements these
//! traits on RP2350 peripherals and the tests implement them on scripted
//! mocks.
//!
//! # Contracts
//! - Camera: one frame per `capture`, failure ends the run
//! - Detection engine: boxes in detector input coordinates, class ids from
//!   the COCO vocabulary
//! - Range finder: raw units, non-positive values are invalid samples
//! - Grayscale sensor: one reading per floor-facing channel
//! - Actuator driver: angles in degrees, drive power in -1.0..=1.0; values
//!   arrive already clamped
//! - Audio: fire and forget

use crate::system::clock::Clock;
use crate::system::error::{AudioError, CameraError, EngineError};
use crate::system::geometry::BoundingBox;

/// Number of floor-facing grayscale channels
pub const GRAYSCALE_CHANNELS: usize = 3;

/// Most raw detections a single inference may report
pub const MAX_RAW_DETECTIONS: usize = 32;

/// A captured camera image
pub trait Frame {
    fn width(&self) -> u16;
    fn height(&self) -> u16;
    /// RGB value of the pixel at `(x, y)`, origin top left
    fn rgb(&self, x: u16, y: u16) -> [u8; 3];
}

/// Image source
pub trait Camera {
    type Frame<'a>: Frame
    where
        Self: 'a;

    /// Brings the camera up; failing here is fatal at startup
    async fn open(&mut self) -> Result<(), CameraError>;

    /// Captures one frame
    async fn capture(&mut self) -> Result<Self::Frame<'_>, CameraError>;

    /// Releases the camera on shutdown
    async fn release(&mut self);
}

/// One detection as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawDetection {
    /// Box in detector input coordinates
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_id: u16,
}

/// Raw detections of one inference
pub type RawDetections = heapless::Vec<RawDetection, MAX_RAW_DETECTIONS>;

/// Object detection engine
pub trait DetectionEngine {
    /// Loads the model; a missing model is fatal at startup
    async fn load(&mut self) -> Result<(), EngineError>;

    /// Runs the model on a `size` x `size` RGB888 image
    async fn infer(&mut self, input: &[u8], size: u16) -> Result<RawDetections, EngineError>;
}

/// Forward-facing distance sensor
pub trait RangeFinder {
    /// One raw reading, non-positive when the echo was invalid
    async fn read(&mut self) -> f32;
}

/// Floor-facing grayscale sensor array
pub trait GrayscaleSensor {
    async fn read_grayscale(&mut self) -> [u16; GRAYSCALE_CHANNELS];
}

/// Servo and motor outputs
pub trait ActuatorDriver {
    fn set_cam_pan(&mut self, degrees: f32);
    fn set_cam_tilt(&mut self, degrees: f32);
    fn set_steering(&mut self, degrees: f32);
    /// Arm servo angle, 0 is the servo's mechanical centre
    fn set_arm(&mut self, degrees: f32);
    /// Signed drive power, negative reverses, 0 stops
    fn set_drive(&mut self, power: f32);
}

/// Background music player
pub trait Audio {
    /// Number of playable tracks
    async fn track_count(&mut self) -> Result<u16, AudioError>;
    async fn set_volume(&mut self, volume: u8) -> Result<(), AudioError>;
    async fn play(&mut self, track: u16) -> Result<(), AudioError>;
    async fn stop(&mut self);
}

/// Bundle of hardware types a hunt runs on
pub trait Platform {
    type Camera: Camera;
    type Engine: DetectionEngine;
    /// Scratch buffer for the letterboxed detector input
    type InputBuffer: AsMut<[u8]>;
    type Ranger: RangeFinder;
    type Grayscale: GrayscaleSensor;
    type Actuators: ActuatorDriver;
    type Audio: Audio;
    type Clock: Clock;
}
