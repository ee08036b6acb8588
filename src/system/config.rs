//! Hunt Configuration
//!
//! Every tunable of the hunt in one place. `Default` reproduces the values the
//! robot was calibrated with; tests and experiments override single fields
//! with struct update syntax:
//!
//! ```rust
//! use bottle_toppler::system::config::{HuntConfig, WaitConfig};
//! use embassy_time::Duration;
//!
//! let config = HuntConfig {
//!     wait: WaitConfig {
//!         timeout: Duration::from_secs(2),
//!         ..WaitConfig::default()
//!     },
//!     ..HuntConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Units
//! - Angles in degrees, positive pan is right, positive tilt is up
//! - Distances in millimetres
//! - Drive power normalized to -1.0 (full reverse) ..= 1.0 (full forward)
//! - Servo pulse widths in microseconds

use embassy_time::Duration;

use crate::system::error::ConfigError;
use crate::system::labels::LabelSet;
use crate::system::platform::GRAYSCALE_CHANNELS;

/// Symmetric limit for camera pan/tilt and steering (degrees)
pub const ANGLE_LIMIT: f32 = 80.0;

/// Nominal frame edge the proportional gains were tuned against (pixels)
const TUNED_FRAME_EDGE: f32 = 480.0;

/// Pan angles visited by the sweep, outer loop
pub const SWEEP_PANS: [f32; 10] = [5.0, -5.0, 15.0, -15.0, 30.0, -30.0, 45.0, 60.0, 75.0, 90.0];

/// Tilt angles visited by the sweep for every pan angle, inner loop
pub const SWEEP_TILTS: [f32; 3] = [0.0, 10.0, 25.0];

/// Upper bound on range samples taken per distance read
pub const MAX_RANGE_SAMPLES: usize = 16;

/// A timed drive command followed by a stop
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrivePulse {
    /// Signed drive power, negative reverses
    pub power: f32,
    /// How long the power is held before stopping
    pub duration: Duration,
}

impl DrivePulse {
    pub const fn new(power: f32, millis: u64) -> Self {
        Self {
            power,
            duration: Duration::from_millis(millis),
        }
    }
}

/// Object detection settings
#[derive(Debug, Clone, Copy)]
pub struct PerceptionConfig {
    /// Edge of the square letterboxed image fed to the detection engine
    pub input_size: u16,
    /// Detections below this confidence are discarded
    pub confidence_threshold: f32,
    /// An engine call running longer than this counts as failed
    pub inference_timeout: Duration,
    /// Labels the hunt searches for and approaches
    pub targets: LabelSet,
    /// Labels that stand in for a watching person during WAIT
    pub cues: LabelSet,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            input_size: 480,
            confidence_threshold: 0.35,
            inference_timeout: Duration::from_secs(2),
            targets: LabelSet::new(&["bottle"]),
            cues: LabelSet::new(&["person"]),
        }
    }
}

/// Camera aiming settings used by TRACK and APPROACH
#[derive(Debug, Clone, Copy)]
pub struct AimConfig {
    /// Angular limit for pan, tilt and steering
    pub limit: f32,
    /// Degrees of pan per pixel of horizontal error
    pub pan_gain: f32,
    /// Degrees of tilt per pixel of vertical error
    pub tilt_gain: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            limit: ANGLE_LIMIT,
            pan_gain: 10.0 / TUNED_FRAME_EDGE,
            tilt_gain: 10.0 / TUNED_FRAME_EDGE,
        }
    }
}

/// Camera sweep settings
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub pans: &'static [f32],
    pub tilts: &'static [f32],
    /// Delay after moving the camera before looking
    pub settle: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            pans: &SWEEP_PANS,
            tilts: &SWEEP_TILTS,
            settle: Duration::from_millis(800),
        }
    }
}

/// Ultrasonic ranger settings
#[derive(Debug, Clone, Copy)]
pub struct RangeConfig {
    /// Raw samples per distance read (median of the valid ones is used)
    pub samples: usize,
    /// Millimetres per raw ranger unit (the ranger reports centimetres)
    pub mm_per_unit: f32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            samples: 3,
            mm_per_unit: 10.0,
        }
    }
}

/// APPROACH settings
#[derive(Debug, Clone, Copy)]
pub struct ApproachConfig {
    /// Stop and wait once the target is this close
    pub stop_distance_mm: f32,
    /// Closer than `stop_distance_mm - too_close_margin_mm` backs off instead
    pub too_close_margin_mm: f32,
    /// A range reading under this still counts as the target being present
    pub presence_ceiling_mm: f32,
    /// Forward power during a burst
    pub burst_power: f32,
    /// Length of one forward burst
    pub burst_time: Duration,
    /// Range/cliff poll interval inside a burst
    pub burst_poll: Duration,
    /// Back-off when too close
    pub too_close_reverse: DrivePulse,
    /// Settling pulse when the stop distance is reached
    pub arrival_reverse: DrivePulse,
    /// Back-off before giving up on a lost target
    pub lost_reverse: DrivePulse,
    /// Consecutive cycles without vision or range evidence before giving up
    pub lost_frame_limit: u8,
}

impl Default for ApproachConfig {
    fn default() -> Self {
        Self {
            stop_distance_mm: 100.0,
            too_close_margin_mm: 30.0,
            presence_ceiling_mm: 300.0,
            burst_power: 0.5,
            burst_time: Duration::from_millis(100),
            burst_poll: Duration::from_millis(50),
            too_close_reverse: DrivePulse::new(-0.5, 300),
            arrival_reverse: DrivePulse::new(-0.5, 100),
            lost_reverse: DrivePulse::new(-0.7, 700),
            lost_frame_limit: 2,
        }
    }
}

/// WAIT settings
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Camera pose used to look for a person
    pub person_pan: f32,
    pub person_tilt: f32,
    /// Proportional gains while following a face
    pub face_pan_gain: f32,
    pub face_tilt_gain: f32,
    /// A face is centred when both pixel errors are below this
    pub center_tolerance_px: f32,
    /// Consecutive centred sightings needed before knocking
    pub centered_frames_required: u8,
    /// Knock anyway after this long
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            person_pan: 50.0,
            person_tilt: 25.0,
            face_pan_gain: 10.0 / TUNED_FRAME_EDGE,
            face_tilt_gain: 10.0 / TUNED_FRAME_EDGE,
            center_tolerance_px: 15.0,
            centered_frames_required: 1,
            timeout: Duration::from_secs(5),
        }
    }
}

/// BACKUP settings
#[derive(Debug, Clone, Copy)]
pub struct BackupConfig {
    /// Reverse power held after the knock
    pub power: f32,
    pub duration: Duration,
    /// Interval between deadline checks while reversing
    pub poll: Duration,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            power: -1.0,
            duration: Duration::from_millis(500),
            poll: Duration::from_millis(10),
        }
    }
}

/// Arm servo calibration for the knock
#[derive(Debug, Clone, Copy)]
pub struct StrikeConfig {
    /// Pulse width at which the arm rests
    pub neutral_us: f32,
    /// Offsets this small are sent as zero to avoid jitter
    pub gate_us: f32,
    /// Swing offset from neutral
    pub offset_us: f32,
    /// Time for a swing to travel roughly 90 degrees
    pub swing_hold: Duration,
    /// Counter pulse against coast at the end of a swing
    pub brake_us: f32,
    pub brake_hold: Duration,
    /// Rest at neutral between swings
    pub settle: Duration,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            neutral_us: 1450.0,
            gate_us: 60.0,
            offset_us: 200.0,
            swing_hold: Duration::from_millis(570),
            brake_us: 70.0,
            brake_hold: Duration::from_millis(35),
            settle: Duration::from_millis(120),
        }
    }
}

/// Cliff interlock settings
#[derive(Debug, Clone, Copy)]
pub struct CliffConfig {
    /// Grayscale readings of the floor the robot was calibrated on
    pub reference: [u16; GRAYSCALE_CHANNELS],
    /// Relative drop below reference that still counts as floor
    pub tolerance: f32,
    pub reverse: DrivePulse,
    /// Steering angle for the re-orient leg, side is picked at random
    pub turn_angle: f32,
    pub forward: DrivePulse,
}

impl Default for CliffConfig {
    fn default() -> Self {
        Self {
            reference: [200; GRAYSCALE_CHANNELS],
            tolerance: 0.0,
            reverse: DrivePulse::new(-1.0, 1500),
            turn_angle: 40.0,
            forward: DrivePulse::new(1.0, 400),
        }
    }
}

/// Background music settings
#[derive(Debug, Clone, Copy)]
pub struct AudioConfig {
    /// Track to play, `None` plays the first track found
    pub track: Option<u16>,
    /// Module volume (0-30)
    pub volume: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            track: Some(1),
            volume: 30,
        }
    }
}

/// Complete hunt configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct HuntConfig {
    pub perception: PerceptionConfig,
    pub aim: AimConfig,
    pub sweep: SweepConfig,
    pub range: RangeConfig,
    pub approach: ApproachConfig,
    pub wait: WaitConfig,
    pub backup: BackupConfig,
    pub strike: StrikeConfig,
    pub cliff: CliffConfig,
    pub audio: AudioConfig,
}

impl HuntConfig {
    /// Rejects configurations the state machine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.pans.is_empty() || self.sweep.tilts.is_empty() {
            return Err(ConfigError::EmptySweep);
        }
        if self.perception.input_size == 0 {
            return Err(ConfigError::InputSize);
        }
        if self.range.samples == 0 || self.range.samples > MAX_RANGE_SAMPLES {
            return Err(ConfigError::RangeSamples(self.range.samples));
        }
        if !(self.aim.limit > 0.0) {
            return Err(ConfigError::AngleLimit);
        }
        if self.approach.lost_frame_limit == 0 {
            return Err(ConfigError::LostFrameLimit);
        }
        if self.wait.centered_frames_required == 0 {
            return Err(ConfigError::CenteredFrames);
        }
        Ok(())
    }
}
