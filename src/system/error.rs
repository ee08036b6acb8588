//! Error types
//!
//! Only startup problems and a dead camera are fatal. Everything that can go
//! wrong inside a cycle (engine failures, sensor dropouts, a cliff) is
//! absorbed by the state machine and logged.

use thiserror::Error;

/// Camera failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraError {
    #[error("camera could not be opened")]
    Unavailable,
    #[error("camera produced no frame")]
    Exhausted,
    #[error("camera link failed")]
    Link,
}

/// Detection engine failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    #[error("detection model not found")]
    ModelMissing,
    #[error("inference did not finish in time")]
    TimedOut,
    #[error("engine link failed")]
    Link,
    #[error("engine reply malformed")]
    Malformed,
}

/// Audio module failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioError {
    #[error("no audio tracks found")]
    NoTracks,
    #[error("track {track} not found, {available} available")]
    TrackMissing { track: u16, available: u16 },
    #[error("audio link failed")]
    Link,
}

/// Configuration the hunt cannot run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("sweep needs at least one pan and one tilt angle")]
    EmptySweep,
    #[error("detector input size must be positive")]
    InputSize,
    #[error("range sample count {0} out of bounds")]
    RangeSamples(usize),
    #[error("angle limit must be positive")]
    AngleLimit,
    #[error("approach lost-frame limit must be at least 1")]
    LostFrameLimit,
    #[error("wait needs at least 1 centred frame")]
    CenteredFrames,
    #[error("input buffer holds {available} bytes, {needed} needed")]
    InputBuffer { needed: usize, available: usize },
}

/// Reasons the robot refuses to arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("detection engine unavailable: {0}")]
    Engine(#[from] EngineError),
    #[error("audio unavailable: {0}")]
    Audio(#[from] AudioError),
    #[error("camera unavailable: {0}")]
    Camera(#[from] CameraError),
}

/// Reasons a running hunt ends without an operator stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HuntError {
    #[error("camera failed: {0}")]
    Camera(#[from] CameraError),
}

/// Malformed bytes on a module link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    #[error("message truncated, {needed} bytes needed, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("unexpected start byte {0:#04x}")]
    BadStart(u8),
    #[error("unexpected end byte {0:#04x}")]
    BadEnd(u8),
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("reply to opcode {0:#04x} not expected")]
    UnexpectedReply(u8),
    #[error("checksum {found:#06x}, expected {expected:#06x}")]
    Checksum { expected: u16, found: u16 },
    #[error("payload length {0} out of range")]
    Length(u32),
}
