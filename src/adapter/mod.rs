//! Adapters between the state machine and the platform traits
//!
//! Each adapter owns one group of hardware and adds the policy the state
//! machine should not care about: letterboxing and filtering for
//! perception, median filtering and calibration for the sensors, limits and
//! last-commanded state for the actuators.
pub mod actuation;
pub mod audio;
pub mod perception;
pub mod sensor;
