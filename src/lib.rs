//! Bottle-toppler control core
//!
//! Hardware-agnostic behavior controller for a small wheeled robot that
//! sweeps its camera for a bottle, drives up to it, waits for somebody to
//! look, knocks the bottle over and starts again.
//!
//! # Layout
//! - [`system`]: configuration, clock, errors, geometry and the platform
//!   traits every piece of hardware is reached through
//! - [`adapter`]: perception, sensor, actuation and audio adapters
//! - [`maneuver`]: time-stepped actuator sequences (strike, cliff escape,
//!   drive pulses)
//! - [`behavior`]: the hunt state machine and its safety interlock
//! - [`protocol`]: byte framing for the vision co-processor and MP3 module
//!
//! The firmware binary (`--features rp2350`) binds these to RP2350
//! peripherals; tests bind them to scripted mocks and a virtual clock.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This must go first so the macros are visible to all other modules.
mod fmt;

pub mod adapter;
pub mod behavior;
pub mod maneuver;
pub mod protocol;
pub mod system;
