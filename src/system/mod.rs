//! Core system components shared by the control loop
pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod labels;
pub mod operator;
pub mod platform;
