//! Wire formats of the UART-attached modules
//!
//! Pure encoders and parsers; the firmware tasks own the UARTs and move the
//! bytes.

pub mod dfplayer;
pub mod vision;
