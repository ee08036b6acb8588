//! Hunt behavior
//!
//! - [`state`]: the behavior state enum and the sweep cursor
//! - [`interlock`]: the cliff check that runs before every state handler
//! - [`hunt`]: the control-loop context and one handler per state

pub mod hunt;
pub mod interlock;
pub mod state;
