//! Grayscale Floor Sensors
//!
//! Three reflective sensors facing the floor, read through the ADC. Bright
//! floor reflects more light and reads higher; a drop-off reads low.
//!
//! # Error Handling
//! A failed conversion reads as 0, which the cliff check treats as a
//! drop-off. An unreadable sensor stops the robot rather than letting it
//! drive blind.

use bottle_toppler::system::platform::{GrayscaleSensor, GRAYSCALE_CHANNELS};
use defmt::warn;
use embassy_rp::adc::{Adc, Async, Channel, Config};
use embassy_rp::gpio::Pull;

use crate::task::resources::{GrayscaleResources, Irqs};

pub struct Grayscale {
    adc: Adc<'static, Async>,
    channels: [Channel<'static>; GRAYSCALE_CHANNELS],
}

impl Grayscale {
    pub fn new(r: GrayscaleResources) -> Self {
        Self {
            adc: Adc::new(r.adc, Irqs, Config::default()),
            channels: [
                Channel::new_pin(r.left_pin, Pull::None),
                Channel::new_pin(r.centre_pin, Pull::None),
                Channel::new_pin(r.right_pin, Pull::None),
            ],
        }
    }
}

impl GrayscaleSensor for Grayscale {
    async fn read_grayscale(&mut self) -> [u16; GRAYSCALE_CHANNELS] {
        let mut out = [0; GRAYSCALE_CHANNELS];
        for (value, channel) in out.iter_mut().zip(self.channels.iter_mut()) {
            match self.adc.read(channel).await {
                Ok(raw) => *value = raw,
                Err(e) => warn!("grayscale read failed: {:?}", e),
            }
        }
        out
    }
}
