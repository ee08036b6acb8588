//! Hobby Servo Outputs
//!
//! Two servos per hardware PWM slice, one on each channel. The slice runs at
//! 50 Hz; the pulse width maps linearly from 500 µs (-90°) through 1500 µs
//! (0°) to 2500 µs (+90°).
//!
//! # Timer Calculation
//! ```text
//! counts per period = clk_sys / divider / 50 Hz
//! 150 MHz / 64 / 50 = 46875 -> top = 46874
//! ```

use embassy_rp::pwm::{Config, Pwm};

/// Servo refresh period in microseconds (50 Hz)
const PERIOD_US: u32 = 20_000;

/// Clock divider keeping the period inside the 16-bit counter
const DIVIDER: u8 = 64;

/// Pulse width at 0°
const CENTRE_US: f32 = 1500.0;

/// Pulse width change per degree
const US_PER_DEGREE: f32 = 2000.0 / 180.0;

/// Mechanical travel either side of centre
const TRAVEL: f32 = 90.0;

/// PWM configuration for a 50 Hz servo slice with both outputs centred
pub fn servo_config() -> Config {
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
    let counts = clock_freq_hz / u32::from(DIVIDER) / (1_000_000 / PERIOD_US);
    let mut config = Config::default();
    config.divider = DIVIDER.into();
    config.top = (counts - 1) as u16;
    let centre = compare_for(0.0, config.top);
    config.compare_a = centre;
    config.compare_b = centre;
    config
}

/// Compare value for `degrees` on a slice wrapping at `top`
fn compare_for(degrees: f32, top: u16) -> u16 {
    let pulse_us = CENTRE_US + degrees.clamp(-TRAVEL, TRAVEL) * US_PER_DEGREE;
    let counts_per_us = (f32::from(top) + 1.0) / PERIOD_US as f32;
    (pulse_us * counts_per_us) as u16
}

/// Two servos on the A and B outputs of one slice
pub struct ServoPair {
    pwm: Pwm<'static>,
    config: Config,
}

impl ServoPair {
    pub fn new(pwm: Pwm<'static>, config: Config) -> Self {
        Self { pwm, config }
    }

    pub fn set_a(&mut self, degrees: f32) {
        self.config.compare_a = compare_for(degrees, self.config.top);
        self.pwm.set_config(&self.config);
    }

    pub fn set_b(&mut self, degrees: f32) {
        self.config.compare_b = compare_for(degrees, self.config.top);
        self.pwm.set_config(&self.config);
    }
}
