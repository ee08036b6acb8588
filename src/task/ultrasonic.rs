//! Ultrasonic Ranger
//!
//! HC-SR04 forward ranger. One reading per call:
//! 1. 10 µs trigger pulse
//! 2. wait for the echo to rise, then time how long it stays high
//! 3. distance in centimetres = echo µs / 58
//!
//! # Error Handling
//! A missing or overlong echo yields -1.0, which the sensor adapter drops as
//! an invalid sample. Readings are spaced by at least 60 ms so a late echo
//! of the previous ping is not mistaken for the current one.

use bottle_toppler::system::platform::RangeFinder;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::task::resources::UltrasonicResources;

/// Trigger pulse length
const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// Longest wait for the echo to start
const ECHO_START_TIMEOUT: Duration = Duration::from_millis(5);

/// Longest echo accepted, about 4 m
const ECHO_TIMEOUT: Duration = Duration::from_millis(25);

/// Minimum spacing between pings
const PING_INTERVAL: Duration = Duration::from_millis(60);

/// Echo microseconds per centimetre of distance (there and back)
const US_PER_CM: f32 = 58.0;

/// Reported for a failed reading
const INVALID: f32 = -1.0;

pub struct Ultrasonic {
    trigger: Output<'static>,
    echo: Input<'static>,
    last_ping: Instant,
}

impl Ultrasonic {
    pub fn new(r: UltrasonicResources) -> Self {
        Self {
            trigger: Output::new(r.trigger_pin, Level::Low),
            echo: Input::new(r.echo_pin, Pull::None),
            last_ping: Instant::from_ticks(0),
        }
    }

    async fn ping(&mut self) -> Option<Duration> {
        let since = Instant::now().saturating_duration_since(self.last_ping);
        if since < PING_INTERVAL {
            Timer::after(PING_INTERVAL - since).await;
        }
        self.last_ping = Instant::now();

        self.trigger.set_high();
        Timer::after(TRIGGER_PULSE).await;
        self.trigger.set_low();

        with_timeout(ECHO_START_TIMEOUT, self.echo.wait_for_high()).await.ok()?;
        let start = Instant::now();
        with_timeout(ECHO_TIMEOUT, self.echo.wait_for_low()).await.ok()?;
        Some(Instant::now() - start)
    }
}

impl RangeFinder for Ultrasonic {
    async fn read(&mut self) -> f32 {
        match self.ping().await {
            Some(echo) => echo.as_micros() as f32 / US_PER_CM,
            None => INVALID,
        }
    }
}
