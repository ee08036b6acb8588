//! Background Music
//!
//! DFPlayer Mini on UART1 at 9600 baud. Commands are fire and forget; only
//! the track count query waits for an answer.
//!
//! # Startup
//! The module ignores commands for about a second and a half after power
//! up, so the first query waits out [`BOOT_DELAY`].

use bottle_toppler::protocol::dfplayer::{self, Command, Reply, FRAME_LEN};
use bottle_toppler::system::error::AudioError;
use bottle_toppler::system::platform::Audio;
use defmt::{debug, warn};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{self, Async, Uart};
use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::task::resources::{Irqs, MusicResources};

const BAUD_RATE: u32 = 9600;

/// Time the module needs after power up
const BOOT_DELAY: Duration = Duration::from_millis(1500);

/// Longest wait for a reply frame
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// Unrelated frames skipped while waiting for the track count
const MAX_SKIPPED: u8 = 4;

pub struct Music {
    uart: Uart<'static, UART1, Async>,
}

impl Music {
    pub fn new(r: MusicResources) -> Self {
        let mut config = uart::Config::default();
        config.baudrate = BAUD_RATE;
        Self {
            uart: Uart::new(r.uart, r.tx_pin, r.rx_pin, Irqs, r.tx_dma, r.rx_dma, config),
        }
    }

    async fn send(&mut self, command: Command) -> Result<(), AudioError> {
        debug!("dfplayer {:?}", command);
        self.uart
            .write(&command.encode())
            .await
            .map_err(|_| AudioError::Link)
    }

    async fn receive(&mut self) -> Result<Reply, AudioError> {
        let mut frame = [0u8; FRAME_LEN];
        match with_timeout(REPLY_TIMEOUT, self.uart.read(&mut frame)).await {
            Ok(Ok(())) => dfplayer::decode(&frame).map_err(|e| {
                warn!("dfplayer reply: {:?}", e);
                AudioError::Link
            }),
            _ => Err(AudioError::Link),
        }
    }
}

impl Audio for Music {
    async fn track_count(&mut self) -> Result<u16, AudioError> {
        Timer::at(Instant::from_ticks(0) + BOOT_DELAY).await;
        self.send(Command::QueryTrackCount).await?;
        for _ in 0..=MAX_SKIPPED {
            match self.receive().await? {
                Reply::TrackCount(count) => return Ok(count),
                Reply::Error(code) => {
                    warn!("dfplayer error {}", code);
                    return Ok(0);
                }
                other => debug!("dfplayer {:?}", other),
            }
        }
        Err(AudioError::Link)
    }

    async fn set_volume(&mut self, volume: u8) -> Result<(), AudioError> {
        self.send(Command::Volume(volume)).await
    }

    async fn play(&mut self, track: u16) -> Result<(), AudioError> {
        self.send(Command::Play(track)).await
    }

    async fn stop(&mut self) {
        if self.send(Command::Stop).await.is_err() {
            warn!("music did not stop");
        }
    }
}
