//! Background music
//!
//! Started once when the robot arms and stopped on an operator stop. The
//! hunt never waits on it or reads anything back.

use crate::system::config::AudioConfig;
use crate::system::error::AudioError;
use crate::system::platform::Audio;

pub struct Soundtrack<A> {
    audio: A,
}

impl<A: Audio> Soundtrack<A> {
    pub fn new(audio: A) -> Self {
        Self { audio }
    }

    /// Picks the track to play and sets the volume
    ///
    /// Fails when the module holds no tracks or the configured track is
    /// missing.
    pub async fn prepare(&mut self, config: &AudioConfig) -> Result<u16, AudioError> {
        let available = self.audio.track_count().await?;
        if available == 0 {
            return Err(AudioError::NoTracks);
        }
        let track = config.track.unwrap_or(1);
        if track == 0 || track > available {
            return Err(AudioError::TrackMissing { track, available });
        }
        self.audio.set_volume(config.volume).await?;
        Ok(track)
    }

    pub async fn start(&mut self, track: u16) -> Result<(), AudioError> {
        info!("playing track {}", track);
        self.audio.play(track).await
    }

    pub async fn stop(&mut self) {
        self.audio.stop().await;
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }
}
