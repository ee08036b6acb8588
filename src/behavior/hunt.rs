//! Hunt Control Loop
//!
//! [`Hunt`] is the control-loop context. It owns one instance of every
//! adapter and the current [`BehaviorState`], and hands itself by `&mut` to
//! one handler per state. A cycle is:
//!
//! 1. safety interlock (a cliff ends the cycle in SWEEP)
//! 2. the active state's handler, which grabs at most one frame, reads the
//!    sensors, commands the actuators and returns the next state
//!
//! ```text
//! SWEEP ──sighting──▶ TRACK ──sighting──▶ APPROACH ──at stop distance──▶ WAIT
//!   ▲                   │                    │                             │
//!   ├────── lost ───────┘                    │                      centred face
//!   ├──────────── lost for too long ─────────┘                       or timeout
//!   │                                                                      │
//!   └────────── reverse done ◀── BACKUP ◀────────── knock ◀────────────────┘
//! ```
//!
//! A cliff in any state runs the escape maneuver and restarts the sweep.
//! Knocks and escapes run to completion; an operator stop is only noticed
//! between cycles.

use core::cmp::min;

use embassy_time::Instant;

use crate::adapter::actuation::Actuation;
use crate::adapter::audio::Soundtrack;
use crate::adapter::perception::{Perception, Sighting};
use crate::adapter::sensor::Sensors;
use crate::behavior::interlock::SafetyInterlock;
use crate::behavior::state::{BehaviorState, SweepCursor};
use crate::maneuver::{pulse, strike};
use crate::system::clock::Clock;
use crate::system::config::HuntConfig;
use crate::system::error::{HuntError, StartupError};
use crate::system::labels::LabelSet;
use crate::system::operator::{stop_requested, StopSignal};
use crate::system::platform::{Camera, Frame, Platform};

/// Hardware handed to a new hunt
pub struct Parts<P: Platform> {
    pub camera: P::Camera,
    pub engine: P::Engine,
    /// Scratch space for the detector input, at least `input_size² * 3` bytes
    pub input: P::InputBuffer,
    pub ranger: P::Ranger,
    pub grayscale: P::Grayscale,
    pub actuators: P::Actuators,
    pub audio: P::Audio,
    pub clock: P::Clock,
}

/// Counters kept over the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HuntStats {
    pub cycles: u32,
    pub knocks: u32,
    pub escapes: u32,
    /// Approaches abandoned after losing the target
    pub give_ups: u32,
}

/// How a forward burst ended
enum Burst {
    /// Ran for the full burst time
    Clear,
    /// Stopped early at this distance
    Reached(f32),
    /// A cliff cut the burst short and the escape ran
    Cliff,
}

pub struct Hunt<P: Platform> {
    config: HuntConfig,
    camera: P::Camera,
    perception: Perception<P::Engine, P::InputBuffer>,
    sensors: Sensors<P::Ranger, P::Grayscale>,
    actuation: Actuation<P::Actuators>,
    soundtrack: Soundtrack<P::Audio>,
    clock: P::Clock,
    interlock: SafetyInterlock,
    state: BehaviorState,
    stats: HuntStats,
}

impl<P: Platform> Hunt<P> {
    /// Builds the hunt context; nothing is commanded until [`Hunt::arm`]
    ///
    /// `seed` drives the random escape turns.
    pub fn new(parts: Parts<P>, config: HuntConfig, seed: u64) -> Result<Self, StartupError> {
        config.validate()?;
        let perception = Perception::new(parts.engine, parts.input, &config.perception)?;
        Ok(Self {
            camera: parts.camera,
            perception,
            sensors: Sensors::new(parts.ranger, parts.grayscale, &config.range, &config.cliff),
            actuation: Actuation::new(parts.actuators, config.aim.limit),
            soundtrack: Soundtrack::new(parts.audio),
            clock: parts.clock,
            interlock: SafetyInterlock::new(config.cliff, seed),
            state: BehaviorState::initial(),
            stats: HuntStats::default(),
            config,
        })
    }

    /// Startup checks, then centres the actuators and starts the music
    ///
    /// Fails before any actuator is commanded when the model, the music or
    /// the camera is missing.
    pub async fn arm(&mut self) -> Result<(), StartupError> {
        self.perception.load().await?;
        let track = self.soundtrack.prepare(&self.config.audio).await?;
        self.camera.open().await?;

        self.actuation.centre();
        self.actuation.set_arm(strike::arm_angle(0.0, &self.config.strike));
        if let Err(e) = self.soundtrack.start(track).await {
            warn!("music did not start: {:?}", e);
        }
        self.state = BehaviorState::initial();
        info!("armed, hunting");
        Ok(())
    }

    /// Runs cycles until an operator stop or a camera failure
    ///
    /// The robot is parked on the way out either way.
    pub async fn run(&mut self, stop: &StopSignal) -> Result<(), HuntError> {
        let result = loop {
            if stop_requested(stop) {
                info!("operator stop");
                break Ok(());
            }
            if let Err(e) = self.cycle().await {
                error!("hunt ended: {:?}", e);
                break Err(e);
            }
        };
        self.shutdown().await;
        result
    }

    /// One control cycle: interlock, then the active state's handler
    pub async fn cycle(&mut self) -> Result<(), HuntError> {
        self.stats.cycles = self.stats.cycles.saturating_add(1);

        if self
            .interlock
            .check(&mut self.sensors, &mut self.actuation, &mut self.clock)
            .await
        {
            self.stats.escapes = self.stats.escapes.saturating_add(1);
            self.reset_to_sweep();
            self.enter(BehaviorState::initial());
            return Ok(());
        }

        let next = match self.state {
            BehaviorState::Sweep(cursor) => self.sweep(cursor).await?,
            BehaviorState::Track => self.track().await?,
            BehaviorState::Approach { lost_frames } => self.approach(lost_frames).await?,
            BehaviorState::Wait {
                deadline,
                centered_frames,
            } => self.wait(deadline, centered_frames).await?,
            BehaviorState::Backup { deadline } => self.backup(deadline).await,
        };
        self.enter(next);
        Ok(())
    }

    /// Stops the drive and music, centres the servos and releases the camera
    pub async fn shutdown(&mut self) {
        self.actuation.centre();
        self.soundtrack.stop().await;
        self.camera.release().await;
        info!(
            "parked after {} cycles, {} knocks",
            self.stats.cycles,
            self.stats.knocks
        );
    }

    async fn sweep(&mut self, cursor: SweepCursor) -> Result<BehaviorState, HuntError> {
        let (pan, tilt) = cursor.pose(&self.config.sweep);
        self.actuation.set_cam_angle(pan, tilt);
        self.clock.sleep(self.config.sweep.settle).await;

        if self.look(self.config.perception.targets).await?.is_some() {
            let aim = self.actuation.aim();
            info!("target at pan {} tilt {}", aim.pan, aim.tilt);
            return Ok(BehaviorState::Track);
        }
        let sweep = &self.config.sweep;
        Ok(BehaviorState::Sweep(
            cursor.advance(sweep.pans.len(), sweep.tilts.len()),
        ))
    }

    async fn track(&mut self) -> Result<BehaviorState, HuntError> {
        let Some(sighting) = self.look(self.config.perception.targets).await? else {
            return Ok(BehaviorState::initial());
        };
        self.steer_toward(&sighting);
        Ok(BehaviorState::Approach { lost_frames: 0 })
    }

    async fn approach(&mut self, lost_frames: u8) -> Result<BehaviorState, HuntError> {
        let config = self.config.approach;
        let mut distance = self.sensors.read_distance_mm(self.config.range.samples).await;
        let sighting = self.look(self.config.perception.targets).await?;

        match &sighting {
            Some(sighting) => self.steer_toward(sighting),
            None => self.actuation.set_steering(0.0),
        }

        if let Some(mm) = distance {
            if mm < config.stop_distance_mm - config.too_close_margin_mm {
                debug!("too close at {} mm", mm);
                self.actuation
                    .perform(&pulse(config.too_close_reverse), &mut self.clock)
                    .await;
                return Ok(BehaviorState::Approach { lost_frames: 0 });
            }
            if mm <= config.stop_distance_mm {
                info!("reached target at {} mm", mm);
                self.actuation
                    .perform(&pulse(config.arrival_reverse), &mut self.clock)
                    .await;
                let wait = &self.config.wait;
                self.actuation.set_cam_angle(wait.person_pan, wait.person_tilt);
                return Ok(BehaviorState::Wait {
                    deadline: self.clock.now() + wait.timeout,
                    centered_frames: 0,
                });
            }
        }

        match self.burst().await {
            Burst::Cliff => {
                self.stats.escapes = self.stats.escapes.saturating_add(1);
                self.reset_to_sweep();
                return Ok(BehaviorState::initial());
            }
            Burst::Reached(mm) => distance = Some(mm),
            Burst::Clear => {}
        }

        let present =
            sighting.is_some() || distance.is_some_and(|mm| mm < config.presence_ceiling_mm);
        let lost_frames = if present { 0 } else { lost_frames.saturating_add(1) };
        if lost_frames >= config.lost_frame_limit {
            warn!("target lost, backing up");
            self.actuation
                .perform(&pulse(config.lost_reverse), &mut self.clock)
                .await;
            self.stats.give_ups = self.stats.give_ups.saturating_add(1);
            self.reset_to_sweep();
            return Ok(BehaviorState::initial());
        }
        Ok(BehaviorState::Approach { lost_frames })
    }

    /// Short forward drive, re-polling range and the interlock as it goes
    async fn burst(&mut self) -> Burst {
        let config = self.config.approach;
        self.actuation.drive(config.burst_power);
        let start = self.clock.now();
        let mut outcome = Burst::Clear;

        loop {
            if self
                .interlock
                .check(&mut self.sensors, &mut self.actuation, &mut self.clock)
                .await
            {
                return Burst::Cliff;
            }
            let live = self.sensors.read_distance_mm(self.config.range.samples).await;
            if let Some(mm) = live.filter(|mm| *mm <= config.stop_distance_mm) {
                outcome = Burst::Reached(mm);
                break;
            }
            // a slow range read can use up the whole burst on its own
            let elapsed = self.clock.since(start);
            if elapsed >= config.burst_time {
                break;
            }
            self.clock
                .sleep(min(config.burst_poll, config.burst_time - elapsed))
                .await;
        }
        self.actuation.stop();
        outcome
    }

    async fn wait(
        &mut self,
        deadline: Instant,
        centered_frames: u8,
    ) -> Result<BehaviorState, HuntError> {
        let wait = self.config.wait;
        let centered_frames = match self.look(self.config.perception.cues).await? {
            Some(face) => {
                let (ex, ey) = self.aim_at(&face, wait.face_pan_gain, wait.face_tilt_gain);
                let centred = libm::fabsf(ex) < wait.center_tolerance_px
                    && libm::fabsf(ey) < wait.center_tolerance_px;
                if centred {
                    centered_frames.saturating_add(1)
                } else {
                    0
                }
            }
            None => 0,
        };

        if centered_frames >= wait.centered_frames_required {
            info!("person is watching");
            return Ok(self.knock().await);
        }
        if self.clock.now() >= deadline {
            info!("nobody came, knocking anyway");
            return Ok(self.knock().await);
        }
        Ok(BehaviorState::Wait {
            deadline,
            centered_frames,
        })
    }

    async fn backup(&mut self, deadline: Instant) -> BehaviorState {
        if self.clock.now() >= deadline {
            info!("bottle knocked, searching again");
            self.reset_to_sweep();
            return BehaviorState::initial();
        }
        self.actuation.drive(self.config.backup.power);
        self.clock.sleep(self.config.backup.poll).await;
        BehaviorState::Backup { deadline }
    }

    /// Strikes, starts reversing and looks straight ahead again
    async fn knock(&mut self) -> BehaviorState {
        self.actuation.strike(&mut self.clock, &self.config.strike).await;
        self.stats.knocks = self.stats.knocks.saturating_add(1);
        self.actuation.drive(self.config.backup.power);
        self.actuation.set_cam_angle(0.0, 0.0);
        BehaviorState::Backup {
            deadline: self.clock.now() + self.config.backup.duration,
        }
    }

    /// Captures a frame and looks for `wanted` in it
    async fn look(&mut self, wanted: LabelSet) -> Result<Option<Sighting>, HuntError> {
        let frame = self.camera.capture().await?;
        let (frame_width, frame_height) = (frame.width(), frame.height());
        let detection = self.perception.detect(&frame, wanted, &mut self.clock).await;
        Ok(detection.map(|detection| Sighting {
            detection,
            frame_width,
            frame_height,
        }))
    }

    /// One proportional camera step toward `sighting`, returns the pixel error
    fn aim_at(&mut self, sighting: &Sighting, pan_gain: f32, tilt_gain: f32) -> (f32, f32) {
        let (ex, ey) = sighting.offset();
        let aim = self.actuation.aim();
        // image y grows downward, tilt grows upward
        self.actuation
            .set_cam_angle(aim.pan + ex * pan_gain, aim.tilt - ey * tilt_gain);
        (ex, ey)
    }

    /// Aims at `sighting` and turns the wheels to follow the camera
    fn steer_toward(&mut self, sighting: &Sighting) {
        self.aim_at(sighting, self.config.aim.pan_gain, self.config.aim.tilt_gain);
        self.actuation.set_steering(self.actuation.aim().pan);
    }

    /// Drive stopped, wheels and camera centred
    fn reset_to_sweep(&mut self) {
        self.actuation.centre();
    }

    fn enter(&mut self, next: BehaviorState) {
        if !next.same_kind(&self.state) {
            info!("{} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn stats(&self) -> HuntStats {
        self.stats
    }

    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    pub fn actuation(&self) -> &Actuation<P::Actuators> {
        &self.actuation
    }

    pub fn camera(&self) -> &P::Camera {
        &self.camera
    }

    pub fn soundtrack(&self) -> &Soundtrack<P::Audio> {
        &self.soundtrack
    }

    pub fn sensors_mut(&mut self) -> &mut Sensors<P::Ranger, P::Grayscale> {
        &mut self.sensors
    }

    pub fn clock(&self) -> &P::Clock {
        &self.clock
    }
}
