//! Scripted robot for scenario tests
//!
//! Every mock shares one [`Rig`]: the test sets what the world looks like
//! (detections, range, floor) and reads back what the robot did (actuator
//! commands, audio, camera use). Time is virtual: sleeps and frame captures
//! advance it instantly.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use bottle_toppler::behavior::hunt::{Hunt, Parts};
use bottle_toppler::system::clock::Clock;
use bottle_toppler::system::config::{HuntConfig, PerceptionConfig};
use bottle_toppler::system::error::{AudioError, CameraError, EngineError, StartupError};
use bottle_toppler::system::geometry::{BoundingBox, Letterbox};
use bottle_toppler::system::platform::{
    ActuatorDriver, Audio, Camera, DetectionEngine, Frame, GrayscaleSensor, Platform,
    RangeFinder, RawDetection, RawDetections, GRAYSCALE_CHANNELS,
};
use embassy_futures::block_on;
use embassy_time::{Duration, Instant};

pub const BOTTLE: u16 = 39;
pub const PERSON: u16 = 0;

/// Camera frame size, 4:3
pub const FRAME_WIDTH: u16 = 128;
pub const FRAME_HEIGHT: u16 = 96;

/// Detector input edge; the frame maps onto rows 12..84
pub const INPUT_SIZE: u16 = 96;

/// Time one frame capture takes
pub const FRAME_TIME: Duration = Duration::from_millis(33);

/// Floor the default cliff reference accepts
pub const SAFE_FLOOR: [u16; GRAYSCALE_CHANNELS] = [400, 410, 395];

/// One channel over a drop-off
pub const DROP_OFF: [u16; GRAYSCALE_CHANNELS] = [400, 90, 395];

/// A command seen by the actuator driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Output {
    Pan(f32),
    Tilt(f32),
    Steer(f32),
    Arm(f32),
    Drive(f32),
}

/// Shared world and recording state
#[derive(Clone)]
pub struct Rig {
    /// Virtual time in microseconds
    pub time: Rc<Cell<u64>>,

    pub camera_ok: Rc<Cell<bool>>,
    /// Frames left before the camera runs dry, `None` for endless
    pub frames_left: Rc<Cell<Option<usize>>>,
    pub captures: Rc<Cell<usize>>,
    pub opened: Rc<Cell<bool>>,
    pub released: Rc<Cell<bool>>,

    pub model_loaded: Rc<Cell<bool>>,
    pub engine_hangs: Rc<Cell<bool>>,
    pub inferences: Rc<Cell<usize>>,
    /// Per-inference replies, used before `seen`
    pub detection_script: Rc<RefCell<VecDeque<Vec<RawDetection>>>>,
    /// Reply once the script is used up
    pub seen: Rc<RefCell<Vec<RawDetection>>>,

    /// Per-sample ranger readings, used before `range_cm`
    pub range_script: Rc<RefCell<VecDeque<f32>>>,
    pub range_cm: Rc<Cell<f32>>,
    /// Virtual microseconds one ranger sample takes
    pub range_sample_time: Rc<Cell<u64>>,

    /// Per-read floor readings, used before `floor`
    pub floor_script: Rc<RefCell<VecDeque<[u16; GRAYSCALE_CHANNELS]>>>,
    pub floor: Rc<Cell<[u16; GRAYSCALE_CHANNELS]>>,

    /// Actuator commands with the virtual time they were issued at
    pub outputs: Rc<RefCell<Vec<(u64, Output)>>>,

    pub tracks: Rc<Cell<u16>>,
    pub volume: Rc<Cell<Option<u8>>>,
    pub playing: Rc<Cell<Option<u16>>>,
    pub audio_stopped: Rc<Cell<bool>>,
}

impl Default for Rig {
    fn default() -> Self {
        Self {
            time: Rc::default(),
            camera_ok: Rc::new(Cell::new(true)),
            frames_left: Rc::default(),
            captures: Rc::default(),
            opened: Rc::default(),
            released: Rc::default(),
            model_loaded: Rc::new(Cell::new(true)),
            engine_hangs: Rc::default(),
            inferences: Rc::default(),
            detection_script: Rc::default(),
            seen: Rc::default(),
            range_script: Rc::default(),
            range_cm: Rc::new(Cell::new(-1.0)),
            range_sample_time: Rc::default(),
            floor_script: Rc::default(),
            floor: Rc::new(Cell::new(SAFE_FLOOR)),
            outputs: Rc::default(),
            tracks: Rc::new(Cell::new(3)),
            volume: Rc::default(),
            playing: Rc::default(),
            audio_stopped: Rc::default(),
        }
    }
}

impl Rig {
    pub fn now(&self) -> Instant {
        Instant::from_micros(self.time.get())
    }

    /// Standing detections for every inference
    pub fn see(&self, detections: &[RawDetection]) {
        *self.seen.borrow_mut() = detections.to_vec();
    }

    pub fn see_nothing(&self) {
        self.see(&[]);
    }

    /// Replies for the next inferences, in order
    pub fn script(&self, replies: &[&[RawDetection]]) {
        let mut script = self.detection_script.borrow_mut();
        script.extend(replies.iter().map(|r| r.to_vec()));
    }

    /// Number of commands recorded so far
    pub fn checkpoint(&self) -> usize {
        self.outputs.borrow().len()
    }

    /// Commands recorded after `checkpoint`
    pub fn outputs_from(&self, checkpoint: usize) -> Vec<Output> {
        self.outputs.borrow()[checkpoint..].iter().map(|(_, o)| *o).collect()
    }

    /// Commands with their timestamps, recorded after `checkpoint`
    pub fn timed_outputs_from(&self, checkpoint: usize) -> Vec<(u64, Output)> {
        self.outputs.borrow()[checkpoint..].to_vec()
    }

    pub fn all_outputs(&self) -> Vec<Output> {
        self.outputs_from(0)
    }

    /// Current virtual time in microseconds
    pub fn mark(&self) -> u64 {
        self.time.get()
    }
}

/// A detection centred on the frame, box in detector input coordinates
pub fn centred(class_id: u16) -> RawDetection {
    offset(class_id, 0.0, 0.0)
}

/// A detection `dx`/`dy` input pixels off centre (positive right/down)
pub fn offset(class_id: u16, dx: f32, dy: f32) -> RawDetection {
    let c = f32::from(INPUT_SIZE) / 2.0;
    RawDetection {
        bbox: BoundingBox::new(c - 4.0 + dx, c - 4.0 + dy, c + 4.0 + dx, c + 4.0 + dy),
        confidence: 0.9,
        class_id,
    }
}

pub struct VirtualClock {
    rig: Rig,
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.rig.now()
    }

    async fn sleep(&mut self, duration: Duration) {
        self.rig.time.set(self.rig.time.get() + duration.as_micros());
    }
}

pub struct TestFrame;

impl Frame for TestFrame {
    fn width(&self) -> u16 {
        FRAME_WIDTH
    }

    fn height(&self) -> u16 {
        FRAME_HEIGHT
    }

    fn rgb(&self, x: u16, y: u16) -> [u8; 3] {
        assert!(x < FRAME_WIDTH && y < FRAME_HEIGHT);
        [(x % 256) as u8, (y % 256) as u8, 0]
    }
}

pub struct MockCamera {
    rig: Rig,
}

impl Camera for MockCamera {
    type Frame<'a> = TestFrame;

    async fn open(&mut self) -> Result<(), CameraError> {
        if !self.rig.camera_ok.get() {
            return Err(CameraError::Unavailable);
        }
        self.rig.opened.set(true);
        Ok(())
    }

    async fn capture(&mut self) -> Result<TestFrame, CameraError> {
        match self.rig.frames_left.get() {
            Some(0) => return Err(CameraError::Exhausted),
            Some(n) => self.rig.frames_left.set(Some(n - 1)),
            None => {}
        }
        self.rig.captures.set(self.rig.captures.get() + 1);
        self.rig.time.set(self.rig.time.get() + FRAME_TIME.as_micros());
        Ok(TestFrame)
    }

    async fn release(&mut self) {
        self.rig.released.set(true);
    }
}

pub struct MockEngine {
    rig: Rig,
}

impl DetectionEngine for MockEngine {
    async fn load(&mut self) -> Result<(), EngineError> {
        if self.rig.model_loaded.get() {
            Ok(())
        } else {
            Err(EngineError::ModelMissing)
        }
    }

    async fn infer(&mut self, input: &[u8], size: u16) -> Result<RawDetections, EngineError> {
        assert_eq!(input.len(), Letterbox::buffer_len(size));
        self.rig.inferences.set(self.rig.inferences.get() + 1);
        if self.rig.engine_hangs.get() {
            core::future::pending::<()>().await;
        }
        let reply = self
            .rig
            .detection_script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.rig.seen.borrow().clone());
        Ok(reply.into_iter().collect())
    }
}

pub struct MockRanger {
    rig: Rig,
}

impl RangeFinder for MockRanger {
    async fn read(&mut self) -> f32 {
        let time = &self.rig.time;
        time.set(time.get() + self.rig.range_sample_time.get());
        self.rig
            .range_script
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.rig.range_cm.get())
    }
}

pub struct MockFloor {
    rig: Rig,
}

impl GrayscaleSensor for MockFloor {
    async fn read_grayscale(&mut self) -> [u16; GRAYSCALE_CHANNELS] {
        self.rig
            .floor_script
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.rig.floor.get())
    }
}

pub struct MockActuators {
    rig: Rig,
}

impl MockActuators {
    fn record(&mut self, output: Output) {
        self.rig.outputs.borrow_mut().push((self.rig.time.get(), output));
    }
}

impl ActuatorDriver for MockActuators {
    fn set_cam_pan(&mut self, degrees: f32) {
        self.record(Output::Pan(degrees));
    }

    fn set_cam_tilt(&mut self, degrees: f32) {
        self.record(Output::Tilt(degrees));
    }

    fn set_steering(&mut self, degrees: f32) {
        self.record(Output::Steer(degrees));
    }

    fn set_arm(&mut self, degrees: f32) {
        self.record(Output::Arm(degrees));
    }

    fn set_drive(&mut self, power: f32) {
        self.record(Output::Drive(power));
    }
}

pub struct MockAudio {
    rig: Rig,
}

impl Audio for MockAudio {
    async fn track_count(&mut self) -> Result<u16, AudioError> {
        Ok(self.rig.tracks.get())
    }

    async fn set_volume(&mut self, volume: u8) -> Result<(), AudioError> {
        self.rig.volume.set(Some(volume));
        Ok(())
    }

    async fn play(&mut self, track: u16) -> Result<(), AudioError> {
        self.rig.playing.set(Some(track));
        Ok(())
    }

    async fn stop(&mut self) {
        self.rig.playing.set(None);
        self.rig.audio_stopped.set(true);
    }
}

pub struct TestRobot;

impl Platform for TestRobot {
    type Camera = MockCamera;
    type Engine = MockEngine;
    type InputBuffer = Vec<u8>;
    type Ranger = MockRanger;
    type Grayscale = MockFloor;
    type Actuators = MockActuators;
    type Audio = MockAudio;
    type Clock = VirtualClock;
}

/// Default configuration on the small test frames
pub fn test_config() -> HuntConfig {
    HuntConfig {
        perception: PerceptionConfig {
            input_size: INPUT_SIZE,
            ..PerceptionConfig::default()
        },
        ..HuntConfig::default()
    }
}

pub fn try_build(rig: &Rig, config: HuntConfig) -> Result<Hunt<TestRobot>, StartupError> {
    let parts = Parts::<TestRobot> {
        camera: MockCamera { rig: rig.clone() },
        engine: MockEngine { rig: rig.clone() },
        input: vec![0; Letterbox::buffer_len(config.perception.input_size)],
        ranger: MockRanger { rig: rig.clone() },
        grayscale: MockFloor { rig: rig.clone() },
        actuators: MockActuators { rig: rig.clone() },
        audio: MockAudio { rig: rig.clone() },
        clock: VirtualClock { rig: rig.clone() },
    };
    Hunt::new(parts, config, 7)
}

pub fn build(rig: &Rig, config: HuntConfig) -> Hunt<TestRobot> {
    try_build(rig, config).unwrap()
}

/// A hunt that has passed its startup checks
pub fn armed(rig: &Rig) -> Hunt<TestRobot> {
    let mut hunt = build(rig, test_config());
    block_on(hunt.arm()).unwrap();
    hunt
}

pub fn cycle(hunt: &mut Hunt<TestRobot>) {
    block_on(hunt.cycle()).unwrap();
}

/// Cycles until `done` holds, panicking after `limit` cycles
pub fn cycle_until(
    hunt: &mut Hunt<TestRobot>,
    limit: usize,
    mut done: impl FnMut(&Hunt<TestRobot>) -> bool,
) -> usize {
    for n in 1..=limit {
        cycle(hunt);
        if done(hunt) {
            return n;
        }
    }
    panic!("condition not reached in {} cycles, state {:?}", limit, hunt.state());
}
