//! Perception Adapter
//!
//! Wraps the detection engine. A call to [`Perception::detect`]:
//! 1. letterboxes the frame into the square detector input
//! 2. runs the engine once, raced against the inference timeout
//! 3. drops detections under the confidence threshold or outside the wanted
//!    labels
//! 4. maps the survivors back into frame coordinates
//! 5. returns the most confident one (first seen wins a tie)
//!
//! Engine failures and timeouts are logged and reported as "nothing seen".

use embassy_futures::select::{select, Either};
use embassy_time::Duration;

use crate::system::clock::Clock;
use crate::system::config::PerceptionConfig;
use crate::system::error::{ConfigError, EngineError};
use crate::system::geometry::{BoundingBox, Letterbox};
use crate::system::labels::{label_for, LabelSet};
use crate::system::platform::{DetectionEngine, Frame, RawDetection};

/// A detection in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Detection {
    pub label: &'static str,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A detection together with the size of the frame it was found in
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sighting {
    pub detection: Detection,
    pub frame_width: u16,
    pub frame_height: u16,
}

impl Sighting {
    /// Pixel error of the box centre from the frame centre, `(x, y)`
    ///
    /// Positive x is right of centre, positive y is below centre.
    pub fn offset(&self) -> (f32, f32) {
        let (cx, cy) = self.detection.bbox.center();
        (
            cx - f32::from(self.frame_width) / 2.0,
            cy - f32::from(self.frame_height) / 2.0,
        )
    }
}

/// Detection engine plus the scratch buffer for its input
pub struct Perception<E, B> {
    engine: E,
    input: B,
    size: u16,
    threshold: f32,
    timeout: Duration,
}

impl<E: DetectionEngine, B: AsMut<[u8]>> Perception<E, B> {
    /// Fails when `input` cannot hold a letterboxed image
    pub fn new(engine: E, mut input: B, config: &PerceptionConfig) -> Result<Self, ConfigError> {
        let needed = Letterbox::buffer_len(config.input_size);
        let available = input.as_mut().len();
        if available < needed {
            return Err(ConfigError::InputBuffer { needed, available });
        }
        Ok(Self {
            engine,
            input,
            size: config.input_size,
            threshold: config.confidence_threshold,
            timeout: config.inference_timeout,
        })
    }

    /// Loads the detection model
    pub async fn load(&mut self) -> Result<(), EngineError> {
        self.engine.load().await
    }

    /// Best detection in `frame` whose label is in `wanted`
    pub async fn detect<F: Frame, C: Clock>(
        &mut self,
        frame: &F,
        wanted: LabelSet,
        clock: &mut C,
    ) -> Option<Detection> {
        let Some(letterbox) = Letterbox::new(frame.width(), frame.height(), self.size) else {
            warn!("empty frame {}x{}", frame.width(), frame.height());
            return None;
        };

        let input = &mut self.input.as_mut()[..Letterbox::buffer_len(self.size)];
        letterbox.fill(frame, input);

        let raw = match select(self.engine.infer(input, self.size), clock.sleep(self.timeout)).await {
            Either::First(Ok(raw)) => raw,
            Either::First(Err(e)) => {
                warn!("detection engine failed: {:?}", e);
                return None;
            }
            Either::Second(()) => {
                warn!("detection engine failed: {:?}", EngineError::TimedOut);
                return None;
            }
        };

        best_match(&raw, wanted, self.threshold, &letterbox)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

/// Picks the most confident wanted detection and maps it onto the frame
///
/// Detections under `threshold` (NaN included), unknown class ids or
/// unwanted labels are skipped. Only a strictly greater confidence replaces
/// the current best, so the first of equal detections wins.
pub fn best_match(
    raw: &[RawDetection],
    wanted: LabelSet,
    threshold: f32,
    letterbox: &Letterbox,
) -> Option<Detection> {
    let mut best: Option<Detection> = None;
    for det in raw {
        if !(det.confidence >= threshold && det.confidence <= 1.0) {
            continue;
        }
        let Some(label) = label_for(det.class_id) else {
            continue;
        };
        if !wanted.contains(label) {
            continue;
        }
        if !best.map_or(true, |b| det.confidence > b.confidence) {
            continue;
        }
        best = Some(Detection {
            label,
            bbox: letterbox.to_source(det.bbox),
            confidence: det.confidence,
        });
    }
    if let Some(found) = &best {
        debug!("saw {} ({})", found.label, found.confidence);
    }
    best
}
