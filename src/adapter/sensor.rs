//! Sensor Adapter
//!
//! Polls the forward ranger and the floor-facing grayscale array.
//!
//! # Range
//! Several raw samples are taken per read. Non-positive samples are invalid
//! echoes and discarded; the median of the rest is scaled to millimetres.
//! The median keeps a single spike from moving the result.
//!
//! # Cliff
//! Each grayscale channel is compared against the reading it gave on the
//! calibration floor. A channel reading at or below
//! `reference * (1 - tolerance)` sees a drop-off (less light comes back).

use heapless::Vec;

use crate::system::config::{CliffConfig, RangeConfig, MAX_RANGE_SAMPLES};
use crate::system::geometry::median;
use crate::system::platform::{GrayscaleSensor, RangeFinder, GRAYSCALE_CHANNELS};

/// Grayscale readings of safe floor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CliffCalibration {
    pub reference: [u16; GRAYSCALE_CHANNELS],
    pub tolerance: f32,
}

impl CliffCalibration {
    /// True when any channel indicates a drop-off
    pub fn is_drop_off(&self, live: [u16; GRAYSCALE_CHANNELS]) -> bool {
        live.iter().zip(self.reference.iter()).any(|(live, reference)| {
            f32::from(*live) <= f32::from(*reference) * (1.0 - self.tolerance)
        })
    }
}

/// Median of the valid (positive) samples, in raw units
pub fn median_of_valid(samples: &[f32]) -> Option<f32> {
    let mut valid: Vec<f32, MAX_RANGE_SAMPLES> = samples
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .take(MAX_RANGE_SAMPLES)
        .collect();
    median(&mut valid)
}

/// Ranger and cliff sensors
pub struct Sensors<R, G> {
    ranger: R,
    grayscale: G,
    calibration: CliffCalibration,
    mm_per_unit: f32,
}

impl<R: RangeFinder, G: GrayscaleSensor> Sensors<R, G> {
    pub fn new(ranger: R, grayscale: G, range: &RangeConfig, cliff: &CliffConfig) -> Self {
        Self {
            ranger,
            grayscale,
            calibration: CliffCalibration {
                reference: cliff.reference,
                tolerance: cliff.tolerance,
            },
            mm_per_unit: range.mm_per_unit,
        }
    }

    /// Median distance over `samples` raw readings, `None` if all were invalid
    pub async fn read_distance_mm(&mut self, samples: usize) -> Option<f32> {
        let mut raw: Vec<f32, MAX_RANGE_SAMPLES> = Vec::new();
        for _ in 0..samples.min(MAX_RANGE_SAMPLES) {
            // capacity checked by the loop bound
            let _ = raw.push(self.ranger.read().await);
        }
        median_of_valid(&raw).map(|units| units * self.mm_per_unit)
    }

    /// True when the floor drops away under any grayscale channel
    pub async fn read_cliff(&mut self) -> bool {
        let live = self.grayscale.read_grayscale().await;
        let cliff = self.calibration.is_drop_off(live);
        if cliff {
            debug!("grayscale {:?} under reference {:?}", live, self.calibration.reference);
        }
        cliff
    }

    /// Replaces the calibrated floor reference
    pub fn set_cliff_reference(&mut self, reference: [u16; GRAYSCALE_CHANNELS]) {
        self.calibration.reference = reference;
    }

    pub fn calibration(&self) -> &CliffCalibration {
        &self.calibration
    }
}
