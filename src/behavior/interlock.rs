//! Safety Interlock
//!
//! Checked once per cycle before any state handler runs, and between the
//! polls of a drive burst. A cliff under any grayscale channel runs the
//! escape maneuver to completion; the caller then resets the hunt to SWEEP.
//! Nothing else runs in a cycle in which the interlock fired.

use nanorand::{Rng, WyRand};

use crate::adapter::actuation::Actuation;
use crate::adapter::sensor::Sensors;
use crate::maneuver::cliff::{self, Side};
use crate::system::clock::Clock;
use crate::system::config::CliffConfig;
use crate::system::platform::{ActuatorDriver, GrayscaleSensor, RangeFinder};

pub struct SafetyInterlock {
    config: CliffConfig,
    rng: WyRand,
}

impl SafetyInterlock {
    /// `seed` picks the sequence of escape turn sides
    pub fn new(config: CliffConfig, seed: u64) -> Self {
        Self {
            config,
            rng: WyRand::new_seed(seed),
        }
    }

    /// Reads the cliff sensors and escapes if needed
    ///
    /// Returns true when the escape ran.
    pub async fn check<R, G, D, C>(
        &mut self,
        sensors: &mut Sensors<R, G>,
        actuation: &mut Actuation<D>,
        clock: &mut C,
    ) -> bool
    where
        R: RangeFinder,
        G: GrayscaleSensor,
        D: ActuatorDriver,
        C: Clock,
    {
        if !sensors.read_cliff().await {
            return false;
        }
        let side = self.pick_side();
        warn!("cliff detected, escaping {:?}", side);
        actuation.perform(&cliff::escape(&self.config, side), clock).await;
        true
    }

    fn pick_side(&mut self) -> Side {
        if self.rng.generate::<bool>() {
            Side::Left
        } else {
            Side::Right
        }
    }
}
