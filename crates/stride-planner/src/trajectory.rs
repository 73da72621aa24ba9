//! Sampling of the optimized motion
//!
//! Turns a set of endeffector motions into a fixed-step time series, the
//! form in which a solution is exported or played back.

use serde::{Deserialize, Serialize};
use tracing::debug;

use stride_core::CartesianState;

use crate::endeffectors::{EndeffectorsError, EndeffectorsMotion};

/// State of all feet at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndeffectorsSample {
    /// Global time [s]
    pub time: f64,
    /// Foot states in endeffector order
    pub states: Vec<CartesianState>,
    /// Contact flags in endeffector order
    pub in_contact: Vec<bool>,
}

/// Sample every foot at `t = k·dt` for all `t < total_time`
pub fn sample_trajectory(
    motion: &EndeffectorsMotion,
    dt: f64,
) -> Result<Vec<EndeffectorsSample>, EndeffectorsError> {
    if dt.is_nan() || dt <= 0.0 {
        return Err(EndeffectorsError::InvalidSampleStep(dt));
    }

    let total_time = motion.total_time();
    let samples: Vec<_> = (0..)
        .map(|k| k as f64 * dt)
        .take_while(|&t| t < total_time)
        .map(|t| EndeffectorsSample {
            time: t,
            states: motion.states_at(t),
            in_contact: motion.contact_flags(t),
        })
        .collect();

    debug!(samples = samples.len(), dt, total_time, "sampled endeffector motion");
    Ok(samples)
}
