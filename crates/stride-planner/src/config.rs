//! Motion parameters
//!
//! Everything needed to set up the endeffector variables of a motion
//! optimization problem: the gait timing per foot, the nominal footholds
//! and the shape of the swing trajectories.

use serde::{Deserialize, Serialize};

use stride_core::{Vec3, DEFAULT_LIFT_HEIGHT};

use crate::schedule::{ContactSchedule, ScheduleError};

/// Main motion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionParameters {
    /// Alternating phase durations per endeffector [s]
    pub ee_phase_durations: Vec<Vec<f64>>,
    /// Whether each endeffector starts in contact
    pub ee_in_contact_at_start: Vec<bool>,
    /// Initial foothold of each endeffector (world frame) [m]
    pub nominal_stance: Vec<Vec3>,
    /// Swing trajectory shape
    pub swing: SwingConfig,
    /// Time step used when sampling the optimized motion [s]
    pub sample_dt: f64,
    /// Allowed disagreement between the total durations of the feet [s]
    pub duration_tolerance: f64,
}

impl Default for MotionParameters {
    /// Quadruped trot-like schedule: diagonal leg pairs swing one after another
    fn default() -> Self {
        // LF, RF, LH, RH
        let pair_a = vec![0.3, 0.4, 0.9];
        let pair_b = vec![0.7, 0.4, 0.5];
        Self {
            ee_phase_durations: vec![pair_a.clone(), pair_b.clone(), pair_b, pair_a],
            ee_in_contact_at_start: vec![true; 4],
            nominal_stance: vec![
                Vec3::new(0.3, 0.2, 0.0),
                Vec3::new(0.3, -0.2, 0.0),
                Vec3::new(-0.3, 0.2, 0.0),
                Vec3::new(-0.3, -0.2, 0.0),
            ],
            swing: SwingConfig::default(),
            sample_dt: 0.02,
            duration_tolerance: 1e-6,
        }
    }
}

impl MotionParameters {
    /// Number of endeffectors
    pub fn ee_count(&self) -> usize {
        self.ee_in_contact_at_start.len()
    }

    /// Number of phases of one endeffector
    pub fn phase_count(&self, ee: usize) -> Option<usize> {
        self.ee_phase_durations.get(ee).map(Vec::len)
    }

    /// Contact schedule described by these parameters
    pub fn contact_schedule(&self) -> Result<ContactSchedule, ScheduleError> {
        ContactSchedule::from_durations(
            &self.ee_phase_durations,
            &self.ee_in_contact_at_start,
            self.duration_tolerance,
        )
    }

    /// Total duration shared by all endeffectors [s]
    pub fn total_time(&self) -> Result<f64, ScheduleError> {
        Ok(self.contact_schedule()?.total_time())
    }
}

/// Swing trajectory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingConfig {
    /// Lift height above the higher of the two footholds [m]
    pub lift_height: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            lift_height: DEFAULT_LIFT_HEIGHT,
        }
    }
}
