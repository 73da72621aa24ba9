//! Motion of all endeffectors
//!
//! Stacks one [`EndeffectorMotion`] per foot into a single variable set.
//! The parameter vector is endeffector-major:
//!
//! ```text
//! x = [x_ee0 | x_ee1 | ... | x_eeN]
//! ```
//!
//! where every block follows the layout of [`EndeffectorMotion`].

use nalgebra::DVector;
use thiserror::Error;
use tracing::{debug, warn};

use stride_core::{CartesianState, Contact, Coord2, Coord3, EndeffectorId, Vec3};

use crate::config::{MotionParameters, SwingConfig};
use crate::ee_motion::{EndeffectorMotion, MotionError};
use crate::jacobian::JacobianRow;
use crate::schedule::{ContactSchedule, ScheduleError};

/// Errors of the stacked endeffector motion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EndeffectorsError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("Motion error for endeffector {ee}: {source}")]
    Motion {
        ee: EndeffectorId,
        #[source]
        source: MotionError,
    },
    #[error("Got {got} initial footholds for {expected} endeffectors")]
    InitialPositionCount { expected: usize, got: usize },
    #[error("Endeffector {0} does not exist")]
    UnknownEndeffector(EndeffectorId),
    #[error("Invalid parameter dimension: expected {expected}, got {got}")]
    InvalidParameterDimension { expected: usize, got: usize },
    #[error("Sample step must be positive, got {0}")]
    InvalidSampleStep(f64),
}

/// Motions of every endeffector of the robot
#[derive(Debug, Clone)]
pub struct EndeffectorsMotion {
    motions: Vec<EndeffectorMotion>,
    /// First column of each endeffector's block in the stacked vector
    offsets: Vec<usize>,
}

impl EndeffectorsMotion {
    /// Build the motions from initial footholds and a contact schedule
    ///
    /// Every swing target starts at the foothold it departs from; the
    /// solver moves it from there.
    pub fn new(
        initial_positions: &[Vec3],
        schedule: &ContactSchedule,
        swing: &SwingConfig,
    ) -> Result<Self, EndeffectorsError> {
        if initial_positions.len() != schedule.ee_count() {
            return Err(EndeffectorsError::InitialPositionCount {
                expected: schedule.ee_count(),
                got: initial_positions.len(),
            });
        }

        let mut motions = Vec::with_capacity(initial_positions.len());
        for (idx, position) in initial_positions.iter().enumerate() {
            let ee = EndeffectorId(idx);
            let phases = schedule
                .phases(idx)
                .ok_or(EndeffectorsError::UnknownEndeffector(ee))?;

            let mut motion = EndeffectorMotion::with_initial_pos(*position, ee);
            for phase in phases {
                let added = if phase.is_contact {
                    motion.add_stance_phase(phase.duration)
                } else {
                    motion.add_swing_phase_with_lift(phase.duration, *position, swing.lift_height)
                };
                added.map_err(|source| EndeffectorsError::Motion { ee, source })?;
            }
            motion
                .validate()
                .map_err(|source| EndeffectorsError::Motion { ee, source })?;
            motions.push(motion);
        }

        let motion = Self::from_motions(motions);
        debug!(
            endeffectors = motion.ee_count(),
            parameters = motion.num_parameters(),
            total_time = schedule.total_time(),
            "built endeffector motions"
        );
        Ok(motion)
    }

    /// Build the motions described by a parameter set
    pub fn from_parameters(params: &MotionParameters) -> Result<Self, EndeffectorsError> {
        let schedule = params.contact_schedule()?;
        Self::new(&params.nominal_stance, &schedule, &params.swing)
    }

    /// Stack already validated motions, in endeffector order
    fn from_motions(motions: Vec<EndeffectorMotion>) -> Self {
        let offsets = motions
            .iter()
            .scan(0, |next, m| {
                let offset = *next;
                *next += m.num_parameters();
                Some(offset)
            })
            .collect();
        Self { motions, offsets }
    }

    /// Number of endeffectors
    pub fn ee_count(&self) -> usize {
        self.motions.len()
    }

    /// Motion of one endeffector
    pub fn motion(&self, ee: EndeffectorId) -> Result<&EndeffectorMotion, EndeffectorsError> {
        self.motions
            .get(ee.index())
            .ok_or(EndeffectorsError::UnknownEndeffector(ee))
    }

    /// All motions in endeffector order
    pub fn motions(&self) -> &[EndeffectorMotion] {
        &self.motions
    }

    /// Duration of the motion [s]
    ///
    /// Taken from the first endeffector; all of them agree by construction
    /// from a [`ContactSchedule`].
    pub fn total_time(&self) -> f64 {
        self.motions.first().map_or(0.0, EndeffectorMotion::total_time)
    }

    /// State of every foot at a global time
    pub fn states_at(&self, t_global: f64) -> Vec<CartesianState> {
        self.motions.iter().map(|m| m.state(t_global)).collect()
    }

    /// Contact flag of every foot at a global time
    pub fn contact_flags(&self, t_global: f64) -> Vec<bool> {
        self.motions.iter().map(|m| m.is_in_contact(t_global)).collect()
    }

    /// All footholds in use at a global time
    ///
    /// This is the support set the stability checks build their polygon from.
    pub fn contacts_in_stance(&self, t_global: f64) -> Vec<Contact> {
        self.motions
            .iter()
            .flat_map(|m| m.contacts_at(t_global))
            .collect()
    }

    /// Length of the stacked parameter vector
    pub fn num_parameters(&self) -> usize {
        self.motions.iter().map(EndeffectorMotion::num_parameters).sum()
    }

    /// Stacked parameters of all endeffectors
    pub fn optimization_parameters(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.num_parameters());
        for (motion, &offset) in self.motions.iter().zip(&self.offsets) {
            let block = motion.optimization_parameters();
            x.rows_mut(offset, block.len()).copy_from(&block);
        }
        x
    }

    /// Distribute a stacked parameter vector to the endeffectors
    pub fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), EndeffectorsError> {
        let expected = self.num_parameters();
        if x.len() != expected {
            warn!(expected, got = x.len(), "rejected stacked parameter vector");
            return Err(EndeffectorsError::InvalidParameterDimension { expected, got: x.len() });
        }

        for (idx, (motion, &offset)) in self.motions.iter_mut().zip(&self.offsets).enumerate() {
            let block = &x[offset..offset + motion.num_parameters()];
            motion
                .set_optimization_parameters(block)
                .map_err(|source| EndeffectorsError::Motion { ee: EndeffectorId(idx), source })?;
        }
        Ok(())
    }

    /// Column of a contact coordinate in the stacked vector
    pub fn index(&self, ee: EndeffectorId, contact: usize, dim: Coord2) -> Result<usize, EndeffectorsError> {
        let local = self
            .motion(ee)?
            .index(contact, dim)
            .map_err(|source| EndeffectorsError::Motion { ee, source })?;
        Ok(self.offsets[ee.index()] + local)
    }

    /// Sparse row `∂position[dim](t)/∂x` of one foot, in stacked columns
    pub fn jacobian_pos(&self, t_global: f64, ee: EndeffectorId, dim: Coord3) -> Result<JacobianRow, EndeffectorsError> {
        let row = self.motion(ee)?.jacobian_pos(t_global, dim);
        Ok(row.shifted(self.offsets[ee.index()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadruped() -> EndeffectorsMotion {
        EndeffectorsMotion::from_parameters(&MotionParameters::default()).unwrap()
    }

    #[test]
    fn test_build_from_default_parameters() {
        let motion = quadruped();

        assert_eq!(motion.ee_count(), 4);
        assert_relative_eq!(motion.total_time(), 1.6, epsilon = 1e-9);
        // One swing per leg, two parameters each
        assert_eq!(motion.num_parameters(), 8);
        for m in motion.motions() {
            assert_relative_eq!(m.total_time(), 1.6, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_swing_targets_start_at_initial_footholds() {
        let params = MotionParameters::default();
        let motion = EndeffectorsMotion::from_parameters(&params).unwrap();

        let x = motion.optimization_parameters();
        for (ee, stance) in params.nominal_stance.iter().enumerate() {
            assert_relative_eq!(x[2 * ee], stance.x);
            assert_relative_eq!(x[2 * ee + 1], stance.y);
        }
    }

    #[test]
    fn test_initial_position_count_checked() {
        let params = MotionParameters::default();
        let schedule = params.contact_schedule().unwrap();
        let err = EndeffectorsMotion::new(&params.nominal_stance[..2], &schedule, &params.swing).unwrap_err();
        assert_eq!(err, EndeffectorsError::InitialPositionCount { expected: 4, got: 2 });
    }

    #[test]
    fn test_schedule_starting_in_swing_rejected() {
        let schedule = ContactSchedule::from_durations(&[vec![0.4, 0.6]], &[false], 1e-9).unwrap();
        let err = EndeffectorsMotion::new(&[Vec3::zeros()], &schedule, &SwingConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EndeffectorsError::Motion { ee: EndeffectorId(0), source: MotionError::StartsInSwing }
        );
    }

    #[test]
    fn test_schedule_ending_in_swing_rejected() {
        let schedule = ContactSchedule::from_durations(&[vec![0.4, 0.6]], &[true], 1e-9).unwrap();
        let err = EndeffectorsMotion::new(&[Vec3::zeros()], &schedule, &SwingConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EndeffectorsError::Motion { ee: EndeffectorId(0), source: MotionError::EndsInSwing }
        );
    }

    #[test]
    fn test_invalid_lift_height_in_config_rejected() {
        let params = MotionParameters {
            swing: SwingConfig { lift_height: -0.05 },
            ..Default::default()
        };
        assert_eq!(
            EndeffectorsMotion::from_parameters(&params).unwrap_err(),
            EndeffectorsError::Motion { ee: EndeffectorId(0), source: MotionError::InvalidLiftHeight(-0.05) }
        );
    }

    #[test]
    fn test_stacked_layout() {
        let mut motion = quadruped();
        let x: Vec<f64> = (0..8).map(|i| 0.1 * i as f64).collect();
        motion.set_optimization_parameters(&x).unwrap();

        assert_eq!(motion.index(EndeffectorId(2), 1, Coord2::Y).unwrap(), 5);
        let rh = motion.motion(EndeffectorId(3)).unwrap();
        assert_relative_eq!(rh.contacts()[1].position.x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(rh.contacts()[1].position.y, 0.7, epsilon = 1e-12);
        assert_eq!(motion.optimization_parameters().as_slice(), x.as_slice());
    }

    #[test]
    fn test_jacobian_in_stacked_columns() {
        let motion = quadruped();

        // RF swings during [0.7, 1.1)
        let row = motion.jacobian_pos(0.9, EndeffectorId(1), Coord3::X).unwrap();
        assert_eq!(row.iter().map(|(c, _)| c).collect::<Vec<_>>(), vec![2, 3]);
        assert_relative_eq!(row.get(2), 0.5, epsilon = 1e-9);

        assert!(motion.jacobian_pos(0.9, EndeffectorId(0), Coord3::X).unwrap().is_empty());
        assert_eq!(
            motion.jacobian_pos(0.9, EndeffectorId(7), Coord3::X).unwrap_err(),
            EndeffectorsError::UnknownEndeffector(EndeffectorId(7))
        );
    }

    #[test]
    fn test_contacts_in_stance() {
        let motion = quadruped();

        // All four feet planted
        assert_eq!(motion.contacts_in_stance(0.1).len(), 4);
        // LF and RH swing during [0.3, 0.7)
        let support = motion.contacts_in_stance(0.5);
        let feet: Vec<_> = support.iter().map(|c| c.ee).collect();
        assert_eq!(feet, vec![EndeffectorId(1), EndeffectorId(2)]);
        assert_eq!(motion.contact_flags(0.5), vec![false, true, true, false]);
    }

    #[test]
    fn test_wrong_stacked_length_rejected() {
        let mut motion = quadruped();
        assert_eq!(
            motion.set_optimization_parameters(&[0.0; 3]),
            Err(EndeffectorsError::InvalidParameterDimension { expected: 8, got: 3 })
        );
    }
}
