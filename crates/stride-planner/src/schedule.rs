//! Contact schedule
//!
//! Timing of the gait: for every endeffector an ordered list of phases,
//! each either in contact (stance) or not (swing). All endeffectors must
//! cover the same total duration.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Contact schedule errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("Schedule has no endeffectors")]
    NoEndeffectors,
    #[error("Got phase durations for {durations} endeffectors but start flags for {flags}")]
    EndeffectorCountMismatch { durations: usize, flags: usize },
    #[error("Endeffector {ee} has no phases")]
    NoPhases { ee: usize },
    #[error("Phase {phase} of endeffector {ee} has invalid duration {duration}, expected positive and finite")]
    NonPositiveDuration { ee: usize, phase: usize, duration: f64 },
    #[error("Endeffector {ee} lasts {got}s, expected {expected}s like endeffector 0")]
    TotalTimeMismatch { ee: usize, expected: f64, got: f64 },
}

/// One phase of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePhase {
    /// Phase duration [s]
    pub duration: f64,
    /// Whether the foot is on the ground during this phase
    pub is_contact: bool,
}

impl SchedulePhase {
    pub fn stance(duration: f64) -> Self {
        Self { duration, is_contact: true }
    }

    pub fn swing(duration: f64) -> Self {
        Self { duration, is_contact: false }
    }
}

/// Phases of all endeffectors over a shared horizon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSchedule {
    phases: Vec<Vec<SchedulePhase>>,
    total_time: f64,
}

impl ContactSchedule {
    /// Create a schedule from explicit phases
    ///
    /// Consecutive phases with the same contact flag are merged, so the
    /// stored phases of every endeffector strictly alternate.
    pub fn new(phases: Vec<Vec<SchedulePhase>>, tolerance: f64) -> Result<Self, ScheduleError> {
        if phases.is_empty() {
            return Err(ScheduleError::NoEndeffectors);
        }

        let mut merged = Vec::with_capacity(phases.len());
        for (ee, ee_phases) in phases.into_iter().enumerate() {
            if ee_phases.is_empty() {
                return Err(ScheduleError::NoPhases { ee });
            }
            merged.push(Self::merge_phases(ee, ee_phases)?);
        }

        let totals: Vec<f64> = merged
            .iter()
            .map(|p| p.iter().map(|ph| ph.duration).sum::<f64>())
            .collect();
        let total_time = totals[0];
        for (ee, &got) in totals.iter().enumerate().skip(1) {
            if (got - total_time).abs() > tolerance {
                return Err(ScheduleError::TotalTimeMismatch { ee, expected: total_time, got });
            }
        }

        Ok(Self { phases: merged, total_time })
    }

    /// Create a schedule from alternating phase durations
    ///
    /// The first phase of endeffector `ee` is a stance phase if
    /// `contact_at_start[ee]` is set, a swing phase otherwise.
    pub fn from_durations(
        durations: &[Vec<f64>],
        contact_at_start: &[bool],
        tolerance: f64,
    ) -> Result<Self, ScheduleError> {
        if durations.len() != contact_at_start.len() {
            return Err(ScheduleError::EndeffectorCountMismatch {
                durations: durations.len(),
                flags: contact_at_start.len(),
            });
        }

        let phases = durations
            .iter()
            .zip(contact_at_start)
            .map(|(ee_durations, &first_contact)| {
                ee_durations
                    .iter()
                    .enumerate()
                    .map(|(i, &duration)| SchedulePhase {
                        duration,
                        is_contact: first_contact == (i % 2 == 0),
                    })
                    .collect()
            })
            .collect();

        Self::new(phases, tolerance)
    }

    /// Number of endeffectors
    pub fn ee_count(&self) -> usize {
        self.phases.len()
    }

    /// Phases of one endeffector
    pub fn phases(&self, ee: usize) -> Option<&[SchedulePhase]> {
        self.phases.get(ee).map(Vec::as_slice)
    }

    /// Cumulative end time of every phase of one endeffector [s]
    pub fn phase_end_times(&self, ee: usize) -> Option<Vec<f64>> {
        self.phases(ee).map(|phases| {
            phases
                .iter()
                .scan(0.0, |t_end, phase| {
                    *t_end += phase.duration;
                    Some(*t_end)
                })
                .collect()
        })
    }

    /// Duration shared by all endeffectors [s]
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Contact flag of every endeffector at a global time
    ///
    /// Times outside `[0, total_time]` are clamped.
    ///
    /// # Panics
    /// If `t_global` is NaN.
    pub fn is_in_contact(&self, t_global: f64) -> Vec<bool> {
        assert!(!t_global.is_nan(), "query time is NaN");
        let t = t_global.clamp(0.0, self.total_time);
        self.phases
            .iter()
            .map(|ee_phases| Self::phase_at(ee_phases, t).is_contact)
            .collect()
    }

    fn phase_at(phases: &[SchedulePhase], t: f64) -> &SchedulePhase {
        let mut t_end = 0.0;
        for phase in phases {
            t_end += phase.duration;
            if t < t_end {
                return phase;
            }
        }
        // t at (or numerically past) the end of the horizon
        &phases[phases.len() - 1]
    }

    fn merge_phases(ee: usize, phases: Vec<SchedulePhase>) -> Result<Vec<SchedulePhase>, ScheduleError> {
        let mut merged: Vec<SchedulePhase> = Vec::with_capacity(phases.len());
        for (phase_idx, phase) in phases.into_iter().enumerate() {
            if !phase.duration.is_finite() || phase.duration <= 0.0 {
                return Err(ScheduleError::NonPositiveDuration {
                    ee,
                    phase: phase_idx,
                    duration: phase.duration,
                });
            }
            match merged.last_mut() {
                Some(last) if last.is_contact == phase.is_contact => {
                    debug!(ee, phase = phase_idx, "merging consecutive phases of the same type");
                    last.duration += phase.duration;
                }
                _ => merged.push(phase),
            }
        }
        Ok(merged)
    }
}
