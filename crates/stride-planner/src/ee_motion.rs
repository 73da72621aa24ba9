//! Phase-sequenced motion of a single endeffector
//!
//! One foot alternates between stance phases, where it rests on a
//! contact, and swing phases, where it follows a [`SwingTrajectory`]
//! to the next contact:
//!
//! ```text
//! phase     stance     swing      stance     swing      stance
//! contacts  [c₀]  ───▶ c₀→c₁ ───▶ [c₁]  ───▶ c₁→c₂ ───▶ [c₂]
//! ```
//!
//! Contact `c₀` is the fixed initial foothold. Every contact reached by a
//! swing contributes its horizontal position to the parameter vector,
//! in the order the swings occur:
//!
//! ```text
//! x = [c₁ₓ, c₁ᵧ, c₂ₓ, c₂ᵧ, ...]     index(cₖ, d) = 2(k - 1) + d
//! ```
//!
//! Global times outside `[0, total_time]` are clamped to that interval,
//! since sampling grids routinely probe the closed end point.

use std::fmt;

use nalgebra::DVector;
use thiserror::Error;
use tracing::{debug, trace, warn};

use stride_core::{
    CartesianState, Contact, Coord2, Coord3, EndeffectorId, SwingTrajectory, Vec3,
    DEFAULT_LIFT_HEIGHT,
};

use crate::jacobian::JacobianRow;

/// Errors raised while building or updating an endeffector motion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("Initial position already set for endeffector {0}")]
    AlreadyInitialized(EndeffectorId),
    #[error("Initial position must be set before adding phases")]
    NotInitialized,
    #[error("Phase duration must be positive and finite, got {0}")]
    NonPositiveDuration(f64),
    #[error("Lift height must be non-negative and finite, got {0}")]
    InvalidLiftHeight(f64),
    #[error("Contact {contact} got a non-finite coordinate")]
    NonFiniteCoordinate { contact: usize },
    #[error("Phase sequence must start in stance")]
    StartsInSwing,
    #[error("Phase sequence must end in stance")]
    EndsInSwing,
    #[error("Phase sequence is empty")]
    NoPhases,
    #[error("A {0} phase cannot follow another {0} phase")]
    RepeatedPhase(PhaseKind),
    #[error("Invalid parameter dimension: expected {expected}, got {got}")]
    InvalidParameterDimension { expected: usize, got: usize },
    #[error("Contact {0} is fixed and has no optimization parameter")]
    FixedContact(usize),
    #[error("Contact index {index} out of range ({count} contacts)")]
    ContactOutOfRange { index: usize, count: usize },
}

/// Type of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// Foot planted on a contact
    Stance,
    /// Foot moving between two contacts
    Swing,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Stance => write!(f, "stance"),
            PhaseKind::Swing => write!(f, "swing"),
        }
    }
}

/// One phase of the sequence
///
/// Contacts are referenced by index into the owning motion's contact
/// list, so moving a contact is immediately visible to every phase
/// standing on it.
#[derive(Debug, Clone)]
pub struct Phase {
    duration: f64,
    start_contact: usize,
    end_contact: usize,
    swing: Option<SwingTrajectory>,
}

impl Phase {
    /// Phase duration [s]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn kind(&self) -> PhaseKind {
        if self.swing.is_some() {
            PhaseKind::Swing
        } else {
            PhaseKind::Stance
        }
    }

    pub fn is_swing(&self) -> bool {
        self.swing.is_some()
    }

    /// Contact the foot is on when the phase begins
    pub fn start_contact(&self) -> usize {
        self.start_contact
    }

    /// Contact the foot is on when the phase ends
    pub fn end_contact(&self) -> usize {
        self.end_contact
    }

    /// Trajectory followed during a swing phase
    pub fn swing(&self) -> Option<&SwingTrajectory> {
        self.swing.as_ref()
    }
}

/// Motion of one endeffector over the whole horizon
///
/// Built once from a contact schedule, then read and rewritten by the
/// solver loop through [`optimization_parameters`](Self::optimization_parameters)
/// and [`set_optimization_parameters`](Self::set_optimization_parameters).
#[derive(Debug, Clone, Default)]
pub struct EndeffectorMotion {
    ee: Option<EndeffectorId>,
    contacts: Vec<Contact>,
    phases: Vec<Phase>,
    /// Global time at which each phase ends (cumulative durations)
    phase_end_times: Vec<f64>,
}

impl EndeffectorMotion {
    /// Create an empty motion; call [`set_initial_pos`](Self::set_initial_pos) next
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a motion already standing on its initial foothold
    pub fn with_initial_pos(position: Vec3, ee: EndeffectorId) -> Self {
        Self {
            ee: Some(ee),
            contacts: vec![Contact::new(position, ee)],
            ..Default::default()
        }
    }

    /// Set the fixed initial foothold and the endeffector identity
    pub fn set_initial_pos(&mut self, position: Vec3, ee: EndeffectorId) -> Result<(), MotionError> {
        if let Some(existing) = self.ee {
            return Err(MotionError::AlreadyInitialized(existing));
        }
        self.ee = Some(ee);
        self.contacts.push(Contact::new(position, ee));
        Ok(())
    }

    /// Append a stance phase on the current last contact
    pub fn add_stance_phase(&mut self, duration: f64) -> Result<(), MotionError> {
        self.check_next_phase(duration, PhaseKind::Stance)?;

        let contact = self.contacts.len() - 1;
        self.push_phase(Phase {
            duration,
            start_contact: contact,
            end_contact: contact,
            swing: None,
        });
        Ok(())
    }

    /// Append a swing phase to `target` with the default lift height
    pub fn add_swing_phase(&mut self, duration: f64, target: Vec3) -> Result<(), MotionError> {
        self.add_swing_phase_with_lift(duration, target, DEFAULT_LIFT_HEIGHT)
    }

    /// Append a swing phase to a new contact at `target`
    ///
    /// `lift_height` must be non-negative and finite.
    pub fn add_swing_phase_with_lift(
        &mut self,
        duration: f64,
        target: Vec3,
        lift_height: f64,
    ) -> Result<(), MotionError> {
        self.check_next_phase(duration, PhaseKind::Swing)?;
        let ee = self.ee.ok_or(MotionError::NotInitialized)?;
        if !(lift_height >= 0.0 && lift_height.is_finite()) {
            return Err(MotionError::InvalidLiftHeight(lift_height));
        }

        let start_contact = self.contacts.len() - 1;
        let start = self.contacts[start_contact].position;
        self.contacts.push(Contact::new(target, ee));

        self.push_phase(Phase {
            duration,
            start_contact,
            end_contact: start_contact + 1,
            swing: Some(SwingTrajectory::new(&start, &target, duration, lift_height)),
        });
        Ok(())
    }

    /// Move a contact horizontally and re-fit the swings touching it
    ///
    /// The vertical coordinate stays at ground height. The initial
    /// contact is fixed and cannot be moved.
    pub fn update_contact_position(&mut self, contact: usize, position: &Vec3) -> Result<(), MotionError> {
        self.check_free_contact(contact)?;
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(MotionError::NonFiniteCoordinate { contact });
        }

        self.contacts[contact].set_xy(&position.xy());
        for phase in self.phases.iter_mut() {
            if phase.start_contact == contact || phase.end_contact == contact {
                Self::refit_swing(phase, &self.contacts);
            }
        }
        trace!(ee = ?self.ee, contact, x = position.x, y = position.y, "moved contact");
        Ok(())
    }

    /// Check that the sequence is usable for optimization
    ///
    /// The sequence must contain at least one phase and end in stance.
    pub fn validate(&self) -> Result<(), MotionError> {
        match self.phases.last() {
            None => Err(MotionError::NoPhases),
            Some(phase) if phase.is_swing() => Err(MotionError::EndsInSwing),
            Some(_) => Ok(()),
        }
    }

    /// Resolve a global time into `(phase index, local time)`
    ///
    /// Each phase covers `[start, end)`, except the last which also
    /// contains the end of the horizon. Times outside `[0, total_time]`
    /// are clamped.
    ///
    /// # Panics
    /// If no phase has been added or `t_global` is NaN.
    pub fn phase_at(&self, t_global: f64) -> (usize, f64) {
        assert!(!self.phases.is_empty(), "motion of {:?} has no phases", self.ee);
        assert!(!t_global.is_nan(), "query time is NaN");

        let t_total = self.total_time();
        let t = if t_global < 0.0 || t_global > t_total {
            trace!(t_global, t_total, "clamping query time to horizon");
            t_global.clamp(0.0, t_total)
        } else {
            t_global
        };

        let last = self.phases.len() - 1;
        let idx = self.phase_end_times.partition_point(|&end| end <= t).min(last);
        let t_start = if idx == 0 { 0.0 } else { self.phase_end_times[idx - 1] };
        let t_local = (t - t_start).clamp(0.0, self.phases[idx].duration);

        (idx, t_local)
    }

    /// Foot state at a global time
    pub fn state(&self, t_global: f64) -> CartesianState {
        let (idx, t_local) = self.phase_at(t_global);
        let phase = &self.phases[idx];
        match &phase.swing {
            Some(swing) => swing.evaluate(t_local),
            None => CartesianState::at_rest(self.contacts[phase.start_contact].position),
        }
    }

    /// Whether the foot is planted at a global time
    pub fn is_in_contact(&self, t_global: f64) -> bool {
        let (idx, _) = self.phase_at(t_global);
        !self.phases[idx].is_swing()
    }

    /// Contacts active at a global time
    ///
    /// Empty while swinging, otherwise the single contact of the stance phase.
    pub fn contacts_at(&self, t_global: f64) -> Vec<Contact> {
        let (idx, _) = self.phase_at(t_global);
        let phase = &self.phases[idx];
        if phase.is_swing() {
            Vec::new()
        } else {
            vec![self.contacts[phase.start_contact]]
        }
    }

    /// Sum of all phase durations [s]
    pub fn total_time(&self) -> f64 {
        self.phase_end_times.last().copied().unwrap_or(0.0)
    }

    /// Horizontal position of every swing target, in phase order
    pub fn optimization_parameters(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.num_parameters());
        for (k, contact) in self.contacts.iter().enumerate().skip(1) {
            for d in Coord2::ALL {
                x[Self::parameter_index(k, d)] = contact.position[d.index()];
            }
        }
        x
    }

    /// Overwrite every swing target from a parameter vector
    pub fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), MotionError> {
        let expected = self.num_parameters();
        if x.len() != expected {
            warn!(ee = ?self.ee, expected, got = x.len(), "rejected parameter vector");
            return Err(MotionError::InvalidParameterDimension { expected, got: x.len() });
        }
        if let Some(col) = x.iter().position(|v| !v.is_finite()) {
            warn!(ee = ?self.ee, col, "rejected non-finite parameter");
            return Err(MotionError::NonFiniteCoordinate { contact: col / 2 + 1 });
        }

        for (k, contact) in self.contacts.iter_mut().enumerate().skip(1) {
            for d in Coord2::ALL {
                contact.position[d.index()] = x[Self::parameter_index(k, d)];
            }
        }
        self.update_swing_motions();
        Ok(())
    }

    /// Column of a contact's horizontal coordinate in the parameter vector
    pub fn index(&self, contact: usize, dim: Coord2) -> Result<usize, MotionError> {
        self.check_free_contact(contact)?;
        Ok(Self::parameter_index(contact, dim))
    }

    /// Sparse row `∂position[dim](t)/∂x`
    ///
    /// Identically zero (no entries) during stance. During a swing the
    /// row holds the target contact's columns and, unless the swing
    /// starts on the fixed initial contact, the start contact's columns.
    pub fn jacobian_pos(&self, t_global: f64, dim: Coord3) -> JacobianRow {
        let (idx, t_local) = self.phase_at(t_global);
        let phase = &self.phases[idx];

        let mut row = JacobianRow::new();
        let Some(swing) = &phase.swing else {
            return row;
        };

        let d_target = swing.jacobian_wrt_target(t_local, dim);
        for d in Coord2::ALL {
            row.add(Self::parameter_index(phase.end_contact, d), d_target[d.index()]);
        }

        if phase.start_contact > 0 {
            let d_start = swing.jacobian_wrt_start(t_local, dim);
            for d in Coord2::ALL {
                row.add(Self::parameter_index(phase.start_contact, d), d_start[d.index()]);
            }
        }
        row
    }

    /// Length of the parameter vector (two per swing phase)
    pub fn num_parameters(&self) -> usize {
        2 * self.contacts.len().saturating_sub(1)
    }

    pub fn num_swing_phases(&self) -> usize {
        self.phases.iter().filter(|p| p.is_swing()).count()
    }

    pub fn endeffector(&self) -> Option<EndeffectorId> {
        self.ee
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Global time at which each phase ends
    pub fn phase_end_times(&self) -> &[f64] {
        &self.phase_end_times
    }

    /// Re-fit every swing to the current contact positions
    fn update_swing_motions(&mut self) {
        for phase in self.phases.iter_mut() {
            Self::refit_swing(phase, &self.contacts);
        }
        debug!(ee = ?self.ee, swings = self.num_swing_phases(), "updated swing motions");
    }

    fn refit_swing(phase: &mut Phase, contacts: &[Contact]) {
        if let Some(swing) = phase.swing.as_mut() {
            swing.set_contacts(
                &contacts[phase.start_contact].position,
                &contacts[phase.end_contact].position,
            );
        }
    }

    fn parameter_index(contact: usize, dim: Coord2) -> usize {
        debug_assert!(contact > 0, "initial contact has no parameter");
        2 * (contact - 1) + dim.index()
    }

    fn check_free_contact(&self, contact: usize) -> Result<(), MotionError> {
        if contact >= self.contacts.len() {
            return Err(MotionError::ContactOutOfRange {
                index: contact,
                count: self.contacts.len(),
            });
        }
        if contact == 0 {
            return Err(MotionError::FixedContact(0));
        }
        Ok(())
    }

    fn check_next_phase(&self, duration: f64, kind: PhaseKind) -> Result<(), MotionError> {
        if self.ee.is_none() {
            return Err(MotionError::NotInitialized);
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(MotionError::NonPositiveDuration(duration));
        }
        match (self.phases.last().map(Phase::kind), kind) {
            (None, PhaseKind::Swing) => Err(MotionError::StartsInSwing),
            (Some(prev), next) if prev == next => Err(MotionError::RepeatedPhase(next)),
            _ => Ok(()),
        }
    }

    fn push_phase(&mut self, phase: Phase) {
        debug_assert_eq!(
            phase.end_contact,
            phase.start_contact + usize::from(phase.is_swing()),
            "phase boundary contacts inconsistent with phase type"
        );
        assert!(phase.end_contact < self.contacts.len(), "phase references missing contact");

        let t_end = self.total_time() + phase.duration;
        self.phase_end_times.push(t_end);
        self.phases.push(phase);
    }
}
