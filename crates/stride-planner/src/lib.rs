//! Stride Motion Planner
//!
//! Optimization-variable side of legged trajectory optimization.
//!
//! The motion of every foot is an alternating sequence of stance phases
//! (foot planted on a contact) and swing phases (foot travelling to the
//! next contact). The horizontal coordinates of every contact reached by
//! a swing are free parameters of the nonlinear program:
//!
//! ```text
//! x_ee = [c₁ₓ, c₁ᵧ, c₂ₓ, c₂ᵧ, ..., cₙₓ, cₙᵧ]     (one pair per swing phase)
//! ```
//!
//! For any query time the planner returns the foot state and the sparse
//! row `∂p_d(t)/∂x`, which cost and constraint evaluators stack into the
//! Jacobian handed to the solver.
//!
//! # Components
//!
//! - [`config`]: Motion parameters (phase durations, lift height, sampling)
//! - [`schedule`]: Per-endeffector contact schedule
//! - [`ee_motion`]: Phase-sequenced motion of a single endeffector
//! - [`jacobian`]: Sparse Jacobian rows
//! - [`endeffectors`]: Motion of all endeffectors with a stacked parameter vector
//! - [`variables`]: Registry of variable sets forming the decision vector
//! - [`trajectory`]: Sampling of the optimized motion

pub mod config;
pub mod schedule;
pub mod ee_motion;
pub mod jacobian;
pub mod endeffectors;
pub mod variables;
pub mod trajectory;

// Re-exports
pub use config::{MotionParameters, SwingConfig};
pub use ee_motion::{EndeffectorMotion, MotionError, Phase, PhaseKind};
pub use endeffectors::{EndeffectorsError, EndeffectorsMotion};
pub use jacobian::JacobianRow;
pub use schedule::{ContactSchedule, SchedulePhase, ScheduleError};
pub use trajectory::{sample_trajectory, EndeffectorsSample};
pub use variables::{
    Parametrization, VariableContainer, VariableError, VariableId, VariableSet, VectorVariables,
};
