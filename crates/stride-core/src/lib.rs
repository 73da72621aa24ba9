//! # Stride Core
//!
//! Building blocks for optimizing the motion of legged robots:
//! footholds, swing-leg trajectories and the small amount of math
//! they share.
//!
//! ## Modules
//!
//! - [`math`]: Coordinate selectors and cubic Hermite segments
//! - [`state`]: Linear (position/velocity/acceleration) state of a point
//! - [`contact`]: Footholds tagged with the endeffector they belong to
//! - [`swing`]: Swing-leg trajectory between two footholds with analytic sensitivities

pub mod math;
pub mod state;
pub mod contact;
pub mod swing;

pub use contact::{Contact, EndeffectorId};
pub use math::{Coord2, Coord3, CubicHermite};
pub use state::CartesianState;
pub use swing::SwingTrajectory;

use nalgebra::{Vector2, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 2D vector type (horizontal plane)
pub type Vec2 = Vector2<f64>;

/// Default height a foot is lifted above the higher of its two footholds [m]
pub const DEFAULT_LIFT_HEIGHT: f64 = 0.03;
