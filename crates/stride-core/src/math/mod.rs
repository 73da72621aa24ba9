//! Mathematical utilities
//!
//! Coordinate selectors used to address single components of a
//! Cartesian vector, and the cubic Hermite segment the swing
//! trajectories are assembled from.

pub mod coords;
pub mod polynomial;

pub use coords::*;
pub use polynomial::*;
