//! Linear state of a point in space

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// Position and its first two time derivatives
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianState {
    /// Position [m] (world frame)
    pub position: Vec3,
    /// Velocity [m/s] (world frame)
    pub velocity: Vec3,
    /// Acceleration [m/s²] (world frame)
    pub acceleration: Vec3,
}

impl Default for CartesianState {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
        }
    }
}

impl CartesianState {
    /// A point resting at `position`
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Whether velocity and acceleration both vanish within `tolerance`
    pub fn is_at_rest(&self, tolerance: f64) -> bool {
        self.velocity.norm() < tolerance && self.acceleration.norm() < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_rest() {
        let state = CartesianState::at_rest(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(state.is_at_rest(1e-12));

        let moving = CartesianState {
            velocity: Vec3::new(0.0, 0.1, 0.0),
            ..state
        };
        assert!(!moving.is_at_rest(1e-3));
    }
}
