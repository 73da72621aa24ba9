//! Swing-leg trajectory
//!
//! Moves a foot from one foothold to the next through free space.
//!
//! The horizontal components follow a rest-to-rest cubic over the full
//! swing duration `T`:
//!
//! ```text
//! p_xy(t) = p₀ + (p₁ - p₀) h(t/T),    h(s) = 3s² - 2s³
//! ```
//!
//! The vertical component is split at `T/2` into a rise and a fall, both
//! rest-to-rest cubics, with the apex at `max(z₀, z₁) + lift_height`.
//! Velocity therefore vanishes at lift-off, at the apex and at touchdown.
//!
//! Only the horizontal foothold coordinates are optimization variables,
//! so the height profile does not depend on them and
//!
//! ```text
//! ∂p_d/∂p₁_d = h(t/T),   ∂p_d/∂p₀_d = 1 - h(t/T)   for d ∈ {x, y}
//! ```
//!
//! with all cross terms and all z rows identically zero.

use serde::{Deserialize, Serialize};

use crate::math::{Coord3, CubicHermite};
use crate::state::CartesianState;
use crate::{Vec2, Vec3};

/// Smooth foot path between two footholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingTrajectory {
    duration: f64,
    lift_height: f64,
    x: CubicHermite,
    y: CubicHermite,
    z_rise: CubicHermite,
    z_fall: CubicHermite,
}

impl SwingTrajectory {
    /// Create a swing from `start` to `end`
    ///
    /// # Panics
    /// If `duration` is not strictly positive or `lift_height` is negative
    /// or not finite.
    pub fn new(start: &Vec3, end: &Vec3, duration: f64, lift_height: f64) -> Self {
        assert!(duration > 0.0, "swing duration must be positive, got {duration}");
        assert!(
            lift_height >= 0.0 && lift_height.is_finite(),
            "lift height must be non-negative and finite, got {lift_height}"
        );
        let half = 0.5 * duration;
        let mut swing = Self {
            duration,
            lift_height,
            x: CubicHermite::rest_to_rest(start.x, end.x, duration),
            y: CubicHermite::rest_to_rest(start.y, end.y, duration),
            z_rise: CubicHermite::rest_to_rest(start.z, start.z, half),
            z_fall: CubicHermite::rest_to_rest(end.z, end.z, half),
        };
        swing.set_contacts(start, end);
        swing
    }

    /// Recompute the interpolation for new footholds
    ///
    /// Duration and lift height are kept.
    pub fn set_contacts(&mut self, start: &Vec3, end: &Vec3) {
        let apex = start.z.max(end.z) + self.lift_height;

        self.x.set_boundary(start.x, 0.0, end.x, 0.0);
        self.y.set_boundary(start.y, 0.0, end.y, 0.0);
        self.z_rise.set_boundary(start.z, 0.0, apex, 0.0);
        self.z_fall.set_boundary(apex, 0.0, end.z, 0.0);
    }

    /// Swing duration [s]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Lift height above the higher foothold [m]
    pub fn lift_height(&self) -> f64 {
        self.lift_height
    }

    /// Height of the apex reached at half the swing duration [m]
    pub fn apex_height(&self) -> f64 {
        self.z_rise.position(0.5 * self.duration)
    }

    /// Foot state at local time `t ∈ [0, T]`
    ///
    /// Times outside the interval are clamped to it.
    pub fn evaluate(&self, t: f64) -> CartesianState {
        let t = t.clamp(0.0, self.duration);
        let half = 0.5 * self.duration;

        let (z, z_dot, z_ddot) = if t < half {
            (self.z_rise.position(t), self.z_rise.velocity(t), self.z_rise.acceleration(t))
        } else {
            let tf = t - half;
            (self.z_fall.position(tf), self.z_fall.velocity(tf), self.z_fall.acceleration(tf))
        };

        CartesianState {
            position: Vec3::new(self.x.position(t), self.y.position(t), z),
            velocity: Vec3::new(self.x.velocity(t), self.y.velocity(t), z_dot),
            acceleration: Vec3::new(self.x.acceleration(t), self.y.acceleration(t), z_ddot),
        }
    }

    /// ∂position[dim] / ∂(target_x, target_y) at local time `t`
    pub fn jacobian_wrt_target(&self, t: f64, dim: Coord3) -> Vec2 {
        // x and y share the same blend, so either segment gives the basis
        Self::horizontal_row(dim, self.x.dpos_dend(t))
    }

    /// ∂position[dim] / ∂(start_x, start_y) at local time `t`
    pub fn jacobian_wrt_start(&self, t: f64, dim: Coord3) -> Vec2 {
        Self::horizontal_row(dim, self.x.dpos_dstart(t))
    }

    fn horizontal_row(dim: Coord3, weight: f64) -> Vec2 {
        let mut row = Vec2::zeros();
        if let Some(d) = dim.horizontal() {
            row[d.index()] = weight;
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_swing() -> SwingTrajectory {
        SwingTrajectory::new(
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::new(0.3, 0.1, 0.02),
            0.6,
            0.03,
        )
    }

    #[test]
    #[should_panic]
    fn test_negative_lift_height_panics() {
        let _ = SwingTrajectory::new(&Vec3::zeros(), &Vec3::new(0.3, 0.0, 0.0), 0.6, -0.1);
    }

    #[test]
    fn test_boundary_positions() {
        let swing = test_swing();

        let lift_off = swing.evaluate(0.0);
        let touchdown = swing.evaluate(0.6);
        assert_relative_eq!(lift_off.position, Vec3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(touchdown.position, Vec3::new(0.3, 0.1, 0.02), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_velocity_at_lift_off_and_touchdown() {
        let swing = test_swing();

        assert_relative_eq!(swing.evaluate(0.0).velocity, Vec3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(swing.evaluate(0.6).velocity, Vec3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_apex_above_higher_contact() {
        let swing = test_swing();

        let apex = swing.evaluate(0.3);
        assert_relative_eq!(apex.position.z, 0.02 + 0.03, epsilon = 1e-12);
        assert_relative_eq!(apex.velocity.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(swing.apex_height(), 0.05, epsilon = 1e-12);

        // Never higher than the apex
        for k in 0..=60 {
            let z = swing.evaluate(0.01 * k as f64).position.z;
            assert!(z <= 0.05 + 1e-12);
        }
    }

    #[test]
    fn test_velocity_continuous_at_apex() {
        let swing = test_swing();
        let eps = 1e-9;

        let before = swing.evaluate(0.3 - eps).velocity;
        let after = swing.evaluate(0.3 + eps).velocity;
        assert_relative_eq!(before, after, epsilon = 1e-6);
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(0.3, 0.1, 0.0);
        let swing = SwingTrajectory::new(&start, &end, 0.6, 0.03);
        let h = 1e-6;

        for k in 0..=12 {
            let t = 0.05 * k as f64;
            for dim in Coord3::ALL {
                let analytic = swing.jacobian_wrt_target(t, dim);
                for axis in 0..2 {
                    let mut up = end;
                    let mut down = end;
                    up[axis] += h;
                    down[axis] -= h;
                    let p_up = SwingTrajectory::new(&start, &up, 0.6, 0.03).evaluate(t).position;
                    let p_down = SwingTrajectory::new(&start, &down, 0.6, 0.03).evaluate(t).position;
                    let fd = (p_up[dim.index()] - p_down[dim.index()]) / (2.0 * h);
                    assert_relative_eq!(analytic[axis], fd, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_start_and_target_sensitivities_sum_to_one() {
        let swing = test_swing();
        for k in 0..=6 {
            let t = 0.1 * k as f64;
            let total = swing.jacobian_wrt_start(t, Coord3::X) + swing.jacobian_wrt_target(t, Coord3::X);
            assert_relative_eq!(total, Vec2::new(1.0, 0.0), epsilon = 1e-12);
        }
        assert_relative_eq!(swing.jacobian_wrt_target(0.2, Coord3::Z), Vec2::zeros());
    }

    #[test]
    fn test_set_contacts_keeps_duration_and_lift() {
        let mut swing = test_swing();
        swing.set_contacts(&Vec3::new(0.1, 0.0, 0.0), &Vec3::new(0.5, 0.2, 0.0));

        assert_relative_eq!(swing.duration(), 0.6);
        assert_relative_eq!(swing.lift_height(), 0.03);
        assert_relative_eq!(swing.evaluate(0.6).position, Vec3::new(0.5, 0.2, 0.0), epsilon = 1e-12);
        assert_relative_eq!(swing.apex_height(), 0.03, epsilon = 1e-12);
    }
}
