//! Cubic Hermite segments
//!
//! A scalar cubic defined by position and velocity at both ends of a
//! time interval `[0, T]`. Internally the polynomial is stored over the
//! normalized time `s = t / T ∈ [0, 1]`:
//!
//! ```text
//! p(s) = c₀ + c₁ s + c₂ s² + c₃ s³
//!
//! c₀ = p₀
//! c₁ = T v₀
//! c₂ = -3 p₀ - 2 T v₀ + 3 p₁ - T v₁
//! c₃ =  2 p₀ +   T v₀ - 2 p₁ + T v₁
//! ```
//!
//! The position is linear in the boundary positions, so its partial
//! derivatives w.r.t. `p₀` and `p₁` are the Hermite basis functions
//! `h₀₀(s) = 1 - 3s² + 2s³` and `h₀₁(s) = 3s² - 2s³`.

use serde::{Deserialize, Serialize};

/// Scalar cubic between two boundary points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicHermite {
    /// Coefficients over normalized time, lowest order first
    coeffs: [f64; 4],
    /// Segment duration [s]
    duration: f64,
}

impl CubicHermite {
    /// Create a segment from boundary positions and velocities
    ///
    /// # Panics
    /// If `duration` is not strictly positive.
    pub fn new(p0: f64, v0: f64, p1: f64, v1: f64, duration: f64) -> Self {
        assert!(duration > 0.0, "segment duration must be positive, got {duration}");
        let mut segment = Self { coeffs: [0.0; 4], duration };
        segment.set_boundary(p0, v0, p1, v1);
        segment
    }

    /// Segment that starts and ends at rest
    pub fn rest_to_rest(p0: f64, p1: f64, duration: f64) -> Self {
        Self::new(p0, 0.0, p1, 0.0, duration)
    }

    /// Recompute the coefficients for new boundary values, keeping the duration
    pub fn set_boundary(&mut self, p0: f64, v0: f64, p1: f64, v1: f64) {
        let t = self.duration;
        self.coeffs = [
            p0,
            t * v0,
            -3.0 * p0 - 2.0 * t * v0 + 3.0 * p1 - t * v1,
            2.0 * p0 + t * v0 - 2.0 * p1 + t * v1,
        ];
    }

    /// Segment duration [s]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Position at local time `t`, clamped to `[0, T]`
    pub fn position(&self, t: f64) -> f64 {
        let c = &self.coeffs;
        let s = self.normalized(t);
        c[0] + s * (c[1] + s * (c[2] + s * c[3]))
    }

    /// Velocity at local time `t`, clamped to `[0, T]`
    pub fn velocity(&self, t: f64) -> f64 {
        let c = &self.coeffs;
        let s = self.normalized(t);
        (c[1] + s * (2.0 * c[2] + s * 3.0 * c[3])) / self.duration
    }

    /// Acceleration at local time `t`, clamped to `[0, T]`
    pub fn acceleration(&self, t: f64) -> f64 {
        let c = &self.coeffs;
        let s = self.normalized(t);
        (2.0 * c[2] + 6.0 * c[3] * s) / (self.duration * self.duration)
    }

    /// ∂position/∂p₀ at local time `t`
    pub fn dpos_dstart(&self, t: f64) -> f64 {
        let s = self.normalized(t);
        1.0 - s * s * (3.0 - 2.0 * s)
    }

    /// ∂position/∂p₁ at local time `t`
    pub fn dpos_dend(&self, t: f64) -> f64 {
        let s = self.normalized(t);
        s * s * (3.0 - 2.0 * s)
    }

    fn normalized(&self, t: f64) -> f64 {
        (t / self.duration).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boundary_conditions() {
        let seg = CubicHermite::new(1.0, 0.5, 3.0, -0.2, 2.0);

        assert_relative_eq!(seg.position(0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(seg.velocity(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(seg.position(2.0), 3.0, epsilon = 1e-12);
        assert_relative_eq!(seg.velocity(2.0), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_rest_to_rest_is_symmetric() {
        let seg = CubicHermite::rest_to_rest(0.0, 1.0, 1.0);

        assert_relative_eq!(seg.position(0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(seg.velocity(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(seg.velocity(1.0), 0.0, epsilon = 1e-12);
        // Inflection point in the middle
        assert_relative_eq!(seg.acceleration(0.5), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let seg = CubicHermite::new(-0.3, 0.1, 0.7, 0.4, 0.8);
        let h = 1e-6;

        for k in 1..8 {
            let t = 0.1 * k as f64;
            let v_fd = (seg.position(t + h) - seg.position(t - h)) / (2.0 * h);
            let a_fd = (seg.velocity(t + h) - seg.velocity(t - h)) / (2.0 * h);
            assert_relative_eq!(seg.velocity(t), v_fd, epsilon = 1e-6);
            assert_relative_eq!(seg.acceleration(t), a_fd, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_boundary_sensitivities() {
        let duration = 0.6;
        let (p0, p1) = (0.2, 0.5);
        let seg = CubicHermite::rest_to_rest(p0, p1, duration);
        let h = 1e-6;

        for k in 0..=6 {
            let t = 0.1 * k as f64;
            let up = CubicHermite::rest_to_rest(p0, p1 + h, duration).position(t);
            let down = CubicHermite::rest_to_rest(p0, p1 - h, duration).position(t);
            assert_relative_eq!(seg.dpos_dend(t), (up - down) / (2.0 * h), epsilon = 1e-6);

            let up = CubicHermite::rest_to_rest(p0 + h, p1, duration).position(t);
            let down = CubicHermite::rest_to_rest(p0 - h, p1, duration).position(t);
            assert_relative_eq!(seg.dpos_dstart(t), (up - down) / (2.0 * h), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_clamps_outside_interval() {
        let seg = CubicHermite::rest_to_rest(1.0, 2.0, 1.0);
        assert_relative_eq!(seg.position(-1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(seg.position(5.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_zero_duration_panics() {
        let _ = CubicHermite::rest_to_rest(0.0, 1.0, 0.0);
    }
}
