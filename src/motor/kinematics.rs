// Omniwheel inverse kinematics for an N-wheel base
// Converts body-frame velocities (vx, vy, omega) to per-wheel angular speeds.

use std::f32::consts::PI;

/// Inverse kinematics over a fixed wheel layout.
///
/// Geometry is frozen at construction: mounting-angle sin/cos pairs are
/// computed once, and the wheel radius is stored as a reciprocal so the
/// per-tick path is pure multiply-add. Any wheel count and any angular
/// layout works; nothing assumes three wheels at 120 degree spacing.
pub struct OmniKinematics {
    robot_radius: f32,
    inv_wheel_radius: f32,
    sin_angles: Vec<f32>,
    cos_angles: Vec<f32>,
    target_vx: f32,
    target_vy: f32,
    target_omega: f32,
    wheel_speeds: Vec<f32>,
}

impl OmniKinematics {
    /// Build the engine from the base geometry. Mounting angles are in
    /// degrees, measured from +X (right), one per wheel.
    ///
    /// A zero wheel radius leaves the reciprocal at 0.0, so every computed
    /// speed is 0.0 instead of a non-finite value.
    pub fn new(robot_radius: f32, wheel_radius: f32, wheel_angles_deg: &[f32]) -> Self {
        let inv_wheel_radius = if wheel_radius != 0.0 {
            1.0 / wheel_radius
        } else {
            0.0
        };

        let mut sin_angles = Vec::with_capacity(wheel_angles_deg.len());
        let mut cos_angles = Vec::with_capacity(wheel_angles_deg.len());
        for &angle_deg in wheel_angles_deg {
            let angle_rad = angle_deg * (PI / 180.0);
            sin_angles.push(angle_rad.sin());
            cos_angles.push(angle_rad.cos());
        }

        let wheel_speeds = vec![0.0; wheel_angles_deg.len()];

        Self {
            robot_radius,
            inv_wheel_radius,
            sin_angles,
            cos_angles,
            target_vx: 0.0,
            target_vy: 0.0,
            target_omega: 0.0,
            wheel_speeds,
        }
    }

    pub fn wheel_count(&self) -> usize {
        self.wheel_speeds.len()
    }

    /// Set the body-frame target. No computation happens here.
    pub fn set_target(&mut self, vx: f32, vy: f32, omega: f32) {
        self.target_vx = vx;
        self.target_vy = vy;
        self.target_omega = omega;
    }

    /// Recompute every wheel's angular speed (rad/s) from the current
    /// target. All speeds are overwritten; nothing accumulates across calls.
    pub fn compute_wheel_speeds(&mut self) {
        let l = self.robot_radius;

        for i in 0..self.wheel_speeds.len() {
            // Tangential wheel velocity in m/s, then to rad/s via 1/r
            let tangential = self.target_vy * self.cos_angles[i]
                - self.target_vx * self.sin_angles[i]
                + l * self.target_omega;
            self.wheel_speeds[i] = tangential * self.inv_wheel_radius;
        }
    }

    /// Last computed speed for one wheel, or 0.0 for an out-of-range index.
    /// This is read on the hot control path, so it never faults.
    pub fn wheel_speed(&self, index: usize) -> f32 {
        self.wheel_speeds.get(index).copied().unwrap_or(0.0)
    }

    /// All wheel speeds, index-aligned with the construction-time angles.
    pub fn wheel_speeds(&self) -> &[f32] {
        &self.wheel_speeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOT_RADIUS: f32 = 0.075;
    const WHEEL_RADIUS: f32 = 0.0325;
    const ANGLES: [f32; 3] = [270.0, 60.0, 120.0];

    fn engine() -> OmniKinematics {
        OmniKinematics::new(ROBOT_RADIUS, WHEEL_RADIUS, &ANGLES)
    }

    #[test]
    fn test_pure_rotation_uniform_speeds() {
        // Translational terms vanish, so every wheel turns at L*omega/r
        let mut kin = engine();
        kin.set_target(0.0, 0.0, 4.0);
        kin.compute_wheel_speeds();

        let expected = ROBOT_RADIUS * 4.0 / WHEEL_RADIUS;
        for i in 0..3 {
            assert!(
                (kin.wheel_speed(i) - expected).abs() < 1e-4,
                "wheel {} = {}, expected {}",
                i,
                kin.wheel_speed(i),
                expected
            );
        }
    }

    #[test]
    fn test_pure_translation_x() {
        let mut kin = engine();
        kin.set_target(1.0, 0.0, 0.0);
        kin.compute_wheel_speeds();

        // Per wheel: (0*cos - 1*sin) / r
        for (i, angle_deg) in ANGLES.iter().enumerate() {
            let expected = -(angle_deg.to_radians().sin()) / WHEEL_RADIUS;
            assert!(
                (kin.wheel_speed(i) - expected).abs() < 1e-4,
                "wheel {} = {}, expected {}",
                i,
                kin.wheel_speed(i),
                expected
            );
        }
        // The 270 degree wheel rolls straight along X: sin(270) = -1
        assert!((kin.wheel_speed(0) - 1.0 / WHEEL_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let mut kin = engine();
        kin.set_target(0.3, -0.2, 1.5);
        kin.compute_wheel_speeds();
        let first: Vec<f32> = kin.wheel_speeds().to_vec();

        kin.set_target(0.3, -0.2, 1.5);
        kin.compute_wheel_speeds();
        assert_eq!(first, kin.wheel_speeds());
    }

    #[test]
    fn test_zero_wheel_radius_yields_zero_speeds() {
        let mut kin = OmniKinematics::new(ROBOT_RADIUS, 0.0, &ANGLES);
        kin.set_target(1.0, 1.0, 5.0);
        kin.compute_wheel_speeds();

        for i in 0..3 {
            assert_eq!(kin.wheel_speed(i), 0.0);
        }
    }

    #[test]
    fn test_out_of_range_index_is_zero() {
        let mut kin = engine();
        kin.set_target(1.0, 0.0, 0.0);
        kin.compute_wheel_speeds();

        assert_eq!(kin.wheel_speed(3), 0.0);
        assert_eq!(kin.wheel_speed(usize::MAX), 0.0);
    }

    #[test]
    fn test_arbitrary_wheel_count() {
        // Four wheels at 45/135/225/315, pure rotation still uniform
        let mut kin = OmniKinematics::new(0.1, 0.05, &[45.0, 135.0, 225.0, 315.0]);
        kin.set_target(0.0, 0.0, 2.0);
        kin.compute_wheel_speeds();

        assert_eq!(kin.wheel_count(), 4);
        let expected = 0.1 * 2.0 / 0.05;
        for i in 0..4 {
            assert!((kin.wheel_speed(i) - expected).abs() < 1e-4);
        }
    }
}
