//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the few engine-flavoured value types that
//! cross the native boundary.

use std::ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix3, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Tolerance used for "is this float zero" checks
    pub const ZERO_TOLERANCE: f32 = 1e-6;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Whether two floats differ by less than the tolerance
    pub fn nearly_equal(a: f32, b: f32, tolerance: f32) -> bool {
        (a - b).abs() < tolerance
    }
}

/// Interpolation helpers
pub mod interpolation {
    use super::{Add, Mul, Sub};

    /// Cubic (smooth-step) interpolation between `first` and `second`
    ///
    /// The weight is `t² (3 - 2t)`, so the curve has zero slope at both ends.
    pub fn cubic<T>(first: T, second: T, parameter: f32) -> T
    where
        T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
    {
        let weight = parameter * parameter * 2.0f32.mul_add(-parameter, 3.0);
        first + (second - first) * weight
    }
}

/// Rotation expressed as pitch (X), roll (Y) and yaw (Z) in radians
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation around X axis
    pub pitch: f32,
    /// Rotation around Y axis
    pub roll: f32,
    /// Rotation around Z axis
    pub yaw: f32,
}

impl EulerAngles {
    /// Create a new set of angles
    pub const fn new(pitch: f32, roll: f32, yaw: f32) -> Self {
        Self { pitch, roll, yaw }
    }

    /// Extract angles from an orthonormal rotation matrix
    pub fn from_matrix(matrix: &Mat3) -> Self {
        let roll = (-matrix[(2, 0)]).clamp(-1.0, 1.0).asin();
        if (roll.abs() - constants::HALF_PI).abs() < 0.01 {
            Self {
                pitch: 0.0,
                roll,
                yaw: (-matrix[(0, 1)]).atan2(matrix[(1, 1)]),
            }
        } else {
            Self {
                pitch: matrix[(2, 1)].atan2(matrix[(2, 2)]),
                roll,
                yaw: matrix[(1, 0)].atan2(matrix[(0, 0)]),
            }
        }
    }

    /// Extract angles from a unit quaternion
    pub fn from_quaternion(rotation: &Quat) -> Self {
        let (x, y, z, w) = (rotation.i, rotation.j, rotation.k, rotation.w);
        let roll = (-(x * z - w * y) * 2.0).clamp(-1.0, 1.0).asin();
        let yaw = (-2.0 * (x * y - w * z)).atan2(1.0 - (z * z + y * y) * 2.0);
        if (roll.abs() - constants::HALF_PI).abs() < 0.01 {
            Self {
                pitch: 0.0,
                roll,
                yaw: (-2.0 * (x * y - w * z)).atan2(1.0 - (x * x + z * z) * 2.0),
            }
        } else {
            Self {
                pitch: (-2.0 * (y * z - w * x)).atan2(1.0 - (x * x + y * y) * 2.0),
                roll,
                yaw,
            }
        }
    }

    /// Component by index (0 = pitch, 1 = roll, 2 = yaw)
    pub const fn get(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.pitch),
            1 => Some(self.roll),
            2 => Some(self.yaw),
            _ => None,
        }
    }

    /// Angles as a plain vector
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.pitch, self.roll, self.yaw)
    }
}

impl Index<usize> for EulerAngles {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.pitch,
            1 => &self.roll,
            2 => &self.yaw,
            _ => panic!("EulerAngles index out of range: {index}"),
        }
    }
}

impl IndexMut<usize> for EulerAngles {
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        match index {
            0 => &mut self.pitch,
            1 => &mut self.roll,
            2 => &mut self.yaw,
            _ => panic!("EulerAngles index out of range: {index}"),
        }
    }
}

impl Mul<f32> for EulerAngles {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.pitch * rhs, self.roll * rhs, self.yaw * rhs)
    }
}

impl Mul<EulerAngles> for f32 {
    type Output = EulerAngles;

    fn mul(self, rhs: EulerAngles) -> EulerAngles {
        rhs * self
    }
}

impl Div<f32> for EulerAngles {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.pitch / rhs, self.roll / rhs, self.yaw / rhs)
    }
}

impl Neg for EulerAngles {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.pitch, -self.roll, -self.yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_matrix_has_zero_angles() {
        let angles = EulerAngles::from_matrix(&Mat3::identity());
        assert_relative_eq!(angles.pitch, 0.0);
        assert_relative_eq!(angles.roll, 0.0);
        assert_relative_eq!(angles.yaw, 0.0);
    }

    #[test]
    fn test_yaw_from_z_rotation() {
        let rotation = nalgebra::Rotation3::from_axis_angle(&Vec3::z_axis(), 0.5);
        let angles = EulerAngles::from_matrix(rotation.matrix());
        assert_relative_eq!(angles.yaw, 0.5, epsilon = 1e-5);
        assert_relative_eq!(angles.pitch, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pitch_from_x_rotation() {
        let rotation = nalgebra::Rotation3::from_axis_angle(&Vec3::x_axis(), 0.3);
        let angles = EulerAngles::from_matrix(rotation.matrix());
        assert_relative_eq!(angles.pitch, 0.3, epsilon = 1e-5);
        assert_relative_eq!(angles.roll, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_quaternion_matches_matrix() {
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), 0.75);
        let angles = EulerAngles::from_quaternion(&rotation);
        assert_relative_eq!(angles.yaw, 0.75, epsilon = 1e-5);
        assert_relative_eq!(angles.roll, 0.0, epsilon = 1e-5);
        assert_relative_eq!(angles.pitch, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_indexing_and_ops() {
        let mut angles = EulerAngles::new(1.0, 2.0, 3.0);
        assert_eq!(angles[2], 3.0);
        angles[0] = 4.0;
        assert_eq!(angles.get(0), Some(4.0));
        assert_eq!(angles.get(3), None);
        assert_eq!(2.0 * angles, EulerAngles::new(8.0, 4.0, 6.0));
        assert_eq!(angles / 2.0, EulerAngles::new(2.0, 1.0, 1.5));
        assert_eq!(-angles, EulerAngles::new(-4.0, -2.0, -3.0));
    }

    #[test]
    fn test_cubic_interpolation_end_points() {
        assert_relative_eq!(interpolation::cubic(2.0f32, 6.0, 0.0), 2.0);
        assert_relative_eq!(interpolation::cubic(2.0f32, 6.0, 1.0), 6.0);
        assert_relative_eq!(interpolation::cubic(2.0f32, 6.0, 0.5), 4.0);

        let v = interpolation::cubic(Vec3::zeros(), Vec3::new(1.0, 2.0, 4.0), 0.25);
        // weight = 0.0625 * 2.5
        assert_relative_eq!(v.z, 4.0 * 0.156_25, epsilon = 1e-6);
    }
}
