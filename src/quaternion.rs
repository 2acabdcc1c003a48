//! Quaternions.

use crate::{angle::Angle, consts::EPSILON, matrix::Matrix4, vector::Vector3};
use approx::{AbsDiffEq, RelativeEq};
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// A quaternion `w + xi + yj + zk`, stored as `(x, y, z, w)`.
///
/// Rotations are represented by unit quaternions. Multiplication is the
/// Hamilton product, so `q1 * q2` represents applying `q2` first and then
/// `q1`, like the corresponding matrix product.
#[repr(C)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
pub struct Quaternion {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

impl Quaternion {
    /// Creates a new quaternion with the given components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates the identity quaternion, representing no rotation.
    #[inline]
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Creates a new quaternion with the given real (scalar) and imaginary
    /// (vector) parts.
    #[inline]
    pub const fn from_parts(real: f32, imag: Vector3) -> Self {
        Self::new(imag.x(), imag.y(), imag.z(), real)
    }

    /// Creates the unit quaternion rotating by the given angle about the
    /// given axis. The axis does not have to be normalized. A zero-length
    /// axis gives the identity quaternion.
    pub fn from_axis_angle(axis: &Vector3, angle: impl Angle) -> Self {
        let norm = axis.norm();
        if norm < EPSILON {
            log::trace!("Using identity quaternion for zero-length rotation axis");
            return Self::identity();
        }
        let (sin_half, cos_half) = (0.5 * angle.radians()).sin_cos();
        Self::from_parts(cos_half, axis * (sin_half / norm))
    }

    /// Creates the unit quaternion for the rotation given by the Euler
    /// angles, using the same convention as
    /// [`Matrix4::set_rotation_from_euler`]: rotations about the fixed x-, y-
    /// and z-axes, applied in that order.
    pub fn from_euler_angles(ax: impl Angle, ay: impl Angle, az: impl Angle) -> Self {
        let about_x = Self::from_axis_angle(&Vector3::unit_x(), ax);
        let about_y = Self::from_axis_angle(&Vector3::unit_y(), ay);
        let about_z = Self::from_axis_angle(&Vector3::unit_z(), az);
        about_z * about_y * about_x
    }

    /// Computes the unit quaternion for the rotation in the upper left 3x3
    /// block of the given matrix. Scaling is divided out of the block first.
    ///
    /// This is the inverse of [`Matrix4::set_rotation_from_quaternion`] up to
    /// the sign of the quaternion, since `q` and `-q` represent the same
    /// rotation.
    pub fn from_rotation_matrix(matrix: &Matrix4) -> Self {
        let [[r00, r01, r02], [r10, r11, r12], [r20, r21, r22]] = matrix.rotation_part();

        // Divide by the largest of the four diagonal combinations for
        // stability
        let trace = r00 + r11 + r22;
        let quaternion = if trace > 0.0 {
            let s = 2.0 * (trace + 1.0).sqrt();
            Self::new((r21 - r12) / s, (r02 - r20) / s, (r10 - r01) / s, 0.25 * s)
        } else if r00 > r11 && r00 > r22 {
            let s = 2.0 * (1.0 + r00 - r11 - r22).sqrt();
            Self::new(0.25 * s, (r01 + r10) / s, (r02 + r20) / s, (r21 - r12) / s)
        } else if r11 > r22 {
            let s = 2.0 * (1.0 + r11 - r00 - r22).sqrt();
            Self::new((r01 + r10) / s, 0.25 * s, (r12 + r21) / s, (r02 - r20) / s)
        } else {
            let s = 2.0 * (1.0 + r22 - r00 - r11).sqrt();
            Self::new((r02 + r20) / s, (r12 + r21) / s, 0.25 * s, (r10 - r01) / s)
        };

        quaternion.normalized()
    }

    #[inline]
    pub const fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub const fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub const fn z(&self) -> f32 {
        self.z
    }

    #[inline]
    pub const fn w(&self) -> f32 {
        self.w
    }

    /// The real (scalar) part of the quaternion.
    #[inline]
    pub const fn real(&self) -> f32 {
        self.w
    }

    /// The imaginary (vector) part of the quaternion.
    #[inline]
    pub const fn imag(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn norm_squared(&self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.norm_squared().sqrt()
    }

    /// Returns the quaternion scaled to unit length. A quaternion with
    /// negligible length is returned unchanged.
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        if norm < EPSILON {
            return *self;
        }
        let inv_norm = norm.recip();
        Self::new(
            self.x * inv_norm,
            self.y * inv_norm,
            self.z * inv_norm,
            self.w * inv_norm,
        )
    }

    /// Returns the conjugate quaternion, which for a unit quaternion
    /// represents the inverse rotation.
    #[inline]
    pub const fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates the given vector with the quaternion, which is assumed to be
    /// normalized.
    pub fn rotate_vector(&self, vector: &Vector3) -> Vector3 {
        let imag = self.imag();
        let t = 2.0 * imag.cross(vector);
        vector + self.w * t + imag.cross(&t)
    }

    /// Computes the homogeneous rotation matrix corresponding to the
    /// quaternion, which is assumed to be normalized.
    pub fn to_rotation_matrix(&self) -> Matrix4 {
        let mut matrix = Matrix4::identity();
        matrix.set_rotation_from_quaternion(self);
        matrix
    }

    /// Computes the Euler angles, in degrees, of the rotation represented by
    /// the quaternion. See [`Matrix4::to_euler_angles`] for the convention.
    pub fn to_euler_angles(&self) -> Vector3 {
        self.to_rotation_matrix().to_euler_angles()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f32; 4]> for Quaternion {
    fn from([x, y, z, w]: [f32; 4]) -> Self {
        Self::new(x, y, z, w)
    }
}

impl From<Quaternion> for [f32; 4] {
    fn from(quaternion: Quaternion) -> Self {
        [quaternion.x, quaternion.y, quaternion.z, quaternion.w]
    }
}

impl_binop!(Mul, mul, Quaternion, Quaternion, Quaternion, |a, b| {
    Quaternion::new(
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
    )
});

impl_binop_assign!(MulAssign, mul_assign, Quaternion, Quaternion, |a, b| {
    *a = *a * b;
});

impl_unary_op!(Neg, neg, Quaternion, Quaternion, |val| {
    Quaternion::new(-val.x, -val.y, -val.z, -val.w)
});

impl_abs_diff_eq!(Quaternion, |a, b, epsilon| {
    a.x.abs_diff_eq(&b.x, epsilon)
        && a.y.abs_diff_eq(&b.y, epsilon)
        && a.z.abs_diff_eq(&b.z, epsilon)
        && a.w.abs_diff_eq(&b.w, epsilon)
});

impl_relative_eq!(Quaternion, |a, b, epsilon, max_relative| {
    a.x.relative_eq(&b.x, epsilon, max_relative)
        && a.y.relative_eq(&b.y, epsilon, max_relative)
        && a.z.relative_eq(&b.z, epsilon, max_relative)
        && a.w.relative_eq(&b.w, epsilon, max_relative)
});

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}i + {}j + {}k", self.w, self.x, self.y, self.z)
    }
}
