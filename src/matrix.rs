//! Matrices.

use crate::{
    angle::{Angle, radians_to_degrees},
    backend::{ActiveBackend, MatrixBackend},
    consts::{EPSILON, FRAC_PI_2, GIMBAL_LOCK_THRESHOLD},
    quaternion::Quaternion,
    vector::{Vector3, Vector4},
};
use anyhow::{Context, Result};
use approx::{AbsDiffEq, RelativeEq};
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// A 4x4 matrix representing an affine or projective transform.
///
/// The matrix is stored as four columns of four floats, so the in-memory
/// sequence of the 16 elements is column-major: column 0 (rows 0 to 3), then
/// column 1, 2 and 3. This is the layout expected by the rendering boundary,
/// which is why [`Self::as_column_major_array`] can hand out a view of the
/// matrix without copying.
///
/// For affine transforms, the upper left 3x3 block holds the combined
/// rotation and scaling, rows 0 to 2 of the fourth column hold the
/// translation and the bottom row is `(0, 0, 0, 1)`. Any other bottom row
/// makes the transform projective.
///
/// Every operation that modifies a matrix takes `&mut self`. The operators
/// `*`, `+` and `-` return new matrices, with `a * b` meaning `a × b`, so
/// that `(a * b) * v == a * (b * v)`.
#[repr(C)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
pub struct Matrix4 {
    column_1: Vector4,
    column_2: Vector4,
    column_3: Vector4,
    column_4: Vector4,
}

type Rows3 = [[f32; 3]; 3];

impl Matrix4 {
    /// Creates the identity matrix.
    #[inline]
    pub const fn identity() -> Self {
        Self::from_columns(
            Vector4::unit_x(),
            Vector4::unit_y(),
            Vector4::unit_z(),
            Vector4::unit_w(),
        )
    }

    /// Creates a matrix with all zeros.
    #[inline]
    pub const fn zeros() -> Self {
        Self::from_columns(
            Vector4::zeros(),
            Vector4::zeros(),
            Vector4::zeros(),
            Vector4::zeros(),
        )
    }

    /// Creates a matrix from the given elements, listed row by row. The first
    /// three elements of each of the first three rows form the rotation and
    /// scaling block, and the last element of those rows is the translation.
    #[allow(clippy::similar_names)]
    #[inline]
    pub const fn new(
        sxx: f32,
        sxy: f32,
        sxz: f32,
        tx: f32,
        syx: f32,
        syy: f32,
        syz: f32,
        ty: f32,
        szx: f32,
        szy: f32,
        szz: f32,
        tz: f32,
        swx: f32,
        swy: f32,
        swz: f32,
        tw: f32,
    ) -> Self {
        Self::from_columns(
            Vector4::new(sxx, syx, szx, swx),
            Vector4::new(sxy, syy, szy, swy),
            Vector4::new(sxz, syz, szz, swz),
            Vector4::new(tx, ty, tz, tw),
        )
    }

    /// Creates a matrix with the given columns.
    #[inline]
    pub const fn from_columns(
        column_1: Vector4,
        column_2: Vector4,
        column_3: Vector4,
        column_4: Vector4,
    ) -> Self {
        Self {
            column_1,
            column_2,
            column_3,
            column_4,
        }
    }

    /// Creates a matrix whose upper left 3x3 block is given by the 9 values
    /// in row-major order. The remaining elements are taken from the
    /// identity matrix.
    #[inline]
    pub const fn from_row_major_array_3x3(a: &[f32; 9]) -> Self {
        Self::from_columns(
            Vector4::new(a[0], a[3], a[6], 0.0),
            Vector4::new(a[1], a[4], a[7], 0.0),
            Vector4::new(a[2], a[5], a[8], 0.0),
            Vector4::unit_w(),
        )
    }

    /// Creates a matrix from 16 values in row-major order.
    #[inline]
    pub const fn from_row_major_array(a: &[f32; 16]) -> Self {
        Self::from_columns(
            Vector4::new(a[0], a[4], a[8], a[12]),
            Vector4::new(a[1], a[5], a[9], a[13]),
            Vector4::new(a[2], a[6], a[10], a[14]),
            Vector4::new(a[3], a[7], a[11], a[15]),
        )
    }

    /// Creates a matrix from 16 values in column-major (OpenGL) order. The
    /// values are copied verbatim, since this is the storage order.
    #[inline]
    pub fn from_column_major_array(a: &[f32; 16]) -> Self {
        bytemuck::cast(*a)
    }

    /// Like [`Self::from_row_major_array_3x3`], but for a slice whose length
    /// is only known at runtime.
    ///
    /// # Errors
    /// Returns an error if the slice does not contain exactly 9 values.
    pub fn from_row_major_3x3_slice(values: &[f32]) -> Result<Self> {
        let array: &[f32; 9] = values.try_into().with_context(|| {
            format!("Expected 9 row-major matrix values, got {}", values.len())
        })?;
        Ok(Self::from_row_major_array_3x3(array))
    }

    /// Like [`Self::from_row_major_array`], but for a slice whose length is
    /// only known at runtime.
    ///
    /// # Errors
    /// Returns an error if the slice does not contain exactly 16 values.
    pub fn from_row_major_slice(values: &[f32]) -> Result<Self> {
        let array: &[f32; 16] = values.try_into().with_context(|| {
            format!("Expected 16 row-major matrix values, got {}", values.len())
        })?;
        Ok(Self::from_row_major_array(array))
    }

    /// Like [`Self::from_column_major_array`], but for a slice whose length
    /// is only known at runtime.
    ///
    /// # Errors
    /// Returns an error if the slice does not contain exactly 16 values.
    pub fn from_column_major_slice(values: &[f32]) -> Result<Self> {
        let array: &[f32; 16] = values.try_into().with_context(|| {
            format!(
                "Expected 16 column-major matrix values, got {}",
                values.len()
            )
        })?;
        Ok(Self::from_column_major_array(array))
    }

    /// Creates a matrix scaling by the given factor along each axis.
    #[inline]
    pub const fn from_scales(scale_x: f32, scale_y: f32, scale_z: f32) -> Self {
        Self::from_columns(
            Vector4::new(scale_x, 0.0, 0.0, 0.0),
            Vector4::new(0.0, scale_y, 0.0, 0.0),
            Vector4::new(0.0, 0.0, scale_z, 0.0),
            Vector4::unit_w(),
        )
    }

    /// Creates a matrix translating by the given displacement.
    #[inline]
    pub const fn from_translation(translation: &Vector3) -> Self {
        Self::from_columns(
            Vector4::unit_x(),
            Vector4::unit_y(),
            Vector4::unit_z(),
            translation.extended(1.0),
        )
    }

    /// Creates a matrix rotating by the given angle about the given axis. The
    /// axis does not have to be normalized. A zero-length axis gives the
    /// identity matrix.
    pub fn from_axis_angle(angle: impl Angle, x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.set_rotation(angle, x, y, z);
        m
    }

    /// The first column of the matrix.
    #[inline]
    pub const fn column_1(&self) -> &Vector4 {
        &self.column_1
    }

    /// The second column of the matrix.
    #[inline]
    pub const fn column_2(&self) -> &Vector4 {
        &self.column_2
    }

    /// The third column of the matrix.
    #[inline]
    pub const fn column_3(&self) -> &Vector4 {
        &self.column_3
    }

    /// The fourth column of the matrix.
    #[inline]
    pub const fn column_4(&self) -> &Vector4 {
        &self.column_4
    }

    /// Sets the first column of the matrix to the given column.
    #[inline]
    pub const fn set_column_1(&mut self, column: Vector4) {
        self.column_1 = column;
    }

    /// Sets the second column of the matrix to the given column.
    #[inline]
    pub const fn set_column_2(&mut self, column: Vector4) {
        self.column_2 = column;
    }

    /// Sets the third column of the matrix to the given column.
    #[inline]
    pub const fn set_column_3(&mut self, column: Vector4) {
        self.column_3 = column;
    }

    /// Sets the fourth column of the matrix to the given column.
    #[inline]
    pub const fn set_column_4(&mut self, column: Vector4) {
        self.column_4 = column;
    }

    /// Returns the element at the given row and column.
    ///
    /// # Panics
    /// If the indices are outside the matrix.
    #[inline]
    pub fn element(&self, row: usize, col: usize) -> f32 {
        self.column(col)[row]
    }

    /// Returns a mutable reference to the element at the given row and
    /// column.
    ///
    /// # Panics
    /// If the indices are outside the matrix.
    #[inline]
    pub fn element_mut(&mut self, row: usize, col: usize) -> &mut f32 {
        &mut self.column_mut(col)[row]
    }

    /// Whether the bottom row is exactly `(0, 0, 0, 1)`.
    #[inline]
    pub fn is_affine(&self) -> bool {
        self.column_1.w() == 0.0
            && self.column_2.w() == 0.0
            && self.column_3.w() == 0.0
            && self.column_4.w() == 1.0
    }

    /// Copies all elements of the given matrix into this one.
    #[inline]
    pub fn copy_from(&mut self, other: &Self) {
        *self = *other;
    }

    /// Computes the determinant of the full matrix, expanding along the top
    /// two rows.
    pub fn determinant(&self) -> f32 {
        determinant_4x4(&self.rows_f64()) as f32
    }

    /// Computes the determinant of the upper left 3x3 block.
    pub fn determinant_3x3(&self) -> f32 {
        determinant_3x3(&self.linear_part_f64()) as f32
    }

    /// Whether [`Self::invert`] would modify the matrix.
    ///
    /// The matrix is considered singular when the magnitude of its
    /// determinant does not exceed [`EPSILON`] times the product of its
    /// column norms, which bounds the magnitude of the determinant from
    /// above. A matrix whose inverse has elements too large for `f32` is not
    /// invertible either.
    pub fn is_invertible(&self) -> bool {
        self.inverse().is_some()
    }

    /// Inverts the matrix.
    ///
    /// If the matrix is singular (see [`Self::is_invertible`]), it is left
    /// unmodified.
    pub fn invert(&mut self) {
        if let Some(inverse) = self.inverse() {
            *self = inverse;
        }
    }

    /// Inverts the upper left 3x3 block of the matrix, leaving the fourth row
    /// and column unmodified.
    ///
    /// If the block is singular (the magnitude of its determinant does not
    /// exceed [`EPSILON`] times the product of its column norms) or its
    /// inverse does not fit in `f32`, the matrix is left unmodified.
    pub fn invert_3x3(&mut self) {
        if let Some(inverse) = self.inverse_3x3() {
            self.set_linear_part(&inverse);
        }
    }

    /// Transposes the matrix.
    #[inline]
    pub fn transpose(&mut self) {
        *self = ActiveBackend::transpose(self);
    }

    /// Multiplies the matrix with the given matrix from the right, so that
    /// `self` becomes `self × other`. When transforming vectors with the
    /// result, `other` is applied first.
    #[inline]
    pub fn multiply(&mut self, other: &Self) {
        *self = ActiveBackend::multiply(self, other);
    }

    /// Multiplies the matrix with the given matrix from the left, so that
    /// `self` becomes `other × self`. When transforming vectors with the
    /// result, `other` is applied last.
    #[inline]
    pub fn multiply_on_left(&mut self, other: &Self) {
        *self = ActiveBackend::multiply(other, self);
    }

    /// Like [`Self::multiply_on_left`], but only for the upper left 3x3
    /// blocks. The rest of this matrix, including the translation, is left
    /// unmodified.
    pub fn multiply_on_left_3x3(&mut self, other: &Self) {
        let a = self.linear_part();
        let b = other.linear_part();

        let mut product = [[0.0; 3]; 3];
        for (row, product_row) in product.iter_mut().enumerate() {
            for (col, element) in product_row.iter_mut().enumerate() {
                *element = b[row][0] * a[0][col] + b[row][1] * a[1][col] + b[row][2] * a[2][col];
            }
        }

        self.set_linear_part(&product);
    }

    /// Multiplies the given homogeneous 4-vector with the matrix.
    #[inline]
    pub fn transform_vector4(&self, vector: &Vector4) -> Vector4 {
        self.column_1 * vector.x()
            + self.column_2 * vector.y()
            + self.column_3 * vector.z()
            + self.column_4 * vector.w()
    }

    /// Transforms the given point with the matrix. The point is treated as
    /// having a w-component of 1, so the translation is included. The bottom
    /// row is ignored, so no perspective division is performed.
    #[inline]
    pub fn transform_point(&self, point: &Vector3) -> Vector3 {
        self.transform_direction(point) + self.column_4.truncated()
    }

    /// Transforms the given direction with the upper left 3x3 block of the
    /// matrix. The direction is treated as having a w-component of 0, so the
    /// translation is excluded. This is the transform to use for normals and
    /// other direction vectors.
    #[inline]
    pub fn transform_direction(&self, direction: &Vector3) -> Vector3 {
        self.column_1.truncated() * direction.x()
            + self.column_2.truncated() * direction.y()
            + self.column_3.truncated() * direction.z()
    }

    /// Transforms the homogeneous 4-vector stored in the given array with the
    /// matrix, writing the result back into the array.
    #[inline]
    pub fn transform_array4(&self, array: &mut [f32; 4]) {
        *array = self.transform_vector4(&Vector4::from(*array)).into();
    }

    /// Incorporates a rotation by the given angle about the given axis,
    /// applied before the existing transform (`self` becomes `self × R`). The
    /// axis does not have to be normalized. If the axis has zero length, the
    /// matrix is left unmodified.
    pub fn rotate(&mut self, angle: impl Angle, x: f32, y: f32, z: f32) {
        if let Some(rotation) = axis_angle_rotation(angle, x, y, z) {
            let mut rotation_matrix = Self::identity();
            rotation_matrix.set_linear_part(&rotation);
            self.multiply(&rotation_matrix);
        } else {
            log::trace!("Ignoring rotation about zero-length axis");
        }
    }

    /// Replaces the upper left 3x3 block with a rotation by the given angle
    /// about the given axis. The translation is not affected. A zero-length
    /// axis gives an identity block.
    pub fn set_rotation(&mut self, angle: impl Angle, x: f32, y: f32, z: f32) {
        let rotation = axis_angle_rotation(angle, x, y, z).unwrap_or_else(|| {
            log::trace!("Using identity rotation for zero-length axis");
            IDENTITY_3X3
        });
        self.set_linear_part(&rotation);
    }

    /// Replaces the upper left 3x3 block with the rotation given by the Euler
    /// angles. The translation is not affected.
    ///
    /// The rotations are about the fixed x-, y- and z-axes, applied in that
    /// order, so the resulting block is `Rz(az) × Ry(ay) × Rx(ax)`. This is
    /// the convention inverted by [`Self::to_euler_angles`].
    pub fn set_rotation_from_euler(&mut self, ax: impl Angle, ay: impl Angle, az: impl Angle) {
        let (sx, cx) = ax.sin_cos();
        let (sy, cy) = ay.sin_cos();
        let (sz, cz) = az.sin_cos();

        self.set_linear_part(&[
            [cy * cz, cz * sy * sx - sz * cx, cz * sy * cx + sz * sx],
            [cy * sz, sz * sy * sx + cz * cx, sz * sy * cx - cz * sx],
            [-sy, cy * sx, cy * cx],
        ]);
    }

    /// Replaces the upper left 3x3 block with the rotation represented by the
    /// given quaternion, which is assumed to be normalized. The translation
    /// is not affected. This is the inverse of
    /// [`Quaternion::from_rotation_matrix`].
    pub fn set_rotation_from_quaternion(&mut self, quaternion: &Quaternion) {
        let (x, y, z, w) = (
            quaternion.x(),
            quaternion.y(),
            quaternion.z(),
            quaternion.w(),
        );

        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        self.set_linear_part(&[
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
        ]);
    }

    /// Sets the translation part of the matrix. The rest of the matrix is not
    /// affected.
    #[inline]
    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        *self.column_4.x_mut() = x;
        *self.column_4.y_mut() = y;
        *self.column_4.z_mut() = z;
    }

    /// Sets the translation part of the matrix to the given vector. The rest
    /// of the matrix is not affected.
    #[inline]
    pub fn set_translation_by_vector(&mut self, translation: &Vector3) {
        self.set_translation(translation.x(), translation.y(), translation.z());
    }

    /// Incorporates a translation applied before the existing transform
    /// (`self` becomes `self × T`), so the translation is itself rotated and
    /// scaled by the existing transform.
    #[inline]
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.column_4 += self.column_1 * x + self.column_2 * y + self.column_3 * z;
    }

    /// Like [`Self::translate`], with the translation given as a vector.
    #[inline]
    pub fn translate_by_vector(&mut self, translation: &Vector3) {
        self.translate(translation.x(), translation.y(), translation.z());
    }

    /// Computes the length of the translation part of the matrix.
    #[inline]
    pub fn translation_length(&self) -> f32 {
        self.to_position().norm()
    }

    /// Incorporates a scaling along each axis applied before the existing
    /// transform (`self` becomes `self × S`).
    #[inline]
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.column_1 *= x;
        self.column_2 *= y;
        self.column_3 *= z;
    }

    /// Computes the Euler angles, in degrees, of the rotation in the upper
    /// left 3x3 block, using the convention of
    /// [`Self::set_rotation_from_euler`]. Scaling is divided out of the block
    /// first.
    ///
    /// The returned angle about the y-axis lies in `[-90, 90]`. When it is
    /// at either end (gimbal lock), only the sum or difference of the x- and
    /// z-angles is determined. The z-angle is then reported as zero and the
    /// x-angle carries the full remaining rotation.
    pub fn to_euler_angles(&self) -> Vector3 {
        let [[r00, r01, _], [r10, r11, _], [r20, r21, r22]] = self.rotation_part();

        let sin_y = (-r20).clamp(-1.0, 1.0);

        let (x, y, z) = if sin_y.abs() < GIMBAL_LOCK_THRESHOLD {
            (r21.atan2(r22), sin_y.asin(), r10.atan2(r00))
        } else if sin_y > 0.0 {
            (r01.atan2(r11), FRAC_PI_2, 0.0)
        } else {
            ((-r01).atan2(r11), -FRAC_PI_2, 0.0)
        };

        Vector3::new(
            radians_to_degrees(x),
            radians_to_degrees(y),
            radians_to_degrees(z),
        )
    }

    /// Computes the scaling along each axis as the lengths of the columns of
    /// the upper left 3x3 block. This is only exact when the block contains
    /// no shear.
    #[inline]
    pub fn to_scale_values(&self) -> Vector3 {
        Vector3::new(
            self.column_1.truncated().norm(),
            self.column_2.truncated().norm(),
            self.column_3.truncated().norm(),
        )
    }

    /// Returns the translation part of the matrix.
    #[inline]
    pub const fn to_position(&self) -> Vector3 {
        self.column_4.truncated()
    }

    /// Returns the upper left 3x3 block as 9 values in column-major order.
    pub fn to_column_major_array_3x3(&self) -> [f32; 9] {
        let c1 = self.column_1;
        let c2 = self.column_2;
        let c3 = self.column_3;
        [
            c1.x(),
            c1.y(),
            c1.z(),
            c2.x(),
            c2.y(),
            c2.z(),
            c3.x(),
            c3.y(),
            c3.z(),
        ]
    }

    /// Returns the 16 values of the matrix in column-major (OpenGL) order.
    #[inline]
    pub fn to_column_major_array(&self) -> [f32; 16] {
        *self.as_column_major_array()
    }

    /// Returns the 16 values of the matrix in row-major order.
    #[inline]
    pub fn to_row_major_array(&self) -> [f32; 16] {
        bytemuck::cast(self.rows())
    }

    /// Returns a view of the 16 values of the matrix in column-major order,
    /// without copying. The view borrows the matrix, so it cannot outlive it
    /// or observe modifications made while it is held.
    #[inline]
    pub fn as_column_major_array(&self) -> &[f32; 16] {
        bytemuck::cast_ref(self)
    }

    /// Returns a mutable view of the 16 values of the matrix in column-major
    /// order.
    #[inline]
    pub fn as_column_major_array_mut(&mut self) -> &mut [f32; 16] {
        bytemuck::cast_mut(self)
    }

    /// Returns the bytes of the matrix in column-major order, for direct
    /// upload to a uniform or vertex buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    fn column(&self, col: usize) -> &Vector4 {
        match col {
            0 => &self.column_1,
            1 => &self.column_2,
            2 => &self.column_3,
            3 => &self.column_4,
            _ => panic!("index out of bounds"),
        }
    }

    fn column_mut(&mut self, col: usize) -> &mut Vector4 {
        match col {
            0 => &mut self.column_1,
            1 => &mut self.column_2,
            2 => &mut self.column_3,
            3 => &mut self.column_4,
            _ => panic!("index out of bounds"),
        }
    }

    fn rows(&self) -> [[f32; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (row_idx, row) in rows.iter_mut().enumerate() {
            for (col, element) in row.iter_mut().enumerate() {
                *element = self.element(row_idx, col);
            }
        }
        rows
    }

    fn linear_part(&self) -> Rows3 {
        let c1 = self.column_1;
        let c2 = self.column_2;
        let c3 = self.column_3;
        [
            [c1.x(), c2.x(), c3.x()],
            [c1.y(), c2.y(), c3.y()],
            [c1.z(), c2.z(), c3.z()],
        ]
    }

    fn set_linear_part(&mut self, rows: &Rows3) {
        for (row, elements) in rows.iter().enumerate() {
            for (col, &element) in elements.iter().enumerate() {
                *self.element_mut(row, col) = element;
            }
        }
    }

    /// The upper left 3x3 block with each column divided by its length, or
    /// left as is if its length is negligible.
    pub(crate) fn rotation_part(&self) -> Rows3 {
        let scales = self.to_scale_values();
        let mut rows = self.linear_part();
        for col in 0..3 {
            let scale = scales[col];
            if scale >= EPSILON {
                for row in &mut rows {
                    row[col] /= scale;
                }
            }
        }
        rows
    }

    // Determinants and cofactors are evaluated in `f64`, where products of
    // up to four finite `f32` values can neither overflow nor underflow.
    fn rows_f64(&self) -> [[f64; 4]; 4] {
        self.rows().map(|row| row.map(f64::from))
    }

    fn linear_part_f64(&self) -> [[f64; 3]; 3] {
        self.linear_part().map(|row| row.map(f64::from))
    }

    fn inverse(&self) -> Option<Self> {
        let rows = self.rows_f64();
        let [
            [a00, a01, a02, a03],
            [a10, a11, a12, a13],
            [a20, a21, a22, a23],
            [a30, a31, a32, a33],
        ] = rows;

        let s0 = a00 * a11 - a10 * a01;
        let s1 = a00 * a12 - a10 * a02;
        let s2 = a00 * a13 - a10 * a03;
        let s3 = a01 * a12 - a11 * a02;
        let s4 = a01 * a13 - a11 * a03;
        let s5 = a02 * a13 - a12 * a03;

        let c0 = a20 * a31 - a30 * a21;
        let c1 = a20 * a32 - a30 * a22;
        let c2 = a20 * a33 - a30 * a23;
        let c3 = a21 * a32 - a31 * a22;
        let c4 = a21 * a33 - a31 * a23;
        let c5 = a22 * a33 - a32 * a23;

        let determinant = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;

        if is_negligible_determinant(determinant, column_norm_product(&rows)) {
            log::trace!("Leaving singular matrix uninverted (determinant {determinant})");
            return None;
        }

        let inv_det = determinant.recip();

        let inverse = [
            a11 * c5 - a12 * c4 + a13 * c3,
            -a01 * c5 + a02 * c4 - a03 * c3,
            a31 * s5 - a32 * s4 + a33 * s3,
            -a21 * s5 + a22 * s4 - a23 * s3,
            -a10 * c5 + a12 * c2 - a13 * c1,
            a00 * c5 - a02 * c2 + a03 * c1,
            -a30 * s5 + a32 * s2 - a33 * s1,
            a20 * s5 - a22 * s2 + a23 * s1,
            a10 * c4 - a11 * c2 + a13 * c0,
            -a00 * c4 + a01 * c2 - a03 * c0,
            a30 * s4 - a31 * s2 + a33 * s0,
            -a20 * s4 + a21 * s2 - a23 * s0,
            -a10 * c3 + a11 * c1 - a12 * c0,
            a00 * c3 - a01 * c1 + a02 * c0,
            -a30 * s3 + a31 * s1 - a32 * s0,
            a20 * s3 - a21 * s1 + a22 * s0,
        ]
        .map(|cofactor| (cofactor * inv_det) as f32);

        if !inverse.iter().all(|element| element.is_finite()) {
            log::trace!("Leaving matrix uninverted (inverse not representable)");
            return None;
        }

        Some(Self::from_row_major_array(&inverse))
    }

    fn inverse_3x3(&self) -> Option<Rows3> {
        let block = self.linear_part_f64();
        let [[b00, b01, b02], [b10, b11, b12], [b20, b21, b22]] = block;

        let determinant = determinant_3x3(&block);
        let column_norm_product: f64 = (0..3)
            .map(|col| (0..3).map(|row| block[row][col].powi(2)).sum::<f64>().sqrt())
            .product();

        if is_negligible_determinant(determinant, column_norm_product) {
            log::trace!("Leaving singular 3x3 block uninverted (determinant {determinant})");
            return None;
        }

        let inv_det = determinant.recip();

        let inverse = [
            [
                b11 * b22 - b12 * b21,
                b02 * b21 - b01 * b22,
                b01 * b12 - b02 * b11,
            ],
            [
                b12 * b20 - b10 * b22,
                b00 * b22 - b02 * b20,
                b02 * b10 - b00 * b12,
            ],
            [
                b10 * b21 - b11 * b20,
                b01 * b20 - b00 * b21,
                b00 * b11 - b01 * b10,
            ],
        ]
        .map(|row| row.map(|cofactor| (cofactor * inv_det) as f32));

        if !inverse.iter().flatten().all(|element| element.is_finite()) {
            log::trace!("Leaving 3x3 block uninverted (inverse not representable)");
            return None;
        }

        Some(inverse)
    }
}

const IDENTITY_3X3: Rows3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

fn determinant_4x4(rows: &[[f64; 4]; 4]) -> f64 {
    let [
        [a00, a01, a02, a03],
        [a10, a11, a12, a13],
        [a20, a21, a22, a23],
        [a30, a31, a32, a33],
    ] = *rows;

    (a00 * a11 - a01 * a10) * (a22 * a33 - a23 * a32)
        - (a00 * a12 - a02 * a10) * (a21 * a33 - a23 * a31)
        + (a00 * a13 - a03 * a10) * (a21 * a32 - a22 * a31)
        + (a01 * a12 - a02 * a11) * (a20 * a33 - a23 * a30)
        - (a01 * a13 - a03 * a11) * (a20 * a32 - a22 * a30)
        + (a02 * a13 - a03 * a12) * (a20 * a31 - a21 * a30)
}

fn determinant_3x3(block: &[[f64; 3]; 3]) -> f64 {
    let [[b00, b01, b02], [b10, b11, b12], [b20, b21, b22]] = *block;
    b00 * (b11 * b22 - b12 * b21) - b01 * (b10 * b22 - b12 * b20) + b02 * (b10 * b21 - b11 * b20)
}

fn column_norm_product(rows: &[[f64; 4]; 4]) -> f64 {
    (0..4)
        .map(|col| rows.iter().map(|row| row[col].powi(2)).sum::<f64>().sqrt())
        .product()
}

fn is_negligible_determinant(determinant: f64, column_norm_product: f64) -> bool {
    !determinant.is_finite() || determinant.abs() <= f64::from(EPSILON) * column_norm_product
}

/// Computes the 3x3 rotation matrix for the given angle about the given axis
/// using Rodrigues' formula, or returns [`None`] if the axis has negligible
/// length.
fn axis_angle_rotation(angle: impl Angle, x: f32, y: f32, z: f32) -> Option<Rows3> {
    let axis = Vector3::new(x, y, z);
    let norm = axis.norm();
    if norm < EPSILON {
        return None;
    }
    let axis = axis / norm;
    let (x, y, z) = (axis.x(), axis.y(), axis.z());

    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    Some([
        [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
        [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
        [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
    ])
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f32; 16]> for Matrix4 {
    /// Interprets the array as column-major.
    #[inline]
    fn from(array: [f32; 16]) -> Self {
        Self::from_column_major_array(&array)
    }
}

impl From<Matrix4> for [f32; 16] {
    #[inline]
    fn from(matrix: Matrix4) -> Self {
        matrix.to_column_major_array()
    }
}

impl_binop!(Add, add, Matrix4, Matrix4, Matrix4, |a, b| {
    ActiveBackend::add(a, b)
});

impl_binop!(Sub, sub, Matrix4, Matrix4, Matrix4, |a, b| {
    ActiveBackend::subtract(a, b)
});

impl_binop!(Mul, mul, Matrix4, Matrix4, Matrix4, |a, b| {
    ActiveBackend::multiply(a, b)
});

impl_binop!(Mul, mul, Matrix4, Vector4, Vector4, |a, b| {
    a.transform_vector4(b)
});

impl_binop_assign!(AddAssign, add_assign, Matrix4, Matrix4, |a, b| {
    *a = ActiveBackend::add(a, b);
});

impl_binop_assign!(SubAssign, sub_assign, Matrix4, Matrix4, |a, b| {
    *a = ActiveBackend::subtract(a, b);
});

impl_binop_assign!(MulAssign, mul_assign, Matrix4, Matrix4, |a, b| {
    a.multiply(b);
});

impl_unary_op!(Neg, neg, Matrix4, Matrix4, |val| {
    Matrix4::from_columns(-val.column_1, -val.column_2, -val.column_3, -val.column_4)
});

impl_abs_diff_eq!(Matrix4, |a, b, epsilon| {
    a.column_1.abs_diff_eq(&b.column_1, epsilon)
        && a.column_2.abs_diff_eq(&b.column_2, epsilon)
        && a.column_3.abs_diff_eq(&b.column_3, epsilon)
        && a.column_4.abs_diff_eq(&b.column_4, epsilon)
});

impl_relative_eq!(Matrix4, |a, b, epsilon, max_relative| {
    a.column_1.relative_eq(&b.column_1, epsilon, max_relative)
        && a.column_2.relative_eq(&b.column_2, epsilon, max_relative)
        && a.column_3.relative_eq(&b.column_3, epsilon, max_relative)
        && a.column_4.relative_eq(&b.column_4, epsilon, max_relative)
});

impl fmt::Display for Matrix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, [a, b, c, d]) in self.rows().into_iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "[{a}, {b}, {c}, {d}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::op_ref)]

    use super::*;
    use crate::angle::{Degrees, Radians};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const EPSILON: f32 = 1e-5;

    fn general_matrix() -> Matrix4 {
        Matrix4::new(
            2.0, -1.0, 0.5, 3.0, //
            0.0, 1.5, -2.0, -1.0, //
            1.0, 0.25, 3.0, 4.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn projective_matrix() -> Matrix4 {
        Matrix4::new(
            1.0, 2.0, 0.0, 1.0, //
            0.5, -1.0, 3.0, 0.0, //
            2.0, 0.0, 1.0, -2.0, //
            0.1, 0.2, -0.3, 2.0,
        )
    }

    #[test]
    fn creating_identity_gives_identity_matrix() {
        let identity = Matrix4::identity();
        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_eq!(identity.element(row, col), expected);
            }
        }
        assert!(identity.is_affine());
        assert_eq!(Matrix4::default(), identity);
    }

    #[test]
    fn creating_zeros_gives_zero_matrix() {
        assert!(Matrix4::zeros().to_column_major_array().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn creating_matrix_from_elements_lays_them_out_column_major() {
        let m = Matrix4::new(
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        );
        assert_eq!(
            m.to_column_major_array(),
            [
                1.0, 5.0, 9.0, 13.0, 2.0, 6.0, 10.0, 14.0, 3.0, 7.0, 11.0, 15.0, 4.0, 8.0, 12.0,
                16.0
            ]
        );
        assert_eq!(m.element(0, 3), 4.0);
        assert_eq!(m.element(3, 0), 13.0);
        assert_eq!(m.to_position(), Vector3::new(4.0, 8.0, 12.0));
    }

    #[test]
    fn row_major_import_transposes_and_column_major_import_copies() {
        let values: [f32; 16] = std::array::from_fn(|i| i as f32);

        let from_rows = Matrix4::from_row_major_array(&values);
        let from_columns = Matrix4::from_column_major_array(&values);

        assert_eq!(from_rows.to_row_major_array(), values);
        assert_eq!(from_columns.to_column_major_array(), values);

        let mut transposed = from_rows;
        transposed.transpose();
        assert_eq!(transposed, from_columns);
    }

    #[test]
    fn importing_3x3_array_embeds_block_in_identity() {
        let m = Matrix4::from_row_major_array_3x3(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(m.element(0, 1), 2.0);
        assert_eq!(m.element(1, 0), 4.0);
        assert_eq!(m.element(2, 2), 9.0);
        assert_eq!(*m.column_4(), Vector4::unit_w());
        assert!(m.is_affine());
        assert_eq!(
            m.to_column_major_array_3x3(),
            [1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0]
        );
    }

    #[test]
    fn importing_slices_of_wrong_length_fails() {
        assert!(Matrix4::from_column_major_slice(&[0.0; 15]).is_err());
        assert!(Matrix4::from_row_major_slice(&[0.0; 17]).is_err());
        assert!(Matrix4::from_row_major_3x3_slice(&[0.0; 16]).is_err());
    }

    #[test]
    fn importing_slices_of_right_length_matches_array_import() {
        let values: Vec<f32> = (0..16).map(|i| i as f32 * 0.5).collect();
        let array: [f32; 16] = values.clone().try_into().unwrap();

        assert_eq!(
            Matrix4::from_column_major_slice(&values).unwrap(),
            Matrix4::from_column_major_array(&array)
        );
        assert_eq!(
            Matrix4::from_row_major_slice(&values).unwrap(),
            Matrix4::from_row_major_array(&array)
        );
        assert_eq!(
            Matrix4::from_row_major_3x3_slice(&values[..9]).unwrap(),
            Matrix4::from_row_major_array_3x3(&array[..9].try_into().unwrap())
        );
    }

    #[test]
    fn creating_matrix_from_scales_gives_diagonal_matrix() {
        let m = Matrix4::from_scales(2.0, 3.0, 4.0);
        assert_eq!(
            m.to_row_major_array(),
            [
                2.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, 1.0
            ]
        );
        assert_eq!(m.to_scale_values(), Vector3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn setting_elements_and_columns_works() {
        let mut m = Matrix4::identity();
        *m.element_mut(1, 2) = 5.0;
        assert_eq!(m.column_3().y(), 5.0);

        m.set_column_2(Vector4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(m.element(3, 1), 4.0);
        assert!(!m.is_affine());
    }

    #[test]
    #[should_panic]
    fn accessing_element_outside_matrix_panics() {
        let _ = Matrix4::identity().element(0, 4);
    }

    #[test]
    fn copying_matrix_gives_independent_storage() {
        let source = general_matrix();
        let mut copy = Matrix4::zeros();
        copy.copy_from(&source);
        assert_eq!(copy, source);

        copy.translate(1.0, 0.0, 0.0);
        assert_ne!(copy, source);
        assert_eq!(source, general_matrix());
    }

    #[test]
    fn determinant_of_identity_is_one() {
        assert_eq!(Matrix4::identity().determinant(), 1.0);
        assert_eq!(Matrix4::identity().determinant_3x3(), 1.0);
    }

    #[test]
    fn determinant_of_scaling_matrix_is_product_of_scales() {
        let m = Matrix4::from_scales(2.0, -3.0, 0.5);
        assert_abs_diff_eq!(m.determinant(), -3.0, epsilon = EPSILON);
        assert_abs_diff_eq!(m.determinant_3x3(), -3.0, epsilon = EPSILON);
    }

    #[test]
    fn determinant_of_general_matrix_is_correct() {
        // Expanded by hand along the bottom row (0, 0, 0, 1)
        let expected = 2.0 * (1.5 * 3.0 - (-2.0) * 0.25) - (-1.0) * (0.0 * 3.0 - (-2.0) * 1.0)
            + 0.5 * (0.0 * 0.25 - 1.5 * 1.0);
        assert_abs_diff_eq!(general_matrix().determinant(), expected, epsilon = EPSILON);
        assert_abs_diff_eq!(general_matrix().determinant_3x3(), expected, epsilon = EPSILON);
    }

    #[test]
    fn determinant_is_invariant_under_transpose() {
        let m = projective_matrix();
        let mut transposed = m;
        transposed.transpose();
        assert_relative_eq!(m.determinant(), transposed.determinant(), epsilon = EPSILON);
    }

    #[test]
    fn inverting_general_matrix_gives_inverse() {
        for m in [general_matrix(), projective_matrix()] {
            let mut inverse = m;
            inverse.invert();
            assert_abs_diff_eq!(m * inverse, Matrix4::identity(), epsilon = EPSILON);
            assert_abs_diff_eq!(inverse * m, Matrix4::identity(), epsilon = EPSILON);
        }
    }

    #[test]
    fn inverting_twice_gives_original_matrix() {
        let m = projective_matrix();
        let mut twice_inverted = m;
        twice_inverted.invert();
        twice_inverted.invert();
        assert_relative_eq!(twice_inverted, m, epsilon = EPSILON, max_relative = EPSILON);
    }

    #[test]
    fn inverting_singular_matrix_leaves_it_unmodified() {
        let mut singular = Matrix4::new(
            1.0, 2.0, 3.0, 4.0, //
            2.0, 4.0, 6.0, 8.0, //
            0.0, 1.0, 0.0, 1.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        let original = singular;
        assert!(!singular.is_invertible());

        singular.invert();
        assert_eq!(singular, original);

        let mut zeros = Matrix4::zeros();
        zeros.invert();
        assert_eq!(zeros, Matrix4::zeros());
    }

    #[test]
    fn small_but_regular_matrix_is_invertible() {
        let mut m = Matrix4::from_scales(1e-3, 1e-3, 1e-3);
        assert!(m.is_invertible());
        m.invert();
        assert_relative_eq!(m, Matrix4::from_scales(1e3, 1e3, 1e3), max_relative = EPSILON);
    }

    #[test]
    fn inverting_tiny_scaling_matrix_gives_finite_inverse() {
        let mut m = Matrix4::from_scales(1e-13, 1e-13, 1e-13);
        assert!(m.is_invertible());
        m.invert();
        assert!(m.as_column_major_array().iter().all(|value| value.is_finite()));
        assert_relative_eq!(m, Matrix4::from_scales(1e13, 1e13, 1e13), max_relative = EPSILON);

        m.invert();
        assert_relative_eq!(
            m,
            Matrix4::from_scales(1e-13, 1e-13, 1e-13),
            max_relative = EPSILON
        );
    }

    #[test]
    fn inverting_huge_scaling_matrix_gives_inverse() {
        let mut m = Matrix4::from_scales(1e13, 1e13, 1e13);
        assert!(m.is_invertible());
        m.invert();
        assert_relative_eq!(
            m,
            Matrix4::from_scales(1e-13, 1e-13, 1e-13),
            max_relative = EPSILON
        );
    }

    #[test]
    fn determinant_of_huge_scaling_matrix_saturates_without_blocking_inversion() {
        let m = Matrix4::from_scales(1e15, 1e15, 1e15);
        assert_eq!(m.determinant(), f32::INFINITY);
        assert!(m.is_invertible());
    }

    #[test]
    fn inverting_matrix_with_unrepresentable_inverse_leaves_it_unmodified() {
        let mut m = Matrix4::from_scales(1e-39, 1.0, 1.0);
        let original = m;
        assert!(!m.is_invertible());
        m.invert();
        assert_eq!(m, original);

        m.invert_3x3();
        assert_eq!(m, original);
    }

    #[test]
    fn inverting_tiny_3x3_block_gives_finite_inverse() {
        let mut m = Matrix4::from_scales(1e-13, 2e-13, 4e-13);
        m.set_translation(1.0, 2.0, 3.0);

        m.invert_3x3();

        let mut expected = Matrix4::from_scales(1e13, 5e12, 2.5e12);
        expected.set_translation(1.0, 2.0, 3.0);
        assert!(m.as_column_major_array().iter().all(|value| value.is_finite()));
        assert_relative_eq!(m, expected, max_relative = EPSILON);
    }

    #[test]
    fn inverting_3x3_block_leaves_translation_unmodified() {
        let mut m = Matrix4::from_scales(2.0, 4.0, 0.5);
        m.set_translation(1.0, 2.0, 3.0);

        m.invert_3x3();

        let mut expected = Matrix4::from_scales(0.5, 0.25, 2.0);
        expected.set_translation(1.0, 2.0, 3.0);
        assert_abs_diff_eq!(m, expected, epsilon = EPSILON);
    }

    #[test]
    fn inverting_singular_3x3_block_leaves_matrix_unmodified() {
        let mut m = Matrix4::from_scales(1.0, 0.0, 1.0);
        m.set_translation(1.0, 2.0, 3.0);
        let original = m;
        m.invert_3x3();
        assert_eq!(m, original);
    }

    #[test]
    fn inverting_rotation_block_gives_its_transpose() {
        let mut m = Matrix4::from_axis_angle(Degrees(37.0), 1.0, -2.0, 0.5);
        let mut transposed = m;
        transposed.transpose();
        m.invert_3x3();
        assert_abs_diff_eq!(m, transposed, epsilon = EPSILON);
    }

    #[test]
    fn transposing_swaps_rows_and_columns() {
        let m = projective_matrix();
        let mut transposed = m;
        transposed.transpose();
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(transposed.element(row, col), m.element(col, row));
            }
        }
        transposed.transpose();
        assert_eq!(transposed, m);
    }

    #[test]
    fn multiplying_with_identity_gives_same_matrix() {
        let m = projective_matrix();

        let mut right = m;
        right.multiply(&Matrix4::identity());
        assert_eq!(right, m);

        let mut left = m;
        left.multiply_on_left(&Matrix4::identity());
        assert_eq!(left, m);
    }

    #[test]
    fn multiplication_composes_in_right_to_left_order() {
        let a = general_matrix();
        let b = projective_matrix();
        let v = Vector4::new(1.0, -2.0, 0.5, 1.0);

        let mut ab = a;
        ab.multiply(&b);
        assert_abs_diff_eq!(ab * v, a * (b * v), epsilon = EPSILON);

        let mut ba = a;
        ba.multiply_on_left(&b);
        assert_abs_diff_eq!(ba * v, b * (a * v), epsilon = EPSILON);
        assert_abs_diff_eq!(ba, b * a, epsilon = EPSILON);
    }

    #[test]
    fn multiplying_on_left_3x3_leaves_translation_unmodified() {
        let mut m = Matrix4::from_scales(2.0, 2.0, 2.0);
        m.set_translation(5.0, 6.0, 7.0);
        let rotation = Matrix4::from_axis_angle(Degrees(90.0), 0.0, 0.0, 1.0);

        m.multiply_on_left_3x3(&rotation);

        assert_eq!(m.to_position(), Vector3::new(5.0, 6.0, 7.0));
        assert_abs_diff_eq!(
            m.transform_direction(&Vector3::unit_x()),
            Vector3::new(0.0, 2.0, 0.0),
            epsilon = EPSILON
        );
        assert!(m.is_affine());
    }

    #[test]
    fn transforming_direction_excludes_translation() {
        let mut m = Matrix4::identity();
        m.set_translation(10.0, 0.0, 0.0);

        assert_eq!(
            m.transform_direction(&Vector3::unit_x()),
            Vector3::unit_x()
        );
        assert_eq!(
            m.transform_point(&Vector3::unit_x()),
            Vector3::new(11.0, 0.0, 0.0)
        );
    }

    #[test]
    fn transforming_vector4_respects_w() {
        let mut m = Matrix4::from_scales(2.0, 2.0, 2.0);
        m.set_translation(1.0, 2.0, 3.0);

        assert_eq!(
            m.transform_vector4(&Vector4::new(1.0, 1.0, 1.0, 1.0)),
            Vector4::new(3.0, 4.0, 5.0, 1.0)
        );
        assert_eq!(
            m.transform_vector4(&Vector4::new(1.0, 1.0, 1.0, 0.0)),
            Vector4::new(2.0, 2.0, 2.0, 0.0)
        );
    }

    #[test]
    fn transforming_array4_matches_vector4_transform() {
        let m = projective_matrix();
        let mut array = [1.0, 2.0, -3.0, 0.5];
        let expected = m.transform_vector4(&Vector4::from(array));
        m.transform_array4(&mut array);
        assert_eq!(Vector4::from(array), expected);
    }

    #[test]
    fn rotating_about_z_maps_x_to_y() {
        let mut m = Matrix4::identity();
        m.rotate(Degrees(90.0), 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(
            m.transform_point(&Vector3::unit_x()),
            Vector3::unit_y(),
            epsilon = EPSILON
        );
    }

    #[test]
    fn rotation_axis_does_not_need_to_be_normalized() {
        let a = Matrix4::from_axis_angle(Radians(0.3), 0.0, 5.0, 0.0);
        let b = Matrix4::from_axis_angle(Radians(0.3), 0.0, 1.0, 0.0);
        assert_abs_diff_eq!(a, b, epsilon = EPSILON);
    }

    #[test]
    fn rotating_about_zero_axis_leaves_matrix_unmodified() {
        let mut m = general_matrix();
        m.rotate(Degrees(45.0), 0.0, 0.0, 0.0);
        assert_eq!(m, general_matrix());
    }

    #[test]
    fn rotation_is_applied_before_existing_translation() {
        let mut m = Matrix4::identity();
        m.set_translation(1.0, 0.0, 0.0);
        m.rotate(Degrees(90.0), 0.0, 0.0, 1.0);

        assert_abs_diff_eq!(
            m.transform_point(&Vector3::unit_x()),
            Vector3::new(1.0, 1.0, 0.0),
            epsilon = EPSILON
        );
        assert_eq!(m.to_position(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn setting_rotation_replaces_block_and_keeps_translation() {
        let mut m = Matrix4::from_scales(3.0, 3.0, 3.0);
        m.set_translation(1.0, 2.0, 3.0);

        m.set_rotation(Degrees(90.0), 1.0, 0.0, 0.0);

        assert_eq!(m.to_position(), Vector3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(m.to_scale_values(), Vector3::same(1.0), epsilon = EPSILON);
        assert_abs_diff_eq!(
            m.transform_direction(&Vector3::unit_y()),
            Vector3::unit_z(),
            epsilon = EPSILON
        );

        m.set_rotation(Degrees(90.0), 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(
            m.transform_direction(&Vector3::unit_y()),
            Vector3::unit_y(),
            epsilon = EPSILON
        );
    }

    #[test]
    fn euler_rotation_applies_x_then_y_then_z() {
        let mut euler = Matrix4::identity();
        euler.set_rotation_from_euler(Degrees(30.0), Degrees(40.0), Degrees(50.0));

        let mut composed = Matrix4::from_axis_angle(Degrees(50.0), 0.0, 0.0, 1.0);
        composed.rotate(Degrees(40.0), 0.0, 1.0, 0.0);
        composed.rotate(Degrees(30.0), 1.0, 0.0, 0.0);

        assert_abs_diff_eq!(euler, composed, epsilon = EPSILON);
    }

    #[test]
    fn euler_angles_round_trip_away_from_gimbal_lock() {
        for angles in [
            [30.0, 40.0, 50.0],
            [-120.0, 10.0, 170.0],
            [5.0, -80.0, -45.0],
        ] {
            let mut m = Matrix4::identity();
            m.set_rotation_from_euler(Degrees(angles[0]), Degrees(angles[1]), Degrees(angles[2]));
            assert_abs_diff_eq!(m.to_euler_angles(), Vector3::from(angles), epsilon = 1e-3);
        }
    }

    #[test]
    fn euler_angles_are_recovered_from_scaled_and_translated_matrix() {
        let mut m = Matrix4::identity();
        m.set_translation(4.0, 5.0, 6.0);
        m.set_rotation_from_euler(Degrees(30.0), Degrees(40.0), Degrees(50.0));
        m.scale(2.0, 0.5, 3.0);

        assert_abs_diff_eq!(
            m.to_euler_angles(),
            Vector3::new(30.0, 40.0, 50.0),
            epsilon = 1e-3
        );
        assert_abs_diff_eq!(m.to_scale_values(), Vector3::new(2.0, 0.5, 3.0), epsilon = EPSILON);
        assert_eq!(m.to_position(), Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn euler_angles_at_gimbal_lock_collapse_to_x_rotation() {
        for (ay, ax, az) in [(90.0, 20.0, 35.0), (-90.0, 20.0, 35.0)] {
            let mut m = Matrix4::identity();
            m.set_rotation_from_euler(Degrees(ax), Degrees(ay), Degrees(az));

            let angles = m.to_euler_angles();
            assert!(!angles.x().is_nan() && !angles.y().is_nan() && !angles.z().is_nan());
            assert_abs_diff_eq!(angles.y(), ay, epsilon = 1e-3);
            assert_eq!(angles.z(), 0.0);

            let mut recovered = Matrix4::identity();
            recovered.set_rotation_from_euler(
                Degrees(angles.x()),
                Degrees(angles.y()),
                Degrees(angles.z()),
            );
            assert_abs_diff_eq!(recovered, m, epsilon = 1e-4);
        }
    }

    #[test]
    fn setting_rotation_from_quaternion_matches_axis_angle() {
        let quaternion = Quaternion::from_axis_angle(&Vector3::new(1.0, 1.0, 0.0), Degrees(60.0));
        let mut from_quaternion = Matrix4::identity();
        from_quaternion.set_translation(7.0, 8.0, 9.0);
        from_quaternion.set_rotation_from_quaternion(&quaternion);

        let mut from_axis_angle = Matrix4::from_axis_angle(Degrees(60.0), 1.0, 1.0, 0.0);
        from_axis_angle.set_translation(7.0, 8.0, 9.0);

        assert_abs_diff_eq!(from_quaternion, from_axis_angle, epsilon = EPSILON);
    }

    #[test]
    fn setting_translation_is_absolute() {
        let mut m = Matrix4::from_axis_angle(Degrees(30.0), 0.0, 1.0, 0.0);
        m.set_translation(1.0, 2.0, 3.0);
        m.set_translation_by_vector(&Vector3::new(-1.0, 0.0, 2.0));
        assert_eq!(m.to_position(), Vector3::new(-1.0, 0.0, 2.0));
        assert_abs_diff_eq!(m.translation_length(), 5.0_f32.sqrt(), epsilon = EPSILON);
    }

    #[test]
    fn translating_accumulates() {
        let mut m = general_matrix();
        m.translate(1.0, 2.0, 3.0);
        m.translate_by_vector(&Vector3::new(4.0, 5.0, 6.0));

        let mut expected = general_matrix();
        expected.translate(5.0, 7.0, 9.0);

        assert_abs_diff_eq!(m, expected, epsilon = EPSILON);
    }

    #[test]
    fn translating_is_post_multiplication_with_translation_matrix() {
        let mut m = projective_matrix();
        m.translate(1.0, -2.0, 0.5);
        let expected = projective_matrix() * Matrix4::from_translation(&Vector3::new(1.0, -2.0, 0.5));
        assert_abs_diff_eq!(m, expected, epsilon = EPSILON);
    }

    #[test]
    fn translation_is_rotated_by_existing_rotation() {
        let mut m = Matrix4::from_axis_angle(Degrees(90.0), 0.0, 0.0, 1.0);
        m.translate(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(m.to_position(), Vector3::unit_y(), epsilon = EPSILON);
    }

    #[test]
    fn scaling_is_post_multiplication_with_scaling_matrix() {
        let mut m = projective_matrix();
        m.scale(2.0, 3.0, 4.0);
        let expected = projective_matrix() * Matrix4::from_scales(2.0, 3.0, 4.0);
        assert_abs_diff_eq!(m, expected, epsilon = EPSILON);
    }

    #[test]
    fn scaling_and_inverse_scaling_cancel() {
        let mut m = Matrix4::identity();
        m.scale(2.0, 3.0, 4.0);
        m.scale(0.5, 1.0 / 3.0, 0.25);
        assert_abs_diff_eq!(
            m.transform_point(&Vector3::same(1.0)),
            Vector3::same(1.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn column_major_array_round_trips_exactly() {
        let values = [
            1.5, -0.0, f32::MAX, f32::MIN_POSITIVE, 1e-30, -7.25, 3.0, 0.1, 1024.0, -1e-7, 2.0, 4.0,
            -3.5, 0.0, 8.0, 1.0,
        ];
        let m = Matrix4::from_column_major_array(&values);
        let round_tripped = m.to_column_major_array();
        for (a, b) in values.iter().zip(round_tripped.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(<[f32; 16]>::from(Matrix4::from(values)), values);
    }

    #[test]
    fn column_major_view_aliases_storage() {
        let mut m = general_matrix();
        assert_eq!(m.as_column_major_array(), &m.to_column_major_array());
        assert_eq!(m.as_column_major_array()[12], 3.0);

        m.as_column_major_array_mut()[13] = 42.0;
        assert_eq!(m.to_position().y(), 42.0);

        assert_eq!(m.as_bytes().len(), 64);
        assert_eq!(m.as_bytes(), bytemuck::cast_slice::<f32, u8>(&m.to_column_major_array()));
    }

    #[test]
    fn matrix_addition_and_subtraction_are_elementwise() {
        let a = general_matrix();
        let b = projective_matrix();

        let sum = a + b;
        let difference = a - b;
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(sum.element(row, col), a.element(row, col) + b.element(row, col));
                assert_eq!(
                    difference.element(row, col),
                    a.element(row, col) - b.element(row, col)
                );
            }
        }

        let mut c = a;
        c += b;
        c -= b;
        assert_abs_diff_eq!(c, a, epsilon = EPSILON);
        assert_eq!(a + (-a), Matrix4::zeros());
    }

    #[test]
    fn multiply_assign_matches_multiply() {
        let mut a = general_matrix();
        a *= projective_matrix();
        let mut b = general_matrix();
        b.multiply(&projective_matrix());
        assert_eq!(a, b);
    }

    #[test]
    fn displaying_matrix_prints_rows() {
        let m = Matrix4::from_scales(2.0, 3.0, 4.0);
        assert_eq!(
            m.to_string(),
            "[2, 0, 0, 0]\n[0, 3, 0, 0]\n[0, 0, 4, 0]\n[0, 0, 0, 1]"
        );
    }
}
