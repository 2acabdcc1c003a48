//! Implementation of the primitive matrix operations using vector
//! instructions.

use super::MatrixBackend;
use crate::matrix::Matrix4;
use glam::Mat4;

/// Backend operating on whole columns at a time through [`glam`], which uses
/// SSE2 on x86, NEON on AArch64 and SIMD128 on WebAssembly, and falls back to
/// scalar code on other targets. The column-major storage of [`Matrix4`] is
/// also the layout of [`Mat4`], so conversion is a plain copy.
#[derive(Clone, Copy, Debug)]
pub struct SimdBackend;

impl MatrixBackend for SimdBackend {
    const NAME: &'static str = "simd";

    fn transpose(m: &Matrix4) -> Matrix4 {
        from_glam(&to_glam(m).transpose())
    }

    fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        from_glam(&to_glam(a).mul_mat4(&to_glam(b)))
    }

    fn add(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        from_glam(&to_glam(a).add_mat4(&to_glam(b)))
    }

    fn subtract(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        from_glam(&to_glam(a).sub_mat4(&to_glam(b)))
    }
}

#[inline]
fn to_glam(m: &Matrix4) -> Mat4 {
    Mat4::from_cols_array(m.as_column_major_array())
}

#[inline]
fn from_glam(m: &Mat4) -> Matrix4 {
    Matrix4::from_column_major_array(&m.to_cols_array())
}
