//! Portable implementation of the primitive matrix operations.

use super::MatrixBackend;
use crate::matrix::Matrix4;

/// Backend computing every element with plain scalar arithmetic. It is
/// available on every target and serves as the reference for other
/// backends.
#[derive(Clone, Copy, Debug)]
pub struct ScalarBackend;

impl MatrixBackend for ScalarBackend {
    const NAME: &'static str = "scalar";

    fn transpose(m: &Matrix4) -> Matrix4 {
        let m = m.as_column_major_array();
        Matrix4::from_column_major_array(&std::array::from_fn(|idx| {
            let (col, row) = (idx / 4, idx % 4);
            m[row * 4 + col]
        }))
    }

    fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        let a = a.as_column_major_array();
        let b = b.as_column_major_array();
        Matrix4::from_column_major_array(&std::array::from_fn(|idx| {
            let (col, row) = (idx / 4, idx % 4);
            a[row] * b[col * 4]
                + a[4 + row] * b[col * 4 + 1]
                + a[8 + row] * b[col * 4 + 2]
                + a[12 + row] * b[col * 4 + 3]
        }))
    }

    fn add(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        elementwise(a, b, |a, b| a + b)
    }

    fn subtract(a: &Matrix4, b: &Matrix4) -> Matrix4 {
        elementwise(a, b, |a, b| a - b)
    }
}

fn elementwise(a: &Matrix4, b: &Matrix4, op: impl Fn(f32, f32) -> f32) -> Matrix4 {
    let a = a.as_column_major_array();
    let b = b.as_column_major_array();
    Matrix4::from_column_major_array(&std::array::from_fn(|idx| op(a[idx], b[idx])))
}
