//! Interchangeable implementations of the primitive matrix operations.
//!
//! The arithmetic that dominates the cost of composing transforms
//! (multiplication, addition, subtraction and transposition) is routed
//! through a [`MatrixBackend`]. A portable [`ScalarBackend`] is always
//! available, and the [`SimdBackend`] uses the vector instructions of the
//! target where there are any. [`ActiveBackend`] is the one used by
//! [`Matrix4`], selected at compile time through the `simd` feature.
//!
//! Both backends are always compiled, so that they can be checked against
//! each other with [`compare_backends`].

mod scalar;
mod simd;

pub use scalar::ScalarBackend;
pub use simd::SimdBackend;

use crate::matrix::Matrix4;

/// Implementation of the primitive matrix operations.
///
/// Every backend must produce the same results as [`ScalarBackend`] up to
/// floating-point rounding, and transposition must be exact.
pub trait MatrixBackend {
    /// A short name for the backend, used in diagnostics.
    const NAME: &'static str;

    /// Computes the transpose of the matrix.
    fn transpose(m: &Matrix4) -> Matrix4;

    /// Computes the matrix product `a × b`.
    fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4;

    /// Computes the elementwise sum of the matrices.
    fn add(a: &Matrix4, b: &Matrix4) -> Matrix4;

    /// Computes the elementwise difference `a - b`.
    fn subtract(a: &Matrix4, b: &Matrix4) -> Matrix4;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "simd")] {
        /// The backend used by [`Matrix4`].
        pub type ActiveBackend = SimdBackend;
    } else {
        /// The backend used by [`Matrix4`].
        pub type ActiveBackend = ScalarBackend;
    }
}

/// The largest relative deviation observed between two backends for each
/// primitive operation.
///
/// For a product, the deviation of each element is measured relative to the
/// sum of the magnitudes of the terms contributing to it, which bounds the
/// rounding error of any evaluation order. For sums and differences it is
/// measured relative to the sum of the magnitudes of the two operands. A
/// non-finite deviation is reported as infinite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BackendDeviation {
    pub transpose: f32,
    pub multiply: f32,
    pub add: f32,
    pub subtract: f32,
}

impl BackendDeviation {
    /// The largest deviation over all operations.
    pub fn max(&self) -> f32 {
        self.transpose
            .max(self.multiply)
            .max(self.add)
            .max(self.subtract)
    }

    /// Returns the elementwise maximum of the two sets of deviations.
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            transpose: self.transpose.max(other.transpose),
            multiply: self.multiply.max(other.multiply),
            add: self.add.max(other.add),
            subtract: self.subtract.max(other.subtract),
        }
    }

    /// Whether all deviations are within the given relative tolerance and
    /// the transposes are identical.
    pub fn is_within(&self, tolerance: f32) -> bool {
        self.transpose == 0.0
            && self.multiply <= tolerance
            && self.add <= tolerance
            && self.subtract <= tolerance
    }
}

/// Runs every primitive operation on the given operands with both backends
/// and reports how far the results deviate from each other.
pub fn compare_backends<A: MatrixBackend, B: MatrixBackend>(
    a: &Matrix4,
    b: &Matrix4,
) -> BackendDeviation {
    let deviation = BackendDeviation {
        transpose: max_deviation(&A::transpose(a), &B::transpose(a), |row, col| {
            a.element(col, row).abs()
        }),
        multiply: max_deviation(&A::multiply(a, b), &B::multiply(a, b), |row, col| {
            (0..4)
                .map(|k| (a.element(row, k) * b.element(k, col)).abs())
                .sum()
        }),
        add: max_deviation(&A::add(a, b), &B::add(a, b), |row, col| {
            a.element(row, col).abs() + b.element(row, col).abs()
        }),
        subtract: max_deviation(&A::subtract(a, b), &B::subtract(a, b), |row, col| {
            a.element(row, col).abs() + b.element(row, col).abs()
        }),
    };

    log::trace!(
        "Deviation between {} and {} backends: {deviation:?}",
        A::NAME,
        B::NAME
    );

    deviation
}

fn max_deviation(
    result_a: &Matrix4,
    result_b: &Matrix4,
    magnitude: impl Fn(usize, usize) -> f32,
) -> f32 {
    let mut max = 0.0_f32;
    for row in 0..4 {
        for col in 0..4 {
            let difference = (result_a.element(row, col) - result_b.element(row, col)).abs();
            let deviation = difference / magnitude(row, col).max(f32::MIN_POSITIVE);
            if !deviation.is_finite() {
                return f32::INFINITY;
            }
            max = max.max(deviation);
        }
    }
    max
}
