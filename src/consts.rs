//! Numeric constants.

pub use std::f32::consts::*;

/// Magnitude below which norms, determinants and dot products are treated as
/// zero. Determinant and projection checks scale it by the magnitude of their
/// inputs.
pub const EPSILON: f32 = 1e-6;

/// When the magnitude of the sine of the y-rotation extracted from a rotation
/// matrix exceeds this value, the x- and z-axes are considered aligned.
pub const GIMBAL_LOCK_THRESHOLD: f32 = 1.0 - EPSILON;
