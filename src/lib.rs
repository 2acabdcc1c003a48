//! Transform algebra for 3D rendering: 4x4 affine and projective matrices
//! stored in the column-major layout expected by graphics APIs, with
//! composition, inversion, decomposition and planar shadow projection.

#[macro_use]
mod macros;

pub mod angle;
pub mod backend;
pub mod consts;
pub mod matrix;
pub mod projection;
pub mod quaternion;
pub mod vector;

pub use angle::{Angle, Degrees, Radians};
pub use backend::{
    ActiveBackend, BackendDeviation, MatrixBackend, ScalarBackend, SimdBackend, compare_backends,
};
pub use matrix::Matrix4;
pub use projection::{planar_projection_from_direction, planar_projection_from_position};
pub use quaternion::Quaternion;
pub use vector::{Vector3, Vector4};
