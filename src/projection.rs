//! Projection of geometry onto a plane, as used for planar shadows.
//!
//! The plane is given by its equation coefficients `(a, b, c, d)`, so that
//! points `p` on the plane satisfy `a*p.x + b*p.y + c*p.z + d = 0`. The
//! normal `(a, b, c)` does not have to be normalized.
//!
//! The returned matrices are projective. Multiplying a homogeneous point with
//! `w = 1` by them and dividing the result by its w-component gives the
//! projected point on the plane.
//!
//! When no projection exists, because the plane normal is zero, the source
//! lies on the plane or the direction runs parallel to it, the identity
//! matrix is returned.

use crate::{
    consts::EPSILON,
    matrix::Matrix4,
    vector::{Vector3, Vector4},
};

/// Creates the matrix projecting points onto the given plane along the lines
/// through the given position, like the shadow cast by a point light.
pub fn planar_projection_from_position(plane: &Vector4, position: &Vector3) -> Matrix4 {
    let Some(normal_norm) = plane_normal_norm(plane) else {
        return Matrix4::identity();
    };

    let source = position.extended(1.0);
    let signed_distance = plane.dot(&source) / normal_norm;

    if signed_distance.abs() <= EPSILON * position.norm().max(1.0) {
        log::trace!("Using identity projection for position on the projection plane");
        return Matrix4::identity();
    }

    projection_from_source(plane, &source)
}

/// Creates the matrix projecting points onto the given plane along the given
/// direction, like the shadow cast by a directional light. The direction
/// points from the light towards the plane and does not have to be
/// normalized.
pub fn planar_projection_from_direction(plane: &Vector4, direction: &Vector3) -> Matrix4 {
    let Some(normal_norm) = plane_normal_norm(plane) else {
        return Matrix4::identity();
    };

    let alignment = plane.truncated().dot(direction);

    if alignment.abs() <= EPSILON * normal_norm * direction.norm() {
        log::trace!("Using identity projection for direction parallel to the projection plane");
        return Matrix4::identity();
    }

    projection_from_source(plane, &direction.extended(0.0))
}

fn plane_normal_norm(plane: &Vector4) -> Option<f32> {
    let normal_norm = plane.truncated().norm();
    if normal_norm < EPSILON {
        log::trace!("Using identity projection for plane with zero normal");
        None
    } else {
        Some(normal_norm)
    }
}

/// Computes `(plane · source) I - source planeᵀ`, which maps every
/// homogeneous point `x` to the intersection of the plane with the line
/// through `x` and the homogeneous source point.
fn projection_from_source(plane: &Vector4, source: &Vector4) -> Matrix4 {
    let dot = plane.dot(source);
    let column = |unit: Vector4, plane_component: f32| unit * dot - source * plane_component;
    Matrix4::from_columns(
        column(Vector4::unit_x(), plane.x()),
        column(Vector4::unit_y(), plane.y()),
        column(Vector4::unit_z(), plane.z()),
        column(Vector4::unit_w(), plane.w()),
    )
}
