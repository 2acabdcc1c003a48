//! Cross-checks against the transforms computed by `nalgebra`.

use affine_math::{Degrees, Matrix4, Quaternion, Radians, Vector3, Vector4};
use approx::{abs_diff_eq, relative_eq};
use nalgebra as na;
use proptest::prelude::*;

fn to_nalgebra(m: &Matrix4) -> na::Matrix4<f32> {
    na::Matrix4::from_column_slice(m.as_column_major_array())
}

fn from_nalgebra(m: &na::Matrix4<f32>) -> Matrix4 {
    Matrix4::from_column_major_slice(m.as_slice()).unwrap()
}

prop_compose! {
    fn matrix_strategy()(values in prop::array::uniform16(-10.0_f32..10.0)) -> Matrix4 {
        Matrix4::from_column_major_array(&values)
    }
}

prop_compose! {
    fn axis_strategy()(values in prop::array::uniform3(-1.0_f32..1.0)) -> na::Vector3<f32> {
        let axis = na::Vector3::from(values);
        if axis.norm() < 0.1 { na::Vector3::z() } else { axis }
    }
}

proptest! {
    #[test]
    fn product_matches_nalgebra(a in matrix_strategy(), b in matrix_strategy()) {
        let product = a * b;
        let reference = from_nalgebra(&(to_nalgebra(&a) * to_nalgebra(&b)));
        prop_assert!(abs_diff_eq!(product, reference, epsilon = 1e-3));
    }
}

proptest! {
    #[test]
    fn determinant_matches_nalgebra(m in matrix_strategy()) {
        let reference = to_nalgebra(&m).determinant();
        // The 24 terms of the expansion are each bounded by 1e4
        prop_assert!(abs_diff_eq!(m.determinant(), reference, epsilon = 1.0));
    }
}

proptest! {
    #[test]
    fn inverse_matches_nalgebra(m in matrix_strategy()) {
        let reference = to_nalgebra(&m).try_inverse();
        // Only compare well-conditioned matrices, where both inverses are accurate
        prop_assume!(reference.is_some_and(|inverse| inverse.amax() < 1.0));

        let mut inverse = m;
        inverse.invert();
        prop_assert!(m.is_invertible());
        prop_assert!(abs_diff_eq!(
            inverse,
            from_nalgebra(&reference.unwrap()),
            epsilon = 1e-3
        ));
    }
}

proptest! {
    #[test]
    fn transforming_vector_matches_nalgebra(
        m in matrix_strategy(),
        values in prop::array::uniform4(-10.0_f32..10.0),
    ) {
        let transformed = m * Vector4::from(values);
        let reference = to_nalgebra(&m) * na::Vector4::from(values);
        prop_assert!(abs_diff_eq!(
            transformed,
            Vector4::new(reference.x, reference.y, reference.z, reference.w),
            epsilon = 1e-3
        ));
    }
}

proptest! {
    #[test]
    fn axis_angle_rotation_matches_nalgebra(
        axis in axis_strategy(),
        angle in -3.0_f32..3.0,
        point in prop::array::uniform3(-10.0_f32..10.0),
    ) {
        let rotation = na::UnitQuaternion::from_axis_angle(&na::Unit::new_normalize(axis), angle);
        let reference = rotation.transform_vector(&na::Vector3::from(point));
        let reference = Vector3::new(reference.x, reference.y, reference.z);

        let m = Matrix4::from_axis_angle(Radians(angle), axis.x, axis.y, axis.z);
        prop_assert!(abs_diff_eq!(m.transform_direction(&Vector3::from(point)), reference, epsilon = 1e-4));

        let q = Quaternion::from_axis_angle(&Vector3::new(axis.x, axis.y, axis.z), Radians(angle));
        prop_assert!(abs_diff_eq!(q.rotate_vector(&Vector3::from(point)), reference, epsilon = 1e-4));
    }
}

proptest! {
    #[test]
    fn euler_rotation_matches_nalgebra_roll_pitch_yaw(
        ax in -3.0_f32..3.0,
        ay in -1.5_f32..1.5,
        az in -3.0_f32..3.0,
    ) {
        let reference = na::Rotation3::from_euler_angles(ax, ay, az).to_homogeneous();

        let mut m = Matrix4::identity();
        m.set_rotation_from_euler(Radians(ax), Radians(ay), Radians(az));
        prop_assert!(abs_diff_eq!(m, from_nalgebra(&reference), epsilon = 1e-5));

        let q = Quaternion::from_euler_angles(Radians(ax), Radians(ay), Radians(az));
        prop_assert!(abs_diff_eq!(q.to_rotation_matrix(), from_nalgebra(&reference), epsilon = 1e-5));
    }
}

#[test]
fn quaternion_from_rotation_matrix_matches_nalgebra() {
    let axis = na::Unit::new_normalize(na::Vector3::new(1.0, -2.0, 0.5));
    let reference = na::UnitQuaternion::from_axis_angle(&axis, 2.5);

    let q = Quaternion::from_rotation_matrix(&from_nalgebra(&reference.to_homogeneous()));
    let sign = if q.w() * reference.w < 0.0 { -1.0 } else { 1.0 };

    assert!(relative_eq!(q.x(), sign * reference.i, epsilon = 1e-5));
    assert!(relative_eq!(q.y(), sign * reference.j, epsilon = 1e-5));
    assert!(relative_eq!(q.z(), sign * reference.k, epsilon = 1e-5));
    assert!(relative_eq!(q.w(), sign * reference.w, epsilon = 1e-5));
}

#[test]
fn euler_angles_match_nalgebra_decomposition() {
    let rotation = na::Rotation3::from_euler_angles(0.4, -0.9, 2.1);
    let (roll, pitch, yaw) = rotation.euler_angles();

    let angles = from_nalgebra(&rotation.to_homogeneous()).to_euler_angles();

    assert!(abs_diff_eq!(angles.x(), Degrees::from(Radians(roll)).0, epsilon = 1e-3));
    assert!(abs_diff_eq!(angles.y(), Degrees::from(Radians(pitch)).0, epsilon = 1e-3));
    assert!(abs_diff_eq!(angles.z(), Degrees::from(Radians(yaw)).0, epsilon = 1e-3));
}
