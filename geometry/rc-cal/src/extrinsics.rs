//! World-to-camera extrinsics from camera-to-world poses.
use lazy_static::lazy_static;
use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};

lazy_static! {
    /// Rotation of 180° about +x, as a homogeneous transform.
    ///
    /// Right-multiplying a graphics-convention pose (camera looking along -z,
    /// +y up) by this yields the computer vision camera convention (looking
    /// along +z, +y down).
    #[rustfmt::skip]
    pub static ref CV_CAMERA_FLIP: Matrix4<f64> = Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0, 0.0, -1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
}

/// Convert a 4x4 camera-to-world pose into a 3x4 `[R | t]` extrinsic matrix.
///
/// `R` is the world-to-camera rotation and `t = -R·c` with `c` the camera
/// center. The rotation block of `pose` is assumed orthonormal; this is not
/// checked.
pub fn pose_to_extrinsics(pose: &Matrix4<f64>) -> Matrix3x4<f64> {
    let pose = pose * *CV_CAMERA_FLIP;
    let rmat: Matrix3<f64> = pose.fixed_view::<3, 3>(0, 0).transpose();
    let camcenter: Vector3<f64> = pose.fixed_view::<3, 1>(0, 3).into_owned();
    let t = -(rmat * camcenter);

    let mut extrinsics = Matrix3x4::zeros();
    extrinsics.fixed_view_mut::<3, 3>(0, 0).copy_from(&rmat);
    extrinsics.set_column(3, &t);
    extrinsics
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Rotation3, Unit};

    fn pose_from(rot: &Rotation3<f64>, camcenter: &Vector3<f64>) -> Matrix4<f64> {
        let mut pose = Matrix4::identity();
        pose.fixed_view_mut::<3, 3>(0, 0).copy_from(rot.matrix());
        pose.fixed_view_mut::<3, 1>(0, 3).copy_from(camcenter);
        pose
    }

    #[test]
    fn test_identity_pose() {
        let extrinsics = pose_to_extrinsics(&Matrix4::identity());
        let rx180 = Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI);
        let expected_r = rx180.matrix().transpose();
        assert_relative_eq!(
            extrinsics.fixed_view::<3, 3>(0, 0).into_owned(),
            expected_r,
            epsilon = 1e-12
        );
        assert_eq!(extrinsics.column(3).into_owned(), Vector3::zeros());
    }

    #[test]
    fn test_preserves_orthonormality() {
        let axes = [
            Vector3::new(0.3, -1.0, 0.2),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        for (i, axis) in axes.iter().enumerate() {
            let rot = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), 0.4 + i as f64);
            let pose = pose_from(&rot, &Vector3::new(1.0, -2.0, 3.5));
            let extrinsics = pose_to_extrinsics(&pose);
            let r = extrinsics.fixed_view::<3, 3>(0, 0).into_owned();
            assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-12);
            assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_camera_center_maps_to_origin() {
        let rot = Rotation3::from_euler_angles(0.1, -0.7, 2.0);
        let camcenter = Vector3::new(-20.58, -6.326, 21.45);
        let extrinsics = pose_to_extrinsics(&pose_from(&rot, &camcenter));
        let r = extrinsics.fixed_view::<3, 3>(0, 0);
        let t = extrinsics.column(3);
        let in_cam = r * camcenter + t;
        assert_relative_eq!(in_cam, Vector3::zeros(), epsilon = 1e-12);

        // A point straight ahead of the graphics camera (its -z axis) is in
        // front of the CV camera (+z).
        let ahead = Point3::from(camcenter) + rot * -Vector3::z();
        let ahead_cam = r * ahead.coords + t;
        assert_relative_eq!(ahead_cam, Vector3::z(), epsilon = 1e-12);
    }
}
