//! Camera orientation in the convention of RealityCapture XMP sidecars.
//!
//! RealityCapture expects the camera-to-world rotation of a camera with +z
//! forward, +x right and +y up, written in column-major order, and the camera
//! center in world coordinates.
use lazy_static::lazy_static;
use nalgebra::{Matrix3, Matrix4, Vector3};

use crate::text_matrix::format_py_float;

lazy_static! {
    /// Rotation of 180° about +x applied to the camera axes for RealityCapture.
    ///
    /// Numerically equal to the rotation block of
    /// [crate::extrinsics::CV_CAMERA_FLIP].
    #[rustfmt::skip]
    pub static ref RC_CAMERA_FLIP: Matrix3<f64> = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, -1.0, 0.0,
        0.0, 0.0, -1.0,
    );
}

/// Rotation and position of one camera, ready for an XMP sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct RcOrientation {
    /// camera-to-world rotation
    pub rotation: Matrix3<f64>,
    /// camera center in world coordinates
    pub position: Vector3<f64>,
}

impl RcOrientation {
    /// The nine rotation values, column-major, space separated.
    pub fn rotation_string(&self) -> String {
        rotation_column_major_string(&self.rotation)
    }

    /// The three position values, space separated.
    pub fn position_string(&self) -> String {
        position_string(&self.position)
    }
}

/// Orientation of a camera-to-world pose for RealityCapture.
///
/// The rotation block is right-multiplied by [RC_CAMERA_FLIP] and not
/// transposed. The position is the translation column, unmodified.
pub fn rc_orientation_from_pose(pose: &Matrix4<f64>) -> RcOrientation {
    let rotation = pose.fixed_view::<3, 3>(0, 0) * *RC_CAMERA_FLIP;
    let position = pose.fixed_view::<3, 1>(0, 3).into_owned();
    RcOrientation { rotation, position }
}

pub fn rotation_column_major_string(rotation: &Matrix3<f64>) -> String {
    // nalgebra stores matrices column-major
    join_values(rotation.as_slice().iter().copied())
}

pub fn position_string(position: &Vector3<f64>) -> String {
    join_values(position.iter().copied())
}

fn join_values(values: impl Iterator<Item = f64>) -> String {
    values.map(format_py_float).collect::<Vec<_>>().join(" ")
}
