//! Convert photogrammetry camera calibration inputs into pinhole camera
//! matrices and [RealityCapture](https://www.capturingreality.com) XMP
//! sidecar files.
//!
//! The inputs of one scene are per-image `(height, width, fov)` triples and
//! either per-image 4x4 camera-to-world pose matrices or a single flight log
//! with one comma separated record per image. From these this crate derives:
//!
//! - 3x3 pinhole intrinsic matrices ([`intrinsics`]),
//! - 3x4 world-to-camera extrinsic matrices in the computer vision camera
//!   convention ([`extrinsics`]),
//! - RealityCapture XMP sidecars holding the 35mm-equivalent focal length,
//!   the camera-to-world rotation and the camera position ([`xmp`]).
//!
//! ## Coordinate conventions
//!
//! Poses are given in a graphics convention where the camera looks along its
//! -z axis with +y up. Both outputs flip the camera by 180° about its +x axis,
//! but they do so independently: the extrinsics are transposed into a
//! world-to-camera rotation, whereas RealityCapture wants the camera-to-world
//! rotation written column-major. The two flips are kept as separate
//! constants, [`extrinsics::CV_CAMERA_FLIP`] and
//! [`rc_convention::RC_CAMERA_FLIP`].
//!
//! ## Example
//!
//! ```rust
//! use rc_cal::intrinsics::{HwFov, intrinsics_from_hwfov};
//! use rc_cal::xmp::format_focal_length;
//!
//! let hwfov = HwFov { height: 1080.0, width: 1920.0, fov_degrees: 90.0 };
//! let k = intrinsics_from_hwfov(&hwfov);
//! assert!((k[(0, 0)] - 960.0).abs() < 1e-9);
//! assert_eq!(k[(1, 2)], 540.0);
//!
//! assert_eq!(format_focal_length(13.125), "13.125");
//! assert_eq!(format_focal_length(10.0), "10.");
//! ```
#![deny(rust_2018_idioms)]
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RcCalError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse \"{token}\" as a number in {path} (line {line})")]
    ParseNumber {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("expected {expected} in {path}, found {found}")]
    InvalidShape {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
    #[error("flight log {path} line {line}: {msg}")]
    MalformedFlightLogRecord {
        path: PathBuf,
        line: u64,
        msg: String,
    },
    #[error("csv error reading {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("xml error: {0}")]
    Xml(#[from] xml::writer::Error),
    #[error("{pose_count} pose records but {focal_count} focal length records: inputs not paired")]
    NotPaired {
        pose_count: usize,
        focal_count: usize,
    },
    #[error("no pose source in {0}: expected a \"poses\" directory or a \"*.log\" flight log")]
    MissingPoseSource(PathBuf),
    #[error("no focal length source in {0}: expected a \"hwfovs\" directory or \"hwfov.txt\"")]
    MissingFocalSource(PathBuf),
    #[error("{operation} requires per-image pose matrices but the scene provides {found}")]
    UnsupportedPoseSource {
        operation: &'static str,
        found: PathBuf,
    },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<M> = std::result::Result<M, RcCalError>;

/// Attach a path to an [std::io::Error].
pub(crate) trait IoContext<T> {
    fn at_path(self, path: &std::path::Path) -> Result<T>;
}

impl<T> IoContext<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| RcCalError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub mod intrinsics;

pub mod extrinsics;

pub mod rc_convention;

pub mod flight_log;

pub mod xmp;

pub mod text_matrix;

pub mod scene;

pub mod pipeline;

pub use crate::flight_log::{Attitude, FlightLogRecord};
pub use crate::intrinsics::HwFov;
pub use crate::pipeline::{run_extrinsics, run_intrinsics, run_rc};
pub use crate::scene::{FocalSource, PoseSource, SceneLayout};
pub use crate::xmp::CalibrationRecord;
