//! Whole-scene conversions.
//!
//! Every run resolves its input sources, loads and converts all records and
//! checks pairing before the first output file is created. A failing run
//! therefore leaves no partial output behind, except for I/O errors while
//! writing.
use std::path::{Path, PathBuf};

use nalgebra::{Matrix3, Matrix3x4};
use tracing::{debug, info};

use crate::extrinsics::pose_to_extrinsics;
use crate::intrinsics::{focal_length_35mm, intrinsics_from_hwfov};
use crate::rc_convention::rc_orientation_from_pose;
use crate::scene::{load_pose, FocalSource, LoadedPoses, PoseSource, SceneLayout};
use crate::text_matrix::save_matrix;
use crate::xmp::{save_xmp, xmp_filename, CalibrationRecord};
use crate::{IoContext, RcCalError, Result};

/// Write `intrinsics_{index:03}.txt` for every image of the scene.
///
/// With a shared `hwfov.txt` the number of images is taken from the pose
/// source of the scene.
pub fn run_intrinsics(layout: &SceneLayout) -> Result<Vec<PathBuf>> {
    let focal_source = FocalSource::resolve(layout)?;
    let pose_count = match focal_source {
        FocalSource::PerImageFiles(_) => None,
        FocalSource::SharedFile(_) => Some(PoseSource::resolve(layout)?.count()?),
    };
    let intrinsics: Vec<Matrix3<f64>> = focal_source
        .load(pose_count)?
        .iter()
        .map(intrinsics_from_hwfov)
        .collect();

    let out_dir = layout.intrinsics_dir();
    write_all(&out_dir, &intrinsics, |index, k| {
        let path = out_dir.join(format!("intrinsics_{index:03}.txt"));
        save_matrix(&path, k)?;
        Ok(path)
    })
}

/// Write `extrinsics_{index:03}.txt` for every pose file of the scene.
pub fn run_extrinsics(layout: &SceneLayout) -> Result<Vec<PathBuf>> {
    let files = match PoseSource::resolve(layout)? {
        PoseSource::PoseFiles(files) => files,
        PoseSource::FlightLog(found) => {
            return Err(RcCalError::UnsupportedPoseSource {
                operation: "extrinsics conversion",
                found,
            });
        }
    };
    let extrinsics = files
        .iter()
        .map(|path| Ok(pose_to_extrinsics(&load_pose(path)?)))
        .collect::<Result<Vec<Matrix3x4<f64>>>>()?;

    let out_dir = layout.extrinsics_dir();
    write_all(&out_dir, &extrinsics, |index, e| {
        let path = out_dir.join(format!("extrinsics_{index:03}.txt"));
        save_matrix(&path, e)?;
        Ok(path)
    })
}

/// Build the calibration records of a scene without writing anything.
pub fn calibration_records(layout: &SceneLayout) -> Result<Vec<CalibrationRecord>> {
    let pose_source = PoseSource::resolve(layout)?;
    let focal_source = FocalSource::resolve(layout)?;

    let poses = pose_source.load()?;
    let hwfovs = focal_source.load(Some(poses.len()))?;

    let records = match poses {
        LoadedPoses::Matrices(poses) => poses
            .iter()
            .zip(hwfovs.iter())
            .map(|(pose, hwfov)| {
                let orientation = rc_orientation_from_pose(pose);
                CalibrationRecord {
                    focal_length_35mm: focal_length_35mm(hwfov.fov_degrees),
                    rotation: Some(orientation.rotation_string()),
                    position: orientation.position_string(),
                }
            })
            .collect(),
        LoadedPoses::FlightLog(log) => log
            .iter()
            .zip(hwfovs.iter())
            .map(|(record, hwfov)| CalibrationRecord {
                focal_length_35mm: focal_length_35mm(hwfov.fov_degrees),
                rotation: record.rotation_string(),
                position: record.position_string(),
            })
            .collect(),
    };
    Ok(records)
}

/// Write `image_{index:03}.xmp` for every image of the scene.
pub fn run_rc(layout: &SceneLayout) -> Result<Vec<PathBuf>> {
    let records = calibration_records(layout)?;
    let out_dir = layout.rc_dir();
    write_all(&out_dir, &records, |index, record| {
        let path = out_dir.join(xmp_filename(index));
        save_xmp(&path, record)?;
        Ok(path)
    })
}

fn write_all<T, F>(out_dir: &Path, items: &[T], mut write_one: F) -> Result<Vec<PathBuf>>
where
    F: FnMut(usize, &T) -> Result<PathBuf>,
{
    std::fs::create_dir_all(out_dir).at_path(out_dir)?;
    let mut written = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = write_one(index, item)?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }
    info!("Wrote {} files to {}", written.len(), out_dir.display());
    Ok(written)
}
