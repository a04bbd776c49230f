//! Scene directory layout and input source selection.
//!
//! A scene named `name` reads from `<input_root>/<name>/` and writes to
//! `<output_root>/<name>/`. Which pose and focal length sources a scene
//! provides is decided once, by probing the input directory, and captured in
//! [PoseSource] and [FocalSource].
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::flight_log::{read_flight_log, FlightLogRecord};
use crate::intrinsics::HwFov;
use crate::text_matrix::{read_fixed, read_flat};
use crate::{IoContext, RcCalError, Result};

pub const POSES_DIRNAME: &str = "poses";
pub const HWFOVS_DIRNAME: &str = "hwfovs";
pub const SHARED_HWFOV_FNAME: &str = "hwfov.txt";
pub const FLIGHT_LOG_PATTERN: &str = "*.log";

pub const INTRINSICS_DIRNAME: &str = "intrinsics";
pub const EXTRINSICS_DIRNAME: &str = "extrinsics";
pub const RC_DIRNAME: &str = "rc";

/// Input and output directories of one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLayout {
    pub scene_name: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl SceneLayout {
    /// Scene under `input/` and `output/` of the current directory.
    pub fn new(scene_name: &str) -> Self {
        Self::with_roots(scene_name, "input", "output")
    }

    pub fn with_roots(
        scene_name: &str,
        input_root: impl AsRef<Path>,
        output_root: impl AsRef<Path>,
    ) -> Self {
        Self {
            scene_name: scene_name.to_string(),
            input_dir: input_root.as_ref().join(scene_name),
            output_dir: output_root.as_ref().join(scene_name),
        }
    }

    pub fn intrinsics_dir(&self) -> PathBuf {
        self.output_dir.join(INTRINSICS_DIRNAME)
    }

    pub fn extrinsics_dir(&self) -> PathBuf {
        self.output_dir.join(EXTRINSICS_DIRNAME)
    }

    pub fn rc_dir(&self) -> PathBuf {
        self.output_dir.join(RC_DIRNAME)
    }
}

/// Where the camera poses of a scene come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseSource {
    /// One 4x4 pose matrix file per image, in sorted file name order.
    PoseFiles(Vec<PathBuf>),
    /// One flight log with a record per image, in line order.
    FlightLog(PathBuf),
}

impl PoseSource {
    /// Probe the scene input directory.
    ///
    /// A `poses` directory takes precedence over a flight log.
    pub fn resolve(layout: &SceneLayout) -> Result<Self> {
        let pose_dir = layout.input_dir.join(POSES_DIRNAME);
        if pose_dir.is_dir() {
            let files = sorted_files(&pose_dir)?;
            info!(
                "Using {} pose files from {}",
                files.len(),
                pose_dir.display()
            );
            return Ok(PoseSource::PoseFiles(files));
        }

        let pattern = format!(
            "{}/{FLIGHT_LOG_PATTERN}",
            glob::Pattern::escape(&layout.input_dir.to_string_lossy())
        );
        let mut logs: Vec<PathBuf> = glob::glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable path: {e}");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        logs.sort();

        match logs.len() {
            0 => Err(RcCalError::MissingPoseSource(layout.input_dir.clone())),
            n => {
                if n > 1 {
                    warn!(
                        "Found {n} flight logs in {}, using {}",
                        layout.input_dir.display(),
                        logs[0].display()
                    );
                }
                let path = logs.swap_remove(0);
                info!("Using flight log {}", path.display());
                Ok(PoseSource::FlightLog(path))
            }
        }
    }

    pub fn load(&self) -> Result<LoadedPoses> {
        match self {
            PoseSource::PoseFiles(files) => Ok(LoadedPoses::Matrices(
                files
                    .iter()
                    .map(|path| load_pose(path))
                    .collect::<Result<Vec<_>>>()?,
            )),
            PoseSource::FlightLog(path) => Ok(LoadedPoses::FlightLog(read_flight_log(path)?)),
        }
    }

    /// Number of pose records, without parsing pose files.
    pub fn count(&self) -> Result<usize> {
        match self {
            PoseSource::PoseFiles(files) => Ok(files.len()),
            PoseSource::FlightLog(path) => Ok(read_flight_log(path)?.len()),
        }
    }
}

/// Where the image size and field of view of a scene come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocalSource {
    /// One `(height, width, fov)` file per image, in sorted file name order.
    PerImageFiles(Vec<PathBuf>),
    /// A single `(height, width, fov)` file applied to every image.
    SharedFile(PathBuf),
}

impl FocalSource {
    /// Probe the scene input directory.
    ///
    /// An `hwfovs` directory takes precedence over `hwfov.txt`.
    pub fn resolve(layout: &SceneLayout) -> Result<Self> {
        let hwfov_dir = layout.input_dir.join(HWFOVS_DIRNAME);
        if hwfov_dir.is_dir() {
            let files = sorted_files(&hwfov_dir)?;
            info!(
                "Using {} field of view files from {}",
                files.len(),
                hwfov_dir.display()
            );
            return Ok(FocalSource::PerImageFiles(files));
        }
        let shared = layout.input_dir.join(SHARED_HWFOV_FNAME);
        if shared.is_file() {
            info!("Using shared field of view {}", shared.display());
            return Ok(FocalSource::SharedFile(shared));
        }
        Err(RcCalError::MissingFocalSource(layout.input_dir.clone()))
    }

    /// Number of records, if the source fixes it.
    pub fn count(&self) -> Option<usize> {
        match self {
            FocalSource::PerImageFiles(files) => Some(files.len()),
            FocalSource::SharedFile(_) => None,
        }
    }

    /// Load one record per image.
    ///
    /// `pose_count` is the number of pose records the focal lengths are paired
    /// with. A per-image source must match it; a shared source is repeated
    /// that many times. Without poses a shared source yields one record.
    pub fn load(&self, pose_count: Option<usize>) -> Result<Vec<HwFov>> {
        match self {
            FocalSource::PerImageFiles(files) => {
                if let Some(pose_count) = pose_count {
                    check_paired(pose_count, files.len())?;
                }
                files.iter().map(|path| load_hwfov(path)).collect()
            }
            FocalSource::SharedFile(path) => {
                let hwfov = load_hwfov(path)?;
                Ok(vec![hwfov; pose_count.unwrap_or(1)])
            }
        }
    }
}

pub(crate) fn check_paired(pose_count: usize, focal_count: usize) -> Result<()> {
    if pose_count != focal_count {
        return Err(RcCalError::NotPaired {
            pose_count,
            focal_count,
        });
    }
    Ok(())
}

/// Regular files in `dir`, sorted by file name.
pub fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).at_path(dir)? {
        let entry = entry.at_path(dir)?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!("Ignoring non-file {}", path.display());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn load_hwfov(path: &Path) -> Result<HwFov> {
    Ok(HwFov::from_values(read_flat::<3>(path)?))
}

pub fn load_pose(path: &Path) -> Result<nalgebra::Matrix4<f64>> {
    let rows = read_fixed::<4, 4>(path)?;
    Ok(nalgebra::Matrix4::from_fn(|i, j| rows[i][j]))
}

/// Pose data loaded from a [PoseSource].
#[derive(Debug, Clone)]
pub enum LoadedPoses {
    Matrices(Vec<nalgebra::Matrix4<f64>>),
    FlightLog(Vec<FlightLogRecord>),
}

impl LoadedPoses {
    pub fn len(&self) -> usize {
        match self {
            LoadedPoses::Matrices(m) => m.len(),
            LoadedPoses::FlightLog(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
