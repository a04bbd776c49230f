//! Flight log telemetry as a pose source.
//!
//! A flight log holds one comma separated record per image, in capture
//! order:
//!
//! ```text
//! id, x, y, z[, pitch, roll, yaw]
//! ```
//!
//! The first field (an id or timestamp) is not interpreted. Position fields
//! are kept as text and passed through verbatim. Attitude angles are in
//! degrees.
use std::path::Path;

use lazy_static::lazy_static;
use nalgebra::{Matrix3, Rotation3, Vector3};
use tracing::{debug, warn};

use crate::rc_convention::{rotation_column_major_string, RC_CAMERA_FLIP};
use crate::{IoContext, RcCalError, Result};

/// Minimum number of fields: id and a position.
pub const MIN_FIELDS: usize = 4;
/// Number of fields of a record with attitude.
pub const FIELDS_WITH_ATTITUDE: usize = 7;

lazy_static! {
    /// Orientation of a level camera with zero pitch and yaw.
    ///
    /// `Rx(90°) · RC_CAMERA_FLIP`.
    pub static ref DEFAULT_CAMERA_ROTATION: Matrix3<f64> =
        rotation_x_degrees(90.0) * *RC_CAMERA_FLIP;
}

/// Camera attitude of one record, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub pitch: f64,
    /// Parsed and kept, but not used by [attitude_to_rc_rotation].
    pub roll: f64,
    pub yaw: f64,
}

/// One parsed flight log record.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightLogRecord {
    /// 1-based line number in the log, for diagnostics.
    pub line: u64,
    /// Id or timestamp field, uninterpreted.
    pub id: String,
    /// Position fields, verbatim.
    pub position: [String; 3],
    pub attitude: Option<Attitude>,
}

impl FlightLogRecord {
    /// The position as written into an XMP sidecar.
    pub fn position_string(&self) -> String {
        self.position.join(" ")
    }

    /// The column-major RealityCapture rotation, if the attitude is known.
    pub fn rotation_string(&self) -> Option<String> {
        self.attitude
            .as_ref()
            .map(|attitude| rotation_column_major_string(&attitude_to_rc_rotation(attitude)))
    }
}

/// Camera-to-world rotation `Rz(yaw) · Rx(-pitch) · DEFAULT_CAMERA_ROTATION`.
///
/// Roll does not enter the composition.
pub fn attitude_to_rc_rotation(attitude: &Attitude) -> Matrix3<f64> {
    rotation_z_degrees(attitude.yaw)
        * rotation_x_degrees(-attitude.pitch)
        * *DEFAULT_CAMERA_ROTATION
}

fn rotation_x_degrees(angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle.to_radians()).into_inner()
}

fn rotation_z_degrees(angle: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle.to_radians()).into_inner()
}

/// Parse the fields of one record.
///
/// `line` and `path` are used for diagnostics only.
pub fn parse_record<'a, I>(fields: I, line: u64, path: &Path) -> Result<FlightLogRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let fields: Vec<&str> = fields.into_iter().map(str::trim).collect();
    let malformed = |msg: String| RcCalError::MalformedFlightLogRecord {
        path: path.to_path_buf(),
        line,
        msg,
    };

    if fields.len() < MIN_FIELDS {
        return Err(malformed(format!(
            "expected at least {MIN_FIELDS} fields (id, x, y, z), found {}",
            fields.len()
        )));
    }

    let attitude = match fields.len() {
        n if n < 5 => None,
        n if n < FIELDS_WITH_ATTITUDE => {
            return Err(malformed(format!(
                "incomplete attitude: expected pitch, roll and yaw, found {} of 3 fields",
                n - MIN_FIELDS
            )));
        }
        _ => {
            let angle = |idx: usize, name: &str| -> Result<f64> {
                fields[idx]
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("{name} \"{}\": {e}", fields[idx])))
            };
            let attitude = Attitude {
                pitch: angle(4, "pitch")?,
                roll: angle(5, "roll")?,
                yaw: angle(6, "yaw")?,
            };
            if attitude.roll != 0.0 {
                warn!(
                    "{}:{line}: roll of {}° is ignored in the camera rotation",
                    path.display(),
                    attitude.roll
                );
            }
            Some(attitude)
        }
    };

    Ok(FlightLogRecord {
        line,
        id: fields[0].to_string(),
        position: [
            fields[1].to_string(),
            fields[2].to_string(),
            fields[3].to_string(),
        ],
        attitude,
    })
}

/// Parse a whole flight log from a reader.
pub fn parse_flight_log<Rd: std::io::Read>(rdr: Rd, path: &Path) -> Result<Vec<FlightLogRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(rdr);

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(|source| RcCalError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let record = parse_record(row.iter(), line, path)?;
        debug!(
            "flight log record {} (line {line}): position {}",
            record.id,
            record.position_string()
        );
        records.push(record);
    }
    Ok(records)
}

/// Read a flight log file.
pub fn read_flight_log(path: &Path) -> Result<Vec<FlightLogRecord>> {
    let fd = std::fs::File::open(path).at_path(path)?;
    parse_flight_log(std::io::BufReader::new(fd), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tracing_test::traced_test;

    fn parse(line: &str) -> Result<FlightLogRecord> {
        parse_record(line.split(','), 1, Path::new("flight.log"))
    }

    #[test]
    fn test_position_only() {
        let record = parse("17, 1.50, -2.25,  30.000").unwrap();
        assert_eq!(record.id, "17");
        assert!(record.attitude.is_none());
        assert!(record.rotation_string().is_none());
        assert_eq!(record.position_string(), "1.50 -2.25 30.000");
    }

    #[test]
    fn test_too_few_fields() {
        let err = parse("17,1.0,2.0").unwrap_err();
        assert!(matches!(err, RcCalError::MalformedFlightLogRecord { .. }));
    }

    #[test]
    fn test_incomplete_attitude() {
        assert!(parse("17,1,2,3,10").is_err());
        assert!(parse("17,1,2,3,10,0").is_err());
    }

    #[test]
    fn test_non_numeric_angle() {
        let err = parse("17,1,2,3,ten,0,0").unwrap_err();
        assert!(err.to_string().contains("pitch"));
    }

    #[test]
    fn test_roll_is_kept() {
        let record = parse("t0,1,2,3,-30,5,45").unwrap();
        let attitude = record.attitude.unwrap();
        assert_eq!(attitude.roll, 5.0);
        // roll does not change the rotation
        let no_roll = Attitude { roll: 0.0, ..attitude };
        assert_eq!(
            attitude_to_rc_rotation(&attitude),
            attitude_to_rc_rotation(&no_roll)
        );
    }

    #[traced_test]
    #[test]
    fn test_nonzero_roll_warns() {
        parse("t0,1,2,3,-30,5,45").unwrap();
        assert!(logs_contain("roll of 5° is ignored"));
    }

    #[traced_test]
    #[test]
    fn test_zero_bank_is_silent() {
        parse("t0,1,2,3,-30,0,45").unwrap();
        parse("t1,1,2,3").unwrap();
        assert!(!logs_contain("is ignored"));
    }

    #[test]
    fn test_level_camera() {
        let level = Attitude {
            pitch: 0.0,
            roll: 0.0,
            yaw: 0.0,
        };
        let r = attitude_to_rc_rotation(&level);
        assert_relative_eq!(r, *DEFAULT_CAMERA_ROTATION, epsilon = 1e-12);
        // Rx(90°)·diag(1,-1,-1): camera +z axis maps to world -y.
        #[rustfmt::skip]
        let expected = Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
            0.0, -1.0, 0.0,
        );
        assert_relative_eq!(r, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_composition_order() {
        let attitude = Attitude {
            pitch: 20.0,
            roll: 0.0,
            yaw: 75.0,
        };
        let r = attitude_to_rc_rotation(&attitude);
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), 75f64.to_radians());
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), (-20f64).to_radians());
        let expected = yaw.matrix() * pitch.matrix() * *DEFAULT_CAMERA_ROTATION;
        assert_relative_eq!(r, expected, epsilon = 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_log_names_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.log");
        match read_flight_log(&path) {
            Err(RcCalError::Io { path: err_path, .. }) => assert_eq!(err_path, path),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_log() {
        let log = "# id,x,y,z,pitch,roll,yaw\n\
                   0,1.0,2.0,3.0,-90,0,0\n\
                   1,4.0,5.0,6.0\n";
        let records = parse_flight_log(log.as_bytes(), Path::new("flight.log")).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].attitude.is_some());
        assert_eq!(records[0].rotation_string().unwrap().split(' ').count(), 9);
        assert!(records[1].attitude.is_none());
        assert_eq!(records[1].position_string(), "4.0 5.0 6.0");
    }
}
