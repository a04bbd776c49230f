//! Whitespace separated numeric text files.
//!
//! Reading accepts what `numpy.loadtxt` accepts for plain float files and
//! writing produces what `numpy.savetxt` produces with its default settings,
//! so files can be exchanged with existing Python tooling unchanged.
use std::io::Write;
use std::path::Path;

use nalgebra::{Dim, Matrix, RawStorage};

use crate::{IoContext, RcCalError, Result};

/// Parse numeric text into rows of values.
///
/// `#` starts a comment. Lines without values are skipped. `path` is only
/// used in error messages.
pub fn parse_rows(text: &str, path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let row = line
            .split_whitespace()
            .map(|token| {
                parse_float(token).ok_or_else(|| RcCalError::ParseNumber {
                    path: path.to_path_buf(),
                    line: i + 1,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn parse_float(token: &str) -> Option<f64> {
    // Python spells these differently from Rust.
    match token.to_ascii_lowercase().as_str() {
        "nan" | "+nan" | "-nan" => return Some(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => return Some(f64::INFINITY),
        "-inf" | "-infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    token.parse().ok()
}

/// Read all rows of a numeric text file.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = std::fs::read_to_string(path).at_path(path)?;
    parse_rows(&text, path)
}

/// Read a file holding exactly `R` rows of `C` values, row-major.
pub fn read_fixed<const R: usize, const C: usize>(path: &Path) -> Result<[[f64; C]; R]> {
    let rows = read_rows(path)?;
    let shape_err = || RcCalError::InvalidShape {
        path: path.to_path_buf(),
        expected: shape_name(R, C),
        found: describe_shape(&rows),
    };
    if rows.len() != R || rows.iter().any(|row| row.len() != C) {
        return Err(shape_err());
    }
    let mut out = [[0.0; C]; R];
    for (dest, src) in out.iter_mut().zip(rows.iter()) {
        dest.copy_from_slice(src);
    }
    Ok(out)
}

/// Read a file holding exactly `N` values, in any row layout.
pub fn read_flat<const N: usize>(path: &Path) -> Result<[f64; N]> {
    let rows = read_rows(path)?;
    let values: Vec<f64> = rows.iter().flatten().copied().collect();
    values
        .as_slice()
        .try_into()
        .map_err(|_| RcCalError::InvalidShape {
            path: path.to_path_buf(),
            expected: match N {
                3 => "3 values",
                _ => "a fixed number of values",
            },
            found: format!("{} values", values.len()),
        })
}

fn shape_name(rows: usize, cols: usize) -> &'static str {
    match (rows, cols) {
        (4, 4) => "a 4x4 matrix",
        (3, 3) => "a 3x3 matrix",
        (3, 4) => "a 3x4 matrix",
        _ => "a fixed size matrix",
    }
}

fn describe_shape(rows: &[Vec<f64>]) -> String {
    let lens: Vec<String> = rows.iter().map(|r| r.len().to_string()).collect();
    format!("{} rows with [{}] values", rows.len(), lens.join(", "))
}

/// Format like C's `%.18e`, which is the `numpy.savetxt` default.
pub fn format_savetxt(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    c_style_exponent(&format!("{value:.18e}"))
}

/// Format like Python's `str(float)`.
///
/// Rust's `Debug` output for `f64` is already the shortest round-trip
/// representation and switches to scientific notation at the same
/// magnitudes as Python, so only the exponent spelling differs.
pub fn format_py_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{value:?}");
    if s.contains('e') {
        c_style_exponent(&s)
    } else {
        s
    }
}

/// Rewrite a Rust exponent (`e2`, `e-5`) in C style (`e+02`, `e-05`).
fn c_style_exponent(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s.to_string(),
    }
}

/// Write a matrix in `numpy.savetxt` layout.
pub fn write_matrix<W, Rw, Cl, S>(mut wtr: W, m: &Matrix<f64, Rw, Cl, S>) -> std::io::Result<()>
where
    W: Write,
    Rw: Dim,
    Cl: Dim,
    S: RawStorage<f64, Rw, Cl>,
{
    for row in m.row_iter() {
        let line: Vec<String> = row.iter().map(|v| format_savetxt(*v)).collect();
        writeln!(wtr, "{}", line.join(" "))?;
    }
    Ok(())
}

/// Create `path` and write `m` into it.
pub fn save_matrix<Rw, Cl, S>(path: &Path, m: &Matrix<f64, Rw, Cl, S>) -> Result<()>
where
    Rw: Dim,
    Cl: Dim,
    S: RawStorage<f64, Rw, Cl>,
{
    let fd = std::fs::File::create(path).at_path(path)?;
    let mut wtr = std::io::BufWriter::new(fd);
    write_matrix(&mut wtr, m).at_path(path)?;
    wtr.flush().at_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn test_savetxt_format() {
        assert_eq!(format_savetxt(960.0), "9.600000000000000000e+02");
        assert_eq!(format_savetxt(0.0), "0.000000000000000000e+00");
        assert_eq!(format_savetxt(1.0), "1.000000000000000000e+00");
        assert_eq!(format_savetxt(-0.5), "-5.000000000000000000e-01");
        // %.18e shows the exact binary value
        assert_eq!(format_savetxt(1e-100), "1.000000000000000020e-100");
        assert_eq!(format_savetxt(0.1), "1.000000000000000056e-01");
        assert_eq!(format_savetxt(f64::INFINITY), "inf");
    }

    #[test]
    fn test_py_float_format() {
        assert_eq!(format_py_float(1.0), "1.0");
        assert_eq!(format_py_float(-0.0), "-0.0");
        assert_eq!(format_py_float(0.7071068), "0.7071068");
        assert_eq!(format_py_float(-20.5807016265379), "-20.5807016265379");
        assert_eq!(format_py_float(0.0001), "0.0001");
        assert_eq!(format_py_float(1e-5), "1e-05");
        assert_eq!(format_py_float(1.5e-7), "1.5e-07");
        assert_eq!(format_py_float(1e16), "1e+16");
        assert_eq!(format_py_float(1.2345e20), "1.2345e+20");
        assert_eq!(format_py_float(123456789.0), "123456789.0");
        assert_eq!(format_py_float(f64::NAN), "nan");
    }

    #[test]
    fn test_parse_rows() {
        let text = "# pose\n1 0 0 0\n0 1 0 0 # trailing\n\n0 0 1 0\n0 0 0 1\n";
        let rows = parse_rows(text, Path::new("pose.txt")).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], vec![0.0, 1.0, 0.0, 0.0]);

        let rows = parse_rows("1080 1920 9.0e1", Path::new("hwfov.txt")).unwrap();
        assert_eq!(rows, vec![vec![1080.0, 1920.0, 90.0]]);
    }

    #[test]
    fn test_parse_error_names_token() {
        let err = parse_rows("1 2\n3 x4\n", Path::new("bad.txt")).unwrap_err();
        match err {
            RcCalError::ParseNumber { line, token, .. } => {
                assert_eq!(line, 2);
                assert_eq!(token, "x4");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_write_matrix() {
        #[rustfmt::skip]
        let m = Matrix3::new(
            960.0, 0.0, 960.0,
            0.0, 960.0, 540.0,
            0.0, 0.0, 1.0,
        );
        let mut buf = Vec::new();
        write_matrix(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "0.000000000000000000e+00 9.600000000000000000e+02 5.400000000000000000e+02"
        );
        // and it reads back
        let rows = parse_rows(&text, Path::new("k.txt")).unwrap();
        assert_eq!(rows[0], vec![960.0, 0.0, 960.0]);
    }
}
