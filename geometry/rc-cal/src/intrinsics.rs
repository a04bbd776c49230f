//! Pinhole intrinsics from a horizontal field of view.
use nalgebra as na;
use nalgebra::{Matrix3, RealField};

/// Sensor width of the 35mm film format, in millimeters.
pub const FILM_35MM_WIDTH: f64 = 35.0;

/// Image size and horizontal field of view of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HwFov {
    /// Image height in pixels
    pub height: f64,
    /// Image width in pixels
    pub width: f64,
    /// Horizontal field of view in degrees
    pub fov_degrees: f64,
}

impl HwFov {
    /// Build from the three values of a FOV file, in file order.
    pub fn from_values(values: [f64; 3]) -> Self {
        let [height, width, fov_degrees] = values;
        Self {
            height,
            width,
            fov_degrees,
        }
    }
}

/// Focal length in pixels for an image `width` pixels wide.
///
/// `fov_degrees` is expected in the open interval (0, 180). Degenerate values
/// are not rejected: 180° yields a focal length near zero and 0° yields
/// infinity.
pub fn focal_length_px<R: RealField + Copy>(width: R, fov_degrees: R) -> R {
    let two: R = na::convert(2.0);
    let half_fov = (fov_degrees / two).to_radians();
    (width / two) * (R::one() / half_fov.tan())
}

/// Inverse of [focal_length_px]: the horizontal field of view in degrees.
pub fn fov_from_focal_length_px<R: RealField + Copy>(width: R, focal_px: R) -> R {
    let two: R = na::convert(2.0);
    two * ((width / two) / focal_px).atan().to_degrees()
}

/// 35mm-equivalent focal length in millimeters.
///
/// This is the value RealityCapture reads from `FocalLength35mm`.
pub fn focal_length_35mm<R: RealField + Copy>(fov_degrees: R) -> R {
    let two: R = na::convert(2.0);
    let film_width: R = na::convert(FILM_35MM_WIDTH);
    (film_width / two) * (R::one() / (fov_degrees.to_radians() / two).tan())
}

/// The 3x3 intrinsic matrix `[[f,0,cx],[0,f,cy],[0,0,1]]`.
///
/// The principal point is the exact image center.
pub fn intrinsics_from_hwfov(hwfov: &HwFov) -> Matrix3<f64> {
    let f = focal_length_px(hwfov.width, hwfov.fov_degrees);
    let cx = hwfov.width / 2.0;
    let cy = hwfov.height / 2.0;
    #[rustfmt::skip]
    let k = Matrix3::new(
        f, 0.0, cx,
        0.0, f, cy,
        0.0, 0.0, 1.0,
    );
    k
}

// `to_radians`/`to_degrees` for any RealField. The conversion factor is
// formed first, as `f64::to_radians` and `numpy.radians` do, so results agree
// to the last bit.
trait AngleConv {
    fn to_radians(self) -> Self;
    fn to_degrees(self) -> Self;
}

impl<R: RealField + Copy> AngleConv for R {
    fn to_radians(self) -> Self {
        let half_turn: R = na::convert(180.0);
        self * (R::pi() / half_turn)
    }
    fn to_degrees(self) -> Self {
        let half_turn: R = na::convert(180.0);
        self * (half_turn / R::pi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_matrix::format_savetxt;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_hd_90_degrees() {
        let hwfov = HwFov::from_values([1080.0, 1920.0, 90.0]);
        let k = intrinsics_from_hwfov(&hwfov);
        #[rustfmt::skip]
        let expected = Matrix3::new(
            960.0, 0.0, 960.0,
            0.0, 960.0, 540.0,
            0.0, 0.0, 1.0,
        );
        assert_relative_eq!(k, expected, epsilon = 1e-9);
        // principal point is exact
        assert_eq!(k[(0, 2)], 960.0);
        assert_eq!(k[(1, 2)], 540.0);
    }

    #[test]
    fn test_focal_positive_and_finite() {
        for width in [1.0_f64, 640.0, 4000.0] {
            for fov in [0.5, 10.0, 45.0, 90.0, 120.0, 179.5] {
                let f = focal_length_px(width, fov);
                assert!(f.is_finite());
                assert!(f > 0.0, "fov {fov} width {width} gave {f}");
            }
        }
    }

    #[test]
    fn test_fov_roundtrip() {
        let width = 1920.0;
        for fov in [1.0, 33.3, 60.0, 90.0, 135.0, 170.0] {
            let f = focal_length_px(width, fov);
            let fov2 = fov_from_focal_length_px(width, f);
            assert_relative_eq!(fov, fov2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_35mm() {
        assert_relative_eq!(focal_length_35mm(90.0), 17.5, epsilon = 1e-12);
        // both half-angle forms agree
        for fov in [20.0, 73.7, 90.0, 110.0] {
            assert_relative_eq!(
                focal_length_35mm(fov),
                focal_length_px(FILM_35MM_WIDTH, fov),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_bitwise_equal_to_std_degrees() {
        // `(width / 2) * (1 / tan(radians(fov / 2)))` with the std conversion
        let mut fov = 0.1_f64;
        while fov < 179.0 {
            let expected = (1920.0 / 2.0) * (1.0 / (fov / 2.0).to_radians().tan());
            assert_eq!(focal_length_px(1920.0, fov).to_bits(), expected.to_bits(), "fov {fov}");
            let expected = (35.0 * 0.5) * (1.0 / (fov.to_radians() / 2.0).tan());
            assert_eq!(focal_length_35mm(fov).to_bits(), expected.to_bits(), "fov {fov}");
            fov += 0.1;
        }
        assert_eq!(
            format_savetxt(focal_length_px(1920.0, 0.7)),
            format_savetxt((1920.0 / 2.0) * (1.0 / 0.35f64.to_radians().tan()))
        );
    }

    #[test]
    fn test_degenerate_fov_passes_through() {
        assert!(focal_length_px(1920.0_f64, 0.0).is_infinite());
        assert!(focal_length_px(1920.0_f64, 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_f32() {
        let f: f32 = focal_length_px(1920.0, 90.0);
        assert_relative_eq!(f, 960.0, epsilon = 1e-3);
    }
}
