//! Coordinate transforms between the labeling tool's space and the target
//! dataset formats.
//!
//! All angles are in degrees. Boxes are typed by coordinate space (see
//! [`Percent`], [`Normalized`], [`Pixel`]) so that each step of a builder's
//! pipeline is visible in its signature:
//!
//! ```
//! use annotation_exporter::geometry::{
//!     normalize_box, rotate_box, to_center_form, BBoxXYXY, Coord, Percent, RotationMode,
//! };
//!
//! let region = BBoxXYXY::<Percent>::from_xyxy(25.0, 25.0, 75.0, 75.0);
//! let rotated = rotate_box(&region, 0.0, Coord::new(50.0, 50.0), RotationMode::Literal);
//! let (cx, cy, w, h) = to_center_form(&normalize_box(&rotated));
//! assert_eq!((cx, cy, w, h), (0.5, 0.5, 0.5, 0.5));
//! ```

mod bbox;
mod coord;
mod space;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use space::{Normalized, Percent, Pixel};

/// How [`rotate_point`] composes the rotation matrix.
///
/// Datasets produced by earlier exporter runs were generated with a point
/// rotation that computes the new `y` from the already rotated `x`. That is
/// only correct for multiples of 180°, but downstream training sets depend on
/// those exact coordinates, so it stays the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    /// Reproduces previously exported coordinates bit for bit.
    #[default]
    Literal,
    /// Standard 2D rotation; both outputs use the original `x, y`.
    Corrected,
}

impl RotationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Literal => "literal",
            RotationMode::Corrected => "corrected",
        }
    }
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(RotationMode::Literal),
            "corrected" => Ok(RotationMode::Corrected),
            other => Err(format!(
                "unknown rotation mode '{other}' (expected 'literal' or 'corrected')"
            )),
        }
    }
}

/// Rotates `(x, y)` about `origin` by `angle` degrees.
pub fn rotate_point(
    x: f64,
    y: f64,
    angle: f64,
    origin: (f64, f64),
    mode: RotationMode,
) -> (f64, f64) {
    let theta = angle.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();

    let dx = x - origin.0;
    let dy = y - origin.1;

    let rx = dx * cos_t - dy * sin_t;
    let ry = match mode {
        RotationMode::Corrected => dx * sin_t + dy * cos_t,
        RotationMode::Literal => rx * sin_t + dy * cos_t,
    };

    (rx + origin.0, ry + origin.1)
}

/// Rotates the two diagonal corners of `bbox` and returns their enclosing box.
///
/// Only `(xmin, ymin)` and `(xmax, ymax)` are rotated, so for angles that are
/// not multiples of 90° the result is smaller than the true swept area of the
/// rotated rectangle. Exported label files rely on this convention.
pub fn rotate_box<TSpace>(
    bbox: &BBoxXYXY<TSpace>,
    angle: f64,
    origin: Coord<TSpace>,
    mode: RotationMode,
) -> BBoxXYXY<TSpace> {
    let origin = (origin.x, origin.y);
    let (ax, ay) = rotate_point(bbox.xmin(), bbox.ymin(), angle, origin, mode);
    let (bx, by) = rotate_point(bbox.xmax(), bbox.ymax(), angle, origin, mode);

    BBoxXYXY::from_xyxy(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
}

/// Converts a percentage-space box to the unit interval.
#[inline]
pub fn normalize_box(bbox: &BBoxXYXY<Percent>) -> BBoxXYXY<Normalized> {
    bbox.to_normalized()
}

/// Converts an XYXY box to `(x_center, y_center, width, height)`.
#[inline]
pub fn to_center_form<TSpace>(bbox: &BBoxXYXY<TSpace>) -> (f64, f64, f64, f64) {
    bbox.to_cxcywh()
}

/// Inverse of [`to_center_form`].
#[inline]
pub fn from_center_form<TSpace>(cx: f64, cy: f64, width: f64, height: f64) -> BBoxXYXY<TSpace> {
    BBoxXYXY::from_cxcywh(cx, cy, width, height)
}

/// Center of percentage space, the pivot the labeling tool rotates around.
pub fn percent_center() -> Coord<Percent> {
    Coord::new(50.0, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS
    }

    #[test]
    fn zero_rotation_is_identity_in_both_modes() {
        for mode in [RotationMode::Literal, RotationMode::Corrected] {
            let rotated = rotate_point(12.5, -3.0, 0.0, (40.0, 7.0), mode);
            assert!(close(rotated, (12.5, -3.0)), "{mode}: {rotated:?}");
        }
    }

    #[test]
    fn corrected_rotation_quarter_turn() {
        let rotated = rotate_point(60.0, 50.0, 90.0, (50.0, 50.0), RotationMode::Corrected);
        assert!(close(rotated, (50.0, 60.0)), "{rotated:?}");
    }

    #[test]
    fn literal_rotation_reuses_rotated_x() {
        // dx = 10, dy = 0: rotated x is ~0, so the literal y collapses to the
        // origin instead of moving to 60.
        let rotated = rotate_point(60.0, 50.0, 90.0, (50.0, 50.0), RotationMode::Literal);
        assert!(close(rotated, (50.0, 50.0)), "{rotated:?}");
    }

    #[test]
    fn modes_agree_on_half_turn() {
        let literal = rotate_point(30.0, 20.0, 180.0, (50.0, 50.0), RotationMode::Literal);
        let corrected = rotate_point(30.0, 20.0, 180.0, (50.0, 50.0), RotationMode::Corrected);
        assert!(close(literal, corrected), "{literal:?} vs {corrected:?}");
        assert!(close(corrected, (70.0, 80.0)));
    }

    #[test]
    fn rotate_box_uses_two_corner_envelope() {
        let bbox = BBoxXYXY::<Percent>::from_xyxy(40.0, 40.0, 60.0, 60.0);
        let rotated = rotate_box(&bbox, 45.0, percent_center(), RotationMode::Corrected);

        // Both diagonal corners land on the vertical axis through the center,
        // so the two-corner envelope has zero width.
        assert!(rotated.width().abs() < EPS, "{rotated:?}");
        assert!((rotated.height() - 20.0 * 2f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn rotate_box_orders_corners() {
        let bbox = BBoxXYXY::<Percent>::from_xyxy(10.0, 20.0, 30.0, 60.0);
        let rotated = rotate_box(&bbox, 180.0, percent_center(), RotationMode::Corrected);
        assert!(rotated.xmin() <= rotated.xmax());
        assert!(rotated.ymin() <= rotated.ymax());
        assert!((rotated.xmin() - 70.0).abs() < EPS);
        assert!((rotated.ymin() - 40.0).abs() < EPS);
        assert!((rotated.xmax() - 90.0).abs() < EPS);
        assert!((rotated.ymax() - 80.0).abs() < EPS);
    }

    #[test]
    fn normalize_divides_by_hundred() {
        let bbox = BBoxXYXY::<Percent>::from_xyxy(25.0, 10.0, 75.0, 100.0);
        assert_eq!(normalize_box(&bbox).to_xyxy(), (0.25, 0.1, 0.75, 1.0));
    }

    #[test]
    fn center_form_of_centered_box() {
        let bbox = BBoxXYXY::<Normalized>::from_xyxy(0.25, 0.25, 0.75, 0.75);
        assert_eq!(to_center_form(&bbox), (0.5, 0.5, 0.5, 0.5));
    }

    #[test]
    fn rotation_mode_parses_case_insensitively() {
        assert_eq!("Literal".parse::<RotationMode>(), Ok(RotationMode::Literal));
        assert_eq!("corrected".parse::<RotationMode>(), Ok(RotationMode::Corrected));
        assert!("exact".parse::<RotationMode>().is_err());
    }
}
