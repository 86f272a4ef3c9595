//! Axis-aligned boxes in XYXY form.

use super::coord::Coord;
use super::{Normalized, Percent, Pixel};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// Like [`Coord`], the box carries its coordinate space as a type parameter
/// so a percentage box cannot be written out where a normalized one is
/// expected.
///
/// Note: the constructor does NOT enforce min <= max. Rotated boxes may come
/// out of frame or inverted, and the builders report such values as
/// diagnostics instead of refusing to represent them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Builds a box from its center, width and height.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        let (half_w, half_h) = (width / 2.0, height / 2.0);
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Signed extent along x; negative once a rotation flips the corners.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Signed extent along y.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn to_xyxy(&self) -> (f64, f64, f64, f64) {
        (self.min.x, self.min.y, self.max.x, self.max.y)
    }

    /// Converts to `(x_center, y_center, width, height)`.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        let (w, h) = (self.width(), self.height());
        (self.min.x + w / 2.0, self.min.y + h / 2.0, w, h)
    }

    fn map(&self, fx: impl Fn(f64) -> f64, fy: impl Fn(f64) -> f64) -> (f64, f64, f64, f64) {
        (fx(self.min.x), fy(self.min.y), fx(self.max.x), fy(self.max.y))
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BBoxXYXY[{}, {}, {}, {}]",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}

impl BBoxXYXY<Percent> {
    /// Percentages (0-100) to the unit interval.
    pub fn to_normalized(&self) -> BBoxXYXY<Normalized> {
        let (x0, y0, x1, y1) = self.map(|x| x / 100.0, |y| y / 100.0);
        BBoxXYXY::from_xyxy(x0, y0, x1, y1)
    }

    /// Percentages to absolute pixels of a `image_width` x `image_height` raster.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        self.to_normalized().to_pixel(image_width, image_height)
    }
}

impl BBoxXYXY<Normalized> {
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        let (x0, y0, x1, y1) = self.map(|x| x * image_width, |y| y * image_height);
        BBoxXYXY::from_xyxy(x0, y0, x1, y1)
    }
}

impl BBoxXYXY<Pixel> {
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        let (x0, y0, x1, y1) = self.map(|x| x / image_width, |y| y / image_height);
        BBoxXYXY::from_xyxy(x0, y0, x1, y1)
    }

    /// Expands the box into its four corners, truncated to whole pixels, in
    /// the order top-left, top-right, bottom-right, bottom-left.
    pub fn corners_truncated(&self) -> [i64; 8] {
        let (x1, y1, x2, y2) = self.map(f64::trunc, f64::trunc);
        let (x1, y1, x2, y2) = (x1 as i64, y1 as i64, x2 as i64, y2 as i64);
        [x1, y1, x2, y1, x2, y2, x1, y2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_are_signed() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(100.0, 20.0, 10.0, 80.0);
        assert_eq!((bbox.width(), bbox.height()), (-90.0, 60.0));
        assert_eq!(bbox.to_xyxy(), (100.0, 20.0, 10.0, 80.0));
    }

    #[test]
    fn percent_to_pixel_scales_each_axis() {
        let bbox: BBoxXYXY<Percent> = BBoxXYXY::from_xyxy(25.0, 25.0, 75.0, 75.0);
        let px = bbox.to_pixel(200.0, 400.0);
        assert_eq!(px.to_xyxy(), (50.0, 100.0, 150.0, 300.0));
    }

    #[test]
    fn cxcywh_roundtrip() {
        let original: BBoxXYXY<Normalized> = BBoxXYXY::from_xyxy(0.1, 0.2, 0.5, 0.9);
        let (cx, cy, w, h) = original.to_cxcywh();
        let restored = BBoxXYXY::<Normalized>::from_cxcywh(cx, cy, w, h);
        assert!((original.xmin() - restored.xmin()).abs() < 1e-12);
        assert!((original.ymin() - restored.ymin()).abs() < 1e-12);
        assert!((original.xmax() - restored.xmax()).abs() < 1e-12);
        assert!((original.ymax() - restored.ymax()).abs() < 1e-12);
    }

    #[test]
    fn corners_truncate_toward_zero() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(50.9, 50.1, 150.99, 150.5);
        assert_eq!(
            bbox.corners_truncated(),
            [50, 50, 150, 50, 150, 150, 50, 150]
        );
    }
}
