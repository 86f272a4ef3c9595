//! Raster operations used by the builders: decode, rotate, crop, encode.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::error::ExportError;
use crate::geometry::{BBoxXYXY, Pixel};

const JPEG_QUALITY: u8 = 100;

/// Decodes an encoded image into an RGB buffer.
pub fn decode(bytes: &[u8], locator: &str) -> Result<RgbImage, ExportError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|source| ExportError::ImageDecode {
            locator: locator.to_string(),
            source,
        })
}

/// Rotates `image` counter-clockwise by `angle` degrees about its center.
///
/// The canvas keeps its size: content rotated out of frame is lost and the
/// uncovered corners are filled with black.
pub fn rotate(image: &RgbImage, angle: f64) -> RgbImage {
    if angle == 0.0 {
        return image.clone();
    }
    // imageproc rotates clockwise for positive angles.
    let theta = -(angle as f32).to_radians();
    rotate_about_center(image, theta, Interpolation::Bicubic, Rgb([0, 0, 0]))
}

/// Encodes `image` as a maximum-quality JPEG.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    image
        .write_with_encoder(encoder)
        .map_err(ExportError::ImageEncode)?;
    Ok(bytes)
}

/// Crops `image` to `bbox` (truncated to whole pixels, clamped to the image).
///
/// Returns `None` when nothing of the box lies inside the image.
pub fn crop(image: &RgbImage, bbox: &BBoxXYXY<Pixel>) -> Option<RgbImage> {
    let [x1, y1, x2, _, _, y2, _, _] = bbox.corners_truncated();
    let clamp = |value: i64, max: u32| value.clamp(0, i64::from(max)) as u32;

    let left = clamp(x1, image.width());
    let top = clamp(y1, image.height());
    let right = clamp(x2, image.width());
    let bottom = clamp(y2, image.height());

    if right <= left || bottom <= top {
        return None;
    }

    Some(imageops::crop_imm(image, left, top, right - left, bottom - top).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]))
    }

    #[test]
    fn jpeg_roundtrip_keeps_dimensions() {
        let image = gradient(16, 8);
        let bytes = encode_jpeg(&image).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = decode(&bytes, "mem").expect("decode");
        assert_eq!(decoded.dimensions(), (16, 8));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode(b"not an image", "page.jpg").expect_err("garbage");
        assert!(matches!(err, ExportError::ImageDecode { ref locator, .. } if locator == "page.jpg"));
    }

    #[test]
    fn rotation_keeps_canvas_size() {
        let image = gradient(20, 10);
        assert_eq!(rotate(&image, 0.0), image);
        assert_eq!(rotate(&image, 33.0).dimensions(), (20, 10));
    }

    #[test]
    fn positive_angle_turns_counter_clockwise() {
        // A bright spot east of the center should end up north of it.
        let mut image = RgbImage::new(41, 41);
        for x in 29..=37 {
            for y in 16..=24 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }

        let rotated = rotate(&image, 90.0);
        let brightness = |x: u32, y: u32| rotated.get_pixel(x, y)[0];
        assert!(brightness(20, 8) > 200, "north: {}", brightness(20, 8));
        assert!(brightness(20, 33) < 50, "south: {}", brightness(20, 33));
        assert!(brightness(33, 20) < 50, "east: {}", brightness(33, 20));
    }

    #[test]
    fn crop_clamps_to_image() {
        let image = gradient(10, 10);
        let cropped = crop(&image, &BBoxXYXY::from_xyxy(-5.0, 2.0, 4.9, 20.0)).expect("crop");
        assert_eq!(cropped.dimensions(), (4, 8));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([0, 2, 128]));

        assert!(crop(&image, &BBoxXYXY::from_xyxy(12.0, 0.0, 20.0, 5.0)).is_none());
    }
}
