#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use serde_json::json;

/// A PNG with a horizontal gradient, so crops of different columns differ.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, _| {
        Rgb([(x * 255 / width.max(1)) as u8, 96, 160])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, png_bytes(width, height)).expect("write png file");
}

/// A rectangle region (`r1`) and a polygon region (`p1`), each with a
/// transcription.
pub fn region_parts(rotation: f64) -> serde_json::Value {
    json!([
        {"id": "r1", "type": "rectangle", "image_rotation": rotation,
         "value": {"x": 25, "y": 25, "width": 50, "height": 50}},
        {"id": "r1", "type": "textarea", "image_rotation": rotation,
         "value": {"text": ["hello"]}},
        {"id": "p1", "type": "polygon", "image_rotation": rotation,
         "value": {"points": [[10.4, 5.5], [40.6, 5.5], [40.6, 15.2], [10.4, 15.2]]}},
        {"id": "p1", "type": "textarea", "image_rotation": rotation,
         "value": {"text": ["world, again"]}}
    ])
}

/// A two-task export: task 1 has a training and a validation annotation,
/// task 2 has none.
pub fn sample_export(image: &str) -> String {
    json!([
        {
            "id": 1,
            "data": {"image": image},
            "annotations": [
                {"id": 11, "result": region_parts(0.0), "data_categories": ["Training"]},
                {"id": 12, "result": region_parts(0.0), "data_categories": ["Validation"]},
                {"id": 13, "result": region_parts(0.0), "was_cancelled": true,
                 "data_categories": ["Training"]}
            ]
        },
        {
            "id": 2,
            "data": {"image": "never-fetched.png"},
            "annotations": []
        }
    ])
    .to_string()
}
