//! ICDAR 2015 text-detection layout, as consumed by CRAFT training.
//!
//! ```text
//! ch4_training_images/<name>.jpg
//! ch4_training_localization_transcription_gt/gt_<name>.txt
//! ch4_test_images/<name>.jpg
//! ch4_test_localization_transcription_gt/gt_<name>.txt
//! ```
//!
//! Ground-truth rows are `x1,y1,x2,y1,x2,y2,x1,y2,<transcription>` in whole
//! pixels, corners clockwise from top-left.

use super::{walk_tasks, AnnotationJob, BuildOptions, Builder, Split, Step};
use crate::annotations::{Annotation, Region, Task};
use crate::diagnostics::Diagnostics;
use crate::error::ExportError;
use crate::export::{write_all, Exporter};
use crate::geometry::{percent_center, rotate_box, BBoxXYXY, Pixel, RotationMode};
use crate::source::ImageSource;

pub(super) const NAME: &str = "craft";

/// Builds a CRAFT / ICDAR 2015 text-detection dataset.
pub struct CraftBuilder<'a> {
    source: &'a dyn ImageSource,
    options: BuildOptions,
}

impl<'a> CraftBuilder<'a> {
    pub fn new(source: &'a dyn ImageSource, options: BuildOptions) -> Self {
        Self { source, options }
    }
}

impl Builder for CraftBuilder<'_> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_dataset(
        &self,
        tasks: &[Task],
        sinks: &mut [&mut dyn Exporter],
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), ExportError> {
        walk_tasks(tasks, self.source, |step| match step {
            Step::Annotation(job) => write_annotation(&job, self.options.rotation, sinks),
            Step::TaskDone(_) => Ok(()),
        })
    }
}

fn write_annotation(
    job: &AnnotationJob<'_>,
    rotation: RotationMode,
    sinks: &mut [&mut dyn Exporter],
) -> Result<(), ExportError> {
    let image_bytes = super::raster::encode_jpeg(&job.image)?;
    let (width, height) = job.image.dimensions();

    let labels: Vec<String> = job
        .annotation
        .regions()
        .filter_map(|region| {
            let bbox = pixel_box(region, job.annotation, rotation, width, height)?;
            Some(gt_row(&bbox, &region.text))
        })
        .collect();
    let labels = labels.join("\n");

    for split in &job.splits {
        let (images_dir, gt_dir) = split_dirs(*split);
        write_all(
            sinks,
            &image_bytes,
            &format!("{images_dir}/{}.jpg", job.name),
        )?;
        write_all(
            sinks,
            labels.as_bytes(),
            &format!("{gt_dir}/gt_{}.txt", job.name),
        )?;
    }

    tracing::debug!(name = %job.name, splits = ?job.splits, "wrote craft sample");
    Ok(())
}

fn split_dirs(split: Split) -> (&'static str, &'static str) {
    match split {
        Split::Training => (
            "ch4_training_images",
            "ch4_training_localization_transcription_gt",
        ),
        Split::Validation => ("ch4_test_images", "ch4_test_localization_transcription_gt"),
    }
}

/// The region's box, rotated with the image and scaled to pixels.
///
/// Scaling uses the dimensions the labeling tool reported for the region
/// and falls back to the decoded image size.
pub(crate) fn pixel_box(
    region: &Region,
    annotation: &Annotation,
    rotation: RotationMode,
    image_width: u32,
    image_height: u32,
) -> Option<BBoxXYXY<Pixel>> {
    let bbox = region.bounding_box()?;
    let rotated = rotate_box(&bbox, annotation.image_rotation, percent_center(), rotation);

    let width = region.original_width.unwrap_or(image_width);
    let height = region.original_height.unwrap_or(image_height);
    Some(rotated.to_pixel(f64::from(width), f64::from(height)))
}

/// Formats one ground-truth row.
pub fn gt_row(bbox: &BBoxXYXY<Pixel>, text: &str) -> String {
    let corners: Vec<String> = bbox
        .corners_truncated()
        .iter()
        .map(|c| c.to_string())
        .collect();
    format!("{},{}", corners.join(","), text)
}
