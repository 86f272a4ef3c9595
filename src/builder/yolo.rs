//! Ultralytics-style YOLO object-detection layout.
//!
//! ```text
//! data.yaml
//! train/images/<name>.jpg   train/labels/<name>.txt
//! val/images/<name>.jpg     val/labels/<name>.txt
//! ```
//!
//! Every region becomes a class-0 row `0 <x_center> <y_center> <width>
//! <height>` in normalized coordinates.
//!
//! Boxes are rotated in percent space and normalized afterwards, so rows
//! match older datasets only up to the last digit of float rounding.

use super::{walk_tasks, AnnotationJob, BuildOptions, Builder, Step};
use crate::annotations::{Annotation, Task};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::error::ExportError;
use crate::export::{write_all, Exporter};
use crate::geometry::{normalize_box, percent_center, rotate_box, to_center_form, RotationMode};
use crate::source::ImageSource;

pub(super) const NAME: &str = "yolo";

/// Dataset descriptor shared by every task. The exporter has a single
/// handwriting class.
pub const DATA_YAML: &str =
    "train: ../train/images\nval: ../val/images\n\nnc: 1\nnames: ['Handwriting']";

const CLASS_ID: u32 = 0;

/// Builds a YOLO object-detection dataset.
pub struct YoloBuilder<'a> {
    source: &'a dyn ImageSource,
    options: BuildOptions,
}

impl<'a> YoloBuilder<'a> {
    pub fn new(source: &'a dyn ImageSource, options: BuildOptions) -> Self {
        Self { source, options }
    }
}

impl Builder for YoloBuilder<'_> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_dataset(
        &self,
        tasks: &[Task],
        sinks: &mut [&mut dyn Exporter],
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ExportError> {
        walk_tasks(tasks, self.source, |step| match step {
            Step::Annotation(job) => {
                write_annotation(&job, self.options.rotation, sinks, diagnostics)
            }
            Step::TaskDone(_) => write_all(sinks, DATA_YAML.as_bytes(), "data.yaml"),
        })
    }
}

fn write_annotation(
    job: &AnnotationJob<'_>,
    rotation: RotationMode,
    sinks: &mut [&mut dyn Exporter],
    diagnostics: &mut Diagnostics,
) -> Result<(), ExportError> {
    let image_bytes = super::raster::encode_jpeg(&job.image)?;
    let labels = label_rows(job.task, job.annotation, rotation, diagnostics).join("\n");

    for split in &job.splits {
        let dir = split.short_dir();
        write_all(sinks, &image_bytes, &format!("{dir}/images/{}.jpg", job.name))?;
        write_all(
            sinks,
            labels.as_bytes(),
            &format!("{dir}/labels/{}.txt", job.name),
        )?;
    }

    tracing::debug!(name = %job.name, splits = ?job.splits, "wrote yolo sample");
    Ok(())
}

/// One label row per region, warning on values pushed outside `[0, 1]`.
pub(crate) fn label_rows(
    task: &Task,
    annotation: &Annotation,
    rotation: RotationMode,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let mut rows = Vec::new();

    for region in annotation.regions() {
        let Some(bbox) = region.bounding_box() else {
            continue;
        };

        let rotated = rotate_box(&bbox, annotation.image_rotation, percent_center(), rotation);
        let (x_center, y_center, width, height) = to_center_form(&normalize_box(&rotated));

        let out_of_range: Vec<String> = [
            ("x_center", x_center),
            ("y_center", y_center),
            ("width", width),
            ("height", height),
        ]
        .into_iter()
        .filter(|(_, value)| !(0.0..=1.0).contains(value))
        .map(|(field, value)| format!("{field} = {}", format_float(value)))
        .collect();

        if !out_of_range.is_empty() {
            diagnostics.warn(
                DiagnosticCode::CoordinateOutOfRange,
                format!(
                    "normalized box outside [0, 1] after rotating {} degrees: {}",
                    format_float(annotation.image_rotation),
                    out_of_range.join(", ")
                ),
                DiagnosticContext::Region {
                    task_id: task.id.clone(),
                    annotation_id: annotation.id.clone(),
                    region_id: region.id.clone(),
                },
            );
        }

        rows.push(format!(
            "{CLASS_ID} {} {} {} {}",
            format_float(x_center),
            format_float(y_center),
            format_float(width),
            format_float(height)
        ));
    }

    rows
}

/// Renders a float the way existing label files spell them: the shortest
/// round-trip digits, a `.0` on integral values, and scientific notation
/// (two-digit exponent) below 1e-4 or from 1e16 up.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}
