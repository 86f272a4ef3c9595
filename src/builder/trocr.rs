//! Line-crop text-recognition layout, as consumed by TrOCR fine-tuning.
//!
//! ```text
//! train/images/<name>_<k>.jpg   train/labels.csv
//! val/images/<name>_<k>.jpg     val/labels.csv
//! ```
//!
//! `<k>` is the region's position within its annotation. Each `labels.csv`
//! has a `file_name,text` header and one row per crop, with `file_name`
//! relative to the split directory.

use std::collections::BTreeMap;

use super::craft::pixel_box;
use super::{raster, walk_tasks, AnnotationJob, BuildOptions, Builder, Split, Step};
use crate::annotations::Task;
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::error::ExportError;
use crate::export::{write_all, Exporter};
use crate::source::ImageSource;

pub(super) const NAME: &str = "trocr";

/// `(file_name, text)` rows collected per split.
type LabelRows = BTreeMap<Split, Vec<(String, String)>>;

/// Builds a TrOCR text-recognition dataset of region crops.
pub struct TrocrBuilder<'a> {
    source: &'a dyn ImageSource,
    options: BuildOptions,
}

impl<'a> TrocrBuilder<'a> {
    pub fn new(source: &'a dyn ImageSource, options: BuildOptions) -> Self {
        Self { source, options }
    }

    fn write_annotation(
        &self,
        job: &AnnotationJob<'_>,
        sinks: &mut [&mut dyn Exporter],
        rows: &mut LabelRows,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ExportError> {
        let (width, height) = job.image.dimensions();

        for (k, region) in job.annotation.regions().enumerate() {
            let Some(bbox) = pixel_box(region, job.annotation, self.options.rotation, width, height)
            else {
                continue;
            };

            let Some(crop) = raster::crop(&job.image, &bbox) else {
                diagnostics.warn(
                    DiagnosticCode::EmptyCrop,
                    format!(
                        "pixel box {:?} does not overlap the {width}x{height} image",
                        bbox.corners_truncated()
                    ),
                    DiagnosticContext::Region {
                        task_id: job.task.id.clone(),
                        annotation_id: job.annotation.id.clone(),
                        region_id: region.id.clone(),
                    },
                );
                continue;
            };

            let bytes = raster::encode_jpeg(&crop)?;
            let file_name = format!("images/{}_{k}.jpg", job.name);

            for split in &job.splits {
                write_all(sinks, &bytes, &format!("{}/{file_name}", split.short_dir()))?;
                rows.entry(*split)
                    .or_default()
                    .push((file_name.clone(), region.text.clone()));
            }
        }

        tracing::debug!(name = %job.name, splits = ?job.splits, "wrote trocr crops");
        Ok(())
    }
}

impl Builder for TrocrBuilder<'_> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_dataset(
        &self,
        tasks: &[Task],
        sinks: &mut [&mut dyn Exporter],
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ExportError> {
        let mut rows = LabelRows::new();

        walk_tasks(tasks, self.source, |step| match step {
            Step::Annotation(job) => self.write_annotation(&job, sinks, &mut rows, diagnostics),
            Step::TaskDone(_) => Ok(()),
        })?;

        for (split, split_rows) in &rows {
            let csv = labels_csv(split_rows)?;
            write_all(sinks, &csv, &format!("{}/labels.csv", split.short_dir()))?;
        }

        Ok(())
    }
}

/// Renders the `file_name,text` CSV for one split.
pub(crate) fn labels_csv(rows: &[(String, String)]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["file_name", "text"])?;
    for (file_name, text) in rows {
        writer.write_record([file_name.as_str(), text.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use image::{Rgb, RgbImage};

    use super::*;
    use crate::annotations::{Annotation, AnnotationData, Region};
    use crate::export::MemoryExporter;
    use crate::geometry::Coord;
    use crate::source::MemoryImageSource;

    fn region(id: &str, text: &str, xyxy: (f64, f64, f64, f64)) -> AnnotationData {
        let (x1, y1, x2, y2) = xyxy;
        AnnotationData::Region(Region {
            id: id.to_string(),
            text: text.to_string(),
            points: [(x1, y1), (x2, y1), (x2, y2), (x1, y2), (x1, y1)]
                .into_iter()
                .map(Coord::from)
                .collect(),
            ..Default::default()
        })
    }

    fn source() -> MemoryImageSource {
        let image = RgbImage::from_pixel(40, 20, Rgb([200, 200, 200]));
        let bytes = raster::encode_jpeg(&image).expect("encode");
        MemoryImageSource::new().with_image("page.jpg", bytes)
    }

    fn training() -> BTreeSet<String> {
        BTreeSet::from(["Training".to_string()])
    }

    #[test]
    fn crops_each_region_and_writes_labels() {
        let annotation = Annotation::from_data(
            "a1",
            training(),
            [
                region("r1", "first line", (0.0, 0.0, 50.0, 50.0)),
                region("r2", "say \"hi\", ok", (50.0, 50.0, 100.0, 100.0)),
            ],
        );
        let tasks = vec![Task::new("t1", "page.jpg", vec![annotation])];
        let source = source();
        let mut sink = MemoryExporter::new();
        let mut diagnostics = Diagnostics::new();

        TrocrBuilder::new(&source, BuildOptions::default())
            .build_dataset(&tasks, &mut [&mut sink], &mut diagnostics)
            .expect("build");

        assert_eq!(
            sink.writes,
            vec![
                "train/images/00_0.jpg",
                "train/images/00_1.jpg",
                "train/labels.csv"
            ]
        );
        let crop = raster::decode(&sink.files["train/images/00_0.jpg"], "crop").expect("decode");
        assert_eq!(crop.dimensions(), (20, 10));
        assert_eq!(
            sink.text("train/labels.csv"),
            Some(
                "file_name,text\nimages/00_0.jpg,first line\nimages/00_1.jpg,\"say \"\"hi\"\", ok\"\n"
            )
        );
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn region_outside_image_is_skipped_with_warning() {
        let annotation = Annotation::from_data(
            "a1",
            training(),
            [
                region("r1", "gone", (120.0, 0.0, 150.0, 10.0)),
                region("r2", "kept", (0.0, 0.0, 50.0, 50.0)),
            ],
        );
        let tasks = vec![Task::new("t1", "page.jpg", vec![annotation])];
        let source = source();
        let mut sink = MemoryExporter::new();
        let mut diagnostics = Diagnostics::new();

        TrocrBuilder::new(&source, BuildOptions::default())
            .build_dataset(&tasks, &mut [&mut sink], &mut diagnostics)
            .expect("build");

        assert_eq!(diagnostics.count_of(DiagnosticCode::EmptyCrop), 1);
        assert!(!sink.files.contains_key("train/images/00_0.jpg"));
        assert_eq!(
            sink.text("train/labels.csv"),
            Some("file_name,text\nimages/00_1.jpg,kept\n")
        );
    }

    #[test]
    fn labels_csv_with_no_rows_is_header_only() {
        let csv = labels_csv(&[]).expect("csv");
        assert_eq!(csv, b"file_name,text\n");
    }
}
