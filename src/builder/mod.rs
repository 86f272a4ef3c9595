//! Dataset builders.
//!
//! A [`Builder`] turns parsed [`Task`]s into one training-dataset layout and
//! writes every artifact to every sink it is given. Three layouts exist:
//!
//! | name    | format                                    | builder            |
//! |---------|-------------------------------------------|--------------------|
//! | `yolo`  | object detection (Ultralytics YOLO)       | [`YoloBuilder`]    |
//! | `craft` | text detection (ICDAR 2015 / CRAFT)       | [`CraftBuilder`]   |
//! | `trocr` | text recognition (line crops + CSV)       | [`TrocrBuilder`]   |
//!
//! All three share the same walk over the tasks: fetch
//! each task image once, skip annotations without regions or without a
//! split, rotate the image per annotation, and hand the result to the
//! format-specific code.

mod craft;
pub mod raster;
mod trocr;
mod yolo;

use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use serde::{Deserialize, Serialize};

pub use craft::{gt_row, CraftBuilder};
pub use trocr::TrocrBuilder;
pub use yolo::{format_float, YoloBuilder, DATA_YAML};

use crate::annotations::{Annotation, Task, TRAINING_CATEGORY, VALIDATION_CATEGORY};
use crate::diagnostics::Diagnostics;
use crate::error::ExportError;
use crate::export::Exporter;
use crate::geometry::RotationMode;
use crate::source::ImageSource;

/// Converts tasks into a dataset layout.
pub trait Builder {
    /// The stable name used to select this builder.
    fn name(&self) -> &'static str;

    /// Builds the dataset, writing each artifact to every sink.
    ///
    /// Warnings are recorded in `diagnostics`; image source, codec and sink
    /// failures abort the build. Artifacts written before a failure stay.
    /// `craft` records no warnings; `yolo` and `trocr` do.
    fn build_dataset(
        &self,
        tasks: &[Task],
        sinks: &mut [&mut dyn Exporter],
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ExportError>;
}

/// Options shared by all builders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// How box corners are rotated into the image's frame.
    pub rotation: RotationMode,
}

/// Selects a builder by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
    Yolo,
    Craft,
    Trocr,
}

impl BuilderKind {
    pub const ALL: [BuilderKind; 3] = [BuilderKind::Yolo, BuilderKind::Craft, BuilderKind::Trocr];

    pub fn name(&self) -> &'static str {
        match self {
            BuilderKind::Yolo => yolo::NAME,
            BuilderKind::Craft => craft::NAME,
            BuilderKind::Trocr => trocr::NAME,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuilderKind::Yolo => "object detection: images/ + labels/ per split, data.yaml",
            BuilderKind::Craft => "text detection: ICDAR 2015 ch4_* images and gt_*.txt files",
            BuilderKind::Trocr => "text recognition: region crops + labels.csv per split",
        }
    }

    /// Instantiates the builder, reading images from `source`.
    pub fn create<'a>(
        &self,
        source: &'a dyn ImageSource,
        options: BuildOptions,
    ) -> Box<dyn Builder + 'a> {
        match self {
            BuilderKind::Yolo => Box::new(YoloBuilder::new(source, options)),
            BuilderKind::Craft => Box::new(CraftBuilder::new(source, options)),
            BuilderKind::Trocr => Box::new(TrocrBuilder::new(source, options)),
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuilderKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuilderKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExportError::UnknownBuilder(s.to_string()))
    }
}

/// A dataset split an annotation can be routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Split {
    Training,
    Validation,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Training, Split::Validation];

    /// The `data_categories` entry that selects this split.
    pub fn category(&self) -> &'static str {
        match self {
            Split::Training => TRAINING_CATEGORY,
            Split::Validation => VALIDATION_CATEGORY,
        }
    }

    /// Splits the annotation belongs to, training first.
    pub fn of(annotation: &Annotation) -> Vec<Split> {
        Split::ALL
            .into_iter()
            .filter(|split| annotation.in_category(split.category()))
            .collect()
    }

    /// The `train`/`val` directory name used by the yolo and trocr layouts.
    pub fn short_dir(&self) -> &'static str {
        match self {
            Split::Training => "train",
            Split::Validation => "val",
        }
    }
}

/// Name of the artifacts produced for annotation `j` of task `i`.
pub fn artifact_name(task_index: usize, annotation_index: usize) -> String {
    format!("{task_index}{annotation_index}")
}

/// One annotation that qualifies for output, with its rotated image.
pub(crate) struct AnnotationJob<'t> {
    pub task: &'t Task,
    pub annotation: &'t Annotation,
    pub name: String,
    pub splits: Vec<Split>,
    /// Task image rotated by the annotation's `image_rotation`.
    pub image: RgbImage,
}

/// Events produced by [`walk_tasks`].
pub(crate) enum Step<'t> {
    Annotation(AnnotationJob<'t>),
    /// All annotations of a non-empty task were visited.
    TaskDone(&'t Task),
}

/// Walks `tasks` in order, applying the skip rules every builder shares.
///
/// Tasks without annotations are skipped before their image is fetched.
/// Annotations without regions, or with no split in `data_categories`,
/// produce no step.
pub(crate) fn walk_tasks<'t>(
    tasks: &'t [Task],
    source: &dyn ImageSource,
    mut visit: impl FnMut(Step<'t>) -> Result<(), ExportError>,
) -> Result<(), ExportError> {
    for (i, task) in tasks.iter().enumerate() {
        if task.annotations.is_empty() {
            tracing::debug!(task = %task.id, "skipping task without annotations");
            continue;
        }

        let bytes = source.fetch(&task.image_url)?;
        let image = raster::decode(&bytes, &task.image_url)?;

        for (j, annotation) in task.annotations.iter().enumerate() {
            let name = artifact_name(i, j);
            if !annotation.has_regions() {
                tracing::debug!(task = %task.id, annotation = %annotation.id, "no regions");
                continue;
            }

            let splits = Split::of(annotation);
            if splits.is_empty() {
                tracing::debug!(
                    task = %task.id,
                    annotation = %annotation.id,
                    categories = ?annotation.data_categories,
                    "annotation is in no split"
                );
                continue;
            }

            let image = raster::rotate(&image, annotation.image_rotation);
            visit(Step::Annotation(AnnotationJob {
                task,
                annotation,
                name,
                splits,
                image,
            }))?;
        }

        visit(Step::TaskDone(task))?;
    }

    Ok(())
}
