//! Annotation data model.
//!
//! The labeling tool exports each annotation pass as a flat list of parts.
//! Parts that share an id describe one entity, and the set of their type
//! tags decides what that entity is:
//!
//! | tags present                              | entity      |
//! |-------------------------------------------|-------------|
//! | `textarea` + (`rectangle` or `polygon`)   | [`Region`]  |
//! | `choices`                                 | [`Choices`] |
//! | anything else                             | dropped, with a warning |
//!
//! # Example
//!
//! ```
//! use annotation_exporter::annotations::{from_tasks_str, ParseOptions};
//! use annotation_exporter::diagnostics::Diagnostics;
//!
//! let json = r#"[{
//!   "id": 1,
//!   "data": {"image": "page.jpg"},
//!   "annotations": [{
//!     "id": 10,
//!     "result": [
//!       {"id": "r1", "type": "rectangle", "value": {"x": 25, "y": 25, "width": 50, "height": 50}},
//!       {"id": "r1", "type": "textarea", "value": {"text": ["hello"]}}
//!     ]
//!   }]
//! }]"#;
//!
//! let mut diagnostics = Diagnostics::new();
//! let tasks = from_tasks_str(json, &ParseOptions::default(), &mut diagnostics).unwrap();
//! let region = tasks[0].annotations[0].regions().next().unwrap();
//! assert_eq!(region.text, "hello");
//! assert_eq!(region.bounding_box().unwrap().to_xyxy(), (25.0, 25.0, 75.0, 75.0));
//! ```

mod model;
mod parse;
mod raw;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use model::{
    Annotation, AnnotationData, Choices, Region, Task, TRAINING_CATEGORY, VALIDATION_CATEGORY,
};
pub use parse::{parse_annotation, parse_task, ParseOptions};
pub use raw::{PartKind, RawAnnotation, RawId, RawPart, RawTask, RawTaskData};

use crate::diagnostics::Diagnostics;
use crate::error::ExportError;

/// Read a task-export JSON file (an array of tasks).
pub fn read_tasks(
    path: &Path,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Task>, ExportError> {
    let file = File::open(path).map_err(ExportError::Io)?;
    let reader = BufReader::new(file);

    let raw: Vec<RawTask> =
        serde_json::from_reader(reader).map_err(|source| ExportError::TaskJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    parse_tasks(&raw, options, diagnostics)
}

/// Parse task-export JSON from a string.
pub fn from_tasks_str(
    json: &str,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Task>, ExportError> {
    let raw: Vec<RawTask> =
        serde_json::from_str(json).map_err(|source| ExportError::TaskJsonParse {
            path: Path::new("<string>").to_path_buf(),
            source,
        })?;
    parse_tasks(&raw, options, diagnostics)
}

/// Parse task-export JSON from bytes.
pub fn from_tasks_slice(
    bytes: &[u8],
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Task>, ExportError> {
    let raw: Vec<RawTask> =
        serde_json::from_slice(bytes).map_err(|source| ExportError::TaskJsonParse {
            path: Path::new("<bytes>").to_path_buf(),
            source,
        })?;
    parse_tasks(&raw, options, diagnostics)
}

fn parse_tasks(
    raw: &[RawTask],
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Task>, ExportError> {
    raw.iter()
        .map(|task| parse_task(task, options, diagnostics))
        .collect()
}

/// Parse entry point for fuzzing. Errors are expected; panics are not.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_tasks(bytes: &[u8]) -> Result<(), ExportError> {
    from_tasks_slice(bytes, &ParseOptions::default(), &mut Diagnostics::new()).map(|_| ())
}
