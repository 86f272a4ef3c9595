use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// The main error type for annotation export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse task export JSON from {path}: {source}")]
    TaskJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid '{part_type}' value in {context}: {source}")]
    PartValueInvalid {
        context: String,
        part_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field '{field}' in {context}")]
    MissingField { context: String, field: String },

    #[error("Image not found for locator '{locator}'")]
    ImageNotFound { locator: String },

    #[error("Failed to fetch image '{locator}': {message}")]
    ImageFetch { locator: String, message: String },

    #[error("Failed to decode image '{locator}': {source}")]
    ImageDecode {
        locator: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image artifact: {0}")]
    ImageEncode(#[source] image::ImageError),

    #[error("Failed to write '{path}' to sink: {source}")]
    SinkWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "archive")]
    #[error("Archive error for {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write label CSV: {0}")]
    LabelCsv(#[from] csv::Error),

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Unknown builder '{0}' (supported: yolo, craft, trocr)")]
    UnknownBuilder(String),

    #[error("Export finished with {warning_count} warning(s) in strict mode")]
    StrictWarnings {
        warning_count: usize,
        diagnostics: Diagnostics,
    },
}
