//! Build configuration.
//!
//! A build can be described in a YAML file and refined with command-line
//! flags; flags always win over file values.
//!
//! ```yaml
//! builder: craft
//! input: exports/project-7.json
//! outputs: [datasets/craft]
//! archive: datasets/craft.zip
//! images_root: buckets/scans
//! categories: [Training]
//! rotation: literal
//! strict: false
//! ```
//!
//! Relative paths are resolved against the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::builder::BuilderKind;
use crate::error::ExportError;
use crate::geometry::RotationMode;

/// Everything needed to run one export.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub builder: Option<BuilderKind>,
    /// Task-export JSON file.
    pub input: Option<PathBuf>,
    /// Dataset directories; every artifact is written to each.
    pub outputs: Vec<PathBuf>,
    /// Zip archive receiving the same artifacts.
    pub archive: Option<PathBuf>,
    /// Directory images are resolved under. Defaults to the input's directory.
    pub images_root: Option<PathBuf>,
    /// Split membership for annotations without `data_categories`.
    pub categories: Vec<String>,
    pub rotation: Option<RotationMode>,
    /// Fail the run when any warning was recorded.
    pub strict: bool,
}

impl BuildConfig {
    /// Loads a configuration file.
    pub fn from_yaml_path(path: &Path) -> Result<Self, ExportError> {
        let text = fs::read_to_string(path).map_err(ExportError::Io)?;
        Self::from_yaml_str(&text).map_err(|source| ExportError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Applies `overrides` on top of `self`.
    ///
    /// Scalar values are replaced when set; non-empty lists replace the
    /// whole list; `strict` is enabled by either side.
    pub fn merge(mut self, overrides: BuildConfig) -> Self {
        if overrides.builder.is_some() {
            self.builder = overrides.builder;
        }
        if overrides.input.is_some() {
            self.input = overrides.input;
        }
        if !overrides.outputs.is_empty() {
            self.outputs = overrides.outputs;
        }
        if overrides.archive.is_some() {
            self.archive = overrides.archive;
        }
        if overrides.images_root.is_some() {
            self.images_root = overrides.images_root;
        }
        if !overrides.categories.is_empty() {
            self.categories = overrides.categories;
        }
        if overrides.rotation.is_some() {
            self.rotation = overrides.rotation;
        }
        self.strict |= overrides.strict;
        self
    }

    pub fn builder(&self) -> Result<BuilderKind, ExportError> {
        self.builder.ok_or_else(|| {
            ExportError::ConfigInvalid(
                "no builder selected (use --builder or 'builder:' in the config)".to_string(),
            )
        })
    }

    pub fn input(&self) -> Result<&Path, ExportError> {
        self.input.as_deref().ok_or_else(|| {
            ExportError::ConfigInvalid(
                "no input file given (use --input or 'input:' in the config)".to_string(),
            )
        })
    }

    /// Root for local image lookup: `images_root`, else the input's directory.
    pub fn images_root(&self) -> Result<PathBuf, ExportError> {
        if let Some(root) = &self.images_root {
            return Ok(root.clone());
        }
        let parent = self.input()?.parent().unwrap_or(Path::new(""));
        if parent.as_os_str().is_empty() {
            Ok(PathBuf::from("."))
        } else {
            Ok(parent.to_path_buf())
        }
    }

    /// Checks that the build can produce output at all.
    pub fn validate(&self) -> Result<(), ExportError> {
        self.builder()?;
        self.input()?;
        if self.outputs.is_empty() && self.archive.is_none() {
            return Err(ExportError::ConfigInvalid(
                "no output sink given (use --output and/or --archive)".to_string(),
            ));
        }
        if cfg!(not(feature = "archive")) && self.archive.is_some() {
            return Err(ExportError::ConfigInvalid(
                "--archive requires the 'archive' feature".to_string(),
            ));
        }
        Ok(())
    }
}
