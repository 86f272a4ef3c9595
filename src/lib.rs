//! Annotation exporter: turns labeling-tool task exports into training
//! dataset layouts.
//!
//! A task export (JSON, one record per image) is parsed into
//! [`Task`](annotations::Task)s, and a [`Builder`](builder::Builder) writes
//! one of three layouts to any number of output sinks:
//!
//! - `yolo`: object detection, normalized center-form boxes
//! - `craft`: ICDAR 2015 text detection, pixel quadrilaterals
//! - `trocr`: text recognition, region crops plus a CSV of transcriptions
//!
//! # Modules
//!
//! - [`annotations`]: raw export records and the resolved data model
//! - [`geometry`]: coordinate spaces, rotation and box conversions
//! - [`builder`]: the dataset builders
//! - [`source`]: where task images come from
//! - [`export`]: where artifacts go
//! - [`diagnostics`]: non-fatal warnings
//! - [`config`]: build configuration
//! - [`error`]: error types

pub mod annotations;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod geometry;
pub mod source;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use annotations::ParseOptions;
use builder::{BuildOptions, BuilderKind};
use config::BuildConfig;
use diagnostics::Diagnostics;
use export::{DirectoryExporter, Exporter};
use geometry::RotationMode;

pub use error::ExportError;

/// The annotation-exporter CLI application.
#[derive(Parser)]
#[command(name = "annotation-exporter")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a dataset from a task export.
    Build(BuildArgs),
    /// List the available dataset builders.
    Builders,
}

/// Arguments for the build subcommand.
#[derive(clap::Args)]
struct BuildArgs {
    /// Dataset layout to produce.
    #[arg(long, value_enum, env = "ANNOTATION_EXPORTER_BUILDER")]
    builder: Option<BuilderKind>,

    /// Task-export JSON file.
    #[arg(long, env = "ANNOTATION_EXPORTER_INPUT")]
    input: Option<PathBuf>,

    /// Output directory (repeatable; every artifact is written to each).
    #[arg(long = "output", short = 'o')]
    outputs: Vec<PathBuf>,

    /// Also write the dataset into this zip archive.
    #[arg(long, env = "ANNOTATION_EXPORTER_ARCHIVE")]
    archive: Option<PathBuf>,

    /// Directory task images are resolved under (default: the input's directory).
    #[arg(long, env = "ANNOTATION_EXPORTER_IMAGES_ROOT")]
    images_root: Option<PathBuf>,

    /// Split category for annotations that carry none (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Box rotation: 'literal' (compatible with existing datasets) or 'corrected'.
    #[arg(long, env = "ANNOTATION_EXPORTER_ROTATION")]
    rotation: Option<RotationMode>,

    /// YAML build configuration; flags override its values.
    #[arg(long, env = "ANNOTATION_EXPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,
}

impl BuildArgs {
    fn into_config(self) -> Result<BuildConfig, ExportError> {
        let base = match &self.config {
            Some(path) => BuildConfig::from_yaml_path(path)?,
            None => BuildConfig::default(),
        };

        Ok(base.merge(BuildConfig {
            builder: self.builder,
            input: self.input,
            outputs: self.outputs,
            archive: self.archive,
            images_root: self.images_root,
            categories: self.categories,
            rotation: self.rotation,
            strict: self.strict,
        }))
    }
}

/// Run the annotation-exporter CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ExportError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Build(args)) => run_build(args),
        Some(Commands::Builders) => {
            for kind in BuilderKind::ALL {
                println!("{:<7} {}", kind.name(), kind.description());
            }
            Ok(())
        }
        None => {
            println!("annotation-exporter {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Converts labeling-tool task exports into training dataset layouts.");
            println!();
            println!("Run 'annotation-exporter --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the build subcommand.
fn run_build(args: BuildArgs) -> Result<(), ExportError> {
    let config = args.into_config()?;
    let diagnostics = export_dataset(&config)?;

    print!("{}", diagnostics);

    if config.strict && diagnostics.warning_count() > 0 {
        return Err(ExportError::StrictWarnings {
            warning_count: diagnostics.warning_count(),
            diagnostics,
        });
    }
    Ok(())
}

/// Runs one export described by `config` and returns the warnings raised.
///
/// Reads the task export, resolves images under the configured root (and
/// over HTTP with the `remote` feature), and writes the selected layout to
/// every configured directory and archive.
pub fn export_dataset(config: &BuildConfig) -> Result<Diagnostics, ExportError> {
    config.validate()?;
    let kind = config.builder()?;
    let input = config.input()?;

    let mut diagnostics = Diagnostics::new();
    let options = ParseOptions::with_default_categories(config.categories.iter().cloned());
    let tasks = annotations::read_tasks(input, &options, &mut diagnostics)?;
    tracing::info!(input = %input.display(), tasks = tasks.len(), "read task export");

    let local = source::LocalImageSource::new(config.images_root()?)?;
    #[cfg(feature = "remote")]
    let images = source::FallbackImageSource {
        local: Some(local),
        remote: source::HttpImageSource,
    };
    #[cfg(not(feature = "remote"))]
    let images = local;

    let mut directories: Vec<DirectoryExporter> =
        config.outputs.iter().map(DirectoryExporter::new).collect();
    #[cfg(feature = "archive")]
    let mut archive = config
        .archive
        .as_ref()
        .map(export::ZipExporter::create)
        .transpose()?;

    let mut sinks: Vec<&mut dyn Exporter> = directories
        .iter_mut()
        .map(|sink| sink as &mut dyn Exporter)
        .collect();
    #[cfg(feature = "archive")]
    if let Some(archive) = archive.as_mut() {
        sinks.push(archive);
    }

    let build_options = BuildOptions {
        rotation: config.rotation.unwrap_or_default(),
    };
    let builder = kind.create(&images, build_options);
    builder.build_dataset(&tasks, &mut sinks, &mut diagnostics)?;

    for sink in sinks.iter_mut() {
        sink.finish()?;
    }

    tracing::info!(
        builder = builder.name(),
        warnings = diagnostics.warning_count(),
        "dataset written"
    );
    Ok(diagnostics)
}
