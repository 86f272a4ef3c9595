//! Output sinks for dataset artifacts.
//!
//! Builders address every artifact by a `/`-separated path relative to the
//! dataset root and write it to each sink they were given.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::ExportError;

/// A destination for named byte blobs.
pub trait Exporter {
    /// Writes `data` at `relative_path`, replacing any previous content.
    fn write(&mut self, data: &[u8], relative_path: &str) -> Result<(), ExportError>;

    /// Flushes buffered state. Called once after the last write.
    fn finish(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Writes `data` to every sink.
pub fn write_all(
    sinks: &mut [&mut dyn Exporter],
    data: &[u8],
    relative_path: &str,
) -> Result<(), ExportError> {
    for sink in sinks.iter_mut() {
        sink.write(data, relative_path)?;
    }
    Ok(())
}

/// Writes files under a root directory.
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// reader never sees a partially written artifact.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    root: PathBuf,
}

impl DirectoryExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Exporter for DirectoryExporter {
    fn write(&mut self, data: &[u8], relative_path: &str) -> Result<(), ExportError> {
        let path = self.root.join(relative_path);
        let sink_error = |source| ExportError::SinkWrite {
            path: relative_path.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(sink_error)?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        fs::write(&partial, data).map_err(sink_error)?;
        fs::rename(&partial, &path).map_err(sink_error)
    }
}

/// Collects artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryExporter {
    /// Latest content per path.
    pub files: BTreeMap<String, Vec<u8>>,
    /// Every write, in order (paths may repeat).
    pub writes: Vec<String>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the content at `path` as UTF-8 text, if present.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.files
            .get(path)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl Exporter for MemoryExporter {
    fn write(&mut self, data: &[u8], relative_path: &str) -> Result<(), ExportError> {
        self.files.insert(relative_path.to_string(), data.to_vec());
        self.writes.push(relative_path.to_string());
        Ok(())
    }
}

#[cfg(feature = "archive")]
pub use archive::ZipExporter;

#[cfg(feature = "archive")]
mod archive {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::Exporter;
    use crate::error::ExportError;

    /// Writes artifacts as entries of a zip archive.
    pub struct ZipExporter {
        path: PathBuf,
        writer: Option<ZipWriter<File>>,
    }

    impl ZipExporter {
        /// Creates (or truncates) the archive at `path`.
        pub fn create(path: impl Into<PathBuf>) -> Result<Self, ExportError> {
            let path = path.into();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(ExportError::Io)?;
            }
            let file = File::create(&path).map_err(ExportError::Io)?;
            Ok(Self {
                path,
                writer: Some(ZipWriter::new(file)),
            })
        }
    }

    impl Exporter for ZipExporter {
        fn write(&mut self, data: &[u8], relative_path: &str) -> Result<(), ExportError> {
            let Some(writer) = self.writer.as_mut() else {
                return Err(ExportError::SinkWrite {
                    path: relative_path.to_string(),
                    source: std::io::Error::other("archive already finished"),
                });
            };

            if let Err(source) = writer.start_file(relative_path, SimpleFileOptions::default()) {
                return Err(ExportError::Archive {
                    path: self.path.clone(),
                    source,
                });
            }
            writer
                .write_all(data)
                .map_err(|source| ExportError::SinkWrite {
                    path: relative_path.to_string(),
                    source,
                })
        }

        fn finish(&mut self) -> Result<(), ExportError> {
            match self.writer.take() {
                Some(writer) => writer
                    .finish()
                    .map(|_| ())
                    .map_err(|source| ExportError::Archive {
                        path: self.path.clone(),
                        source,
                    }),
                None => Ok(()),
            }
        }
    }

    impl std::fmt::Debug for ZipExporter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ZipExporter")
                .field("path", &self.path)
                .field("finished", &self.writer.is_none())
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_all_mirrors_to_every_sink() {
        let mut first = MemoryExporter::new();
        let mut second = MemoryExporter::new();

        write_all(&mut [&mut first, &mut second], b"abc", "train/labels/00.txt")
            .expect("write");

        assert_eq!(first.text("train/labels/00.txt"), Some("abc"));
        assert_eq!(second.text("train/labels/00.txt"), Some("abc"));
    }

    #[test]
    fn directory_exporter_creates_parents() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut sink = DirectoryExporter::new(temp.path());

        sink.write(b"0 0.5 0.5 0.5 0.5", "train/labels/00.txt")
            .expect("write");

        let written = fs::read_to_string(temp.path().join("train/labels/00.txt")).expect("read");
        assert_eq!(written, "0 0.5 0.5 0.5 0.5");
        assert!(!temp.path().join("train/labels/00.txt.partial").exists());
    }

    #[cfg(feature = "archive")]
    #[test]
    fn zip_exporter_writes_entries() {
        use std::io::Read;

        let temp = tempfile::tempdir().expect("create temp dir");
        let archive_path = temp.path().join("out/dataset.zip");

        let mut sink = ZipExporter::create(&archive_path).expect("create archive");
        sink.write(b"names", "data.yaml").expect("write entry");
        sink.finish().expect("finish");
        assert!(sink.write(b"late", "late.txt").is_err());

        let file = fs::File::open(&archive_path).expect("open archive");
        let mut archive = zip::ZipArchive::new(file).expect("read archive");
        let mut entry = archive.by_name("data.yaml").expect("entry");
        let mut content = String::new();
        entry.read_to_string(&mut content).expect("read entry");
        assert_eq!(content, "names");
    }
}
