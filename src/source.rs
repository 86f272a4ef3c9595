//! Image sources: resolve a task's image locator to raw bytes.
//!
//! Locators come straight from the labeling tool's export and can look like
//! `/data/upload/3/1a2b-page.jpg`, `s3://bucket/scans/page.jpg` or a plain
//! file name. [`LocalImageSource`] serves them from a directory that mirrors
//! the storage bucket; `HttpImageSource` (feature `remote`) downloads them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ExportError;

/// Resolves image locators to encoded image bytes.
pub trait ImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, ExportError>;
}

/// Serves images from a local directory tree.
///
/// A locator is tried, in order, as an existing path, as a path relative to
/// the root (scheme and bucket stripped), and finally by file name anywhere
/// under the root.
#[derive(Debug)]
pub struct LocalImageSource {
    root: PathBuf,
    by_file_name: HashMap<String, PathBuf>,
}

impl LocalImageSource {
    /// Indexes every file under `root` by file name.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let root = root.into();
        let mut by_file_name = HashMap::new();

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = entry.map_err(|source| {
                ExportError::Io(std::io::Error::other(format!(
                    "failed while indexing images under '{}': {source}",
                    root.display()
                )))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                // First file wins on duplicate names; the walk order is stable.
                by_file_name
                    .entry(name.to_string())
                    .or_insert_with(|| entry.path().to_path_buf());
            }
        }

        tracing::debug!(
            root = %root.display(),
            files = by_file_name.len(),
            "indexed local image source"
        );

        Ok(Self { root, by_file_name })
    }

    fn resolve(&self, locator: &str) -> Option<PathBuf> {
        let direct = Path::new(locator);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let relative = strip_scheme(locator).trim_start_matches('/');
        if !relative.is_empty() {
            let under_root = self.root.join(relative);
            if under_root.is_file() {
                return Some(under_root);
            }
        }

        let file_name = locator_file_name(locator)?;
        self.by_file_name.get(&file_name).cloned()
    }
}

impl ImageSource for LocalImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, ExportError> {
        let path = self
            .resolve(locator)
            .ok_or_else(|| ExportError::ImageNotFound {
                locator: locator.to_string(),
            })?;
        tracing::debug!(locator, path = %path.display(), "reading image");
        fs::read(&path).map_err(ExportError::Io)
    }
}

/// Serves images from memory, keyed by exact locator.
#[derive(Debug, Default, Clone)]
pub struct MemoryImageSource {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(locator.into(), bytes);
    }

    pub fn with_image(mut self, locator: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(locator, bytes);
        self
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, ExportError> {
        self.images
            .get(locator)
            .cloned()
            .ok_or_else(|| ExportError::ImageNotFound {
                locator: locator.to_string(),
            })
    }
}

/// Downloads `http://` and `https://` locators.
#[cfg(feature = "remote")]
#[derive(Debug, Default)]
pub struct HttpImageSource;

#[cfg(feature = "remote")]
impl ImageSource for HttpImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, ExportError> {
        let fetch_error = |message: String| ExportError::ImageFetch {
            locator: locator.to_string(),
            message,
        };

        let mut response = match ureq::get(locator).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(ExportError::ImageNotFound {
                    locator: locator.to_string(),
                })
            }
            Err(err) => return Err(fetch_error(err.to_string())),
        };

        response
            .body_mut()
            .read_to_vec()
            .map_err(|err| fetch_error(err.to_string()))
    }
}

/// Serves `http(s)://` locators remotely and everything else from disk.
#[cfg(feature = "remote")]
#[derive(Debug)]
pub struct FallbackImageSource {
    pub local: Option<LocalImageSource>,
    pub remote: HttpImageSource,
}

#[cfg(feature = "remote")]
impl ImageSource for FallbackImageSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, ExportError> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return self.remote.fetch(locator);
        }
        match &self.local {
            Some(local) => local.fetch(locator),
            None => Err(ExportError::ImageNotFound {
                locator: locator.to_string(),
            }),
        }
    }
}

/// Drops a `scheme://authority` prefix, e.g. the bucket of an `s3://` URL.
fn strip_scheme(locator: &str) -> &str {
    let without_query = locator.split(['?', '#']).next().unwrap_or(locator);
    match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
        None => without_query,
    }
}

fn locator_file_name(locator: &str) -> Option<String> {
    let path = locator.split(['?', '#']).next().unwrap_or(locator);
    path.rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_scheme_drops_bucket() {
        assert_eq!(strip_scheme("s3://bucket/scans/a.jpg"), "scans/a.jpg");
        assert_eq!(strip_scheme("/data/upload/1/a.jpg?d=1"), "/data/upload/1/a.jpg");
        assert_eq!(strip_scheme("https://host"), "");
    }

    #[test]
    fn file_name_ignores_query_and_fragment() {
        assert_eq!(
            locator_file_name("https://x.example/a/b/page.jpg?sig=1#top"),
            Some("page.jpg".to_string())
        );
        assert_eq!(locator_file_name("dir/"), None);
    }

    #[test]
    fn local_source_resolves_relative_and_by_name() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("scans/2024")).expect("create dirs");
        fs::write(temp.path().join("scans/2024/page.jpg"), b"jpeg").expect("write image");

        let source = LocalImageSource::new(temp.path()).expect("index");

        assert_eq!(
            source.fetch("s3://bucket/scans/2024/page.jpg").expect("relative"),
            b"jpeg"
        );
        assert_eq!(
            source.fetch("/data/upload/9/page.jpg").expect("by name"),
            b"jpeg"
        );

        let err = source.fetch("missing.jpg").expect_err("missing");
        assert!(matches!(err, ExportError::ImageNotFound { .. }));
    }

    #[test]
    fn memory_source_requires_exact_locator() {
        let source = MemoryImageSource::new().with_image("a.jpg", vec![1, 2, 3]);
        assert_eq!(source.fetch("a.jpg").expect("hit"), vec![1, 2, 3]);
        assert!(source.fetch("b.jpg").is_err());
    }
}
