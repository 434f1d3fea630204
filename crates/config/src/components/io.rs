use crate::error::{BuilderError, BuilderErrorExt};
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Reads named resources: property files and mapper documents.
pub trait ResourceLoader: Debug + Send + Sync {
    /// Directory that relative resource names are resolved against.
    fn set_base_dir(&mut self, _dir: &Path) {}

    fn exists(&self, resource: &str) -> bool;

    /// # Errors
    /// [`BuilderError::Io`] when the resource is missing or unreadable.
    fn read(&self, resource: &str) -> Result<String, BuilderError>;

    /// Reads a `file://` URL. Other schemes are rejected.
    ///
    /// # Errors
    /// [`BuilderError::Resolution`] for a non-file URL, [`BuilderError::Io`] on read failure.
    fn read_url(&self, url: &Url) -> Result<String, BuilderError> {
        let path = file_url_path(url)?;
        fs::read_to_string(&path).context(format!("reading {url}"))
    }
}

/// Converts a `file://` URL to a local path.
///
/// # Errors
/// [`BuilderError::Resolution`] for any other scheme.
pub fn file_url_path(url: &Url) -> Result<PathBuf, BuilderError> {
    if url.scheme() != "file" {
        return Err(BuilderError::resolution(url.as_str(), "only file:// URLs are supported"));
    }
    url.to_file_path()
        .map_err(|()| BuilderError::resolution(url.as_str(), "URL does not name a local file"))
}

/// Resolves resources against a list of root directories, first hit wins.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    roots: Vec<PathBuf>,
}

impl Default for FileSystemLoader {
    fn default() -> Self {
        Self { roots: vec![PathBuf::from(".")] }
    }
}

impl FileSystemLoader {
    pub const TYPE_NAME: &'static str = "mapr::io::FileSystemLoader";

    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { roots: vec![root.into()] }
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn locate(&self, resource: &str) -> Option<PathBuf> {
        let relative = resource.trim_start_matches('/');
        self.roots.iter().map(|root| root.join(relative)).find(|path| path.is_file())
    }
}

impl ResourceLoader for FileSystemLoader {
    fn set_base_dir(&mut self, dir: &Path) {
        self.roots = vec![dir.to_path_buf()];
    }

    fn exists(&self, resource: &str) -> bool {
        self.locate(resource).is_some()
    }

    fn read(&self, resource: &str) -> Result<String, BuilderError> {
        let path = self.locate(resource).ok_or_else(|| BuilderError::Io {
            source: io::Error::new(io::ErrorKind::NotFound, "Could not find resource"),
            context: Some(resource.to_owned().into()),
        })?;
        debug!(path = %path.display(), "Reading resource");
        fs::read_to_string(&path).context(resource.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_root_with_the_resource_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("db.properties"), "a=second").unwrap();

        let loader = FileSystemLoader::new(first.path()).with_root(second.path());
        assert!(loader.exists("db.properties"));
        assert_eq!(loader.read("/db.properties").unwrap(), "a=second");

        fs::write(first.path().join("db.properties"), "a=first").unwrap();
        assert_eq!(loader.read("db.properties").unwrap(), "a=first");
    }

    #[test]
    fn missing_resource_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSystemLoader::new(dir.path()).read("nope.xml").unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("nope.xml"));
    }

    #[test]
    fn only_file_urls_are_read() {
        let url = Url::parse("https://example.com/db.properties").unwrap();
        let err = FileSystemLoader::default().read_url(&url).unwrap_err();
        assert_eq!(err.kind(), "resolution");
    }
}
