//! Where chapter and image bytes come from.
//!
//! The renderer never touches the file system itself; it asks a
//! [`ChapterSource`] for bytes. [`crate::epub::EpubArchive`] serves an
//! EPUB file, [`DirectorySource`] serves loose files from a directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::util::resolve_path;

/// Supplier of chapter markup and the images it references.
pub trait ChapterSource {
    /// Raw bytes of the chapter at `path`.
    fn chapter_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Resolve `target`, as written in the markup of `current`, to a path
    /// this source understands.
    fn resolve_relative_path(&self, current: &str, target: &str) -> String {
        resolve_path(current, target)
    }

    /// Raw bytes of the image at a resolved `path`.
    fn image_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Files below a root directory, addressed with `/`-separated paths.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Source for a single chapter file: the root is its directory and the
    /// returned path names the chapter within it.
    pub fn for_file(path: impl AsRef<Path>) -> (Self, String) {
        let path = path.as_ref();
        let root = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (Self::new(root), name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative path onto the root, refusing to leave it.
    fn locate(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::MissingResource(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.locate(path)?;
        fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::MissingResource(path.to_string()),
            _ => Error::Io(e),
        })
    }
}

impl ChapterSource for DirectorySource {
    fn chapter_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.read(path)
    }

    fn image_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.png"), b"png").unwrap();

        let source = DirectorySource::new(dir.path());
        let path = source.resolve_relative_path("text/ch1.xhtml", "../img/a.png");
        assert_eq!(path, "img/a.png");
        assert_eq!(source.image_bytes(&path).unwrap(), b"png");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(matches!(
            source.chapter_bytes("nope.xhtml"),
            Err(Error::MissingResource(_))
        ));
    }

    #[test]
    fn test_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path().join("sub"));
        assert!(matches!(
            source.image_bytes("../secret"),
            Err(Error::MissingResource(_))
        ));
    }

    #[test]
    fn test_for_file() {
        let (source, name) = DirectorySource::for_file("/books/x/ch1.xhtml");
        assert_eq!(source.root(), Path::new("/books/x"));
        assert_eq!(name, "ch1.xhtml");
    }
}
