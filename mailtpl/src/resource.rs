//! # Resource module
//!
//! Module dedicated to the lookup of the files embedded in or
//! attached to rendered messages.

use std::{
    fmt, fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

/// The resource provider.
///
/// Gives access to a file-system-like tree rooted at a resource
/// directory.
pub trait ResourceProvider: fmt::Debug + Send + Sync {
    /// Return the root directory of the resources.
    fn root(&self) -> &Path;

    /// Return `true` if a resource exists at the given path.
    fn exists(&self, path: &Path) -> bool;

    /// Open the resource at the given path.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Read the whole content of the resource at the given path.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut contents = Vec::new();
        self.open(path)?.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Locate the given path: absolute paths are kept as they are,
    /// relative ones are resolved against the resource root.
    fn locate(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.root().join(path)
        }
    }
}

/// The file system resource provider.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FsResourceProvider {
    root: PathBuf,
}

impl FsResourceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceProvider for FsResourceProvider {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(fs::File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::tempdir;

    use super::{FsResourceProvider, ResourceProvider};

    #[test]
    fn locate() {
        let resources = FsResourceProvider::new("/srv/mail");

        assert_eq!(
            resources.locate("images/logo.png"),
            Path::new("/srv/mail/images/logo.png")
        );
        assert_eq!(resources.locate("/tmp/logo.png"), Path::new("/tmp/logo.png"));
    }

    #[test]
    fn exists_and_read() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"png").unwrap();
        let resources = FsResourceProvider::new(dir.path());

        let logo = resources.locate("logo.png");
        assert!(resources.exists(&logo));
        assert_eq!(resources.read(&logo).unwrap(), b"png");

        assert!(!resources.exists(&resources.locate("missing.png")));
        assert!(!resources.exists(dir.path()));
    }
}
