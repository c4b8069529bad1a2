//! In-memory control surface
//!
//! A fake `/sys` tree for exercising pin and bus logic without hardware.
//! Writes create missing parent directories, every successful write is
//! logged in order, and individual paths can be made to fail.

use super::ControlSurface;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    writes: Vec<(PathBuf, String)>,
    failures: HashMap<PathBuf, io::ErrorKind>,
}

impl Tree {
    fn add_dir(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn check(&self, path: &Path) -> io::Result<()> {
        match self.failures.get(path) {
            Some(kind) => Err(io::Error::new(
                *kind,
                format!("injected failure for {}", path.display()),
            )),
            None => Ok(()),
        }
    }
}

/// [`ControlSurface`] over an in-memory tree
#[derive(Debug, Default)]
pub struct MemorySurface {
    tree: Mutex<Tree>,
}

impl MemorySurface {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a directory (and its ancestors)
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.lock().add_dir(path.as_ref());
    }

    /// Add a file with the given contents without recording a write
    pub fn add_file(&self, path: impl AsRef<Path>, contents: &str) {
        let path = path.as_ref();
        let mut tree = self.lock();
        if let Some(parent) = path.parent() {
            tree.add_dir(parent);
        }
        tree.files.insert(path.to_path_buf(), contents.to_string());
    }

    /// Make every operation on `path` fail with `kind`
    pub fn fail_on(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.lock().failures.insert(path.as_ref().to_path_buf(), kind);
    }

    /// Current contents of a file
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    /// All successful writes, oldest first
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.lock().writes.clone()
    }

    /// Number of successful writes to `path`
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.lock().writes.iter().filter(|(p, _)| p == path).count()
    }
}

impl ControlSurface for MemorySurface {
    fn read(&self, path: &Path) -> io::Result<String> {
        let tree = self.lock();
        tree.check(path)?;
        tree.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut tree = self.lock();
        tree.check(path)?;
        if let Some(parent) = path.parent() {
            tree.add_dir(parent);
        }
        tree.files.insert(path.to_path_buf(), contents.to_string());
        tree.writes.push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        let tree = self.lock();
        tree.check(path)?;
        Ok(tree.dirs.contains(path) || tree.files.contains_key(path))
    }

    fn children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.lock();
        tree.check(path)?;
        if !tree.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }

        Ok(tree
            .dirs
            .iter()
            .filter(|dir| dir.parent() == Some(path))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parents_and_logs() {
        let surface = MemorySurface::new();
        surface.write(Path::new("/gpio/gpio5/direction"), "out").unwrap();

        assert!(surface.exists(Path::new("/gpio/gpio5")).unwrap());
        assert_eq!(surface.contents("/gpio/gpio5/direction").unwrap(), "out");
        assert_eq!(surface.write_count("/gpio/gpio5/direction"), 1);
    }

    #[test]
    fn test_children_lists_only_direct_dirs() {
        let surface = MemorySurface::new();
        surface.add_file("/pci/0000:01:00.0/vendor", "4586\n");
        surface.add_file("/pci/rescan", "");
        surface.add_dir("/pci/0000:02:00.0/nested");

        let children = surface.children(Path::new("/pci")).unwrap();
        assert_eq!(
            children,
            vec![PathBuf::from("/pci/0000:01:00.0"), PathBuf::from("/pci/0000:02:00.0")]
        );
    }

    #[test]
    fn test_injected_failure() {
        let surface = MemorySurface::new();
        surface.fail_on("/gpio/export", io::ErrorKind::PermissionDenied);

        let err = surface.write(Path::new("/gpio/export"), "5\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(surface.writes().is_empty());
    }
}
