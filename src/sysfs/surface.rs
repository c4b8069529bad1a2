//! Control surface backed by the real filesystem

use super::ControlSurface;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// [`ControlSurface`] that reads and writes real files (normally under `/sys`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsSurface;

impl SysfsSurface {
    /// Create a new filesystem-backed surface
    pub fn new() -> Self {
        Self
    }
}

impl ControlSurface for SysfsSurface {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = Vec::new();

        // Device entries under /sys/bus/pci/devices are symlinks; they are
        // listed but not descended into.
        for entry in WalkDir::new(path).min_depth(1).max_depth(1).follow_links(false) {
            let entry = entry?;
            let is_dir = if entry.path_is_symlink() {
                std::fs::metadata(entry.path())?.is_dir()
            } else {
                entry.file_type().is_dir()
            };

            if is_dir {
                children.push(entry.into_path());
            }
        }

        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value");
        let surface = SysfsSurface::new();

        surface.write(&path, "1\n").unwrap();
        assert_eq!(surface.read(&path).unwrap(), "1\n");
    }

    #[test]
    fn test_exists() {
        let dir = TempDir::new().unwrap();
        let surface = SysfsSurface::new();

        assert!(surface.exists(dir.path()).unwrap());
        assert!(!surface.exists(&dir.path().join("gpio508")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_children_skips_files_and_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let targets = dir.path().join("targets");
        let root = dir.path().join("devices");
        std::fs::create_dir_all(targets.join("0000:01:00.0")).unwrap();
        std::fs::create_dir_all(root.join("0000:02:00.0")).unwrap();
        std::fs::write(root.join("rescan"), "").unwrap();
        std::os::unix::fs::symlink(targets.join("0000:01:00.0"), root.join("0000:01:00.0"))
            .unwrap();

        let mut names: Vec<String> = SysfsSurface::new()
            .children(&root)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names, vec!["0000:01:00.0", "0000:02:00.0"]);
    }

    #[test]
    fn test_children_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = SysfsSurface::new().children(&dir.path().join("missing"));
        assert!(result.is_err());
    }
}
