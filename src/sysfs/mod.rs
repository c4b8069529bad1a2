//! Textual pseudo-filesystem control surface
//!
//! The kernel exposes GPIO lines and PCI devices as small text files under
//! `/sys`. Everything that touches hardware goes through the
//! [`ControlSurface`] trait so the same pin and bus logic runs against the
//! real sysfs ([`SysfsSurface`]) or an in-memory tree ([`MemorySurface`]).

mod memory;
mod surface;

pub use memory::MemorySurface;
pub use surface::SysfsSurface;

use std::io;
use std::path::{Path, PathBuf};

/// Read/write access to control entries, keyed by path
pub trait ControlSurface: Send + Sync {
    /// Read the full textual contents of a control entry
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Write `contents` to a control entry
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Whether an entry exists. `NotFound` maps to `Ok(false)`; any other
    /// failure is returned as an error.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Immediate child directories of `path` (symlinks to directories
    /// included), in enumeration order. Plain files are not returned.
    fn children(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}
