//! Bus device walk, filtering and rescan

use super::{DEVICE_ID, SYSFS_PCIE_RESCAN, SYSFS_PCIE_ROOT, VENDOR_ID};
use crate::error::{IoResultExt, Result};
use crate::sysfs::{ControlSurface, SysfsSurface};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A blade node discovered on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PcieEntry {
    /// Bus address, e.g. `0000:01:00.0`
    pub address: String,
}

impl PcieEntry {
    /// Create an entry for a bus address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Path of this device under `root`
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(&self.address)
    }

    /// Human-readable description in `lspci` style.
    ///
    /// The vendor is not a PCI-SIG member and borrows another organisation's
    /// vendor identifier, so the name cannot come from a device database.
    pub fn description(&self) -> String {
        let address = self.address.strip_prefix("0000:").unwrap_or(&self.address);
        format!("{} Network controller: Mixtile Limited Blade 3 (rev 01)", address)
    }
}

impl fmt::Display for PcieEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Lists blade nodes on the PCI bus and triggers rescans
#[derive(Clone)]
pub struct PcieEnumerator {
    surface: Arc<dyn ControlSurface>,
    root: PathBuf,
    rescan_path: PathBuf,
}

impl fmt::Debug for PcieEnumerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcieEnumerator")
            .field("root", &self.root)
            .field("rescan_path", &self.rescan_path)
            .finish()
    }
}

impl PcieEnumerator {
    /// Enumerator over device entries under `root`; rescans go to
    /// `<root>/rescan`
    pub fn new(surface: Arc<dyn ControlSurface>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let rescan_path = root.join("rescan");
        Self {
            surface,
            root,
            rescan_path,
        }
    }

    /// Enumerator for the kernel's real PCI bus
    pub fn sysfs() -> Self {
        Self::new(Arc::new(SysfsSurface::new()), SYSFS_PCIE_ROOT).with_rescan_path(SYSFS_PCIE_RESCAN)
    }

    /// Use a different rescan control entry
    pub fn with_rescan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rescan_path = path.into();
        self
    }

    /// Bus device root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ask the kernel to rescan every bus. Returns once the request is
    /// written; discovery itself completes asynchronously.
    pub fn rescan_all(&self) -> Result<()> {
        tracing::info!("Triggering PCIe rescan via {:?}", self.rescan_path);
        self.surface
            .write(&self.rescan_path, "1\n")
            .with_path(&self.rescan_path)
    }

    /// List blade nodes in enumeration order.
    ///
    /// With `active_only`, devices whose `enable` attribute is not `1` are
    /// left out. An empty list means nothing matched; failing to read a
    /// required attribute aborts the walk.
    pub fn list(&self, active_only: bool) -> Result<Vec<PcieEntry>> {
        let vendor = format!("{:x}", VENDOR_ID);
        let device = format!("{:x}", DEVICE_ID);

        let mut entries = Vec::new();
        for path in self.surface.children(&self.root).with_path(&self.root)? {
            // Only symlinks named for bus addresses live here, so the name is
            // taken as the address without further checks.
            let Some(address) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };

            if self.read_attribute(&path, "vendor")? != vendor {
                continue;
            }
            if self.read_attribute(&path, "device")? != device {
                continue;
            }
            if active_only && self.read_attribute(&path, "enable")? != "1" {
                tracing::debug!("Skipping disabled device {}", address);
                continue;
            }

            tracing::debug!("Found blade node at {}", address);
            entries.push(PcieEntry::new(address));
        }

        Ok(entries)
    }

    fn read_attribute(&self, device: &Path, name: &str) -> Result<String> {
        let path = device.join(name);
        let contents = self.surface.read(&path).with_path(&path)?;
        Ok(contents.trim().to_string())
    }
}
