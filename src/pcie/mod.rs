//! PCIe discovery of attached compute nodes
//!
//! Blade nodes show up on the host's PCI bus as network controllers. They are
//! found by walking the bus device directory and matching the textual
//! `vendor` and `device` attributes against fixed identifiers.

mod enumerator;

pub use enumerator::{PcieEntry, PcieEnumerator};

/// Vendor identifier reported by the blade nodes
pub const VENDOR_ID: u16 = 0x4586;

/// Device identifier reported by the blade nodes
pub const DEVICE_ID: u16 = 0x1234;

/// Default location of the PCI bus device entries
pub const SYSFS_PCIE_ROOT: &str = "/sys/bus/pci/devices";

/// Kernel entry that triggers a rescan of every PCI bus
pub const SYSFS_PCIE_RESCAN: &str = "/sys/bus/pci/rescan";
