//! # nodectl - Cluster Board Node Control
//!
//! Hardware control for four-slot compute cluster boards (Mixtile Blade 3
//! case). The board switches power to each node through GPIO lines exposed
//! by the kernel's sysfs interface, and attached nodes appear on the host's
//! PCIe bus.
//!
//! ## Features
//!
//! - **GPIO pin lifecycle**: idempotent export, direction setup, level I/O
//! - **PCIe discovery**: find blade nodes by vendor/device identifier, rescan
//! - **Power sequencing**: power on, power off and reboot with a settling delay
//! - **Serial consoles**: per-node TTY and baud rate, hand-off to `picocom`
//!
//! ## Quick Start
//!
//! ```no_run
//! use nodectl::gpio::GpioController;
//! use nodectl::node::{NodeRegistry, NodeTopology};
//!
//! let registry = NodeRegistry::new(GpioController::sysfs(), NodeTopology::blade3());
//! let nodes = registry.get_nodes().unwrap();
//!
//! nodes[0].reboot().unwrap();
//! ```
//!
//! ## PCIe Discovery
//!
//! ```no_run
//! use nodectl::pcie::PcieEnumerator;
//!
//! let enumerator = PcieEnumerator::sysfs();
//! for entry in enumerator.list(true).unwrap() {
//!     println!("{}", entry);
//! }
//! ```
//!
//! ## Testing Without Hardware
//!
//! Every controller takes a [`sysfs::ControlSurface`]; [`sysfs::MemorySurface`]
//! is an in-memory tree that logs writes.
//!
//! ```
//! use nodectl::gpio::GpioController;
//! use nodectl::sysfs::MemorySurface;
//! use std::sync::Arc;
//!
//! let surface = Arc::new(MemorySurface::new());
//! let controller = GpioController::new(surface.clone(), "/sys/class/gpio");
//!
//! controller.output_pin(508).unwrap().set_high().unwrap();
//! assert_eq!(surface.contents("/sys/class/gpio/gpio508/value").unwrap(), "1\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod gpio;
pub mod node;
pub mod pcie;
pub mod sysfs;

// Re-export commonly used types
pub use config::{CliArgs, Commands, NodeSelection, NodectlConfig};
pub use error::{NodectlError, Result};
pub use node::{Node, NodeRegistry, NodeTopology};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use nodectl::prelude::*;
    //! ```

    pub use crate::config::{ControlRoots, NodeSelection, NodectlConfig};
    pub use crate::error::{NodectlError, Result};
    pub use crate::gpio::{GpioController, InputPin, OutputPin, PinLevel};
    pub use crate::node::{Node, NodeRegistry, NodeTopology, SettleDelay, SETTLE_DELAY};
    pub use crate::pcie::{PcieEntry, PcieEnumerator};
    pub use crate::sysfs::{ControlSurface, MemorySurface, SysfsSurface};
}
