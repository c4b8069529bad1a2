//! Configuration settings for nodectl
//!
//! Defines the CLI arguments, control-surface locations and node selection
//! rules, and turns them into ready-to-use controllers.

use crate::error::{NodectlError, Result};
use crate::gpio::{GpioController, SYSFS_GPIO_ROOT};
use crate::node::{validate_node_number, NodeRegistry, NodeTopology, NODE_COUNT};
use crate::pcie::{PcieEnumerator, SYSFS_PCIE_RESCAN, SYSFS_PCIE_ROOT};
use crate::sysfs::{ControlSurface, SysfsSurface};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

/// nodectl - power and console control for Blade 3 cluster boards
#[derive(Parser, Debug, Clone)]
#[command(name = "nodectl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Control power, consoles and discovery of cluster board nodes")]
#[command(long_about = r#"
nodectl drives the GPIO lines that switch power to each compute node on a
four-slot cluster board, finds attached nodes on the PCIe bus, and opens
serial consoles.

Examples:
  nodectl list --active-only        # Nodes that are up on the PCIe bus
  nodectl poweron -n 1 -n 3         # Power on nodes 1 and 3
  nodectl reboot --all              # Power cycle every node
  nodectl console -n 2              # Serial console on node 2
"#)]
pub struct CliArgs {
    /// GPIO sysfs root
    #[arg(long, global = true, env = "NODECTL_GPIO_ROOT", default_value = SYSFS_GPIO_ROOT, value_name = "PATH")]
    pub gpio_root: PathBuf,

    /// PCI bus device directory
    #[arg(long, global = true, env = "NODECTL_PCIE_ROOT", default_value = SYSFS_PCIE_ROOT, value_name = "PATH")]
    pub pcie_root: PathBuf,

    /// PCI bus rescan control entry
    #[arg(long, global = true, env = "NODECTL_PCIE_RESCAN", default_value = SYSFS_PCIE_RESCAN, value_name = "PATH")]
    pub pcie_rescan: PathBuf,

    /// JSON topology table replacing the built-in board layout
    #[arg(long, global = true, env = "NODECTL_TOPOLOGY", value_name = "FILE")]
    pub topology: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format for listings
    #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List nodes attached to the PCIe bus
    #[command(name = "list", visible_alias = "l")]
    List {
        /// Only report nodes that are active and online
        #[arg(short = 'e', long)]
        active_only: bool,
    },

    /// Power on nodes
    #[command(name = "poweron", visible_alias = "u")]
    PowerOn {
        #[command(flatten)]
        selection: NodeSelection,
    },

    /// Power off nodes
    #[command(name = "poweroff", visible_alias = "d")]
    PowerOff {
        #[command(flatten)]
        selection: NodeSelection,
    },

    /// Reboot nodes
    #[command(name = "reboot", visible_aliases = ["restart", "r"])]
    Reboot {
        #[command(flatten)]
        selection: NodeSelection,
    },

    /// Flash an image to nodes (not supported yet)
    #[command(name = "flash", visible_alias = "f")]
    Flash {
        #[command(flatten)]
        selection: NodeSelection,
        /// Image file to flash
        #[arg(short, long, value_name = "PATH")]
        file: PathBuf,
    },

    /// Start a serial console session with a node
    #[command(name = "console", visible_alias = "c")]
    Console {
        /// Node to connect to
        #[arg(short, long, value_name = "N")]
        node: u8,
    },

    /// Trigger a PCIe rescan to look for newly attached nodes
    #[command(name = "rescan", visible_alias = "s")]
    Rescan,

    /// Show the status input line of nodes
    #[command(name = "status", visible_alias = "t")]
    Status {
        #[command(flatten)]
        selection: NodeSelection,
    },
}

/// Output format for listings
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Which nodes a command applies to
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSelection {
    /// Select all nodes
    #[arg(short, long, conflicts_with = "nodes")]
    pub all: bool,

    /// Select a specific node (repeatable)
    #[arg(short = 'n', long = "node", value_name = "N")]
    pub nodes: Vec<u8>,
}

impl NodeSelection {
    /// Select every node
    pub fn all() -> Self {
        Self {
            all: true,
            nodes: Vec::new(),
        }
    }

    /// Select the given nodes
    pub fn nodes(nodes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            all: false,
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Node numbers in the order given, duplicates removed. Fails with
    /// `BadParameter` for an empty selection or an out-of-range number.
    pub fn resolve(&self) -> Result<Vec<u8>> {
        if self.all {
            return Ok((1..=NODE_COUNT).collect());
        }
        if self.nodes.is_empty() {
            return Err(NodectlError::bad_parameter(
                "no nodes selected, use --all or --node",
            ));
        }

        let mut selected = Vec::with_capacity(self.nodes.len());
        for &number in &self.nodes {
            validate_node_number(number)?;
            if !selected.contains(&number) {
                selected.push(number);
            }
        }
        Ok(selected)
    }
}

/// Locations of the kernel control interfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRoots {
    /// GPIO sysfs root
    pub gpio_root: PathBuf,
    /// PCI bus device directory
    pub pcie_root: PathBuf,
    /// PCI bus rescan control entry
    pub pcie_rescan: PathBuf,
}

impl Default for ControlRoots {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from(SYSFS_GPIO_ROOT),
            pcie_root: PathBuf::from(SYSFS_PCIE_ROOT),
            pcie_rescan: PathBuf::from(SYSFS_PCIE_RESCAN),
        }
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone, Default)]
pub struct NodectlConfig {
    /// Control interface locations
    pub roots: ControlRoots,
    /// Node topology table
    pub topology: NodeTopology,
}

impl NodectlConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let topology = match &args.topology {
            Some(path) => NodeTopology::load(path)?,
            None => NodeTopology::blade3(),
        };

        Ok(Self {
            roots: ControlRoots {
                gpio_root: args.gpio_root.clone(),
                pcie_root: args.pcie_root.clone(),
                pcie_rescan: args.pcie_rescan.clone(),
            },
            topology,
        })
    }

    /// GPIO controller over the real filesystem
    pub fn gpio_controller(&self) -> GpioController {
        self.gpio_controller_on(Arc::new(SysfsSurface::new()))
    }

    /// GPIO controller over an arbitrary control surface
    pub fn gpio_controller_on(&self, surface: Arc<dyn ControlSurface>) -> GpioController {
        GpioController::new(surface, &self.roots.gpio_root)
    }

    /// PCIe enumerator over the real filesystem
    pub fn pcie_enumerator(&self) -> PcieEnumerator {
        self.pcie_enumerator_on(Arc::new(SysfsSurface::new()))
    }

    /// PCIe enumerator over an arbitrary control surface
    pub fn pcie_enumerator_on(&self, surface: Arc<dyn ControlSurface>) -> PcieEnumerator {
        PcieEnumerator::new(surface, &self.roots.pcie_root).with_rescan_path(&self.roots.pcie_rescan)
    }

    /// Node registry over the real filesystem
    pub fn registry(&self) -> NodeRegistry {
        NodeRegistry::new(self.gpio_controller(), self.topology.clone())
    }
}
