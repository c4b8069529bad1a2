//! Construction of the node set

use super::{validate_node_number, Node, NodeTopology, SettleDelay, ThreadSleep};
use crate::error::Result;
use crate::gpio::GpioController;
use std::sync::Arc;

/// Builds [`Node`]s from a topology table
///
/// Construction is not transactional: if node *k* fails, the lines of nodes
/// 1..k that were already exported stay exported.
#[derive(Clone)]
pub struct NodeRegistry {
    controller: GpioController,
    topology: NodeTopology,
    delay: Arc<dyn SettleDelay>,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("controller", &self.controller)
            .field("topology", &self.topology)
            .finish()
    }
}

impl NodeRegistry {
    /// Create a registry; reboots sleep the calling thread
    pub fn new(controller: GpioController, topology: NodeTopology) -> Self {
        Self {
            controller,
            topology,
            delay: Arc::new(ThreadSleep),
        }
    }

    /// Use a different settling delay implementation
    pub fn with_delay(mut self, delay: Arc<dyn SettleDelay>) -> Self {
        self.delay = delay;
        self
    }

    /// Topology the nodes are built from
    pub fn topology(&self) -> &NodeTopology {
        &self.topology
    }

    /// Build every node, in number order. Stops at the first node that
    /// fails to set up.
    pub fn get_nodes(&self) -> Result<Vec<Node>> {
        self.topology
            .nodes()
            .iter()
            .map(|layout| Node::setup(layout, &self.controller, Arc::clone(&self.delay)))
            .collect()
    }

    /// Build a single node. Out-of-range numbers fail before any I/O.
    pub fn get_node(&self, number: u8) -> Result<Node> {
        validate_node_number(number)?;
        let layout = self.topology.layout(number)?;
        Node::setup(layout, &self.controller, Arc::clone(&self.delay))
    }
}
