//! Static node-to-pin topology table

use crate::error::{NodectlError, Result};
use crate::gpio::PinNumber;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Number of node slots on the board
pub const NODE_COUNT: u8 = 4;

/// Number of serial ports on the board's USB UART bridge
pub const SERIAL_PORT_COUNT: u8 = 4;

/// Pin and serial assignment of one node slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLayout {
    /// Logical node number (1-based)
    pub number: u8,
    /// Power control lines, in the order they are driven
    pub output_pins: [PinNumber; 3],
    /// Status sense line
    pub input_pin: PinNumber,
    /// Index of the node's console UART
    pub serial_port: u8,
}

/// Immutable mapping from node number to hardware assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeTopology {
    nodes: Vec<NodeLayout>,
}

impl Default for NodeTopology {
    fn default() -> Self {
        Self::blade3()
    }
}

impl NodeTopology {
    /// Build a topology after checking it describes exactly
    /// [`NODE_COUNT`] nodes numbered from 1 with no shared lines
    pub fn new(mut nodes: Vec<NodeLayout>) -> Result<Self> {
        if nodes.len() != NODE_COUNT as usize {
            return Err(NodectlError::config(format!(
                "topology must describe {} nodes, got {}",
                NODE_COUNT,
                nodes.len()
            )));
        }

        nodes.sort_by_key(|n| n.number);
        let mut seen = HashSet::new();
        for (index, layout) in nodes.iter().enumerate() {
            let expected = index as u8 + 1;
            if layout.number != expected {
                return Err(NodectlError::config(format!(
                    "node numbers must run 1-{} without gaps, expected {} but found {}",
                    NODE_COUNT, expected, layout.number
                )));
            }
            if layout.serial_port >= SERIAL_PORT_COUNT {
                return Err(NodectlError::config(format!(
                    "node {} serial port {} is out of range 0-{}",
                    layout.number,
                    layout.serial_port,
                    SERIAL_PORT_COUNT - 1
                )));
            }
            for pin in layout.output_pins.iter().chain(std::iter::once(&layout.input_pin)) {
                if !seen.insert(*pin) {
                    return Err(NodectlError::config(format!(
                        "GPIO pin {} is assigned more than once (node {})",
                        pin, layout.number
                    )));
                }
            }
        }

        Ok(Self { nodes })
    }

    /// The Mixtile Blade 3 case board assignment
    pub fn blade3() -> Self {
        Self {
            nodes: vec![
                NodeLayout {
                    number: 1,
                    output_pins: [0x1FC, 0x1F8, 0x1F3],
                    input_pin: 0x1F7,
                    serial_port: 1,
                },
                NodeLayout {
                    number: 2,
                    output_pins: [0x1FD, 0x1F9, 0x1F2],
                    input_pin: 0x1F6,
                    serial_port: 2,
                },
                NodeLayout {
                    number: 3,
                    output_pins: [0x1FF, 0x1FB, 0x1F0],
                    input_pin: 0x1F4,
                    serial_port: 3,
                },
                NodeLayout {
                    number: 4,
                    output_pins: [0x1FE, 0x1FA, 0x1F1],
                    input_pin: 0x1F5,
                    serial_port: 0,
                },
            ],
        }
    }

    /// Load and validate a topology from a JSON array of [`NodeLayout`]
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| NodectlError::io(path, e))?;
        let nodes: Vec<NodeLayout> = serde_json::from_str(&contents).map_err(|e| {
            NodectlError::config(format!("invalid topology file {}: {}", path.display(), e))
        })?;
        Self::new(nodes)
    }

    /// All node layouts, ordered by number
    pub fn nodes(&self) -> &[NodeLayout] {
        &self.nodes
    }

    /// Layout for `number`, or `BadParameter` when out of range
    pub fn layout(&self, number: u8) -> Result<&NodeLayout> {
        validate_node_number(number)?;
        self.nodes
            .get(number as usize - 1)
            .ok_or_else(|| NodectlError::bad_parameter(format!("no layout for node {}", number)))
    }
}

/// Reject node numbers outside 1..=[`NODE_COUNT`]
pub fn validate_node_number(number: u8) -> Result<()> {
    if number < 1 || number > NODE_COUNT {
        return Err(NodectlError::bad_parameter(format!(
            "node number {} is out of range, valid range 1-{}",
            number, NODE_COUNT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blade3_table_is_valid() {
        let table = NodeTopology::blade3();
        let validated = NodeTopology::new(table.nodes().to_vec()).unwrap();
        assert_eq!(validated, table);
    }

    #[test]
    fn test_layout_lookup() {
        let table = NodeTopology::blade3();
        let node4 = table.layout(4).unwrap();

        assert_eq!(node4.output_pins, [0x1FE, 0x1FA, 0x1F1]);
        assert_eq!(node4.input_pin, 0x1F5);
        assert_eq!(node4.serial_port, 0);
    }

    #[test]
    fn test_layout_out_of_range() {
        let table = NodeTopology::blade3();
        assert!(matches!(table.layout(0), Err(NodectlError::BadParameter(_))));
        assert!(matches!(table.layout(5), Err(NodectlError::BadParameter(_))));
    }

    #[test]
    fn test_rejects_shared_pin() {
        let mut nodes = NodeTopology::blade3().nodes().to_vec();
        nodes[3].input_pin = nodes[0].output_pins[1];

        assert!(matches!(NodeTopology::new(nodes), Err(NodectlError::Config(_))));
    }

    #[test]
    fn test_rejects_gap_in_numbering() {
        let mut nodes = NodeTopology::blade3().nodes().to_vec();
        nodes[2].number = 7;

        assert!(NodeTopology::new(nodes).is_err());
    }

    #[test]
    fn test_rejects_wrong_count() {
        let mut nodes = NodeTopology::blade3().nodes().to_vec();
        nodes.pop();

        assert!(NodeTopology::new(nodes).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("topology.json");
        let json = serde_json::to_string(NodeTopology::blade3().nodes()).unwrap();
        std::fs::write(&path, json).unwrap();

        assert_eq!(NodeTopology::load(&path).unwrap(), NodeTopology::blade3());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(NodeTopology::load(&path), Err(NodectlError::Config(_))));
    }
}
