//! Compute node slots and their power control
//!
//! Each slot owns three output lines that switch its power rails and one
//! input line reserved for status sensing. Nodes are built from a
//! [`NodeTopology`] by the [`NodeRegistry`].

mod console;
mod power;
mod registry;
mod topology;

pub use console::{ConsoleCommand, BAUD_RATE, CONSOLE_PROGRAM, TTY_DEVICE_PREFIX};
pub use power::{PowerOperation, SettleDelay, ThreadSleep, SETTLE_DELAY};
pub use registry::NodeRegistry;
pub use topology::{validate_node_number, NodeLayout, NodeTopology, NODE_COUNT, SERIAL_PORT_COUNT};

use crate::error::{NodectlError, Result};
use crate::gpio::{GpioController, InputPin, OutputPin, PinLevel};
use std::fmt;
use std::sync::Arc;

/// A fully configured node slot
pub struct Node {
    number: u8,
    output_pins: [OutputPin; 3],
    input_pin: InputPin,
    serial_port: u8,
    delay: Arc<dyn SettleDelay>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("number", &self.number)
            .field("output_pins", &self.output_pins)
            .field("input_pin", &self.input_pin)
            .field("serial_port", &self.serial_port)
            .finish()
    }
}

impl Node {
    /// Configure all four lines of `layout`. Either every pin is set up or
    /// an error naming the node is returned; lines exported before the
    /// failure stay exported.
    pub(crate) fn setup(
        layout: &NodeLayout,
        controller: &GpioController,
        delay: Arc<dyn SettleDelay>,
    ) -> Result<Self> {
        let wrap = |source: NodectlError| NodectlError::NodeSetup {
            node: layout.number,
            source: Box::new(source),
        };

        let [first, second, third] = layout.output_pins;
        let output_pins = [
            controller.output_pin(first).map_err(wrap)?,
            controller.output_pin(second).map_err(wrap)?,
            controller.output_pin(third).map_err(wrap)?,
        ];
        let input_pin = controller.input_pin(layout.input_pin).map_err(wrap)?;

        tracing::debug!("Node {} GPIO configured", layout.number);

        Ok(Self {
            number: layout.number,
            output_pins,
            input_pin,
            serial_port: layout.serial_port,
            delay,
        })
    }

    /// Logical node number (1-based)
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Power control lines in drive order
    pub fn output_pins(&self) -> &[OutputPin; 3] {
        &self.output_pins
    }

    /// Status sense line
    pub fn input_pin(&self) -> &InputPin {
        &self.input_pin
    }

    /// Index of the node's console UART
    pub fn serial_port(&self) -> u8 {
        self.serial_port
    }

    /// Read the status sense line
    pub fn status(&self) -> Result<PinLevel> {
        self.input_pin.level()
    }
}
