//! Power-on, power-off and reboot sequencing
//!
//! Sequences are write-only: levels are never read back, and a failure part
//! way through leaves the lines already driven as they are.

use super::Node;
use crate::error::{NodectlError, Result};
use crate::gpio::PinLevel;
use std::fmt;
use std::time::Duration;

/// Time the power rails need to discharge between off and on during a reboot
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Blocks the caller while power rails settle
pub trait SettleDelay: Send + Sync {
    /// Wait for `duration`
    fn wait(&self, duration: Duration);
}

/// [`SettleDelay`] that sleeps the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl SettleDelay for ThreadSleep {
    fn wait(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Power sequence being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOperation {
    /// Drive every control line high
    PowerOn,
    /// Drive every control line low
    PowerOff,
    /// Power off, settle, power on
    Reboot,
}

impl fmt::Display for PowerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerOperation::PowerOn => write!(f, "power on"),
            PowerOperation::PowerOff => write!(f, "power off"),
            PowerOperation::Reboot => write!(f, "reboot"),
        }
    }
}

impl Node {
    /// Drive all three control lines high, in configuration order. Stops at
    /// the first failed write.
    pub fn power_on(&self) -> Result<()> {
        tracing::info!("Powering on node {}", self.number);
        self.drive_all(PinLevel::High)
            .map_err(|e| self.power_error(PowerOperation::PowerOn, e))
    }

    /// Drive all three control lines low, in configuration order. Stops at
    /// the first failed write.
    pub fn power_off(&self) -> Result<()> {
        tracing::info!("Powering off node {}", self.number);
        self.drive_all(PinLevel::Low)
            .map_err(|e| self.power_error(PowerOperation::PowerOff, e))
    }

    /// Power off, wait [`SETTLE_DELAY`], then power on. Power on is not
    /// attempted if power off fails.
    pub fn reboot(&self) -> Result<()> {
        self.power_off()
            .map_err(|e| self.power_error(PowerOperation::Reboot, e))?;

        tracing::info!(
            "Waiting {} for node {} power rails to settle",
            humantime::format_duration(SETTLE_DELAY),
            self.number
        );
        self.delay.wait(SETTLE_DELAY);

        self.power_on()
            .map_err(|e| self.power_error(PowerOperation::Reboot, e))
    }

    fn drive_all(&self, level: PinLevel) -> Result<()> {
        for pin in &self.output_pins {
            pin.set_level(level)?;
        }
        Ok(())
    }

    fn power_error(&self, operation: PowerOperation, source: NodectlError) -> NodectlError {
        NodectlError::Power {
            node: self.number,
            operation,
            source: Box::new(source),
        }
    }
}
