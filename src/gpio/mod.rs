//! GPIO line control through the sysfs interface
//!
//! A line is handed from the kernel to userspace by writing its number to
//! `<root>/export`, after which `<root>/gpio<N>/direction` and
//! `<root>/gpio<N>/value` control it. Lines are never unexported: the
//! kernel keeps them across process restarts and setup skips the export
//! when the control directory already exists.

mod pin;

pub use pin::{GpioController, InputPin, OutputPin};

use serde::{Deserialize, Serialize};
use std::fmt;

/// GPIO line number in the board's numbering scheme
pub type PinNumber = u32;

/// Default location of the GPIO sysfs interface
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Direction a line is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Input, readable through `value`
    In,
    /// Output, writable through `value`
    Out,
}

impl Direction {
    /// Literal written to the `direction` control entry
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "input"),
            Direction::Out => write!(f, "output"),
        }
    }
}

/// Logic level of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinLevel {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl PinLevel {
    /// Text written to the `value` control entry
    pub fn as_value(&self) -> &'static str {
        match self {
            PinLevel::Low => "0\n",
            PinLevel::High => "1\n",
        }
    }

    /// Numeric value (0 or 1)
    pub fn as_u8(&self) -> u8 {
        match self {
            PinLevel::Low => 0,
            PinLevel::High => 1,
        }
    }
}

impl fmt::Display for PinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinLevel::Low => write!(f, "low"),
            PinLevel::High => write!(f, "high"),
        }
    }
}

/// Lifecycle state of a line as seen through the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinState {
    /// No control directory; still owned by the kernel
    Unexported,
    /// Exported but no usable direction reported
    ExportedUnconfigured,
    /// Exported and configured as input
    Input,
    /// Exported and configured as output
    Output,
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinState::Unexported => write!(f, "unexported"),
            PinState::ExportedUnconfigured => write!(f, "exported"),
            PinState::Input => write!(f, "input"),
            PinState::Output => write!(f, "output"),
        }
    }
}
