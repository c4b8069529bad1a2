//! Serial console parameters and terminal hand-off

use super::Node;
use crate::error::{NodectlError, Result};
use std::convert::Infallible;
use std::ffi::CString;
use std::path::PathBuf;

/// Baud rate of every node console
pub const BAUD_RATE: u32 = 1_500_000;

/// Terminal program the console session is handed to
pub const CONSOLE_PROGRAM: &str = "picocom";

/// Device node prefix of the board's CH343 USB UART ports
pub const TTY_DEVICE_PREFIX: &str = "/dev/ttyCH343USB";

impl Node {
    /// Console baud rate
    pub fn baud_rate(&self) -> u32 {
        BAUD_RATE
    }

    /// Console TTY device
    pub fn tty_device_path(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", TTY_DEVICE_PREFIX, self.serial_port))
    }

    /// Terminal invocation that attaches to this node's console
    pub fn console_command(&self) -> ConsoleCommand {
        ConsoleCommand {
            program: CONSOLE_PROGRAM.to_string(),
            args: vec![
                "--baud".to_string(),
                self.baud_rate().to_string(),
                self.tty_device_path().to_string_lossy().into_owned(),
            ],
        }
    }
}

/// A terminal program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCommand {
    /// Program looked up on `PATH`
    pub program: String,
    /// Arguments, not including the program name
    pub args: Vec<String>,
}

impl ConsoleCommand {
    /// Replace the current process with the terminal program.
    ///
    /// Only returns on failure.
    #[cfg(unix)]
    pub fn exec(&self) -> Result<Infallible> {
        let to_cstring = |s: &str| {
            CString::new(s).map_err(|_| {
                NodectlError::bad_parameter(format!("argument {:?} contains a NUL byte", s))
            })
        };

        let program = to_cstring(&self.program)?;
        let mut argv = vec![program.clone()];
        for arg in &self.args {
            argv.push(to_cstring(arg)?);
        }

        tracing::debug!("Executing {} {:?}", self.program, self.args);
        nix::unistd::execvp(&program, &argv).map_err(|source| NodectlError::Exec {
            program: self.program.clone(),
            source,
        })
    }

    /// Process replacement needs a Unix host
    #[cfg(not(unix))]
    pub fn exec(&self) -> Result<Infallible> {
        Err(NodectlError::Unsupported(format!(
            "cannot launch {} on this platform",
            self.program
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::gpio::GpioController;
    use crate::node::{NodeRegistry, NodeTopology};
    use crate::sysfs::MemorySurface;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn test_console_parameters_per_node() {
        let controller = GpioController::new(Arc::new(MemorySurface::new()), "/gpio");
        let nodes = NodeRegistry::new(controller, NodeTopology::blade3())
            .get_nodes()
            .unwrap();

        let ttys: Vec<PathBuf> = nodes.iter().map(|n| n.tty_device_path()).collect();
        assert_eq!(
            ttys,
            vec![
                PathBuf::from("/dev/ttyCH343USB1"),
                PathBuf::from("/dev/ttyCH343USB2"),
                PathBuf::from("/dev/ttyCH343USB3"),
                PathBuf::from("/dev/ttyCH343USB0"),
            ]
        );

        let command = nodes[3].console_command();
        assert_eq!(command.program, "picocom");
        assert_eq!(command.args, vec!["--baud", "1500000", "/dev/ttyCH343USB0"]);
    }
}
