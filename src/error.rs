//! Error types for nodectl
//!
//! Every failure carries the control-surface path, GPIO line or node number it
//! concerns, so a failed invocation can be diagnosed from the message alone.
//! Nothing in the crate retries or rolls back; errors propagate straight to
//! the caller.

use crate::gpio::{Direction, PinLevel, PinNumber};
use crate::node::PowerOperation;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for nodectl operations
#[derive(Error, Debug)]
pub enum NodectlError {
    /// Read, write or stat failure on the control surface
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Control entry contents are not in the expected textual format
    #[error("Failed to parse {contents:?} read from '{path}' as an integer: {source}")]
    Parse {
        path: PathBuf,
        contents: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A parsed value falls outside the documented legal set
    #[error("Value read from '{path}' was expected to be 0 or 1, got {value}")]
    InvariantViolation { path: PathBuf, value: i64 },

    /// Pin export or direction configuration failed
    #[error("Failed to set up GPIO pin {pin} as {direction}: {source}")]
    Setup {
        pin: PinNumber,
        direction: Direction,
        #[source]
        source: Box<NodectlError>,
    },

    /// Setting an output level failed
    #[error("Failed to set GPIO pin {pin} output level {level}: {source}")]
    Write {
        pin: PinNumber,
        level: PinLevel,
        #[source]
        source: std::io::Error,
    },

    /// Caller supplied an identifier outside its valid range
    #[error("Bad parameter: {0}")]
    BadParameter(String),

    /// Construction of a node's pins failed
    #[error("Failed to set up node {node}: {source}")]
    NodeSetup {
        node: u8,
        #[source]
        source: Box<NodectlError>,
    },

    /// A power sequence stopped part way through
    #[error("Failed to {operation} node {node}: {source}")]
    Power {
        node: u8,
        operation: PowerOperation,
        #[source]
        source: Box<NodectlError>,
    },

    /// Invalid topology table or control roots
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested feature is not implemented
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Replacing the process image failed
    #[cfg(unix)]
    #[error("Failed to invoke {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: nix::errno::Errno,
    },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<NodectlError>,
    },
}

impl NodectlError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a bad parameter error
    pub fn bad_parameter(message: impl Into<String>) -> Self {
        Self::BadParameter(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping the wrappers that only add pin/node context
    pub fn root_cause(&self) -> &NodectlError {
        match self {
            Self::Setup { source, .. }
            | Self::NodeSetup { source, .. }
            | Self::Power { source, .. }
            | Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self.root_cause() {
            Self::Io { path, .. }
            | Self::Parse { path, .. }
            | Self::InvariantViolation { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self.root_cause() {
            Self::Io { source, .. } | Self::Write { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

/// Result type alias for nodectl operations
pub type Result<T> = std::result::Result<T, NodectlError>;

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| NodectlError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = NodectlError::io("/sys/class/gpio/export", io_err);
        assert_eq!(err.path().unwrap(), &PathBuf::from("/sys/class/gpio/export"));
    }

    #[test]
    fn test_root_cause_unwraps_context() {
        let inner = NodectlError::InvariantViolation {
            path: PathBuf::from("/sys/class/gpio/gpio503/value"),
            value: 2,
        };
        let err = NodectlError::NodeSetup {
            node: 3,
            source: Box::new(inner.with_context("reading status")),
        };

        assert!(matches!(
            err.root_cause(),
            NodectlError::InvariantViolation { value: 2, .. }
        ));
        assert!(err.path().is_some());
        assert!(err.to_string().starts_with("Failed to set up node 3"));
    }

    #[test]
    fn test_permission_error() {
        let err = NodectlError::Write {
            pin: 508,
            level: PinLevel::High,
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_permission_error());
        assert!(!NodectlError::bad_parameter("node 0").is_permission_error());
    }
}
