//! Configuration module for nodectl
//!
//! Provides CLI arguments, control-surface locations and node selection.

mod settings;

pub use settings::*;
