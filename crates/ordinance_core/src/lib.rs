//! Host-facing setup for Ordinance (Layer 3).
//!
//! `ordinance_core` wires the scheduling layers into something a document
//! processing host can load at startup:
//!
//! - [`catalog`] - The built-in legal-markdown plugin set and its default pipeline
//! - [`config`] - JSON pipeline configuration
//! - [`telemetry`] - `tracing` subscriber installation
//!
//! # Example
//!
//! ```
//! use ordinance_core::catalog::{DEFAULT_PIPELINE, builtin_registry};
//! use ordinance_schedule::{ValidationMode, build};
//!
//! let registry = builtin_registry().unwrap();
//! let pipeline = build(&registry, DEFAULT_PIPELINE, ValidationMode::Strict).unwrap();
//!
//! assert_eq!(pipeline.order().first().map(String::as_str), Some("imports"));
//! ```

/// Built-in plugin catalog.
pub mod catalog;

/// Pipeline configuration.
pub mod config;

/// Tracing setup.
pub mod telemetry;

pub use catalog::{DEFAULT_PIPELINE, builtin_plugins, builtin_registry, register_builtins};
pub use config::{ConfigError, PipelineConfig, TracingSettings};
pub use telemetry::{ParseFormatError, TracingConfig, TracingFormat};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::telemetry::*;
}
