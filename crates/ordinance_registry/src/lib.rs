//! Plugin metadata and registry for Ordinance (Layer 1).
//!
//! `ordinance_registry` holds the inert description of every document
//! transformation plugin the host knows about:
//!
//! - [`Phase`] - The five fixed, totally ordered processing stages
//! - [`PluginMetadata`] - Scheduling metadata for one plugin
//! - [`PluginRegistry`] - Insertion-ordered store of metadata keyed by name
//!
//! A plugin here is never a callable. The registry only names plugins and
//! describes how they relate; the host resolves names to behaviour through
//! its own lookup table once a pipeline order has been computed.
//!
//! # Example
//!
//! ```
//! use ordinance_registry::{Phase, PluginMetadata, PluginRegistry};
//!
//! let mut registry = PluginRegistry::new();
//! registry
//!     .register(PluginMetadata::new("imports", Phase::ContentLoading).provides("content:imported"))
//!     .unwrap();
//! registry
//!     .register(
//!         PluginMetadata::new("template-fields", Phase::VariableExpansion)
//!             .provides("variables:resolved"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.position("template-fields"), Some(1));
//! assert!(registry.register(PluginMetadata::new("imports", Phase::ContentLoading)).is_err());
//! ```

/// Error types for registration and phase parsing.
pub mod error;

/// Plugin scheduling metadata.
pub mod metadata;

/// Processing phases.
pub mod phase;

/// The plugin registry.
pub mod registry;

pub use error::{ParsePhaseError, RegistryError};
pub use metadata::PluginMetadata;
pub use phase::Phase;
pub use registry::{PluginRegistry, RegistrationPolicy};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::*;
    pub use crate::metadata::*;
    pub use crate::phase::*;
    pub use crate::registry::*;
}
