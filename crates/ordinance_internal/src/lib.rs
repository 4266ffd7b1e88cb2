//! # Ordinance Internal Library
//!
//! Re-exports the core Ordinance crates for convenience.

/// Layer 1: Plugin metadata and registry.
pub use ordinance_registry;

/// Layer 2: Dependency graphs, scheduling, and validation.
pub use ordinance_schedule;

/// Layer 3: Tracing, configuration, and the built-in catalog.
pub use ordinance_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use ordinance_core::prelude::*;
    pub use ordinance_registry::prelude::*;
    pub use ordinance_schedule::prelude::*;
}
