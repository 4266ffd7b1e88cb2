//! Pipeline scheduling for Ordinance (Layer 2).
//!
//! Given a [`PluginRegistry`](ordinance_registry::PluginRegistry) and the
//! names a caller wants enabled, this crate computes a deterministic
//! execution order that respects phases, ordering constraints, capability
//! requirements, and conflicts.
//!
//! # Components
//!
//! - [`DependencyGraph`] - Per-phase graph with `run_before`/`run_after`
//!   normalized into forward edges
//! - [`TopologicalScheduler`] - Kahn's algorithm with a registration-order
//!   tie-break and optional cycle recovery
//! - [`PhaseComposer`] - Concatenates phase orders and rejects impossible
//!   phase dependencies
//! - [`CapabilityValidator`] - Checks each required capability is provided
//!   earlier in the order
//! - [`ConflictDetector`] - Finds mutually exclusive plugin pairs
//! - [`PipelineBuilder`] - Orchestrates all of the above under a
//!   [`ValidationMode`]
//!
//! # Example
//!
//! ```
//! use ordinance_registry::{Phase, PluginMetadata, PluginRegistry};
//! use ordinance_schedule::{ValidationMode, build};
//!
//! let mut registry = PluginRegistry::new();
//! registry.register_all([
//!     PluginMetadata::new("template-fields", Phase::VariableExpansion)
//!         .provides("variables:resolved"),
//!     PluginMetadata::new("loops", Phase::ConditionalEval).requires("variables:resolved"),
//! ]).unwrap();
//!
//! let result = build(&registry, &["loops"], ValidationMode::Warn).unwrap();
//! assert!(!result.is_valid());
//! assert_eq!(result.diagnostics().error_count(), 1);
//! ```

/// Capability reachability validation.
pub mod capability;

/// Phase composition.
pub mod compose;

/// Conflict detection.
pub mod conflict;

/// Structured diagnostics.
pub mod diagnostic;

/// Error types.
pub mod error;

/// Per-phase dependency graphs.
pub mod graph;

/// Pipeline orchestration.
pub mod pipeline;

/// Topological scheduling.
pub mod scheduler;

pub use capability::CapabilityValidator;
pub use compose::PhaseComposer;
pub use conflict::{ConflictDetector, ConflictPair};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::PipelineError;
pub use graph::{ConstraintKind, DependencyEdge, DependencyGraph, DropReason, DroppedConstraint};
pub use pipeline::{
    ParseModeError, PipelineBuilder, PipelineRequest, PipelineResult, ValidationMode, build,
};
pub use scheduler::{CycleError, RecoveredSchedule, TopologicalScheduler};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::capability::*;
    pub use crate::compose::*;
    pub use crate::conflict::*;
    pub use crate::diagnostic::*;
    pub use crate::error::*;
    pub use crate::graph::*;
    pub use crate::pipeline::*;
    pub use crate::scheduler::*;
}
