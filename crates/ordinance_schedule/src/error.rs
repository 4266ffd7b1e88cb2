//! Error types for pipeline construction.

use crate::diagnostic::Diagnostics;

/// A pipeline could not be delivered.
///
/// Every variant carries the complete diagnostic list gathered during the
/// build, not only the diagnostics that caused the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// One or more requested plugins are not registered. Fatal in every mode.
    #[error("unknown plugin(s) requested: {}", .names.join(", "))]
    UnknownPlugin {
        /// The unregistered names, in request order.
        names: Vec<String>,
        /// All diagnostics from the build.
        diagnostics: Diagnostics,
    },

    /// Plugin metadata declares a phase dependency no ordering can satisfy.
    /// Fatal in every mode.
    #[error("plugin(s) depend on their own or a later phase: {}", .plugins.join(", "))]
    PhaseDependency {
        /// The offending plugins.
        plugins: Vec<String>,
        /// All diagnostics from the build.
        diagnostics: Diagnostics,
    },

    /// Strict mode found error-severity diagnostics.
    #[error("pipeline is invalid: {errors} error(s)")]
    Invalid {
        /// Number of error-severity diagnostics.
        errors: usize,
        /// All diagnostics from the build.
        diagnostics: Diagnostics,
    },
}

impl PipelineError {
    /// Returns every diagnostic gathered during the failed build.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            PipelineError::UnknownPlugin { diagnostics, .. }
            | PipelineError::PhaseDependency { diagnostics, .. }
            | PipelineError::Invalid { diagnostics, .. } => diagnostics,
        }
    }

    /// Consumes the error, returning its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Diagnostics {
        match self {
            PipelineError::UnknownPlugin { diagnostics, .. }
            | PipelineError::PhaseDependency { diagnostics, .. }
            | PipelineError::Invalid { diagnostics, .. } => diagnostics,
        }
    }
}
