//! Processing phases.
//!
//! Every plugin belongs to exactly one [`Phase`]. Phases run strictly in
//! ordinal order: a pipeline never interleaves plugins of different phases.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParsePhaseError;

/// One of the five fixed, totally ordered processing stages.
///
/// The derived [`Ord`] follows the declaration order, which is also the
/// execution order:
///
/// ```
/// use ordinance_registry::Phase;
///
/// assert!(Phase::ContentLoading < Phase::VariableExpansion);
/// assert!(Phase::StructureParsing < Phase::PostProcessing);
/// assert_eq!(Phase::ConditionalEval.ordinal(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Imports and other raw content loading.
    ContentLoading = 1,
    /// Mixins, template fields, and variable resolution.
    VariableExpansion = 2,
    /// Conditional clauses and loops, evaluated against resolved variables.
    ConditionalEval = 3,
    /// Header numbering, cross-references, and other structural passes.
    StructureParsing = 4,
    /// Field tracking, signature lines, and final touch-ups.
    PostProcessing = 5,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::ContentLoading,
        Phase::VariableExpansion,
        Phase::ConditionalEval,
        Phase::StructureParsing,
        Phase::PostProcessing,
    ];

    /// Returns the 1-based ordinal of this phase.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Returns the phase with the given 1-based ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Phase::ContentLoading),
            2 => Some(Phase::VariableExpansion),
            3 => Some(Phase::ConditionalEval),
            4 => Some(Phase::StructureParsing),
            5 => Some(Phase::PostProcessing),
            _ => None,
        }
    }

    /// Returns the stable textual name used in configuration and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::ContentLoading => "CONTENT_LOADING",
            Phase::VariableExpansion => "VARIABLE_EXPANSION",
            Phase::ConditionalEval => "CONDITIONAL_EVAL",
            Phase::StructureParsing => "STRUCTURE_PARSING",
            Phase::PostProcessing => "POST_PROCESSING",
        }
    }

    /// Returns the phase that runs directly after this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParsePhaseError;

    /// Parses either the stable name (`VARIABLE_EXPANSION`) or its kebab-case
    /// form (`variable-expansion`), ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParsePhaseError(s.to_string()))
    }
}
