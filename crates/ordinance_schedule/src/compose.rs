//! Phase composition and phase-dependency validation.

use std::collections::BTreeMap;

use ordinance_registry::{Phase, PluginMetadata};

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};

/// Joins per-phase orders into one pipeline and checks that phase
/// dependencies can be satisfied at all.
pub struct PhaseComposer;

impl PhaseComposer {
    /// Concatenates the per-phase orders in ascending phase ordinal.
    ///
    /// Phases missing from `by_phase` contribute nothing.
    #[must_use]
    pub fn compose(by_phase: &BTreeMap<Phase, Vec<String>>) -> Vec<String> {
        Phase::ALL
            .iter()
            .filter_map(|phase| by_phase.get(phase))
            .flatten()
            .cloned()
            .collect()
    }

    /// Reports every plugin that requires its own phase or a later one.
    ///
    /// Such metadata can never be satisfied by any ordering, so each
    /// violation is an error regardless of validation mode. Returns the
    /// offending plugin names in input order, without duplicates.
    pub fn check_phase_dependencies<'a, I>(plugins: I, diagnostics: &mut Diagnostics) -> Vec<String>
    where
        I: IntoIterator<Item = &'a PluginMetadata>,
    {
        let mut offenders = Vec::new();

        for metadata in plugins {
            let mut offended = false;
            for required in metadata.unsatisfiable_phases() {
                offended = true;
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::PhaseDependency,
                    &metadata.name,
                    format!(
                        "plugin '{}' runs in phase {} but requires phase {}, which does not run before it",
                        metadata.name, metadata.phase, required
                    ),
                ));
            }
            if offended {
                offenders.push(metadata.name.clone());
            }
        }

        offenders
    }
}
