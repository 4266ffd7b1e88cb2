//! Mutual-exclusion checks between enabled plugins.

use ordinance_registry::{PluginMetadata, PluginRegistry};

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};

/// A pair of enabled plugins that cannot run together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictPair {
    /// The plugin registered first.
    pub earlier: String,
    /// The plugin registered later.
    pub later: String,
}

/// Detects declared conflicts among enabled plugins.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Checks every unordered pair of `enabled` plugins.
    ///
    /// A pair conflicts when either side lists the other in its
    /// `conflicts`. Each conflicting pair is reported once, as an error,
    /// with the earlier-registered plugin as the offender. Pairs are returned
    /// in registration order of their earlier member.
    pub fn detect(
        enabled: &[&PluginMetadata],
        registry: &PluginRegistry,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ConflictPair> {
        let mut ordered: Vec<&PluginMetadata> = enabled.to_vec();
        ordered.sort_by_key(|metadata| registry.position(&metadata.name).unwrap_or(usize::MAX));

        let mut pairs = Vec::new();

        for (i, a) in ordered.iter().enumerate() {
            for b in &ordered[i + 1..] {
                if !a.conflicts_with_plugin(b) {
                    continue;
                }

                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Conflict,
                        &a.name,
                        format!(
                            "plugins '{}' and '{}' are mutually exclusive and cannot both be enabled",
                            a.name, b.name
                        ),
                    )
                    .with_related(&b.name),
                );

                pairs.push(ConflictPair {
                    earlier: a.name.clone(),
                    later: b.name.clone(),
                });
            }
        }

        pairs
    }

    /// Chooses which plugins to exclude so that no conflict remains.
    ///
    /// Pairs are resolved in order by excluding the later-registered plugin.
    /// A pair whose member was already excluded is already resolved. Returns
    /// the pairs that caused an exclusion; their `later` member is the
    /// excluded plugin.
    #[must_use]
    pub fn exclusions(pairs: &[ConflictPair]) -> Vec<ConflictPair> {
        let mut resolving: Vec<ConflictPair> = Vec::new();

        for pair in pairs {
            let already_resolved = resolving
                .iter()
                .any(|r| r.later == pair.earlier || r.later == pair.later);
            if already_resolved {
                continue;
            }
            resolving.push(pair.clone());
        }

        resolving
    }
}
