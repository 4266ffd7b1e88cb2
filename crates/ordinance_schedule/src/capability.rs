//! Capability reachability validation.
//!
//! Walks a composed pipeline left to right. A capability counts as provided
//! only once a plugin earlier in the order has advertised it; there are no
//! ambient capabilities.

use std::collections::BTreeSet;

use hashbrown::HashSet;
use ordinance_registry::PluginRegistry;

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};

/// Verifies that every required capability is provided before it is needed.
pub struct CapabilityValidator;

impl CapabilityValidator {
    /// Validates `order` against the capability declarations in `registry`.
    ///
    /// For each plugin, every required capability not yet provided yields a
    /// [`DiagnosticKind::CapabilityMissing`] diagnostic: an error when the
    /// plugin is required, a warning when it is optional. Any other
    /// registered plugin advertising the capability, enabled or not, is
    /// named as a candidate provider.
    ///
    /// Returns the set of capabilities provided by the whole order.
    pub fn validate(
        order: &[String],
        registry: &PluginRegistry,
        diagnostics: &mut Diagnostics,
    ) -> BTreeSet<String> {
        let mut provided_so_far: HashSet<&str> = HashSet::new();

        for name in order {
            let Some(metadata) = registry.get(name) else {
                continue;
            };

            for capability in &metadata.requires_capabilities {
                if provided_so_far.contains(capability.as_str()) {
                    continue;
                }

                let candidates: Vec<&str> = registry
                    .providers_of(capability)
                    .filter(|provider| provider.name != metadata.name)
                    .map(|provider| provider.name.as_str())
                    .collect();

                let severity = if metadata.required {
                    Severity::Error
                } else {
                    Severity::Warning
                };

                let hint = match candidates.as_slice() {
                    [] => "no registered plugin provides it".to_string(),
                    [only] => format!("candidate provider: {only}"),
                    many => format!("candidate providers: {}", many.join(", ")),
                };

                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::CapabilityMissing,
                    severity,
                    &metadata.name,
                    format!(
                        "plugin '{}' requires capability '{}' but no earlier plugin provides it ({hint})",
                        metadata.name, capability
                    ),
                )
                .with_capability(capability);

                if let Some(first) = candidates.first() {
                    diagnostic = diagnostic.with_related(*first);
                }

                diagnostics.push(diagnostic);
            }

            provided_so_far.extend(metadata.capabilities.iter().map(String::as_str));
        }

        provided_so_far.into_iter().map(str::to_string).collect()
    }
}
