//! Pipeline orchestration.
//!
//! [`PipelineBuilder`] drives every scheduling component for one request:
//!
//! 1. Resolve requested names against the registry
//! 2. Group the resolved metadata by phase
//! 3. Build a [`DependencyGraph`] and schedule it, per phase
//! 4. Compose the phase orders and check phase dependencies
//! 5. Validate capability reachability
//! 6. Detect conflicts
//! 7. Aggregate diagnostics into a validity verdict
//! 8. Apply the [`ValidationMode`] policy
//!
//! Building is a pure computation over a read-only registry. Nothing is
//! cached between calls and no shared state is written, so any number of
//! builds may run concurrently against the same registry.

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashSet;
use ordinance_registry::{Phase, PluginMetadata, PluginRegistry};
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityValidator;
use crate::compose::PhaseComposer;
use crate::conflict::ConflictDetector;
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::PipelineError;
use crate::graph::DependencyGraph;
use crate::scheduler::{CycleError, TopologicalScheduler};

// ─────────────────────────────────────────────────────────────────────────────
// ValidationMode
// ─────────────────────────────────────────────────────────────────────────────

/// How the builder reacts to error-severity diagnostics.
///
/// Unknown plugins and impossible phase dependencies are fatal in every
/// mode; the mode only governs the recoverable defects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Any error fails the build; no partial result is delivered.
    #[default]
    Strict,
    /// Always deliver a best-effort result and log diagnostics.
    Warn,
    /// As [`Warn`](Self::Warn), without logging diagnostics.
    Silent,
}

impl ValidationMode {
    /// Returns the stable lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Warn => "warn",
            ValidationMode::Silent => "silent",
        }
    }

    /// Returns true if diagnostics are sent to the logging sink.
    #[must_use]
    pub const fn emits_diagnostics(self) -> bool {
        !matches!(self, ValidationMode::Silent)
    }

    /// Returns true if recoverable defects are repaired instead of failing.
    #[must_use]
    pub const fn recovers(self) -> bool {
        !matches!(self, ValidationMode::Strict)
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`ValidationMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown validation mode '{0}': expected strict, warn, or silent")]
pub struct ParseModeError(pub String);

impl FromStr for ValidationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationMode::Strict),
            "warn" => Ok(ValidationMode::Warn),
            "silent" => Ok(ValidationMode::Silent),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PipelineRequest
// ─────────────────────────────────────────────────────────────────────────────

/// The plugins a caller wants to run and how strictly to validate them.
///
/// The order of `enabled_plugins` does not influence the pipeline order;
/// registration order is the only tie-break. Repeated names are ignored
/// after their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Names of the plugins to enable.
    pub enabled_plugins: Vec<String>,
    /// Validation policy.
    #[serde(default)]
    pub validation_mode: ValidationMode,
}

impl PipelineRequest {
    /// Creates a strict request enabling `plugins`.
    #[must_use]
    pub fn new<I, S>(plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled_plugins: plugins.into_iter().map(Into::into).collect(),
            validation_mode: ValidationMode::default(),
        }
    }

    /// Sets the validation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PipelineResult
// ─────────────────────────────────────────────────────────────────────────────

/// A computed pipeline.
///
/// Created fresh by every build and never modified afterwards. `valid` is
/// false whenever an error-severity diagnostic was recorded, in which case
/// the order is best-effort and document output may be suspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    order: Vec<String>,
    by_phase: BTreeMap<Phase, Vec<String>>,
    capabilities_provided: BTreeSet<String>,
    diagnostics: Diagnostics,
    valid: bool,
    excluded: Vec<String>,
    mode: ValidationMode,
}

impl PipelineResult {
    /// The full execution order.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// The execution order split by phase. Every phase is present.
    #[must_use]
    pub fn by_phase(&self) -> &BTreeMap<Phase, Vec<String>> {
        &self.by_phase
    }

    /// The execution order of a single phase.
    #[must_use]
    pub fn phase_order(&self, phase: Phase) -> &[String] {
        self.by_phase.get(&phase).map_or(&[], Vec::as_slice)
    }

    /// Every capability established by the pipeline.
    #[must_use]
    pub fn capabilities_provided(&self) -> &BTreeSet<String> {
        &self.capabilities_provided
    }

    /// All diagnostics, in the order they were produced.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.errors()
    }

    /// Warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics.warnings()
    }

    /// Returns true if no error-severity diagnostic was recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Plugins removed from the order to resolve conflicts.
    #[must_use]
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// The mode the pipeline was built with.
    #[must_use]
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Returns the position of `name` in the order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    /// Returns true if `name` is part of the order.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the number of scheduled plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing was scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consumes the result, returning the execution order.
    #[must_use]
    pub fn into_order(self) -> Vec<String> {
        self.order
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PipelineBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Computes pipelines against a borrowed registry.
///
/// # Example
///
/// ```
/// use ordinance_registry::{Phase, PluginMetadata, PluginRegistry};
/// use ordinance_schedule::pipeline::{PipelineBuilder, PipelineRequest};
///
/// let mut registry = PluginRegistry::new();
/// registry.register_all([
///     PluginMetadata::new("imports", Phase::ContentLoading).provides("content:imported"),
///     PluginMetadata::new("mixins", Phase::VariableExpansion).provides("mixins:expanded"),
///     PluginMetadata::new("template-fields", Phase::VariableExpansion)
///         .provides("variables:resolved")
///         .run_after("mixins"),
///     PluginMetadata::new("loops", Phase::ConditionalEval).requires("variables:resolved"),
/// ]).unwrap();
///
/// let request = PipelineRequest::new(["loops", "template-fields", "mixins", "imports"]);
/// let result = PipelineBuilder::new(&registry).build(&request).unwrap();
///
/// assert!(result.is_valid());
/// assert_eq!(result.order(), ["imports", "mixins", "template-fields", "loops"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PipelineBuilder<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> PipelineBuilder<'r> {
    /// Creates a builder over `registry`.
    #[must_use]
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    /// Returns the registry this builder schedules against.
    #[must_use]
    pub fn registry(&self) -> &'r PluginRegistry {
        self.registry
    }

    /// Builds the pipeline described by `request`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnknownPlugin`] if a requested name is not registered
    /// - [`PipelineError::PhaseDependency`] if enabled metadata requires its
    ///   own or a later phase
    /// - [`PipelineError::Invalid`] in strict mode if any error-severity
    ///   diagnostic was recorded
    pub fn build(&self, request: &PipelineRequest) -> Result<PipelineResult, PipelineError> {
        self.build_with(&request.enabled_plugins, request.validation_mode)
    }

    /// Builds a pipeline from a list of names and a mode.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with<S: AsRef<str>>(
        &self,
        enabled: &[S],
        mode: ValidationMode,
    ) -> Result<PipelineResult, PipelineError> {
        let span = tracing::debug_span!("pipeline_build", %mode, requested = enabled.len());
        let _guard = span.enter();

        let registry = self.registry;
        let mut diagnostics = Diagnostics::new();

        // Step 1: resolve names
        let mut seen: HashSet<&str> = HashSet::new();
        let mut resolved: Vec<&PluginMetadata> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();

        for name in enabled {
            let name = name.as_ref();
            if !seen.insert(name) {
                tracing::debug!(plugin = name, "duplicate plugin in request ignored");
                continue;
            }
            match registry.get(name) {
                Some(metadata) => resolved.push(metadata),
                None => {
                    unknown.push(name.to_string());
                    diagnostics.push(Diagnostic::error(
                        DiagnosticKind::UnknownPlugin,
                        name,
                        format!("plugin '{name}' was requested but is not registered"),
                    ));
                }
            }
        }

        resolved.sort_by_key(|metadata| registry.position(&metadata.name).unwrap_or(usize::MAX));
        let enabled_names: HashSet<&str> = resolved.iter().map(|m| m.name.as_str()).collect();

        // Step 2: group by phase
        let mut groups: BTreeMap<Phase, Vec<&PluginMetadata>> = BTreeMap::new();
        for metadata in &resolved {
            groups.entry(metadata.phase).or_default().push(metadata);
        }

        // Step 3: graph + schedule per phase
        let mut by_phase: BTreeMap<Phase, Vec<String>> = BTreeMap::new();
        for phase in Phase::ALL {
            let members = groups.get(&phase).map(Vec::as_slice).unwrap_or_default();
            let graph = DependencyGraph::build(phase, members, registry, &enabled_names);

            if !mode.recovers() {
                // One report per blocked phase. Unresolved nodes keep
                // registration order for the checks that follow.
                let order = match TopologicalScheduler::schedule(&graph) {
                    Ok(order) => order,
                    Err(cycle) => {
                        diagnostics.push(cycle_diagnostic(&cycle));
                        let mut order = cycle.scheduled;
                        order.extend(cycle.members);
                        order
                    }
                };
                by_phase.insert(phase, order);
                continue;
            }

            let recovered = TopologicalScheduler::schedule_with_recovery(&graph);
            for cycle in &recovered.cycles {
                diagnostics.push(cycle_diagnostic(cycle));
            }
            for edge in &recovered.removed_edges {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::CircularDependency,
                        &edge.to,
                        format!("dropped ordering constraint '{edge}' in phase {phase} to break a cycle"),
                    )
                    .with_related(&edge.from),
                );
            }

            by_phase.insert(phase, recovered.order);
        }

        // Step 4: compose
        let mut order = PhaseComposer::compose(&by_phase);
        let phase_offenders =
            PhaseComposer::check_phase_dependencies(resolved.iter().copied(), &mut diagnostics);

        // Step 5: capabilities
        let mut capability_diagnostics = Diagnostics::new();
        let mut capabilities =
            CapabilityValidator::validate(&order, registry, &mut capability_diagnostics);

        // Step 6: conflicts
        let mut conflict_diagnostics = Diagnostics::new();
        let pairs = ConflictDetector::detect(&resolved, registry, &mut conflict_diagnostics);
        let mut excluded: Vec<String> = Vec::new();

        if mode.recovers() && !pairs.is_empty() {
            for pair in ConflictDetector::exclusions(&pairs) {
                conflict_diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::Conflict,
                        &pair.later,
                        format!(
                            "plugin '{}' excluded from the pipeline because it conflicts with '{}'",
                            pair.later, pair.earlier
                        ),
                    )
                    .with_related(&pair.earlier),
                );
                excluded.push(pair.later);
            }

            for names in by_phase.values_mut() {
                names.retain(|name| !excluded.contains(name));
            }
            order.retain(|name| !excluded.contains(name));

            // Capability reachability is judged on the order actually delivered.
            capability_diagnostics = Diagnostics::new();
            capabilities = CapabilityValidator::validate(&order, registry, &mut capability_diagnostics);
        }

        diagnostics.append(capability_diagnostics);
        diagnostics.append(conflict_diagnostics);

        // Step 7: aggregate
        let valid = !diagnostics.has_errors();

        if mode.emits_diagnostics() {
            diagnostics.emit_all();
        }
        tracing::debug!(?order, valid, diagnostics = diagnostics.len(), "pipeline built");

        // Step 8: mode policy
        if !unknown.is_empty() {
            return Err(PipelineError::UnknownPlugin {
                names: unknown,
                diagnostics,
            });
        }
        if !phase_offenders.is_empty() {
            return Err(PipelineError::PhaseDependency {
                plugins: phase_offenders,
                diagnostics,
            });
        }
        if !valid && !mode.recovers() {
            return Err(PipelineError::Invalid {
                errors: diagnostics.error_count(),
                diagnostics,
            });
        }

        Ok(PipelineResult {
            order,
            by_phase,
            capabilities_provided: capabilities,
            diagnostics,
            valid,
            excluded,
            mode,
        })
    }
}

/// Builds a pipeline in one call.
///
/// Equivalent to `PipelineBuilder::new(registry).build_with(enabled, mode)`.
///
/// # Errors
///
/// See [`PipelineBuilder::build`].
pub fn build<S: AsRef<str>>(
    registry: &PluginRegistry,
    enabled: &[S],
    mode: ValidationMode,
) -> Result<PipelineResult, PipelineError> {
    PipelineBuilder::new(registry).build_with(enabled, mode)
}

fn cycle_diagnostic(cycle: &CycleError) -> Diagnostic {
    let plugin = cycle.members.first().cloned().unwrap_or_default();
    let mut diagnostic = Diagnostic::error(
        DiagnosticKind::CircularDependency,
        plugin,
        format!(
            "circular ordering constraints in phase {} among: {}",
            cycle.phase,
            cycle.members.join(", ")
        ),
    )
    .with_members(cycle.members.clone());

    if let Some(related) = cycle.members.get(1) {
        diagnostic = diagnostic.with_related(related);
    }
    diagnostic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(plugins: Vec<PluginMetadata>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_all(plugins).unwrap();
        registry
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("WARN".parse::<ValidationMode>(), Ok(ValidationMode::Warn));
        assert_eq!("silent".parse::<ValidationMode>(), Ok(ValidationMode::Silent));
        assert!("loud".parse::<ValidationMode>().is_err());
        assert_eq!(ValidationMode::Strict.to_string(), "strict");
        assert_eq!(ValidationMode::default(), ValidationMode::Strict);
    }

    #[test]
    fn empty_request_yields_empty_valid_pipeline() {
        let registry = registry(vec![PluginMetadata::new("imports", Phase::ContentLoading)]);
        let empty: [&str; 0] = [];

        let result = build(&registry, &empty, ValidationMode::Strict).unwrap();
        assert!(result.is_empty());
        assert!(result.is_valid());
        assert_eq!(result.by_phase().len(), Phase::ALL.len());
    }

    #[test]
    fn duplicate_request_names_are_ignored() {
        let registry = registry(vec![PluginMetadata::new("imports", Phase::ContentLoading)]);

        let result = build(&registry, &["imports", "imports"], ValidationMode::Strict).unwrap();
        assert_eq!(result.order(), ["imports"]);
    }

    #[test]
    fn request_order_does_not_affect_pipeline_order() {
        let registry = registry(vec![
            PluginMetadata::new("a", Phase::PostProcessing),
            PluginMetadata::new("b", Phase::PostProcessing),
        ]);

        let forward = build(&registry, &["a", "b"], ValidationMode::Strict).unwrap();
        let backward = build(&registry, &["b", "a"], ValidationMode::Strict).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn unknown_plugin_is_fatal_even_when_silent() {
        let registry = registry(vec![PluginMetadata::new("imports", Phase::ContentLoading)]);

        let err = build(&registry, &["imports", "ghost"], ValidationMode::Silent).unwrap_err();
        match &err {
            PipelineError::UnknownPlugin { names, .. } => assert_eq!(names, &vec!["ghost".to_string()]),
            other => panic!("expected UnknownPlugin, got {other:?}"),
        }
        assert_eq!(
            err.diagnostics()
                .of_kind(DiagnosticKind::UnknownPlugin)
                .count(),
            1
        );
    }

    #[test]
    fn warn_mode_reports_dropped_cycle_edge() {
        let registry = registry(vec![
            PluginMetadata::new("a", Phase::ConditionalEval).run_after("b"),
            PluginMetadata::new("b", Phase::ConditionalEval).run_after("a"),
        ]);

        let result = build(&registry, &["a", "b"], ValidationMode::Warn).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.order(), ["b", "a"]);

        let cycle: Vec<&Diagnostic> = result
            .diagnostics()
            .of_kind(DiagnosticKind::CircularDependency)
            .collect();
        assert_eq!(cycle.len(), 2);
        assert!(cycle[0].is_error());
        assert!(!cycle[1].is_error());
        assert!(cycle[1].message.contains("a -> b"));
    }

    #[test]
    fn strict_mode_does_not_add_recovery_warnings() {
        let registry = registry(vec![
            PluginMetadata::new("a", Phase::ConditionalEval).run_after("b"),
            PluginMetadata::new("b", Phase::ConditionalEval).run_after("a"),
        ]);

        let err = build(&registry, &["a", "b"], ValidationMode::Strict).unwrap_err();
        assert!(matches!(err, PipelineError::Invalid { errors: 1, .. }));
        assert_eq!(err.diagnostics().warnings().count(), 0);
    }

    #[test]
    fn strict_mode_reports_each_blocked_phase_once() {
        let registry = registry(vec![
            PluginMetadata::new("a", Phase::StructureParsing).run_before("b"),
            PluginMetadata::new("b", Phase::StructureParsing).run_before("a"),
            PluginMetadata::new("c", Phase::StructureParsing).run_before("d"),
            PluginMetadata::new("d", Phase::StructureParsing).run_before("c"),
        ]);

        let err = build(&registry, &["a", "b", "c", "d"], ValidationMode::Strict).unwrap_err();
        assert!(matches!(err, PipelineError::Invalid { errors: 1, .. }));

        let cycles: Vec<&Diagnostic> = err
            .diagnostics()
            .of_kind(DiagnosticKind::CircularDependency)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].members, ["a", "b", "c", "d"]);
    }

    #[test]
    fn excluding_a_provider_is_reflected_in_capability_checks() {
        let registry = registry(vec![
            PluginMetadata::new("fields-a", Phase::VariableExpansion)
                .provides("variables:resolved")
                .conflicts_with("fields-b"),
            PluginMetadata::new("fields-b", Phase::VariableExpansion)
                .provides("variables:resolved")
                .provides("dates:formatted"),
            PluginMetadata::new("dates", Phase::ConditionalEval).requires("dates:formatted"),
        ]);

        let result = build(&registry, &["fields-a", "fields-b", "dates"], ValidationMode::Warn)
            .unwrap();

        assert_eq!(result.excluded(), ["fields-b"]);
        assert_eq!(result.order(), ["fields-a", "dates"]);
        assert!(!result.capabilities_provided().contains("dates:formatted"));

        let missing: Vec<&Diagnostic> = result
            .diagnostics()
            .of_kind(DiagnosticKind::CapabilityMissing)
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].related_plugin.as_deref(), Some("fields-b"));
    }
}
