//! Per-phase dependency graph construction.
//!
//! A [`DependencyGraph`] holds the enabled plugins of one phase as nodes and
//! the ordering constraints between them as "must run before" edges.
//! Both legacy constraint directions are normalised into the single forward
//! edge kind [`DependencyEdge`]:
//!
//! - `P.run_before = [Q]` becomes `P → Q`
//! - `P.run_after = [R]` becomes `R → P`
//!
//! Constraints that name a plugin which is unregistered, disabled, or in a
//! different phase cannot be enforced and are dropped. Dropped constraints
//! are logged at debug level and kept for inspection via
//! [`DependencyGraph::dropped`]; they never produce a diagnostic.

use core::fmt;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexSet;
use ordinance_registry::{Phase, PluginMetadata, PluginRegistry};

// ─────────────────────────────────────────────────────────────────────────────
// Edges & Dropped Constraints
// ─────────────────────────────────────────────────────────────────────────────

/// A derived ordering edge: `from` executes before `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    /// The plugin that runs first.
    pub from: String,
    /// The plugin that runs second.
    pub to: String,
}

impl DependencyEdge {
    /// Creates an edge `from → to`.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Which declared constraint a dropped edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A `run_before` entry.
    RunBefore,
    /// A `run_after` entry.
    RunAfter,
}

impl ConstraintKind {
    /// Returns the metadata field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::RunBefore => "run_before",
            ConstraintKind::RunAfter => "run_after",
        }
    }
}

/// Why a constraint could not become an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The target is not in the registry at all.
    NotRegistered,
    /// The target is registered but not enabled.
    Disabled,
    /// The target is enabled but runs in another phase, so phase order
    /// already decides the relative position.
    OtherPhase(Phase),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NotRegistered => f.write_str("target is not registered"),
            DropReason::Disabled => f.write_str("target is not enabled"),
            DropReason::OtherPhase(phase) => write!(f, "target runs in phase {phase}"),
        }
    }
}

/// A constraint ignored during graph construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedConstraint {
    /// The plugin that declared the constraint.
    pub plugin: String,
    /// The kind of constraint.
    pub constraint: ConstraintKind,
    /// The plugin the constraint names.
    pub target: String,
    /// Why it was dropped.
    pub reason: DropReason,
}

// ─────────────────────────────────────────────────────────────────────────────
// DependencyGraph
// ─────────────────────────────────────────────────────────────────────────────

/// Directed "must run before" graph over the enabled plugins of one phase.
///
/// Nodes are kept in registry insertion order, which the scheduler relies on
/// for its tie-break. Edges are deduplicated and kept in the order they were
/// added, so "most recently added edge" is well defined.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    phase: Phase,
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: IndexSet<DependencyEdge>,
    dropped: Vec<DroppedConstraint>,
}

impl DependencyGraph {
    /// Builds the graph for `phase`.
    ///
    /// # Arguments
    ///
    /// * `phase` - The phase being scheduled; members of other phases are ignored
    /// * `members` - Enabled metadata, in any order
    /// * `registry` - The full registry, used to order nodes and explain drops
    /// * `enabled` - Names of every enabled plugin across all phases
    #[must_use]
    pub fn build(
        phase: Phase,
        members: &[&PluginMetadata],
        registry: &PluginRegistry,
        enabled: &HashSet<&str>,
    ) -> Self {
        let mut ordered: Vec<&PluginMetadata> = members
            .iter()
            .copied()
            .filter(|metadata| metadata.phase == phase)
            .collect();
        ordered.sort_by_key(|metadata| registry.position(&metadata.name).unwrap_or(usize::MAX));
        ordered.dedup_by(|a, b| a.name == b.name);

        let nodes: Vec<String> = ordered.iter().map(|m| m.name.clone()).collect();
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let mut graph = Self {
            phase,
            nodes,
            index,
            edges: IndexSet::new(),
            dropped: Vec::new(),
        };

        for metadata in &ordered {
            for target in &metadata.run_before {
                if graph.accepts(metadata, ConstraintKind::RunBefore, target, registry, enabled) {
                    graph
                        .edges
                        .insert(DependencyEdge::new(&metadata.name, target));
                }
            }
            for target in &metadata.run_after {
                if graph.accepts(metadata, ConstraintKind::RunAfter, target, registry, enabled) {
                    graph
                        .edges
                        .insert(DependencyEdge::new(target, &metadata.name));
                }
            }
        }

        graph
    }

    /// Checks whether a constraint can become an edge, recording it as
    /// dropped otherwise.
    fn accepts(
        &mut self,
        metadata: &PluginMetadata,
        constraint: ConstraintKind,
        target: &str,
        registry: &PluginRegistry,
        enabled: &HashSet<&str>,
    ) -> bool {
        if self.index.contains_key(target) {
            return true;
        }

        let reason = match registry.get(target) {
            None => DropReason::NotRegistered,
            Some(_) if !enabled.contains(target) => DropReason::Disabled,
            Some(other) => DropReason::OtherPhase(other.phase),
        };

        tracing::debug!(
            plugin = %metadata.name,
            constraint = constraint.as_str(),
            target,
            %reason,
            phase = %self.phase,
            "ordering constraint dropped"
        );

        self.dropped.push(DroppedConstraint {
            plugin: metadata.name.clone(),
            constraint,
            target: target.to_string(),
            reason,
        });
        false
    }

    /// Returns the phase this graph was built for.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the node names in registry insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Returns the position of `name` in [`nodes`](Self::nodes).
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterates over edges in the order they were added.
    pub fn edges(&self) -> indexmap::set::Iter<'_, DependencyEdge> {
        self.edges.iter()
    }

    /// Returns the number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the edge `from → to` exists.
    #[must_use]
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.edges.contains(&DependencyEdge::new(from, to))
    }

    /// Removes an edge, keeping the relative order of the remaining edges.
    ///
    /// Returns true if the edge was present.
    pub fn remove_edge(&mut self, edge: &DependencyEdge) -> bool {
        self.edges.shift_remove(edge)
    }

    /// Returns the constraints dropped during construction.
    #[must_use]
    pub fn dropped(&self) -> &[DroppedConstraint] {
        &self.dropped
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(plugins: Vec<PluginMetadata>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_all(plugins).unwrap();
        registry
    }

    fn build_for(registry: &PluginRegistry, phase: Phase, enabled: &[&str]) -> DependencyGraph {
        let members: Vec<&PluginMetadata> =
            enabled.iter().filter_map(|name| registry.get(name)).collect();
        let enabled: HashSet<&str> = enabled.iter().copied().collect();
        DependencyGraph::build(phase, &members, registry, &enabled)
    }

    #[test]
    fn normalises_both_constraint_directions() {
        let registry = registry(vec![
            PluginMetadata::new("mixins", Phase::VariableExpansion).run_before("dates"),
            PluginMetadata::new("template-fields", Phase::VariableExpansion).run_after("mixins"),
            PluginMetadata::new("dates", Phase::VariableExpansion),
        ]);

        let graph = build_for(
            &registry,
            Phase::VariableExpansion,
            &["dates", "template-fields", "mixins"],
        );

        assert_eq!(graph.nodes(), ["mixins", "template-fields", "dates"]);
        let edges: Vec<String> = graph.edges().map(ToString::to_string).collect();
        assert_eq!(edges, vec!["mixins -> dates", "mixins -> template-fields"]);
    }

    #[test]
    fn deduplicates_mirrored_constraints() {
        let registry = registry(vec![
            PluginMetadata::new("a", Phase::ConditionalEval).run_before("b"),
            PluginMetadata::new("b", Phase::ConditionalEval).run_after("a"),
        ]);

        let graph = build_for(&registry, Phase::ConditionalEval, &["a", "b"]);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge("a", "b"));
    }

    #[test]
    fn drops_unenforceable_constraints_with_reasons() {
        let registry = registry(vec![
            PluginMetadata::new("imports", Phase::ContentLoading),
            PluginMetadata::new("clauses", Phase::ConditionalEval)
                .run_after("imports")
                .run_after("loops")
                .run_before("ghost"),
            PluginMetadata::new("loops", Phase::ConditionalEval),
        ]);

        let graph = build_for(&registry, Phase::ConditionalEval, &["imports", "clauses"]);

        assert_eq!(graph.edge_count(), 0);
        let reasons: Vec<(&str, DropReason)> = graph
            .dropped()
            .iter()
            .map(|d| (d.target.as_str(), d.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("ghost", DropReason::NotRegistered),
                ("imports", DropReason::OtherPhase(Phase::ContentLoading)),
                ("loops", DropReason::Disabled),
            ]
        );
    }

    #[test]
    fn ignores_members_of_other_phases() {
        let registry = registry(vec![
            PluginMetadata::new("imports", Phase::ContentLoading),
            PluginMetadata::new("headers", Phase::StructureParsing),
        ]);

        let graph = build_for(&registry, Phase::StructureParsing, &["imports", "headers"]);
        assert_eq!(graph.nodes(), ["headers"]);
        assert_eq!(graph.phase(), Phase::StructureParsing);
    }

    #[test]
    fn remove_edge_preserves_order() {
        let registry = registry(vec![
            PluginMetadata::new("a", Phase::PostProcessing)
                .run_before("b")
                .run_before("c"),
            PluginMetadata::new("b", Phase::PostProcessing).run_before("c"),
            PluginMetadata::new("c", Phase::PostProcessing),
        ]);

        let mut graph = build_for(&registry, Phase::PostProcessing, &["a", "b", "c"]);
        assert!(graph.remove_edge(&DependencyEdge::new("a", "c")));
        assert!(!graph.remove_edge(&DependencyEdge::new("a", "c")));

        let edges: Vec<String> = graph.edges().map(ToString::to_string).collect();
        assert_eq!(edges, vec!["a -> b", "b -> c"]);
    }
}
