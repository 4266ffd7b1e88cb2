//! Deterministic topological scheduling.
//!
//! The scheduler runs Kahn's algorithm over a [`DependencyGraph`]. Whenever
//! several plugins are ready at the same time, the one registered earliest
//! wins. Graph nodes are already stored in registration order, so the ready
//! set is a min-heap over node indices and two calls with identical inputs
//! always produce identical output.

use core::cmp::Reverse;
use std::collections::BinaryHeap;

use ordinance_registry::Phase;

use crate::graph::{DependencyEdge, DependencyGraph};

/// An unresolved ordering cycle.
///
/// Reported when the ready set empties while nodes remain. `members` lists
/// every remaining node in registration order, so nothing is silently
/// dropped from the report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("circular dependency in phase {phase} among plugins: {}", .members.join(", "))]
pub struct CycleError {
    /// The phase the cycle was found in.
    pub phase: Phase,
    /// Every node that could not be scheduled.
    pub members: Vec<String>,
    /// The nodes that were scheduled before the cycle blocked progress.
    pub scheduled: Vec<String>,
}

/// Result of scheduling with cycle recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredSchedule {
    /// A complete order over every node of the graph.
    pub order: Vec<String>,
    /// Each cycle encountered, in the order it was found.
    pub cycles: Vec<CycleError>,
    /// Edges removed to break those cycles, in removal order.
    pub removed_edges: Vec<DependencyEdge>,
}

impl RecoveredSchedule {
    /// Returns true if the graph was acyclic.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Kahn's algorithm with a registration-order tie-break.
pub struct TopologicalScheduler;

impl TopologicalScheduler {
    /// Computes a linear order consistent with every edge of `graph`.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`] naming every unscheduled node if the graph
    /// contains a cycle.
    pub fn schedule(graph: &DependencyGraph) -> Result<Vec<String>, CycleError> {
        let n = graph.len();
        let mut in_degree = vec![0usize; n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];

        for edge in graph.edges() {
            let (Some(from), Some(to)) = (graph.node_index(&edge.from), graph.node_index(&edge.to))
            else {
                continue;
            };
            successors[from].push(to);
            in_degree[to] += 1;
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut sorted: Vec<usize> = Vec::with_capacity(n);

        while let Some(Reverse(idx)) = ready.pop() {
            sorted.push(idx);

            for &next in &successors[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        let nodes = graph.nodes();
        let scheduled: Vec<String> = sorted.iter().map(|&i| nodes[i].clone()).collect();

        if sorted.len() != n {
            let members: Vec<String> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| nodes[i].clone())
                .collect();

            return Err(CycleError {
                phase: graph.phase(),
                members,
                scheduled,
            });
        }

        Ok(scheduled)
    }

    /// Schedules `graph`, breaking cycles instead of failing.
    ///
    /// Each time a cycle blocks progress, the most recently added edge that
    /// lies on a cycle among the unresolved nodes is removed and the phase is
    /// scheduled again. Edges that merely lead out of a cycle are never cut.
    /// Each pass removes one edge, so the loop terminates.
    #[must_use]
    pub fn schedule_with_recovery(graph: &DependencyGraph) -> RecoveredSchedule {
        let mut working = graph.clone();
        let mut recovered = RecoveredSchedule::default();

        loop {
            match Self::schedule(&working) {
                Ok(order) => {
                    recovered.order = order;
                    return recovered;
                }
                Err(cycle) => {
                    let victim = working
                        .edges()
                        .rev()
                        .find(|edge| closes_cycle(&working, edge, &cycle.members))
                        .cloned();

                    let Some(edge) = victim else {
                        // No edge left to cut; fall back to registration order
                        // for whatever remains.
                        let mut order = cycle.scheduled.clone();
                        order.extend(cycle.members.iter().cloned());
                        recovered.cycles.push(cycle);
                        recovered.order = order;
                        return recovered;
                    };

                    tracing::debug!(
                        phase = %working.phase(),
                        edge = %edge,
                        "breaking ordering cycle"
                    );

                    working.remove_edge(&edge);
                    recovered.cycles.push(cycle);
                    recovered.removed_edges.push(edge);
                }
            }
        }
    }
}

/// Returns true if `edge` lies on a cycle whose nodes are all in `residual`,
/// that is, if `edge.to` can reach `edge.from` through residual nodes.
fn closes_cycle(graph: &DependencyGraph, edge: &DependencyEdge, residual: &[String]) -> bool {
    if !residual.contains(&edge.from) || !residual.contains(&edge.to) {
        return false;
    }
    if edge.from == edge.to {
        return true;
    }

    let mut visited: Vec<&str> = vec![edge.to.as_str()];
    let mut stack: Vec<&str> = vec![edge.to.as_str()];

    while let Some(node) = stack.pop() {
        for next in graph.edges().filter(|e| e.from == node) {
            if next.to == edge.from {
                return true;
            }
            if residual.contains(&next.to) && !visited.contains(&next.to.as_str()) {
                visited.push(next.to.as_str());
                stack.push(next.to.as_str());
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;
    use ordinance_registry::{PluginMetadata, PluginRegistry};

    fn graph_of(plugins: Vec<PluginMetadata>) -> DependencyGraph {
        let mut registry = PluginRegistry::new();
        registry.register_all(plugins).unwrap();
        let members: Vec<&PluginMetadata> = registry.all().collect();
        let enabled: HashSet<&str> = registry.names().collect();
        DependencyGraph::build(Phase::VariableExpansion, &members, &registry, &enabled)
    }

    fn meta(name: &str) -> PluginMetadata {
        PluginMetadata::new(name, Phase::VariableExpansion)
    }

    #[test]
    fn empty_graph_schedules_to_empty_order() {
        let graph = graph_of(vec![]);
        assert_eq!(TopologicalScheduler::schedule(&graph), Ok(vec![]));
    }

    #[test]
    fn unconstrained_nodes_follow_registration_order() {
        let graph = graph_of(vec![meta("c"), meta("a"), meta("b")]);
        let order = TopologicalScheduler::schedule(&graph).unwrap();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn edges_override_registration_order() {
        let graph = graph_of(vec![meta("template-fields").run_after("mixins"), meta("mixins")]);
        let order = TopologicalScheduler::schedule(&graph).unwrap();
        assert_eq!(order, vec!["mixins", "template-fields"]);
    }

    #[test]
    fn tie_break_prefers_earliest_registered_ready_node() {
        // d must follow a; b and c are free. After a runs, b, c, and d are
        // all ready and must come out in registration order.
        let graph = graph_of(vec![
            meta("d").run_after("a"),
            meta("b"),
            meta("a"),
            meta("c"),
        ]);
        let order = TopologicalScheduler::schedule(&graph).unwrap();
        assert_eq!(order, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn cycle_reports_every_remaining_node() {
        let graph = graph_of(vec![
            meta("free"),
            meta("a").run_after("b"),
            meta("b").run_after("a"),
            meta("downstream").run_after("b"),
        ]);

        let err = TopologicalScheduler::schedule(&graph).unwrap_err();
        assert_eq!(err.phase, Phase::VariableExpansion);
        assert_eq!(err.members, vec!["a", "b", "downstream"]);
        assert_eq!(err.scheduled, vec!["free"]);
        assert!(err.to_string().contains("a, b, downstream"));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let graph = graph_of(vec![meta("narcissus").run_before("narcissus")]);
        let err = TopologicalScheduler::schedule(&graph).unwrap_err();
        assert_eq!(err.members, vec!["narcissus"]);
    }

    #[test]
    fn recovery_drops_most_recently_added_cycle_edge() {
        // Edges in insertion order: b -> a (from a.run_after), a -> b (from b.run_after).
        let graph = graph_of(vec![meta("a").run_after("b"), meta("b").run_after("a")]);

        let recovered = TopologicalScheduler::schedule_with_recovery(&graph);
        assert_eq!(recovered.cycles.len(), 1);
        assert_eq!(recovered.removed_edges, vec![DependencyEdge::new("a", "b")]);
        assert_eq!(recovered.order, vec!["b", "a"]);
        assert!(!recovered.is_clean());
    }

    #[test]
    fn recovery_never_cuts_edges_leaving_a_cycle() {
        // Insertion order: b -> a, a -> b, b -> c. The last edge only leads out
        // of the cycle and must survive.
        let graph = graph_of(vec![
            meta("a").run_after("b"),
            meta("b").run_after("a"),
            meta("c").run_after("b"),
        ]);

        let recovered = TopologicalScheduler::schedule_with_recovery(&graph);
        assert_eq!(recovered.removed_edges, vec![DependencyEdge::new("a", "b")]);
        assert_eq!(recovered.cycles.len(), 1);
        assert_eq!(recovered.cycles[0].members, vec!["a", "b", "c"]);
        assert_eq!(recovered.order, vec!["b", "a", "c"]);
    }

    #[test]
    fn recovery_handles_multiple_cycles() {
        let graph = graph_of(vec![
            meta("a").run_before("b"),
            meta("b").run_before("a"),
            meta("c").run_before("d"),
            meta("d").run_before("c"),
        ]);

        let recovered = TopologicalScheduler::schedule_with_recovery(&graph);
        assert_eq!(recovered.order.len(), 4);
        assert_eq!(recovered.removed_edges.len(), 2);
        assert_eq!(recovered.cycles.len(), 2);
    }

    #[test]
    fn recovery_of_acyclic_graph_is_clean() {
        let graph = graph_of(vec![meta("a"), meta("b").run_after("a")]);
        let recovered = TopologicalScheduler::schedule_with_recovery(&graph);

        assert!(recovered.is_clean());
        assert_eq!(recovered.order, vec!["a", "b"]);
        assert!(recovered.removed_edges.is_empty());
    }
}
