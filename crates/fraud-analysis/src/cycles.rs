//! Bounded directed-cycle search for laundering loops.
//!
//! Unbounded cycle enumeration is exponential on dense graphs, so the
//! search is depth-first with the current path as a stack, capped at a
//! configurable hop count, and budgeted per root. Roots are visited in
//! ascending account-id order and the search never descends into a node
//! ordered below the current root, so every simple cycle is discovered
//! exactly once, rooted at its minimal account — that rooting is the
//! rotation-invariant canonical form. A canonical-key set dedupes as a
//! second line of defense.
//!
//! Exceeding a budget truncates further search and surfaces as the
//! report's `partial` flag rather than an error.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::graph::FlowGraph;
use crate::AnalysisConfig;

/// One detected directed cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Cycle {
    /// Account ids along the cycle; first element equals the last.
    pub path: Vec<String>,
}

impl Cycle {
    /// Member accounts, without the repeated closing element.
    pub fn members(&self) -> &[String] {
        &self.path[..self.path.len() - 1]
    }

    /// Hop count (number of edges) of the cycle.
    pub fn length(&self) -> usize {
        self.path.len() - 1
    }
}

/// Outcome of cycle detection over one graph partition.
#[derive(Clone, Debug, Default)]
pub struct CycleDetection {
    /// Distinct cycles, in discovery order.
    pub cycles: Vec<Cycle>,
    /// True when a search budget stopped the enumeration early.
    pub truncated: bool,
}

/// Find bounded-length directed cycles within one component.
///
/// `component` must be sorted by account id (see
/// [`FlowGraph::components`]); the min-root ordering relies on it.
pub fn detect_cycles(
    graph: &FlowGraph,
    component: &[NodeIndex],
    config: &AnalysisConfig,
) -> CycleDetection {
    let mut detection = CycleDetection::default();
    if component.len() < 2 {
        return detection;
    }

    let mut seen: HashSet<Vec<String>> = HashSet::new();

    'roots: for &root in component {
        if detection.cycles.len() >= config.max_rings {
            detection.truncated = true;
            break;
        }

        let mut search = CycleSearch {
            graph,
            root,
            max_len: config.max_cycle_length,
            step_budget: config.max_steps_per_root,
            steps: 0,
            path: vec![root],
            on_path: HashSet::from([root]),
            found: Vec::new(),
            truncated: false,
        };
        search.dfs(root);
        detection.truncated |= search.truncated;

        for node_path in search.found {
            let key: Vec<String> = node_path
                .iter()
                .map(|&node| graph.account(node).to_string())
                .collect();
            if !seen.insert(key.clone()) {
                continue;
            }

            let mut path = key;
            path.push(graph.account(root).to_string());
            detection.cycles.push(Cycle { path });

            if detection.cycles.len() >= config.max_rings {
                detection.truncated = true;
                break 'roots;
            }
        }
    }

    detection
}

/// Depth-first search state for one root.
struct CycleSearch<'a> {
    graph: &'a FlowGraph,
    root: NodeIndex,
    max_len: usize,
    step_budget: usize,
    steps: usize,
    path: Vec<NodeIndex>,
    on_path: HashSet<NodeIndex>,
    /// Cycle paths found so far, root-first, without the closing repeat.
    found: Vec<Vec<NodeIndex>>,
    truncated: bool,
}

impl CycleSearch<'_> {
    fn dfs(&mut self, node: NodeIndex) {
        let mut neighbors: Vec<NodeIndex> = self.graph.graph.neighbors(node).collect();
        neighbors.sort_by(|a, b| self.graph.account(*a).cmp(self.graph.account(*b)));

        for next in neighbors {
            if self.truncated {
                return;
            }
            self.steps += 1;
            if self.steps > self.step_budget {
                self.truncated = true;
                return;
            }

            // Self-loops are degenerate edges, never cycle hops.
            if next == node {
                continue;
            }

            if next == self.root {
                if self.path.len() >= 2 {
                    self.found.push(self.path.clone());
                }
                continue;
            }

            if self.on_path.contains(&next) {
                continue;
            }
            // Nodes below the root belong to cycles rooted at themselves.
            if self.graph.account(next) < self.graph.account(self.root) {
                continue;
            }
            if self.path.len() >= self.max_len {
                continue;
            }

            self.path.push(next);
            self.on_path.insert(next);
            self.dfs(next);
            self.path.pop();
            self.on_path.remove(&next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Edge;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn flow_graph(pairs: &[(&str, &str)]) -> FlowGraph {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let edges = pairs
            .iter()
            .map(|(source, target)| Edge {
                source: source.to_string(),
                target: target.to_string(),
                total_amount: dec!(100),
                transfer_count: 1,
                earliest_timestamp: ts,
                latest_timestamp: ts,
            })
            .collect();
        FlowGraph::from_edges(edges)
    }

    fn detect(graph: &FlowGraph, config: &AnalysisConfig) -> CycleDetection {
        let components = graph.components();
        let mut detection = CycleDetection::default();
        for component in &components {
            let part = detect_cycles(graph, component, config);
            detection.cycles.extend(part.cycles);
            detection.truncated |= part.truncated;
        }
        detection
    }

    #[test]
    fn triangle_found_exactly_once() {
        let graph = flow_graph(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let detection = detect(&graph, &AnalysisConfig::default());

        assert!(!detection.truncated);
        assert_eq!(detection.cycles.len(), 1);
        assert_eq!(detection.cycles[0].path, vec!["A", "B", "C", "A"]);
        assert_eq!(detection.cycles[0].length(), 3);
        assert_eq!(detection.cycles[0].members(), ["A", "B", "C"]);
    }

    #[test]
    fn two_hop_cycle_found() {
        let graph = flow_graph(&[("A", "B"), ("B", "A")]);
        let detection = detect(&graph, &AnalysisConfig::default());

        assert_eq!(detection.cycles.len(), 1);
        assert_eq!(detection.cycles[0].path, vec!["A", "B", "A"]);
    }

    #[test]
    fn overlapping_cycles_both_reported() {
        // Two loops through A: A→B→C→A and A→D→F→A.
        let graph = flow_graph(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "A"),
            ("A", "D"),
            ("D", "F"),
            ("F", "A"),
        ]);
        let detection = detect(&graph, &AnalysisConfig::default());

        assert_eq!(detection.cycles.len(), 2);
        let paths: Vec<&[String]> = detection.cycles.iter().map(|c| &c.path[..]).collect();
        assert!(paths.iter().any(|p| *p == ["A", "B", "C", "A"]));
        assert!(paths.iter().any(|p| *p == ["A", "D", "F", "A"]));
    }

    #[test]
    fn hop_bound_excludes_longer_cycles() {
        let graph = flow_graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);

        let tight = AnalysisConfig {
            max_cycle_length: 3,
            ..AnalysisConfig::default()
        };
        assert!(detect(&graph, &tight).cycles.is_empty());

        let exact = AnalysisConfig {
            max_cycle_length: 4,
            ..AnalysisConfig::default()
        };
        assert_eq!(detect(&graph, &exact).cycles.len(), 1);
    }

    #[test]
    fn self_loop_is_not_a_cycle() {
        let graph = flow_graph(&[("A", "A"), ("A", "B"), ("B", "A")]);
        let detection = detect(&graph, &AnalysisConfig::default());

        assert_eq!(detection.cycles.len(), 1);
        assert_eq!(detection.cycles[0].path, vec!["A", "B", "A"]);
    }

    #[test]
    fn acyclic_chain_has_no_cycles() {
        let graph = flow_graph(&[("A", "B"), ("B", "C"), ("C", "D")]);
        assert!(detect(&graph, &AnalysisConfig::default()).cycles.is_empty());
    }

    #[test]
    fn ring_cap_truncates_and_flags() {
        // Three independent 2-cycles through A.
        let graph = flow_graph(&[
            ("A", "B"),
            ("B", "A"),
            ("A", "C"),
            ("C", "A"),
            ("A", "D"),
            ("D", "A"),
        ]);

        let capped = AnalysisConfig {
            max_rings: 2,
            ..AnalysisConfig::default()
        };
        let detection = detect(&graph, &capped);
        assert_eq!(detection.cycles.len(), 2);
        assert!(detection.truncated);
    }

    #[test]
    fn step_budget_truncates_and_flags() {
        let graph = flow_graph(&[("A", "B"), ("B", "C"), ("C", "A")]);

        let starved = AnalysisConfig {
            max_steps_per_root: 1,
            ..AnalysisConfig::default()
        };
        let detection = detect(&graph, &starved);
        assert!(detection.truncated);
    }
}
