//! Flow graph construction from aggregated edges.
//!
//! Builds a directed graph where nodes are account ids and each edge
//! weight indexes into the aggregated edge list. The node set is the
//! union of all accounts appearing as source or target; per-node
//! adjacency comes straight from petgraph. Cycle and velocity detection
//! operate directly on this structure.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::aggregate::Edge;

/// Directed account-to-account flow graph for one analysis call.
///
/// Owns the aggregated edge list; graph edge weights are indices into
/// [`FlowGraph::edges`].
pub struct FlowGraph {
    /// The underlying petgraph directed graph. Node weight = account id.
    pub graph: DiGraph<String, usize>,
    /// Lookup from account id to node index.
    pub account_to_ix: HashMap<String, NodeIndex>,
    /// Aggregated edges, in deterministic `(source, target)` order.
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    /// Build the flow graph from aggregated edges.
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        let mut graph = DiGraph::new();
        let mut account_to_ix: HashMap<String, NodeIndex> = HashMap::new();

        for (edge_index, edge) in edges.iter().enumerate() {
            let source_ix = *account_to_ix
                .entry(edge.source.clone())
                .or_insert_with(|| graph.add_node(edge.source.clone()));
            let target_ix = *account_to_ix
                .entry(edge.target.clone())
                .or_insert_with(|| graph.add_node(edge.target.clone()));

            graph.add_edge(source_ix, target_ix, edge_index);
        }

        Self {
            graph,
            account_to_ix,
            edges,
        }
    }

    /// Account id for a node index.
    pub fn account(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    /// Aggregated edge behind a graph edge weight.
    pub fn edge(&self, edge_index: usize) -> &Edge {
        &self.edges[edge_index]
    }

    /// Weakly-connected components, each a sorted list of node indices.
    ///
    /// Components are ordered by their smallest member account id, and
    /// nodes within a component are sorted by account id, so the
    /// partitioning handed to detection workers is deterministic.
    pub fn components(&self) -> Vec<Vec<NodeIndex>> {
        let mut sets = UnionFind::new(self.graph.node_count());
        for edge_ref in self.graph.edge_references() {
            sets.union(edge_ref.source().index(), edge_ref.target().index());
        }

        let labels = sets.into_labeling();
        let mut by_label: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
        for node in self.graph.node_indices() {
            by_label.entry(labels[node.index()]).or_default().push(node);
        }

        let mut components: Vec<Vec<NodeIndex>> = by_label.into_values().collect();
        for component in &mut components {
            component.sort_by(|a, b| self.account(*a).cmp(self.account(*b)));
        }
        components.sort_by(|a, b| self.account(a[0]).cmp(self.account(b[0])));
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn edge(source: &str, target: &str) -> Edge {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            total_amount: dec!(10),
            transfer_count: 1,
            earliest_timestamp: ts,
            latest_timestamp: ts,
        }
    }

    #[test]
    fn node_set_is_union_of_sources_and_targets() {
        let graph = FlowGraph::from_edges(vec![edge("A", "B"), edge("B", "C")]);
        assert_eq!(graph.graph.node_count(), 3);
        assert_eq!(graph.graph.edge_count(), 2);
        assert!(graph.account_to_ix.contains_key("C"));
    }

    #[test]
    fn components_split_disconnected_subgraphs() {
        let graph = FlowGraph::from_edges(vec![
            edge("A", "B"),
            edge("B", "A"),
            edge("X", "Y"),
            edge("Y", "Z"),
        ]);

        let components = graph.components();
        assert_eq!(components.len(), 2);
        // Ordered by smallest member account id: {A,B} first.
        assert_eq!(graph.account(components[0][0]), "A");
        assert_eq!(components[0].len(), 2);
        assert_eq!(components[1].len(), 3);
    }

    #[test]
    fn self_loop_forms_single_node_component() {
        let graph = FlowGraph::from_edges(vec![edge("A", "A")]);
        let components = graph.components();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 1);
    }

    #[test]
    fn empty_edges_empty_graph() {
        let graph = FlowGraph::from_edges(Vec::new());
        assert_eq!(graph.graph.node_count(), 0);
        assert!(graph.components().is_empty());
    }
}
