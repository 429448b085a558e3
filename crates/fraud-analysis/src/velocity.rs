//! Temporal velocity detection: rapid pass-through behavior.
//!
//! A mule account receives funds and forwards them onward within a short
//! window. For each account, every (incoming edge, outgoing edge) pair
//! with `0 ≤ t_out − t_in ≤ window` counts as one pass-through event,
//! where each edge's earliest timestamp stands in for its transfer time.
//! Evaluated independently of cycle membership; self-loop edges never
//! pair.

use std::collections::HashMap;

use chrono::Duration;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::aggregate::Edge;
use crate::graph::FlowGraph;

/// Count qualifying pass-through pairs per account within one component.
///
/// Only accounts with at least one event appear in the result.
pub fn detect_velocity(
    graph: &FlowGraph,
    component: &[NodeIndex],
    window: Duration,
) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();

    for &node in component {
        let incoming: Vec<&Edge> = directed_edges(graph, node, Direction::Incoming);
        if incoming.is_empty() {
            continue;
        }
        let outgoing: Vec<&Edge> = directed_edges(graph, node, Direction::Outgoing);
        if outgoing.is_empty() {
            continue;
        }

        let mut events = 0u32;
        for in_edge in &incoming {
            for out_edge in &outgoing {
                let delta = out_edge.earliest_timestamp - in_edge.earliest_timestamp;
                if delta >= Duration::zero() && delta <= window {
                    events += 1;
                }
            }
        }

        if events > 0 {
            counts.insert(graph.account(node).to_string(), events);
        }
    }

    counts
}

fn directed_edges(graph: &FlowGraph, node: NodeIndex, direction: Direction) -> Vec<&Edge> {
    graph
        .graph
        .edges_directed(node, direction)
        .map(|edge_ref| graph.edge(*edge_ref.weight()))
        .filter(|edge| !edge.is_self_loop())
        .collect()
}
