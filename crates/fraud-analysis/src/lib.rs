//! fraud-analysis crate
//!
//! The analysis engine: edge aggregation, flow-graph construction,
//! bounded cycle search, temporal velocity detection, weighted scoring,
//! and report assembly. Stateless between calls — every invocation owns
//! its graph and scratch state, torn down when the report is returned.
//!
//! ## Pipeline
//!
//! Parser → [`aggregate`] → [`graph`] → {[`cycles`], [`velocity`]} →
//! [`score`] → [`report`]. Cycle and velocity detection fan out across
//! weakly-connected components; each worker owns its accumulator and
//! results are merged by union after join, so the parallel phase shares
//! no mutable state.

pub mod aggregate;
pub mod cycles;
pub mod graph;
pub mod report;
pub mod score;
pub mod velocity;

use std::collections::HashMap;
use std::io::Read;
use std::thread;

use chrono::Duration;
use eyre::{eyre, Result};
use fraud_data::ledger::parse_ledger;
use fraud_data::sample::SAMPLE_LEDGER;
use fraud_data::Transaction;
use tracing::info;

use crate::cycles::Cycle;
use crate::graph::FlowGraph;

pub use crate::aggregate::{aggregate_edges, Edge};
pub use crate::report::{AnalysisReport, FraudRing, SuspiciousAccount};
pub use crate::score::{PatternCount, PatternKind, ScoreWeights};

/// Graphs below this node count are analyzed on the calling thread.
const PARALLEL_NODE_THRESHOLD: usize = 128;

/// Tunables for one analysis call.
///
/// Every bound the engine applies is explicit configuration here, not a
/// hidden constant. Defaults follow the documented engine contract: the
/// hop cap keeps cycle enumeration tractable, and the 72-hour window
/// matches the range the presentation layer exposes.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Maximum cycle hop count searched for fraud rings.
    pub max_cycle_length: usize,
    /// Pass-through window for temporal velocity detection.
    pub velocity_window: Duration,
    /// Cap on reported rings; exceeding it marks the report partial.
    pub max_rings: usize,
    /// DFS step budget per cycle-search root; exceeding it truncates
    /// that root's search and marks the report partial.
    pub max_steps_per_root: usize,
    /// Scoring weight table.
    pub weights: ScoreWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_cycle_length: 6,
            velocity_window: Duration::hours(72),
            max_rings: 256,
            max_steps_per_root: 100_000,
            weights: ScoreWeights::default(),
        }
    }
}

/// Accumulated findings for one worker's slice of components.
#[derive(Default)]
struct PartitionFindings {
    cycles: Vec<Cycle>,
    velocity: HashMap<String, u32>,
    truncated: bool,
}

impl PartitionFindings {
    fn absorb_component(
        &mut self,
        graph: &FlowGraph,
        component: &[petgraph::graph::NodeIndex],
        config: &AnalysisConfig,
    ) {
        let detection = cycles::detect_cycles(graph, component, config);
        self.cycles.extend(detection.cycles);
        self.truncated |= detection.truncated;
        self.velocity
            .extend(velocity::detect_velocity(graph, component, config.velocity_window));
    }

    fn merge(&mut self, other: PartitionFindings) {
        self.cycles.extend(other.cycles);
        self.velocity.extend(other.velocity);
        self.truncated |= other.truncated;
    }
}

/// Analyze a batch of parsed transactions.
///
/// # Errors
/// Fails only on internal invariant violations (programming defects);
/// an empty input is a success with an empty report.
#[tracing::instrument(skip_all, fields(transactions = transactions.len()))]
pub fn analyze_transactions(
    transactions: &[Transaction],
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    if transactions.is_empty() {
        return Ok(AnalysisReport::empty());
    }

    let edges = aggregate_edges(transactions);
    let flow_graph = FlowGraph::from_edges(edges);
    let findings = detect_patterns(&flow_graph, config)?;

    let mut cycles = findings.cycles;
    cycles.sort_by(|a, b| a.path.cmp(&b.path));
    let mut partial = findings.truncated;
    if cycles.len() > config.max_rings {
        cycles.truncate(config.max_rings);
        partial = true;
    }

    let FlowGraph { edges, .. } = flow_graph;
    let report = report::assemble(edges, cycles, findings.velocity, &config.weights, partial, 0)?;

    info!(
        suspicious_accounts = report.suspicious_accounts.len(),
        fraud_rings = report.fraud_rings.len(),
        edges = report.edges.len(),
        partial = report.partial,
        "analysis completed"
    );

    Ok(report)
}

/// Parse a ledger and analyze it, carrying the skipped-row count into
/// the report.
///
/// # Errors
/// Returns error when the reader itself fails or an internal invariant
/// is violated. Row-level defects never propagate; an empty or
/// fully-malformed ledger yields an empty report.
pub fn analyze_ledger<R: Read>(reader: R, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let parsed = parse_ledger(reader)?;
    let mut report = analyze_transactions(&parsed.transactions, config)?;
    report.skipped_rows = parsed.skipped_rows;
    Ok(report)
}

/// Analyze the built-in sample ledger.
///
/// Returns the identical report shape as [`analyze_ledger`].
pub fn analyze_sample(config: &AnalysisConfig) -> Result<AnalysisReport> {
    analyze_ledger(SAMPLE_LEDGER.as_bytes(), config)
}

/// Run cycle and velocity detection across graph partitions.
///
/// Components are independent, so they are distributed over scoped
/// worker threads; each worker owns a [`PartitionFindings`] accumulator
/// and the merge happens after every join. Small graphs stay on the
/// calling thread.
fn detect_patterns(graph: &FlowGraph, config: &AnalysisConfig) -> Result<PartitionFindings> {
    let components = graph.components();
    if components.is_empty() {
        return Ok(PartitionFindings::default());
    }

    let workers = worker_count(graph, components.len());
    if workers <= 1 {
        let mut findings = PartitionFindings::default();
        for component in &components {
            findings.absorb_component(graph, component, config);
        }
        return Ok(findings);
    }

    let chunk_size = components.len().div_ceil(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = components
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut local = PartitionFindings::default();
                    for component in chunk {
                        local.absorb_component(graph, component, config);
                    }
                    local
                })
            })
            .collect();

        let mut findings = PartitionFindings::default();
        for handle in handles {
            let local = handle
                .join()
                .map_err(|_| eyre!("internal error: detection worker panicked"))?;
            findings.merge(local);
        }
        Ok(findings)
    })
}

fn worker_count(graph: &FlowGraph, component_count: usize) -> usize {
    if graph.graph.node_count() < PARALLEL_NODE_THRESHOLD {
        return 1;
    }
    thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(1)
        .min(component_count)
}
