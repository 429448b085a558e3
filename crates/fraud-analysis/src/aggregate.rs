//! Edge aggregation: collapsing transfers into per-pair summary edges.
//!
//! Every distinct ordered `(source, target)` pair becomes exactly one
//! [`Edge`] carrying the summed amount and the timestamp span of its
//! contributing transfers. Accumulation is hash-keyed and linear in the
//! number of transactions. Self-transfers are kept as degenerate edges;
//! the cycle detector skips them (see [`crate::cycles`]).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fraud_data::Transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One aggregated transfer corridor between two accounts.
///
/// Immutable after aggregation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Account the funds left.
    pub source: String,
    /// Account the funds arrived at.
    pub target: String,
    /// Sum of all transaction amounts between the pair.
    pub total_amount: Decimal,
    /// Number of transfers collapsed into this edge.
    pub transfer_count: usize,
    /// Timestamp of the earliest contributing transfer.
    pub earliest_timestamp: DateTime<Utc>,
    /// Timestamp of the latest contributing transfer.
    pub latest_timestamp: DateTime<Utc>,
}

impl Edge {
    /// True when source and target are the same account.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Collapse a transaction sequence into one edge per ordered pair.
///
/// Output is sorted by `(source, target)` so downstream consumers and
/// serialized reports are deterministic regardless of input order.
pub fn aggregate_edges(transactions: &[Transaction]) -> Vec<Edge> {
    let mut accumulators: HashMap<(&str, &str), Edge> = HashMap::new();

    for tx in transactions {
        accumulators
            .entry((tx.source.as_str(), tx.target.as_str()))
            .and_modify(|edge| {
                edge.total_amount += tx.amount;
                edge.transfer_count += 1;
                edge.earliest_timestamp = edge.earliest_timestamp.min(tx.timestamp);
                edge.latest_timestamp = edge.latest_timestamp.max(tx.timestamp);
            })
            .or_insert_with(|| Edge {
                source: tx.source.clone(),
                target: tx.target.clone(),
                total_amount: tx.amount,
                transfer_count: 1,
                earliest_timestamp: tx.timestamp,
                latest_timestamp: tx.timestamp,
            });
    }

    let mut edges: Vec<Edge> = accumulators.into_values().collect();
    edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
    edges
}
