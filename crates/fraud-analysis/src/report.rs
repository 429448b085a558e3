//! Result assembly: scored accounts + rings + edges into the final report.
//!
//! Ring ids are assigned in deterministic order (`RING_001`, `RING_002`,
//! …), accounts are sorted by score then id, and all collections are
//! sorted before serialization, so analyzing the same ledger twice
//! produces byte-identical reports. The assembler also verifies the
//! engine's structural invariants; a violation aborts the single call
//! with an internal error rather than emitting a corrupt report.

use std::collections::{BTreeMap, HashMap};

use eyre::{bail, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::Edge;
use crate::cycles::Cycle;
use crate::score::{PatternCount, PatternKind, ScoreWeights, MAX_SCORE};

/// Extra ring risk for every member that belongs to more than one cycle.
const MULTI_CYCLE_BONUS: f64 = 25.0;

/// One account with at least one detected pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    /// Account identifier from the ledger.
    pub account_id: String,
    /// Weighted suspicion score in [0, 100].
    pub suspicion_score: u8,
    /// Detected patterns with counts, in stable kind order.
    pub detected_patterns: Vec<PatternCount>,
    /// First ring this account was assigned to, if any.
    pub ring_id: Option<String>,
}

/// A detected laundering ring: one directed cycle of transfers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    /// Sequential ring identifier, `RING_001` onwards.
    pub ring_id: String,
    /// Ordered cycle path; first account equals the last.
    pub path: Vec<String>,
    /// Member accounts, sorted.
    pub member_accounts: Vec<String>,
    /// Hop count of the cycle.
    pub cycle_length: usize,
    /// Sum of aggregated edge amounts along the cycle.
    pub total_flow: Decimal,
    /// Ring-level risk: mean member score plus multi-cycle bonus, capped
    /// at 100, one decimal.
    pub risk_score: f64,
}

/// The complete, immutable analysis output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Accounts with any nonzero pattern count, highest score first.
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Detected rings in id order.
    pub fraud_rings: Vec<FraudRing>,
    /// Aggregated edge list for graph reconstruction downstream.
    pub edges: Vec<Edge>,
    /// True when a search limit truncated detection.
    pub partial: bool,
    /// Ledger rows dropped during parsing.
    pub skipped_rows: usize,
}

impl AnalysisReport {
    /// An empty, valid report ("no data" — distinguishable from "no
    /// fraud found" only by the caller inspecting the inputs).
    pub fn empty() -> Self {
        Self {
            suspicious_accounts: Vec::new(),
            fraud_rings: Vec::new(),
            edges: Vec::new(),
            partial: false,
            skipped_rows: 0,
        }
    }
}

/// Merge detector outputs into the final report.
///
/// `cycles` may arrive in any order; they are canonicalized here so ring
/// ids are deterministic.
///
/// # Errors
/// Returns an internal error when a structural invariant is violated
/// (a cycle hop without a backing edge, a non-positive edge total). The
/// failure aborts this call only; no state survives into later calls.
pub fn assemble(
    edges: Vec<Edge>,
    mut cycles: Vec<Cycle>,
    velocity_counts: HashMap<String, u32>,
    weights: &ScoreWeights,
    partial: bool,
    skipped_rows: usize,
) -> Result<AnalysisReport> {
    cycles.sort_by(|a, b| a.path.cmp(&b.path));

    let edge_lookup: HashMap<(&str, &str), &Edge> = edges
        .iter()
        .map(|edge| ((edge.source.as_str(), edge.target.as_str()), edge))
        .collect();

    // Per-account membership count across all kept cycles.
    let mut cycle_counts: BTreeMap<&str, u32> = BTreeMap::new();
    for cycle in &cycles {
        for member in cycle.members() {
            *cycle_counts.entry(member).or_default() += 1;
        }
    }

    // First-assigned ring id per account, in ring-id order.
    let mut first_ring: HashMap<&str, String> = HashMap::new();
    let mut rings: Vec<FraudRing> = Vec::with_capacity(cycles.len());
    for (index, cycle) in cycles.iter().enumerate() {
        let ring_id = format!("RING_{:03}", index + 1);

        let mut total_flow = Decimal::ZERO;
        for hop in cycle.path.windows(2) {
            match edge_lookup.get(&(hop[0].as_str(), hop[1].as_str())) {
                Some(edge) => total_flow += edge.total_amount,
                None => bail!(
                    "internal error: cycle hop {} -> {} has no aggregated edge",
                    hop[0],
                    hop[1]
                ),
            }
        }

        for member in cycle.members() {
            first_ring
                .entry(member.as_str())
                .or_insert_with(|| ring_id.clone());
        }

        let mut member_accounts: Vec<String> = cycle.members().to_vec();
        member_accounts.sort();

        rings.push(FraudRing {
            ring_id,
            path: cycle.path.clone(),
            member_accounts,
            cycle_length: cycle.length(),
            total_flow,
            risk_score: 0.0,
        });
    }

    // Patterns per account: cycle participation first, velocity second.
    let mut patterns_by_account: BTreeMap<String, Vec<PatternCount>> = BTreeMap::new();
    for (account, count) in &cycle_counts {
        patterns_by_account
            .entry((*account).to_string())
            .or_default()
            .push(PatternCount {
                kind: PatternKind::CycleParticipation,
                count: *count,
            });
    }
    for (account, count) in &velocity_counts {
        patterns_by_account
            .entry(account.clone())
            .or_default()
            .push(PatternCount {
                kind: PatternKind::TemporalVelocity,
                count: *count,
            });
    }
    for patterns in patterns_by_account.values_mut() {
        patterns.sort_by_key(|pattern| pattern.kind);
    }

    let mut suspicious_accounts: Vec<SuspiciousAccount> = patterns_by_account
        .into_iter()
        .map(|(account_id, detected_patterns)| {
            let suspicion_score = weights.score(&detected_patterns);
            let ring_id = first_ring.get(account_id.as_str()).cloned();
            SuspiciousAccount {
                account_id,
                suspicion_score,
                detected_patterns,
                ring_id,
            }
        })
        .collect();
    suspicious_accounts.sort_by(|a, b| {
        b.suspicion_score
            .cmp(&a.suspicion_score)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    let scores: HashMap<&str, u8> = suspicious_accounts
        .iter()
        .map(|account| (account.account_id.as_str(), account.suspicion_score))
        .collect();
    for ring in &mut rings {
        ring.risk_score = ring_risk_score(&ring.member_accounts, &scores, &cycle_counts);
    }

    verify_invariants(&rings, &scores, &cycle_counts, &edges)?;

    debug!(
        accounts = suspicious_accounts.len(),
        rings = rings.len(),
        edges = edges.len(),
        partial,
        "report assembled"
    );

    Ok(AnalysisReport {
        suspicious_accounts,
        fraud_rings: rings,
        edges,
        partial,
        skipped_rows,
    })
}

/// Mean member suspicion score plus a bonus per multi-cycle member,
/// capped at 100 and rounded to one decimal.
fn ring_risk_score(
    members: &[String],
    scores: &HashMap<&str, u8>,
    cycle_counts: &BTreeMap<&str, u32>,
) -> f64 {
    if members.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut bonus = 0.0;
    for member in members {
        total += f64::from(scores.get(member.as_str()).copied().unwrap_or(0));
        if cycle_counts.get(member.as_str()).copied().unwrap_or(0) > 1 {
            bonus += MULTI_CYCLE_BONUS;
        }
    }

    let raw = (total / members.len() as f64 + bonus).min(f64::from(MAX_SCORE));
    (raw * 10.0).round() / 10.0
}

/// Structural invariants (defect class): violations abort the call.
fn verify_invariants(
    rings: &[FraudRing],
    scores: &HashMap<&str, u8>,
    cycle_counts: &BTreeMap<&str, u32>,
    edges: &[Edge],
) -> Result<()> {
    for ring in rings {
        for member in &ring.member_accounts {
            if cycle_counts.get(member.as_str()).copied().unwrap_or(0) == 0 {
                bail!(
                    "internal error: ring {} member {} has no cycle participation",
                    ring.ring_id,
                    member
                );
            }
            if !scores.contains_key(member.as_str()) {
                bail!(
                    "internal error: ring {} member {} missing from suspicious accounts",
                    ring.ring_id,
                    member
                );
            }
        }
    }

    for edge in edges {
        if edge.total_amount <= Decimal::ZERO {
            bail!(
                "internal error: edge {} -> {} has non-positive total amount",
                edge.source,
                edge.target
            );
        }
    }

    Ok(())
}
