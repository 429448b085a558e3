//! Type definitions for ledger data structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single money transfer parsed from one ledger row.
///
/// Immutable once created; the parser guarantees `amount > 0` and a
/// well-formed timestamp. Rows that cannot meet these guarantees are
/// skipped at ingestion and never become a `Transaction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Account the funds left.
    pub source: String,
    /// Account the funds arrived at.
    pub target: String,
    /// Transferred amount. Always strictly positive.
    pub amount: Decimal,
    /// When the transfer happened.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// True when source and target are the same account.
    ///
    /// Self-transfers are kept in the edge list as degenerate edges but
    /// are never part of a cycle or pass-through pair.
    pub fn is_self_transfer(&self) -> bool {
        self.source == self.target
    }
}
