//! Shared test helpers and utilities.
//!
//! Provides factory functions for building ledgers and transactions
//! with sensible defaults, anchored to a fixed base time so reports are
//! reproducible.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fraud_data::Transaction;
use rust_decimal::Decimal;

/// Fixed anchor for all test timestamps: 2024-03-01T00:00:00Z.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// Creates a sample Transaction at `base_time() + hour_offset`.
///
/// # Example
/// ```ignore
/// let tx = sample_tx("A", "B", 100, 6);
/// assert_eq!(tx.source, "A");
/// ```
pub fn sample_tx(source: &str, target: &str, amount: u64, hour_offset: i64) -> Transaction {
    Transaction {
        source: source.to_string(),
        target: target.to_string(),
        amount: Decimal::from(amount),
        timestamp: base_time() + Duration::hours(hour_offset),
    }
}

/// The canonical laundering triangle: A→B (t=0), B→C (t=10h),
/// C→A (t=20h), all amount 100.
pub fn triangle_ledger() -> Vec<Transaction> {
    vec![
        sample_tx("A", "B", 100, 0),
        sample_tx("B", "C", 100, 10),
        sample_tx("C", "A", 100, 20),
    ]
}

/// Builds a CSV ledger from `(source, target, amount, hour_offset)`
/// rows, with the standard header.
pub fn csv_ledger(rows: &[(&str, &str, &str, i64)]) -> String {
    let mut out = String::from("source,target,amount,timestamp\n");
    for (source, target, amount, hour_offset) in rows {
        let timestamp = (base_time() + Duration::hours(*hour_offset)).to_rfc3339();
        out.push_str(&format!("{source},{target},{amount},{timestamp}\n"));
    }
    out
}
