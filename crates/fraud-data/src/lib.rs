//! fraud-data crate
//!
//! Ledger types, tolerant CSV ingestion, and the built-in sample ledger.

pub mod ledger;
pub mod sample;
pub mod types;

pub use ledger::{parse_ledger, parse_ledger_file, ParsedLedger};
pub use types::Transaction;
