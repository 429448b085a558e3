//! Tolerant CSV ledger ingestion.
//!
//! End users upload arbitrary CSV exports, so the parser is deliberately
//! forgiving: columns are resolved by header name (not position, not
//! case), several timestamp formats are accepted, and malformed rows are
//! skipped and counted rather than failing the whole call. A ledger with
//! no usable header or no valid rows parses to an empty [`ParsedLedger`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use eyre::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::types::Transaction;

/// Accepted header names for the source-account column.
const SOURCE_ALIASES: &[&str] = &["source", "source_account", "from", "from_account", "sender"];

/// Accepted header names for the target-account column.
const TARGET_ALIASES: &[&str] = &[
    "target",
    "target_account",
    "destination",
    "destination_account",
    "to",
    "to_account",
    "receiver",
];

/// Accepted header names for the amount column.
const AMOUNT_ALIASES: &[&str] = &["amount", "value", "sum"];

/// Accepted header names for the timestamp column.
const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "time", "datetime", "date"];

/// Outcome of parsing one ledger.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLedger {
    /// Rows that parsed into well-formed transactions, in file order.
    pub transactions: Vec<Transaction>,
    /// Rows dropped for missing ids, bad amounts, or bad timestamps.
    pub skipped_rows: usize,
    /// Total data rows seen (header excluded).
    pub total_rows: usize,
}

/// Column indices resolved from the header row.
struct ColumnMap {
    source: usize,
    target: usize,
    amount: usize,
    timestamp: usize,
}

/// Parse a delimited ledger from any reader.
///
/// One record per transfer with four required fields resolved by header
/// name: source account, target account, amount, timestamp. Malformed
/// rows are skipped and counted; they never fail the call.
///
/// # Errors
/// Returns error only when the underlying reader fails mid-stream. An
/// empty or fully-malformed ledger is a success with zero transactions.
pub fn parse_ledger<R: Read>(reader: R) -> Result<ParsedLedger> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = match csv_reader.headers() {
        Ok(headers) => headers.clone(),
        Err(error) => {
            warn!(%error, "ledger header row unreadable, returning empty ledger");
            return Ok(ParsedLedger::default());
        }
    };

    let columns = match resolve_columns(&headers) {
        Some(columns) => columns,
        None => {
            warn!(
                header = ?headers,
                "ledger header missing required columns, returning empty ledger"
            );
            let mut parsed = ParsedLedger::default();
            for record in csv_reader.records() {
                let _ = record.wrap_err("failed to read ledger record")?;
                parsed.total_rows += 1;
                parsed.skipped_rows += 1;
            }
            return Ok(parsed);
        }
    };

    let mut parsed = ParsedLedger::default();
    for record in csv_reader.records() {
        let record = record.wrap_err("failed to read ledger record")?;
        parsed.total_rows += 1;

        match parse_row(&record, &columns) {
            Some(transaction) => parsed.transactions.push(transaction),
            None => {
                debug!(row = parsed.total_rows, "skipping malformed ledger row");
                parsed.skipped_rows += 1;
            }
        }
    }

    debug!(
        rows = parsed.total_rows,
        transactions = parsed.transactions.len(),
        skipped = parsed.skipped_rows,
        "ledger parse completed"
    );

    Ok(parsed)
}

/// Parse a ledger from a file path.
///
/// # Errors
/// Returns error if the file cannot be opened or read. Row-level defects
/// are absorbed per [`parse_ledger`].
pub fn parse_ledger_file<P: AsRef<Path>>(path: P) -> Result<ParsedLedger> {
    let path = path.as_ref();
    let file =
        File::open(path).wrap_err_with(|| format!("failed to open ledger {}", path.display()))?;
    parse_ledger(file)
}

/// Resolve the four required columns by header name, case-insensitively.
fn resolve_columns(headers: &csv::StringRecord) -> Option<ColumnMap> {
    Some(ColumnMap {
        source: find_column(headers, SOURCE_ALIASES)?,
        target: find_column(headers, TARGET_ALIASES)?,
        amount: find_column(headers, AMOUNT_ALIASES)?,
        timestamp: find_column(headers, TIMESTAMP_ALIASES)?,
    })
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| aliases.contains(&header.trim().to_ascii_lowercase().as_str()))
}

/// Parse one record into a [`Transaction`], or `None` for a skip decision.
fn parse_row(record: &csv::StringRecord, columns: &ColumnMap) -> Option<Transaction> {
    let source = record.get(columns.source)?.trim();
    let target = record.get(columns.target)?.trim();
    if source.is_empty() || target.is_empty() {
        return None;
    }

    let amount = record.get(columns.amount)?.trim().parse::<Decimal>().ok()?;
    if amount <= Decimal::ZERO {
        return None;
    }

    let timestamp = parse_timestamp(record.get(columns.timestamp)?.trim())?;

    Some(Transaction {
        source: source.to_string(),
        target: target.to_string(),
        amount,
        timestamp,
    })
}

/// Parse a timestamp in any of the accepted formats.
///
/// Tried in order: RFC 3339, `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`,
/// bare date (midnight UTC), unix epoch seconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(parsed.and_hms_opt(0, 0, 0)?.and_utc());
    }

    if let Ok(epoch_s) = raw.parse::<i64>() {
        return DateTime::from_timestamp(epoch_s, 0);
    }

    None
}
