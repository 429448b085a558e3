//! Integration tests for ledger ingestion feeding the engine.

mod common;

use common::csv_ledger;
use fraud_analysis::{analyze_ledger, analyze_sample, AnalysisConfig};
use fraud_data::sample::SAMPLE_LEDGER;

/// Malformed rows are absorbed at the row level: the valid remainder is
/// analyzed and the skipped count is carried into the report.
#[test]
fn skipped_rows_counted_and_carried_into_report() {
    let ledger = "\
source,target,amount,timestamp
A,B,100,2024-03-01T08:00:00Z
,B,100,2024-03-01T08:00:00Z
A,B,abc,2024-03-01T08:00:00Z
A,B,100,not-a-time
B,A,100,2024-03-01T09:00:00Z
";

    let report =
        analyze_ledger(ledger.as_bytes(), &AnalysisConfig::default()).expect("analyze");

    assert_eq!(report.skipped_rows, 3);
    // The surviving A→B→A rows still form a ring.
    assert_eq!(report.fraud_rings.len(), 1);
}

/// Column order and header case never change the result.
#[test]
fn header_order_and_case_do_not_change_the_report() {
    let canonical = csv_ledger(&[("A", "B", "100", 0), ("B", "A", "100", 10)]);

    let shuffled = "\
AMOUNT,Target,timestamp,SOURCE
100,B,2024-03-01T00:00:00+00:00,A
100,A,2024-03-01T10:00:00+00:00,B
";

    let config = AnalysisConfig::default();
    let first = analyze_ledger(canonical.as_bytes(), &config).expect("canonical");
    let second = analyze_ledger(shuffled.as_bytes(), &config).expect("shuffled");

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

/// A ledger whose header has none of the required columns yields an
/// empty report with every row counted as skipped.
#[test]
fn unusable_header_yields_empty_report() {
    let ledger = "\
alpha,beta
1,2
3,4
";

    let report =
        analyze_ledger(ledger.as_bytes(), &AnalysisConfig::default()).expect("analyze");

    assert!(report.suspicious_accounts.is_empty());
    assert!(report.fraud_rings.is_empty());
    assert_eq!(report.skipped_rows, 2);
}

/// The sample invocation mode is exactly the ledger mode run over the
/// built-in dataset.
#[test]
fn sample_mode_matches_ledger_mode() {
    let config = AnalysisConfig::default();

    let from_sample = analyze_sample(&config).expect("sample mode");
    let from_ledger =
        analyze_ledger(SAMPLE_LEDGER.as_bytes(), &config).expect("ledger mode");

    assert_eq!(
        serde_json::to_string(&from_sample).unwrap(),
        serde_json::to_string(&from_ledger).unwrap()
    );
    assert_eq!(from_sample.fraud_rings.len(), 2);
}
