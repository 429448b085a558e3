//! Benchmarks for the fraud-analysis engine.
//!
//! Uses deterministic synthetic ledgers (no I/O) for reproducible
//! performance testing. Run with: `cargo bench --package fraud-analysis`

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fraud_analysis::{aggregate_edges, analyze_transactions, AnalysisConfig};
use fraud_data::Transaction;
use rust_decimal::Decimal;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn sample_tx(source: String, target: String, amount: u64, hour_offset: i64) -> Transaction {
    Transaction {
        source,
        target,
        amount: Decimal::from(amount),
        timestamp: base_time() + Duration::hours(hour_offset),
    }
}

/// Synthetic ledger: `rings` disjoint laundering triangles plus a long
/// benign payment chain, deterministic for a given argument pair.
fn synthetic_ledger(rings: usize, chain_len: usize) -> Vec<Transaction> {
    let mut txs = Vec::with_capacity(rings * 3 + chain_len);

    for ring in 0..rings {
        let a = format!("RING{ring:03}_A");
        let b = format!("RING{ring:03}_B");
        let c = format!("RING{ring:03}_C");
        txs.push(sample_tx(a.clone(), b.clone(), 1000 + ring as u64, 0));
        txs.push(sample_tx(b, c.clone(), 990 + ring as u64, 12));
        txs.push(sample_tx(c, a, 980 + ring as u64, 24));
    }

    for hop in 0..chain_len {
        let source = format!("CHAIN_{hop:04}");
        let target = format!("CHAIN_{:04}", hop + 1);
        txs.push(sample_tx(source, target, 50 + (hop % 7) as u64, hop as i64));
    }

    txs
}

fn bench_edge_aggregation(c: &mut Criterion) {
    let txs = synthetic_ledger(100, 1000);

    c.bench_function("aggregate_edges_1300_txs", |b| {
        b.iter(|| aggregate_edges(black_box(&txs)))
    });
}

fn bench_full_analysis(c: &mut Criterion) {
    let config = AnalysisConfig::default();
    let small = synthetic_ledger(10, 100);
    let large = synthetic_ledger(200, 2000);

    c.bench_function("analyze_small_ledger", |b| {
        b.iter(|| analyze_transactions(black_box(&small), black_box(&config)))
    });

    c.bench_function("analyze_large_ledger", |b| {
        b.iter(|| analyze_transactions(black_box(&large), black_box(&config)))
    });
}

criterion_group!(benches, bench_edge_aggregation, bench_full_analysis);
criterion_main!(benches);
