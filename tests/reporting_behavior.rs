//! Behavior tests for report exports over a populated store.

use std::fs;
use std::sync::Arc;

use equindex_index::{IndexConfig, IndexEngine};
use equindex_report::{ReportError, ReportFormat, StatsExporter};
use equindex_tests::{date, known_market_data, open_store, three_ticker_universe, DAY_ONE, DAY_TWO};
use tempfile::tempdir;

async fn populated_store(dir: &std::path::Path) -> equindex_store::PriceStore {
    let store = open_store(dir);
    let engine = IndexEngine::new(
        store.clone(),
        Arc::new(known_market_data()),
        three_ticker_universe(),
        IndexConfig {
            top_n: 3,
            base_value: 10_000.0,
        },
    );
    engine
        .compute_range(date(DAY_ONE), date(DAY_TWO), true)
        .await
        .expect("compute");
    store
}

#[tokio::test]
async fn when_user_exports_performance_to_excel_a_file_appears() {
    let temp = tempdir().expect("tempdir");
    let store = populated_store(temp.path()).await;
    let exporter = StatsExporter::new(store);

    let path = exporter
        .dump_performance(ReportFormat::Excel, "index_performance")
        .expect("export");

    assert_eq!(path, temp.path().join("stats").join("index_performance.xlsx"));
    assert!(fs::metadata(&path).expect("metadata").len() > 0);
}

#[tokio::test]
async fn when_user_exports_composition_to_pdf_a_file_appears() {
    let temp = tempdir().expect("tempdir");
    let store = populated_store(temp.path()).await;
    let exporter = StatsExporter::new(store);

    let path = exporter
        .dump_composition(DAY_TWO, ReportFormat::Pdf, "index_composition")
        .expect("export");

    assert_eq!(path, temp.path().join("stats").join("index_composition.pdf"));
    assert!(fs::metadata(&path).expect("metadata").len() > 0);
}

#[tokio::test]
async fn when_user_requests_an_unknown_format_nothing_is_written() {
    let temp = tempdir().expect("tempdir");
    let _store = populated_store(temp.path()).await;

    // The format is rejected before any exporter call can be made.
    let error = ReportFormat::parse("csv").expect_err("must fail");
    assert!(matches!(error, ReportError::FormatUnsupported { .. }));
    assert!(!temp.path().join("stats").exists());
}

#[tokio::test]
async fn when_store_is_empty_export_fails_and_writes_nothing() {
    let temp = tempdir().expect("tempdir");
    let store = open_store(temp.path());
    let exporter = StatsExporter::new(store);

    let error = exporter
        .dump_performance(ReportFormat::Pdf, "index_performance")
        .expect_err("must fail");
    assert!(matches!(error, ReportError::Empty { .. }));
    assert!(!temp.path().join("stats").join("index_performance.pdf").exists());
}

#[tokio::test]
async fn composition_weights_in_report_sum_to_one_hundred_percent() {
    let temp = tempdir().expect("tempdir");
    let store = populated_store(temp.path()).await;

    let weights = store.composition_weights(DAY_TWO).expect("weights");
    assert_eq!(weights.len(), 3);
    let total: f64 = weights.iter().map(|w| w.weight_pct).sum();
    // Stored weights are rounded to two decimals, so allow a small drift.
    assert!((total - 100.0).abs() < 0.05, "weights sum to {total}");
}
