//! Prometheus metrics for commission-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Report/statement requests by kind and status.
pub static REPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commission_reports_total",
        "Total number of reports generated",
        &["kind", "status"] // kind: commissions, statement
    )
    .expect("Failed to register reports_total")
});

/// Report generation duration by kind.
pub static REPORT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "commission_report_duration_seconds",
        "Report generation duration in seconds",
        &["kind"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register report_duration")
});

/// Ledger appends by outcome.
pub static APPENDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commission_appends_total",
        "Total number of ledger append attempts",
        &["outcome"] // appended, duplicate, conflict, error
    )
    .expect("Failed to register appends_total")
});

/// Coupon/order references that no longer resolve.
pub static MISSING_REFERENCES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "commission_missing_references_total",
        "References absorbed as zero contribution",
        &["kind"]
    )
    .expect("Failed to register missing_references")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "commission_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&REPORTS_TOTAL);
    Lazy::force(&REPORT_DURATION);
    Lazy::force(&APPENDS_TOTAL);
    Lazy::force(&MISSING_REFERENCES);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
