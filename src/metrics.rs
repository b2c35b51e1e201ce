// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the nslabel operator.
//!
//! All metrics carry the namespace prefix `nslabel_io_` (prometheus-safe
//! version of "nslabel.io") and are exposed via the `/metrics` endpoint.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Track reconciliation operations and outcomes
//! - **Label Mutation Metrics** - Track label keys set and removed on namespaces
//! - **Admission Metrics** - Track webhook review decisions
//! - **Error Metrics** - Track error conditions by category

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all nslabel metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "nslabel_io";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the `/metrics`
/// endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by status
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of NamespaceLabel reconciliations by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of NamespaceLabel reconciliations in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Label Mutation Metrics
// ============================================================================

/// Total number of label keys mutated on namespaces
///
/// Labels:
/// - `action`: Mutation kind (`set`, `remove`)
pub static LABELS_MUTATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_labels_mutated_total"),
        "Total number of label keys set on or removed from namespaces",
    );
    let counter = CounterVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Admission Metrics
// ============================================================================

/// Total number of admission reviews processed by the webhook
///
/// Labels:
/// - `operation`: Admission operation (`CREATE`, `UPDATE`, other)
/// - `decision`: Verdict (`allow`, `deny`, `invalid`)
pub static ADMISSION_REVIEWS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_admission_reviews_total"),
        "Total number of admission reviews by operation and decision",
    );
    let counter = CounterVec::new(opts, &["operation", "decision"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by category
///
/// Labels:
/// - `error_type`: Category of error (`api_error`, `policy_violation`, `conflict_exhausted`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by category",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record label keys set on and removed from a namespace
pub fn record_labels_mutated(set: usize, removed: usize) {
    if set > 0 {
        LABELS_MUTATED_TOTAL
            .with_label_values(&["set"])
            .inc_by(set as f64);
    }
    if removed > 0 {
        LABELS_MUTATED_TOTAL
            .with_label_values(&["remove"])
            .inc_by(removed as f64);
    }
}

/// Record an admission review decision
///
/// # Arguments
/// * `operation` - The admission operation (e.g., `CREATE`)
/// * `decision` - The verdict (`allow`, `deny`, `invalid`)
pub fn record_admission_review(operation: &str, decision: &str) {
    ADMISSION_REVIEWS_TOTAL
        .with_label_values(&[operation, decision])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `error_type` - Category of error (e.g., `api_error`, `policy_violation`)
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
