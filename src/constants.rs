// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Global constants for the nslabel operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `NamespaceLabel` CRD
pub const API_GROUP: &str = "nslabel.io";

/// API version for the `NamespaceLabel` CRD
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "nslabel.io/v1alpha1";

/// Kind name for the `NamespaceLabel` resource
pub const KIND_NAMESPACE_LABEL: &str = "NamespaceLabel";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration after a successful reconciliation (5 minutes)
pub const RESYNC_REQUEUE_DURATION_SECS: u64 = 300;

// ============================================================================
// Label Apply Constants
// ============================================================================

/// Maximum attempts for the optimistic-concurrency label apply loop.
///
/// Each attempt re-reads the namespace, recomputes the delta, and issues a
/// resourceVersion-guarded patch. Conflicts (HTTP 409) consume an attempt.
pub const LABEL_APPLY_MAX_ATTEMPTS: u32 = 10;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// HTTP Server Constants
// ============================================================================

/// Port for the admission webhook HTTP server (TLS terminated upstream)
pub const WEBHOOK_SERVER_PORT: u16 = 9443;

/// Path for the `NamespaceLabel` validating webhook endpoint
pub const WEBHOOK_VALIDATE_PATH: &str = "/validate-namespacelabel";

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for both HTTP servers
pub const HTTP_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
