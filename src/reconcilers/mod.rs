// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for `NamespaceLabel` resources.
//!
//! This module contains the control loop that drives namespaces toward the
//! label state their `NamespaceLabel` declarations describe.
//!
//! # Reconciliation Architecture
//!
//! The controller follows the standard Kubernetes pattern:
//!
//! 1. **Watch** - Monitor `NamespaceLabel` changes via the Kubernetes API
//! 2. **Reconcile** - Compare the declared label mapping with the namespace's
//!    current labels and the per-key ownership record
//! 3. **Update** - Patch only the owned delta onto the namespace
//! 4. **Status** - Record the applied key set and a Ready condition
//!
//! # Submodules
//!
//! - [`namespacelabel`] - The reconciler itself: policy backstop, label
//!   delta computation and conflict-safe application, deletion cleanup
//! - [`finalizers`] - Generic finalizer add/remove/handle-deletion helpers
//! - [`retry`] - Exponential backoff and API error classification
//! - [`status`] - Condition helpers and status subresource persistence

pub mod finalizers;
pub mod namespacelabel;
pub mod retry;
pub mod status;

#[cfg(test)]
mod finalizers_tests;
#[cfg(test)]
mod retry_tests;
#[cfg(test)]
mod status_tests;

pub use namespacelabel::{compute_label_delta, reconcile_namespacelabel, LabelDelta};

/// Check if a resource's spec has changed by comparing generation with `observed_generation`.
///
/// `metadata.generation` is incremented by the API server only when the spec
/// changes; `status.observed_generation` is set by the controller after
/// processing a spec. When they match, the last reconciliation already covered
/// this spec and status-only updates can be skipped.
#[must_use]
pub fn should_reconcile(current_generation: Option<i64>, observed_generation: Option<i64>) -> bool {
    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        (Some(_), None) => true, // First reconciliation
        _ => false,              // No generation tracking available
    }
}

#[cfg(test)]
mod mod_tests {
    use super::should_reconcile;

    #[test]
    fn test_should_reconcile_on_first_pass() {
        assert!(should_reconcile(Some(1), None));
    }

    #[test]
    fn test_should_reconcile_on_spec_change() {
        assert!(should_reconcile(Some(2), Some(1)));
    }

    #[test]
    fn test_skip_when_generation_observed() {
        assert!(!should_reconcile(Some(3), Some(3)));
    }

    #[test]
    fn test_skip_without_generation_tracking() {
        assert!(!should_reconcile(None, None));
        assert!(!should_reconcile(None, Some(1)));
    }
}
