// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Label constants and the protected-label policy.
//!
//! This module defines the controller's finalizer and the shared predicate
//! deciding whether a label key is protected. The reconciler and the
//! admission webhook must agree on this predicate, so both call into
//! [`find_protected_key`].

use std::collections::BTreeMap;

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer for `NamespaceLabel` resources
pub const FINALIZER_NAMESPACE_LABEL: &str = "nslabel.io/namespacelabel-finalizer";

// ============================================================================
// Protected Prefixes
// ============================================================================

/// Label key domains that declarations may never set.
///
/// Matching is on the prefix part of the key (the segment before `/`):
/// the domain itself and any subdomain of it are both protected, so
/// `kubernetes.io/managed` and `app.kubernetes.io/name` are equally denied.
pub const PROTECTED_KEY_DOMAINS: &[&str] = &["kubernetes.io", "k8s.io", "nslabel.io"];

/// Check whether a single label key is protected.
///
/// A key is protected when its prefix (the part before the first `/`) equals
/// one of [`PROTECTED_KEY_DOMAINS`] or is a subdomain of one. Keys without a
/// `/` have no prefix and are never protected.
#[must_use]
pub fn is_protected_key(key: &str) -> bool {
    let Some((prefix, _)) = key.split_once('/') else {
        return false;
    };

    PROTECTED_KEY_DOMAINS
        .iter()
        .any(|domain| prefix == *domain || prefix.ends_with(&format!(".{domain}")))
}

/// Find the first protected key in a declared label mapping, if any.
///
/// Iteration order is the `BTreeMap` key order, so the reported key is
/// deterministic for a given mapping.
#[must_use]
pub fn find_protected_key(labels: &BTreeMap<String, String>) -> Option<&str> {
    labels
        .keys()
        .map(String::as_str)
        .find(|key| is_protected_key(key))
}

