// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Policy error types for the nslabel operator.
//!
//! This module defines the errors raised when a `NamespaceLabel` violates one
//! of the invariants the controller enforces. The display strings are part of
//! the user-facing contract: the admission webhook returns them verbatim as
//! denial reasons, the reconciler surfaces them as reconciliation failures,
//! and tests assert on their content. Do not reword them casually.

use thiserror::Error;

/// Invariant violations on a `NamespaceLabel` declaration.
///
/// These are not transient: the same declaration will keep failing until the
/// user edits it, so callers should report them rather than retry them into
/// submission. The admission webhook normally prevents them from being
/// persisted at all; the reconciler check is the defense-in-depth backstop
/// for racing creates or direct API writes that bypassed the webhook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// More than one live `NamespaceLabel` exists in the same namespace.
    ///
    /// Each namespace supports exactly one declaration source; a second one
    /// would make label ownership ambiguous.
    #[error("only one NamespaceLabel allowed per namespace (namespace '{namespace}')")]
    DuplicateDeclaration {
        /// The namespace containing the conflicting declarations
        namespace: String,
    },

    /// A declared key matches a protected or management domain.
    ///
    /// Protected keys (see [`crate::labels::PROTECTED_KEY_DOMAINS`]) belong
    /// to the system or to this operator and may never be set through a
    /// declaration. When this error is raised, none of the declaration's
    /// labels are applied, including unprotected ones.
    #[error("cannot add protected or management label '{key}'")]
    ProtectedLabel {
        /// The offending label key
        key: String,
    },
}

