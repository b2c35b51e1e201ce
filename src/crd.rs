// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for declarative namespace labels.
//!
//! This module defines the `NamespaceLabel` CRD: a namespaced resource whose
//! spec declares the set of labels its own namespace should carry. The
//! controller reconciles the declared mapping onto the namespace object and
//! records the keys it applied in the status, so that later reconciliations
//! can remove exactly the keys this declaration owns and nothing else.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: nslabel.io/v1alpha1
//! kind: NamespaceLabel
//! metadata:
//!   name: team-labels
//!   namespace: team-a
//! spec:
//!   labels:
//!     environment: production
//!     team: platform
//! ```
//!
//! At most one `NamespaceLabel` may exist per namespace, and declared keys
//! may not use protected domains such as `kubernetes.io/`. Both rules are
//! enforced synchronously by the admission webhook and again by the
//! reconciler as a backstop.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. Common types include: Ready, Available, Progressing, Degraded, Failed.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// `NamespaceLabel` status.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceLabelStatus {
    /// Label keys this declaration currently owns on the target namespace.
    ///
    /// Updated after every successful reconciliation to exactly the declared
    /// key set, sorted. The reconciler diffs against this record to decide
    /// which formerly-declared keys to remove, and deletion cleanup removes
    /// exactly these keys. Keys set on the namespace by other actors never
    /// appear here and are never touched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_labels: Option<Vec<String>>,

    /// The `metadata.generation` most recently processed by the controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Current conditions (Ready with reason/message).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// `NamespaceLabel` declares the labels its namespace should carry.
///
/// The resource is namespaced and acts on its own namespace only; the
/// controller never creates or deletes namespaces, it only patches the label
/// mapping of the namespace the declaration lives in. Removing a key from
/// `spec.labels` removes it from the namespace on the next reconciliation,
/// and deleting the declaration removes all keys it applied (a finalizer
/// holds deletion until that cleanup has run).
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "nslabel.io",
    version = "v1alpha1",
    kind = "NamespaceLabel",
    namespaced,
    doc = "NamespaceLabel declares a set of labels for the namespace it lives in. The controller applies the declared mapping to the namespace and tracks ownership of each applied key so removals never touch labels set by other actors."
)]
#[kube(status = "NamespaceLabelStatus")]
#[serde(rename_all = "camelCase")]
pub struct NamespaceLabelSpec {
    /// Desired labels for the namespace, as key/value pairs.
    ///
    /// Keys must not use protected domains (`kubernetes.io/`, `k8s.io/`,
    /// their subdomains, or `nslabel.io/`). Values follow normal Kubernetes
    /// label value syntax.
    pub labels: BTreeMap<String, String>,
}

impl NamespaceLabel {
    /// The set of label keys this declaration currently owns, from status.
    ///
    /// Empty when the declaration has never been successfully reconciled.
    #[must_use]
    pub fn applied_keys(&self) -> Vec<String> {
        self.status
            .as_ref()
            .and_then(|status| status.applied_labels.clone())
            .unwrap_or_default()
    }
}

