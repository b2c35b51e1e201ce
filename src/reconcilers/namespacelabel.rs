// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! `NamespaceLabel` reconciliation logic.
//!
//! One reconciliation pass maps the declared label set onto the namespace the
//! declaration lives in:
//!
//! 1. Policy backstop: at most one live declaration per namespace, no
//!    protected keys. Violations fail the pass without touching the
//!    namespace (the admission webhook normally catches these first).
//! 2. Finalizer: added before any labels are applied so deletion always runs
//!    cleanup.
//! 3. Label delta: declared keys are added or updated, keys in the ownership
//!    record but no longer declared are removed, everything else on the
//!    namespace is left alone. The delta is computed from a fresh read and
//!    applied with a resourceVersion-guarded patch; conflicts re-run the
//!    whole read-compute-write cycle.
//! 4. Ownership record: after a successful apply, `status.appliedLabels` is
//!    set to exactly the declared key set.
//!
//! Deletion (finalizer present, deletion timestamp set) removes exactly the
//! owned keys and then clears the finalizer.

use crate::constants::LABEL_APPLY_MAX_ATTEMPTS;
use crate::crd::NamespaceLabel;
use crate::errors::PolicyError;
use crate::labels::{find_protected_key, FINALIZER_NAMESPACE_LABEL};
use crate::reconcilers::finalizers::{ensure_finalizer, handle_deletion, FinalizerCleanup};
use crate::reconcilers::retry::{is_conflict, is_not_found, retry_api_call};
use crate::reconcilers::should_reconcile;
use crate::reconcilers::status::{
    find_condition, patch_namespacelabel_status, update_condition_in_memory,
};
use anyhow::Result;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// The label changes one reconciliation pass wants to make to a namespace.
///
/// `set` holds declared keys whose value is absent or different on the
/// namespace; `remove` holds keys from the ownership record that are no
/// longer declared and still present on the namespace. Keys owned by other
/// actors appear in neither.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelDelta {
    /// Keys to add or overwrite, with their declared values
    pub set: BTreeMap<String, String>,
    /// Keys to delete from the namespace
    pub remove: BTreeSet<String>,
}

impl LabelDelta {
    /// True when the namespace already matches the declared state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }

    /// Render the delta as a JSON merge patch against the namespace.
    ///
    /// Removals become `null` entries (merge-patch delete semantics), and the
    /// observed `resourceVersion` rides along as an optimistic-concurrency
    /// precondition: the API server rejects the patch with 409 if the
    /// namespace changed since it was read.
    #[must_use]
    pub fn to_merge_patch(&self, resource_version: &str) -> serde_json::Value {
        let mut labels = serde_json::Map::new();
        for (key, value) in &self.set {
            labels.insert(key.clone(), json!(value));
        }
        for key in &self.remove {
            labels.insert(key.clone(), serde_json::Value::Null);
        }

        json!({
            "metadata": {
                "resourceVersion": resource_version,
                "labels": labels,
            }
        })
    }
}

/// Compute the label delta for one reconciliation pass.
///
/// Pure function of (declared mapping, ownership record, current namespace
/// labels); safe to re-run after a write conflict.
#[must_use]
pub fn compute_label_delta(
    declared: &BTreeMap<String, String>,
    owned: &BTreeSet<String>,
    current: Option<&BTreeMap<String, String>>,
) -> LabelDelta {
    let empty = BTreeMap::new();
    let current = current.unwrap_or(&empty);

    let set = declared
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let remove = owned
        .iter()
        .filter(|key| !declared.contains_key(*key) && current.contains_key(*key))
        .cloned()
        .collect();

    LabelDelta { set, remove }
}

/// Reconcile a `NamespaceLabel` resource.
///
/// Idempotent: reconciling the same declaration state repeatedly converges
/// on the same namespace labels and the same ownership record.
///
/// # Errors
///
/// Returns a [`PolicyError`] when the declaration violates the
/// single-declaration or protected-label invariant (the namespace is left
/// untouched), or a Kubernetes API error when reads or writes fail.
pub async fn reconcile_namespacelabel(client: Client, nslabel: NamespaceLabel) -> Result<()> {
    let namespace = nslabel.namespace().unwrap_or_default();
    let name = nslabel.name_any();

    info!("Reconciling NamespaceLabel: {}/{}", namespace, name);
    debug!(
        namespace = %namespace,
        name = %name,
        generation = ?nslabel.metadata.generation,
        declared = nslabel.spec.labels.len(),
        "Starting NamespaceLabel reconciliation"
    );

    if nslabel.metadata.deletion_timestamp.is_some() {
        return handle_deletion(&client, &nslabel, FINALIZER_NAMESPACE_LABEL).await;
    }

    if let Err(policy) = check_policy(&client, &nslabel, &namespace).await? {
        warn!(
            namespace = %namespace,
            name = %name,
            error = %policy,
            "NamespaceLabel rejected by policy, no labels applied"
        );
        crate::metrics::record_error("policy_violation");
        record_policy_failure(&client, &nslabel, &policy).await;
        return Err(policy.into());
    }

    ensure_finalizer(&client, &nslabel, FINALIZER_NAMESPACE_LABEL).await?;

    let owned: BTreeSet<String> = nslabel.applied_keys().into_iter().collect();
    sync_namespace_labels(&client, &namespace, &nslabel.spec.labels, &owned).await?;

    // A policy violation can clear without a spec change (the offending
    // duplicate gets deleted), so a non-True Ready condition forces a status
    // write even when the generation was already observed.
    let observed = nslabel
        .status
        .as_ref()
        .and_then(|status| status.observed_generation);
    let ready = nslabel
        .status
        .as_ref()
        .and_then(|status| find_condition(&status.conditions, "Ready"))
        .is_some_and(|condition| condition.status == "True");

    if should_reconcile(nslabel.metadata.generation, observed) || !ready {
        persist_ownership_record(&client, &nslabel).await?;
    } else {
        debug!(
            namespace = %namespace,
            name = %name,
            "Generation already observed, skipping status update"
        );
    }

    info!(
        "Successfully reconciled NamespaceLabel {}/{} ({} labels declared)",
        namespace,
        name,
        nslabel.spec.labels.len()
    );
    Ok(())
}

/// Evaluate the policy backstop for a declaration.
///
/// The outer `Result` carries store errors from the uniqueness list; the
/// inner one is the policy verdict.
async fn check_policy(
    client: &Client,
    nslabel: &NamespaceLabel,
    namespace: &str,
) -> Result<Result<(), PolicyError>> {
    let api: Api<NamespaceLabel> = Api::namespaced(client.clone(), namespace);
    let lp = ListParams::default();
    let declarations = retry_api_call(
        || api.list(&lp),
        "list namespacelabels for uniqueness check",
    )
    .await?;

    let live = declarations
        .items
        .iter()
        .filter(|item| item.metadata.deletion_timestamp.is_none())
        .count();
    if live > 1 {
        return Ok(Err(PolicyError::DuplicateDeclaration {
            namespace: namespace.to_string(),
        }));
    }

    if let Some(key) = find_protected_key(&nslabel.spec.labels) {
        return Ok(Err(PolicyError::ProtectedLabel {
            key: key.to_string(),
        }));
    }

    Ok(Ok(()))
}

/// Apply the declared labels to the namespace, removing formerly-owned keys.
///
/// Bounded read-compute-write loop: each attempt reads the namespace,
/// recomputes the delta, and issues a resourceVersion-guarded merge patch.
/// A 409 conflict consumes an attempt and re-runs the cycle; any other patch
/// error propagates. A missing namespace is only tolerated when there is
/// nothing left to declare (deletion cleanup racing namespace teardown).
async fn sync_namespace_labels(
    client: &Client,
    namespace: &str,
    declared: &BTreeMap<String, String>,
    owned: &BTreeSet<String>,
) -> Result<()> {
    let api: Api<Namespace> = Api::all(client.clone());

    for attempt in 1..=LABEL_APPLY_MAX_ATTEMPTS {
        let ns = match api.get(namespace).await {
            Ok(ns) => ns,
            Err(e) if is_not_found(&e) && declared.is_empty() => {
                debug!(namespace = %namespace, "Namespace already gone, nothing to clean up");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let delta = compute_label_delta(declared, owned, ns.metadata.labels.as_ref());
        if delta.is_empty() {
            debug!(namespace = %namespace, "Namespace labels already match declared state");
            return Ok(());
        }

        let resource_version = ns.metadata.resource_version.clone().unwrap_or_default();
        let patch = delta.to_merge_patch(&resource_version);

        debug!(
            namespace = %namespace,
            attempt,
            set = delta.set.len(),
            remove = delta.remove.len(),
            "Patching namespace labels"
        );

        match api
            .patch(namespace, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => {
                info!(
                    "Updated labels on namespace {} ({} set, {} removed)",
                    namespace,
                    delta.set.len(),
                    delta.remove.len()
                );
                crate::metrics::record_labels_mutated(delta.set.len(), delta.remove.len());
                return Ok(());
            }
            Err(e) if is_conflict(&e) => {
                debug!(
                    namespace = %namespace,
                    attempt,
                    "Conflict while patching namespace labels, re-reading"
                );
            }
            Err(e) if is_not_found(&e) && declared.is_empty() => {
                debug!(namespace = %namespace, "Namespace deleted mid-cleanup, nothing left to do");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    crate::metrics::record_error("conflict_exhausted");
    anyhow::bail!(
        "Gave up patching labels on namespace {namespace} after {LABEL_APPLY_MAX_ATTEMPTS} conflicts"
    )
}

/// Persist the ownership record and Ready condition after a successful apply.
async fn persist_ownership_record(client: &Client, nslabel: &NamespaceLabel) -> Result<()> {
    let applied: Vec<String> = nslabel.spec.labels.keys().cloned().collect();
    let count = applied.len();

    let mut status = nslabel.status.clone().unwrap_or_default();
    status.applied_labels = Some(applied);
    status.observed_generation = nslabel.metadata.generation;
    update_condition_in_memory(
        &mut status.conditions,
        "Ready",
        "True",
        "LabelsApplied",
        &format!("{count} declared labels applied to namespace"),
    );

    patch_namespacelabel_status(client, nslabel, &status).await
}

/// Record a policy failure on the declaration's Ready condition.
///
/// The ownership record is left as-is: a violating declaration applies
/// nothing, so the previously applied keys remain accurate. Status write
/// failures are logged but never mask the policy error itself.
async fn record_policy_failure(client: &Client, nslabel: &NamespaceLabel, policy: &PolicyError) {
    let mut status = nslabel.status.clone().unwrap_or_default();
    update_condition_in_memory(
        &mut status.conditions,
        "Ready",
        "False",
        "PolicyViolation",
        &policy.to_string(),
    );

    if let Err(e) = patch_namespacelabel_status(client, nslabel, &status).await {
        warn!(
            name = %nslabel.name_any(),
            error = %e,
            "Failed to record policy violation in status"
        );
    }
}

#[async_trait::async_trait]
impl FinalizerCleanup for NamespaceLabel {
    /// Remove exactly the owned keys from the namespace before deletion.
    ///
    /// Already-absent keys or an already-deleted namespace count as success;
    /// labels owned by other actors are never touched.
    async fn cleanup(&self, client: &Client) -> Result<()> {
        let namespace = self.namespace().unwrap_or_default();
        let owned: BTreeSet<String> = self.applied_keys().into_iter().collect();

        if owned.is_empty() {
            debug!(namespace = %namespace, "No owned labels recorded, cleanup is a no-op");
            return Ok(());
        }

        info!(
            "Removing {} owned labels from namespace {} before deletion",
            owned.len(),
            namespace
        );
        sync_namespace_labels(client, &namespace, &BTreeMap::new(), &owned).await
    }
}

