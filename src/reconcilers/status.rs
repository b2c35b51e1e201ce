// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Status condition helpers for `NamespaceLabel` resources.
//!
//! This module provides utility functions for creating and managing Kubernetes
//! status conditions following the standard conventions, and for persisting a
//! `NamespaceLabel` status through the status subresource.
//!
//! # Condition Format
//!
//! - `type`: The aspect of the resource being reported (e.g., "Ready")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed

use crate::crd::{Condition, NamespaceLabel, NamespaceLabelStatus};
use anyhow::Result;
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Arguments
///
/// * `condition_type` - The type of condition (e.g., "Ready")
/// * `status` - The status: "True", "False", or "Unknown"
/// * `reason` - A programmatic identifier in `CamelCase` (e.g., "`LabelsApplied`")
/// * `message` - A human-readable explanation
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition of the given type in a conditions list.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// Preserves `lastTransitionTime` when the status value is unchanged, and
/// stamps a new one when it flips. Persist separately with
/// [`patch_namespacelabel_status`].
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Persist a `NamespaceLabel` status through the status subresource.
///
/// Uses a merge patch so concurrent metadata changes on the resource are not
/// clobbered; only the status document is replaced.
///
/// # Errors
///
/// Returns an error if the status patch fails.
pub async fn patch_namespacelabel_status(
    client: &Client,
    nslabel: &NamespaceLabel,
    status: &NamespaceLabelStatus,
) -> Result<()> {
    let namespace = nslabel.namespace().unwrap_or_default();
    let name = nslabel.name_any();

    debug!(
        namespace = %namespace,
        name = %name,
        applied = ?status.applied_labels,
        "Patching NamespaceLabel status"
    );

    let api: Api<NamespaceLabel> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "status": status });
    api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(())
}

