// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Validating admission webhook for `NamespaceLabel` resources.
//!
//! Handles `AdmissionReview` requests for CREATE and UPDATE of
//! `NamespaceLabel` objects and enforces the two write-time policies:
//!
//! - **Single declaration per namespace** - a request is denied when another
//!   live `NamespaceLabel` already exists in the target namespace. The
//!   incoming object itself (matched by UID, falling back to name) and
//!   declarations already being deleted do not count.
//! - **Protected label keys** - a request is denied when any declared key
//!   sits in a protected domain (`kubernetes.io`, `k8s.io`, their
//!   subdomains) or in the operator's own domain.
//!
//! The reconciler re-checks both policies, so the webhook is an early,
//! user-visible gate rather than the only line of defense. TLS termination
//! is left to the surrounding deployment; the server itself speaks plain
//! HTTP.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use kube::{
    api::{Api, ListParams},
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
    core::DynamicObject,
    Client, ResourceExt,
};
use tracing::{debug, error, warn};

use crate::constants::WEBHOOK_VALIDATE_PATH;
use crate::crd::NamespaceLabel;
use crate::errors::PolicyError;
use crate::labels::find_protected_key;
use crate::metrics::record_admission_review;

/// Error type for webhook operations
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// An error occurred while communicating with the Kubernetes API
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let WebhookError::Kube(e) = &self;
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response()
    }
}

/// Build the axum router serving the validation endpoint.
pub fn webhook_router(client: Client) -> Router {
    Router::new()
        .route(WEBHOOK_VALIDATE_PATH, post(validate_handler))
        .with_state(client)
}

/// Handle a validating admission review for a `NamespaceLabel`.
///
/// Malformed reviews produce an "invalid" admission response rather than an
/// HTTP error; the API server relays the message to the client. Failures to
/// list existing declarations surface as HTTP 500 so the webhook's
/// `failurePolicy` decides the outcome.
pub async fn validate_handler(
    State(client): State<Client>,
    Json(body): Json<AdmissionReview<NamespaceLabel>>,
) -> Result<Json<AdmissionReview<DynamicObject>>, WebhookError> {
    let req: AdmissionRequest<NamespaceLabel> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            record_admission_review("UNKNOWN", "invalid");
            return Ok(Json(AdmissionResponse::invalid(e.to_string()).into_review()));
        }
    };

    let operation = operation_name(&req.operation);

    let Some(incoming) = req.object.as_ref() else {
        // DELETE and CONNECT carry no object; nothing to validate
        debug!(uid = %req.uid, operation, "No object in admission request, allowing");
        record_admission_review(operation, "allow");
        return Ok(Json(AdmissionResponse::from(&req).into_review()));
    };

    let namespace = incoming
        .namespace()
        .or_else(|| req.namespace.clone())
        .unwrap_or_default();

    let api: Api<NamespaceLabel> = Api::namespaced(client, &namespace);
    let existing = api.list(&ListParams::default()).await?;

    let response = match validate_declaration(incoming, &existing.items) {
        Ok(()) => {
            debug!(
                uid = %req.uid,
                operation,
                namespace = %namespace,
                name = %incoming.name_any(),
                "NamespaceLabel admitted"
            );
            record_admission_review(operation, "allow");
            AdmissionResponse::from(&req)
        }
        Err(policy) => {
            warn!(
                uid = %req.uid,
                operation,
                namespace = %namespace,
                name = %incoming.name_any(),
                reason = %policy,
                "NamespaceLabel denied"
            );
            record_admission_review(operation, "deny");
            AdmissionResponse::from(&req).deny(policy.to_string())
        }
    };

    Ok(Json(response.into_review()))
}

/// Validate an incoming declaration against the live declarations in its
/// namespace.
///
/// Pure verdict function; the caller supplies the current list. The incoming
/// object never counts against itself, so UPDATEs of the sole declaration
/// pass, and declarations already carrying a deletion timestamp do not block
/// a replacement.
///
/// # Errors
///
/// Returns the first [`PolicyError`] the declaration violates.
pub fn validate_declaration(
    incoming: &NamespaceLabel,
    existing: &[NamespaceLabel],
) -> Result<(), PolicyError> {
    let others = existing
        .iter()
        .filter(|item| item.metadata.deletion_timestamp.is_none())
        .filter(|item| !is_same_declaration(incoming, item))
        .count();
    if others > 0 {
        return Err(PolicyError::DuplicateDeclaration {
            namespace: incoming.namespace().unwrap_or_default(),
        });
    }

    if let Some(key) = find_protected_key(&incoming.spec.labels) {
        return Err(PolicyError::ProtectedLabel {
            key: key.to_string(),
        });
    }

    Ok(())
}

/// Whether two declarations are the same object, by UID when both carry one
/// and by name otherwise (CREATEs have no UID yet).
fn is_same_declaration(a: &NamespaceLabel, b: &NamespaceLabel) -> bool {
    match (&a.metadata.uid, &b.metadata.uid) {
        (Some(ua), Some(ub)) => ua == ub,
        _ => a.name_any() == b.name_any(),
    }
}

fn operation_name(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

