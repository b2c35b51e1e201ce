// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `webhook.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{NamespaceLabel, NamespaceLabelSpec};
    use crate::errors::PolicyError;
    use crate::webhook::validate_declaration;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use k8s_openapi::jiff::Timestamp;
    use kube::core::admission::{AdmissionRequest, AdmissionReview, Operation};
    use std::collections::BTreeMap;

    fn declaration(name: &str, uid: Option<&str>, deleting: bool) -> NamespaceLabel {
        NamespaceLabel {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("team-a".to_string()),
                uid: uid.map(ToString::to_string),
                deletion_timestamp: deleting.then(|| Time(Timestamp::now())),
                ..Default::default()
            },
            spec: NamespaceLabelSpec {
                labels: BTreeMap::from([("label_1".to_string(), "a".to_string())]),
            },
            status: None,
        }
    }

    fn declaration_with_labels(name: &str, labels: &[(&str, &str)]) -> NamespaceLabel {
        let mut decl = declaration(name, None, false);
        decl.spec.labels = labels
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        decl
    }

    /// The first declaration in a namespace is admitted
    #[test]
    fn test_first_declaration_allowed() {
        let incoming = declaration("team-labels", None, false);

        assert!(validate_declaration(&incoming, &[]).is_ok());
    }

    /// A second declaration in the same namespace is denied
    #[test]
    fn test_second_declaration_denied() {
        let incoming = declaration("second", None, false);
        let existing = vec![declaration("first", Some("uid-1"), false)];

        let err = validate_declaration(&incoming, &existing).unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateDeclaration { .. }));
        assert!(err
            .to_string()
            .contains("only one NamespaceLabel allowed per namespace"));
    }

    /// Updating the sole declaration does not count against itself (by UID)
    #[test]
    fn test_self_update_allowed_by_uid() {
        let incoming = declaration("team-labels", Some("uid-1"), false);
        // The list includes the stored copy of the object being updated
        let existing = vec![declaration("team-labels", Some("uid-1"), false)];

        assert!(validate_declaration(&incoming, &existing).is_ok());
    }

    /// Without UIDs (CREATE), self-exclusion falls back to the name
    #[test]
    fn test_self_match_falls_back_to_name() {
        let incoming = declaration("team-labels", None, false);
        let existing = vec![declaration("team-labels", Some("uid-1"), false)];

        assert!(validate_declaration(&incoming, &existing).is_ok());
    }

    /// A declaration already being deleted does not block its replacement
    #[test]
    fn test_deleting_declaration_does_not_block() {
        let incoming = declaration("replacement", None, false);
        let existing = vec![declaration("old", Some("uid-1"), true)];

        assert!(validate_declaration(&incoming, &existing).is_ok());
    }

    /// Protected label keys are denied with the exact violating key
    #[test]
    fn test_protected_key_denied() {
        let incoming = declaration_with_labels(
            "team-labels",
            &[("team", "payments"), ("kubernetes.io/managed", "yes")],
        );

        let err = validate_declaration(&incoming, &[]).unwrap_err();
        assert!(matches!(err, PolicyError::ProtectedLabel { .. }));
        assert!(err
            .to_string()
            .contains("cannot add protected or management label 'kubernetes.io/managed'"));
    }

    /// Subdomains of protected domains are denied too
    #[test]
    fn test_protected_subdomain_denied() {
        let incoming =
            declaration_with_labels("team-labels", &[("app.kubernetes.io/name", "api")]);

        let err = validate_declaration(&incoming, &[]).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot add protected or management label 'app.kubernetes.io/name'"));
    }

    /// The duplicate check fires before the protected-key check
    #[test]
    fn test_duplicate_check_wins_over_protected() {
        let incoming =
            declaration_with_labels("second", &[("kubernetes.io/managed", "yes")]);
        let existing = vec![declaration("first", Some("uid-1"), false)];

        let err = validate_declaration(&incoming, &existing).unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateDeclaration { .. }));
    }

    /// A real AdmissionReview payload parses into a typed request
    #[test]
    fn test_admission_review_parses() {
        let payload = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {
                    "group": "nslabel.io",
                    "version": "v1alpha1",
                    "kind": "NamespaceLabel"
                },
                "resource": {
                    "group": "nslabel.io",
                    "version": "v1alpha1",
                    "resource": "namespacelabels"
                },
                "name": "team-labels",
                "namespace": "team-a",
                "operation": "CREATE",
                "userInfo": { "username": "admin" },
                "object": {
                    "apiVersion": "nslabel.io/v1alpha1",
                    "kind": "NamespaceLabel",
                    "metadata": {
                        "name": "team-labels",
                        "namespace": "team-a"
                    },
                    "spec": {
                        "labels": { "label_1": "a", "label_2": "b" }
                    }
                }
            }
        });

        let review: AdmissionReview<NamespaceLabel> =
            serde_json::from_value(payload).expect("review should deserialize");
        let request: AdmissionRequest<NamespaceLabel> =
            review.try_into().expect("review should carry a request");

        assert!(matches!(request.operation, Operation::Create));
        assert_eq!(request.namespace.as_deref(), Some("team-a"));

        let object = request.object.expect("CREATE carries the object");
        assert_eq!(object.spec.labels.len(), 2);
        assert!(validate_declaration(&object, &[]).is_ok());
    }
}
