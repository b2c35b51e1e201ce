// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `finalizers.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{NamespaceLabel, NamespaceLabelSpec};
    use crate::labels::FINALIZER_NAMESPACE_LABEL;
    use crate::reconcilers::finalizers::FinalizerCleanup;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use k8s_openapi::jiff::Timestamp;
    use std::collections::BTreeMap;

    const TEST_NAMESPACE: &str = "test-namespace";
    const TEST_NAME: &str = "test-resource";

    /// Helper to create a test NamespaceLabel
    fn create_test_nslabel(
        finalizers: Option<Vec<String>>,
        deleting: bool,
    ) -> NamespaceLabel {
        NamespaceLabel {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers,
                deletion_timestamp: deleting.then(|| Time(Timestamp::now())),
                generation: Some(1),
                ..Default::default()
            },
            spec: NamespaceLabelSpec {
                labels: BTreeMap::from([("label_1".to_string(), "a".to_string())]),
            },
            status: None,
        }
    }

    #[test]
    fn test_finalizer_cleanup_trait_is_implemented() {
        // Compile-time check that NamespaceLabel satisfies the cleanup trait
        fn _assert_cleanup<T: FinalizerCleanup>() {}
        _assert_cleanup::<NamespaceLabel>();
    }

    #[test]
    fn test_finalizer_presence_check() {
        let without = create_test_nslabel(None, false);
        let with = create_test_nslabel(vec![FINALIZER_NAMESPACE_LABEL.to_string()].into(), false);

        assert!(!without
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&FINALIZER_NAMESPACE_LABEL.to_string())));
        assert!(with
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&FINALIZER_NAMESPACE_LABEL.to_string())));
    }

    #[test]
    fn test_empty_finalizer_list_treated_as_absent() {
        let empty = create_test_nslabel(Some(vec![]), false);

        assert!(!empty
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&FINALIZER_NAMESPACE_LABEL.to_string())));
    }

    #[test]
    fn test_finalizer_list_manipulation() {
        // The list operations ensure_finalizer and remove_finalizer perform
        let mut finalizers: Vec<String> = vec![];

        finalizers.push(FINALIZER_NAMESPACE_LABEL.to_string());
        assert_eq!(finalizers.len(), 1);

        if !finalizers.contains(&FINALIZER_NAMESPACE_LABEL.to_string()) {
            finalizers.push(FINALIZER_NAMESPACE_LABEL.to_string());
        }
        assert_eq!(finalizers.len(), 1, "must not duplicate on re-add");

        let other = "other.nslabel.io/finalizer";
        finalizers.push(other.to_string());
        finalizers.retain(|f| f != FINALIZER_NAMESPACE_LABEL);

        assert_eq!(finalizers, vec![other.to_string()]);
    }

    #[test]
    fn test_deletion_timestamp_and_finalizer_combinations() {
        // Being deleted WITH finalizer: cleanup must run
        let deleting = create_test_nslabel(
            vec![FINALIZER_NAMESPACE_LABEL.to_string()].into(),
            true,
        );
        assert!(deleting.metadata.deletion_timestamp.is_some());
        assert!(deleting
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&FINALIZER_NAMESPACE_LABEL.to_string())));

        // Being deleted WITHOUT finalizer: handle_deletion is a no-op
        let deleting_bare = create_test_nslabel(None, true);
        assert!(deleting_bare.metadata.deletion_timestamp.is_some());
        assert!(deleting_bare.metadata.finalizers.is_none());

        // Live resource without finalizer: initial state before first reconcile
        let fresh = create_test_nslabel(None, false);
        assert!(fresh.metadata.deletion_timestamp.is_none());
        assert!(fresh.metadata.finalizers.is_none());
    }
}
