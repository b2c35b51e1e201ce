// Copyright (c) 2025 The nslabel Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use super::super::status::{create_condition, find_condition, update_condition_in_memory};

    #[test]
    fn test_create_condition_sets_all_fields() {
        let condition = create_condition("Ready", "True", "LabelsApplied", "2 labels applied");

        assert_eq!(condition.r#type, "Ready");
        assert_eq!(condition.status, "True");
        assert_eq!(condition.reason.as_deref(), Some("LabelsApplied"));
        assert_eq!(condition.message.as_deref(), Some("2 labels applied"));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![
            create_condition("Ready", "True", "LabelsApplied", "ok"),
            create_condition("Degraded", "False", "NoErrors", "ok"),
        ];

        assert!(find_condition(&conditions, "Ready").is_some());
        assert!(find_condition(&conditions, "Degraded").is_some());
        assert!(find_condition(&conditions, "Progressing").is_none());
    }

    #[test]
    fn test_update_condition_adds_when_absent() {
        let mut conditions = Vec::new();
        update_condition_in_memory(&mut conditions, "Ready", "True", "LabelsApplied", "ok");

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, "True");
    }

    #[test]
    fn test_update_condition_replaces_in_place() {
        let mut conditions = vec![create_condition("Ready", "True", "LabelsApplied", "ok")];

        update_condition_in_memory(
            &mut conditions,
            "Ready",
            "False",
            "PolicyViolation",
            "cannot add protected or management label 'kubernetes.io/managed'",
        );

        assert_eq!(conditions.len(), 1, "must not accumulate duplicates");
        assert_eq!(conditions[0].status, "False");
        assert_eq!(conditions[0].reason.as_deref(), Some("PolicyViolation"));
    }

    /// lastTransitionTime is preserved when the status value does not change
    #[test]
    fn test_transition_time_preserved_when_status_unchanged() {
        let mut conditions = vec![create_condition("Ready", "True", "LabelsApplied", "ok")];
        let original_time = conditions[0].last_transition_time.clone();

        update_condition_in_memory(&mut conditions, "Ready", "True", "LabelsApplied", "still ok");

        assert_eq!(conditions[0].last_transition_time, original_time);
        assert_eq!(conditions[0].message.as_deref(), Some("still ok"));
    }
}
