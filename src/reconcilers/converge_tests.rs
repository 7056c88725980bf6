// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `converge.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::reconcilers::test_fakes::{record, FakeDns, RecordingObserver};

    #[tokio::test]
    async fn test_deletes_run_before_creates() {
        let dns = FakeDns::with_records(vec![record("B", "2.2.2.2")]);
        let observer = RecordingObserver::default();
        let diff = RecordDiff {
            to_create: vec!["3.3.3.3".to_string()],
            to_delete: vec![record("B", "2.2.2.2")],
        };

        let report = apply_diff(&dns, "lb.example.com", &diff, &observer).await;

        assert_eq!(dns.calls(), vec!["delete:B", "create:3.3.3.3"]);
        assert_eq!(
            report,
            ConvergeReport {
                created: 1,
                deleted: 1,
                failed: 0
            }
        );
        assert_eq!(dns.contents(), vec!["3.3.3.3"]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_remaining_operations() {
        let mut dns = FakeDns::with_records(vec![
            record("A", "1.1.1.1"),
            record("B", "2.2.2.2"),
        ]);
        dns.failing_deletes.insert("A".to_string());
        dns.failing_creates.insert("3.3.3.3".to_string());
        let observer = RecordingObserver::default();
        let diff = RecordDiff {
            to_create: vec!["3.3.3.3".to_string(), "4.4.4.4".to_string()],
            to_delete: vec![record("A", "1.1.1.1"), record("B", "2.2.2.2")],
        };

        let report = apply_diff(&dns, "lb.example.com", &diff, &observer).await;

        assert_eq!(
            dns.calls(),
            vec!["delete:A", "delete:B", "create:3.3.3.3", "create:4.4.4.4"]
        );
        assert_eq!(report.deleted, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(dns.contents(), vec!["1.1.1.1", "4.4.4.4"]);
    }

    #[tokio::test]
    async fn test_every_operation_is_reported_to_observer() {
        let mut dns = FakeDns::default();
        dns.failing_creates.insert("10.0.0.2".to_string());
        let observer = RecordingObserver::default();
        let diff = RecordDiff {
            to_create: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            to_delete: Vec::new(),
        };

        apply_diff(&dns, "lb.example.com", &diff, &observer).await;

        let operations = observer.operations.lock().unwrap().clone();
        assert_eq!(
            operations,
            vec![("create".to_string(), true), ("create".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_empty_diff_makes_no_calls() {
        let dns = FakeDns::default();
        let observer = RecordingObserver::default();

        let report = apply_diff(&dns, "lb.example.com", &RecordDiff::default(), &observer).await;

        assert_eq!(report, ConvergeReport::default());
        assert!(dns.calls().is_empty());
    }
}
