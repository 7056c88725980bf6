// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS converger.
//!
//! Applies a [`RecordDiff`] one record at a time: every delete first, then
//! every create. A failed call is logged and counted, and the remaining calls
//! still run.

use tracing::{error, info};

use super::diff::RecordDiff;
use crate::cloudflare::client::{OPERATION_CREATE, OPERATION_DELETE};
use crate::cloudflare::DnsProvider;
use crate::metrics::ReconcileObserver;

/// Result of applying a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvergeReport {
    pub created: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Apply `diff` to the records named `record_name`.
pub async fn apply_diff(
    dns: &dyn DnsProvider,
    record_name: &str,
    diff: &RecordDiff,
    observer: &dyn ReconcileObserver,
) -> ConvergeReport {
    let mut report = ConvergeReport::default();

    for record in &diff.to_delete {
        match dns.delete_record(&record.id).await {
            Ok(()) => {
                report.deleted += 1;
                observer.dns_operation(OPERATION_DELETE, true);
                info!(
                    record_id = %record.id,
                    content = %record.content,
                    "Deleted stale record"
                );
            }
            Err(e) => {
                report.failed += 1;
                observer.dns_operation(OPERATION_DELETE, false);
                error!(
                    record_id = %record.id,
                    content = %record.content,
                    error = %e,
                    "Error deleting record"
                );
            }
        }
    }

    for address in &diff.to_create {
        match dns.create_record(record_name, address).await {
            Ok(record) => {
                report.created += 1;
                observer.dns_operation(OPERATION_CREATE, true);
                info!(
                    record_id = %record.id,
                    content = %address,
                    "Created record"
                );
            }
            Err(e) => {
                report.failed += 1;
                observer.dns_operation(OPERATION_CREATE, false);
                error!(content = %address, error = %e, "Error creating record");
            }
        }
    }

    report
}

#[cfg(test)]
#[path = "converge_tests.rs"]
mod converge_tests;
