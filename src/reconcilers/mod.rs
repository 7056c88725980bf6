// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS reconciliation for the watched job.
//!
//! One reconciliation pass makes the published address records for a hostname
//! match the nodes currently running the job.
//!
//! # Reconciliation Pipeline
//!
//! 1. **Resolve** - [`resolve_nodes`] reads the job's eligible nodes from Nomad
//! 2. **List** - the hostname's current `A`/`AAAA` records are read from the provider
//! 3. **Diff** - [`compute_diff`] works out what to create and what to delete
//! 4. **Converge** - [`apply_diff`] deletes, then creates, one record per call
//!
//! A pass fails only when step 1 or step 2 cannot list anything. Failed
//! create or delete calls are logged and counted in the outcome, but do not
//! fail the pass.
//!
//! # Example
//!
//! ```rust,no_run
//! use nomad_dns_controller::cloudflare::CloudflareClient;
//! use nomad_dns_controller::config::Config;
//! use nomad_dns_controller::metrics::Metrics;
//! use nomad_dns_controller::nomad::NomadClient;
//! use nomad_dns_controller::reconcilers::{reconcile_once, PassSettings};
//!
//! # async fn example(config: Config) -> anyhow::Result<()> {
//! let nomad = NomadClient::new(&config)?;
//! let dns = CloudflareClient::new(&config)?;
//! let metrics = Metrics::new()?;
//! let settings = PassSettings::new(&config.job_name, &config.dns_record_name);
//!
//! let outcome = reconcile_once(&nomad, &dns, &settings, &metrics).await;
//! println!("created {}, deleted {}", outcome.created, outcome.deleted);
//! # Ok(())
//! # }
//! ```

pub mod converge;
pub mod diff;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_fakes;

pub use converge::{apply_diff, ConvergeReport};
pub use diff::{compute_diff, RecordDiff};
pub use resolver::resolve_nodes;

use tracing::{debug, error, info};

use crate::cloudflare::DnsProvider;
use crate::errors::ReconcileError;
use crate::metrics::ReconcileObserver;
use crate::nomad::Orchestrator;
use crate::types::{desired_state, ReconciliationOutcome};

/// What a pass reconciles: which job's nodes, published under which name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSettings {
    /// Nomad job whose nodes are published
    pub job_name: String,
    /// Fully qualified hostname of the address records
    pub record_name: String,
}

impl PassSettings {
    #[must_use]
    pub fn new(job_name: &str, record_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            record_name: record_name.to_string(),
        }
    }
}

/// Run one full reconciliation pass.
///
/// `observer.pass_started` and `observer.pass_finished` are called exactly once
/// each, including when the pass fails.
pub async fn reconcile_once(
    orchestrator: &dyn Orchestrator,
    dns: &dyn DnsProvider,
    settings: &PassSettings,
    observer: &dyn ReconcileObserver,
) -> ReconciliationOutcome {
    let timer = observer.pass_started();
    info!(
        job = %settings.job_name,
        record = %settings.record_name,
        "Starting DNS reconciliation"
    );

    let outcome = match run_pass(orchestrator, dns, settings, observer).await {
        Ok(outcome) => {
            info!(
                desired = outcome.addresses_desired,
                eligible_nodes = outcome.eligible_nodes,
                observed = outcome.records_observed,
                created = outcome.created,
                deleted = outcome.deleted,
                failed_operations = outcome.failed_operations,
                "DNS reconciliation completed"
            );
            outcome
        }
        Err(e) => {
            error!(error = %e, error_type = e.error_type(), "DNS reconciliation failed");
            ReconciliationOutcome::failed(e)
        }
    };

    observer.pass_finished(timer, &outcome);
    outcome
}

async fn run_pass(
    orchestrator: &dyn Orchestrator,
    dns: &dyn DnsProvider,
    settings: &PassSettings,
    observer: &dyn ReconcileObserver,
) -> Result<ReconciliationOutcome, ReconcileError> {
    let nodes = resolve_nodes(orchestrator, &settings.job_name).await?;
    let desired = desired_state(&nodes);

    let observed = dns
        .list_records(&settings.record_name)
        .await
        .map_err(|source| ReconcileError::ListRecords {
            name: settings.record_name.clone(),
            source,
        })?;

    let diff = compute_diff(&desired, &observed);
    debug!(
        desired = ?desired,
        to_create = diff.to_create.len(),
        to_delete = diff.to_delete.len(),
        "Computed record diff"
    );

    let report = if diff.is_empty() {
        ConvergeReport::default()
    } else {
        apply_diff(dns, &settings.record_name, &diff, observer).await
    };

    Ok(ReconciliationOutcome {
        addresses_desired: desired.len(),
        eligible_nodes: nodes.len(),
        records_observed: observed.len(),
        created: report.created,
        deleted: report.deleted,
        failed_operations: report.failed,
        error: None,
    })
}
