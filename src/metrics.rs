// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Nomad DNS controller.
//!
//! All metrics carry the namespace prefix `nomad_dns_controller_` and live in a
//! [`Registry`] owned by a [`Metrics`] handle. The handle is created once in
//! `main`, shared with the health server, and injected into the control loop,
//! which reports through the [`ReconcileObserver`] trait.
//!
//! # Metrics
//!
//! - **Pass metrics** - `sync_total`, `sync_errors_total`, `sync_duration_seconds`
//! - **State gauges** - `dns_records_total`, `eligible_nodes`, `last_sync_timestamp_seconds`
//! - **Operation metrics** - `dns_operations_total`, `events_received_total`
//!
//! # Example
//!
//! ```rust
//! use nomad_dns_controller::metrics::{Metrics, ReconcileObserver};
//! use nomad_dns_controller::types::ReconciliationOutcome;
//!
//! let metrics = Metrics::new().unwrap();
//! let timer = metrics.pass_started();
//! metrics.pass_finished(timer, &ReconciliationOutcome::default());
//! assert!(metrics.gather_metrics().unwrap().contains("nomad_dns_controller_sync_total"));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use tracing::info;

use crate::types::{EventKind, ReconciliationOutcome};

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all controller metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "nomad_dns_controller";

/// Status label values for `dns_operations_total`
const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

// ============================================================================
// Observer Seam
// ============================================================================

/// Start time of a reconciliation pass, handed back at the end of the pass.
#[derive(Debug, Clone, Copy)]
pub struct PassTimer {
    started: Instant,
}

impl PassTimer {
    /// Start timing now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Time since the pass started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Hooks the reconciliation core calls into.
///
/// `pass_started`/`pass_finished` bracket every pass exactly once;
/// `mark_ready` is called once, after the first successful pass.
pub trait ReconcileObserver: Send + Sync {
    /// A reconciliation pass is starting.
    fn pass_started(&self) -> PassTimer;

    /// A reconciliation pass has finished, successfully or not.
    fn pass_finished(&self, timer: PassTimer, outcome: &ReconciliationOutcome);

    /// The first pass succeeded; the process is ready.
    fn mark_ready(&self);

    /// An event reached the control loop.
    fn event_received(&self, kind: EventKind);

    /// A single DNS create/update/delete call completed.
    fn dns_operation(&self, operation: &str, ok: bool);
}

// ============================================================================
// Metrics Handle
// ============================================================================

/// Metrics and readiness state for one controller process.
pub struct Metrics {
    registry: Registry,
    ready: AtomicBool,

    /// Total number of reconciliation passes
    sync_total: Counter,
    /// Failed passes by error category
    sync_errors_total: CounterVec,
    /// Pass duration in seconds
    sync_duration_seconds: Histogram,
    /// Number of addresses that should be published
    dns_records_total: Gauge,
    /// Number of eligible nodes found by the last pass
    eligible_nodes: Gauge,
    /// Unix time of the last successful pass
    last_sync_timestamp_seconds: Gauge,
    /// DNS calls by operation and status
    dns_operations_total: CounterVec,
    /// Events delivered to the control loop by kind
    events_received_total: CounterVec,
}

impl Metrics {
    /// Create every metric and register it in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric definition is rejected by the registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let sync_total = Counter::with_opts(Opts::new(
            format!("{METRICS_NAMESPACE}_sync_total"),
            "Total number of DNS reconciliation passes",
        ))?;
        registry.register(Box::new(sync_total.clone()))?;

        let sync_errors_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_sync_errors_total"),
                "Total number of failed reconciliation passes by error category",
            ),
            &["error_type"],
        )?;
        registry.register(Box::new(sync_errors_total.clone()))?;

        let sync_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                format!("{METRICS_NAMESPACE}_sync_duration_seconds"),
                "Duration of reconciliation passes in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(sync_duration_seconds.clone()))?;

        let dns_records_total = Gauge::with_opts(Opts::new(
            format!("{METRICS_NAMESPACE}_dns_records_total"),
            "Number of addresses that should be published for the hostname",
        ))?;
        registry.register(Box::new(dns_records_total.clone()))?;

        let eligible_nodes = Gauge::with_opts(Opts::new(
            format!("{METRICS_NAMESPACE}_eligible_nodes"),
            "Number of ready, address-bearing nodes running the watched job",
        ))?;
        registry.register(Box::new(eligible_nodes.clone()))?;

        let last_sync_timestamp_seconds = Gauge::with_opts(Opts::new(
            format!("{METRICS_NAMESPACE}_last_sync_timestamp_seconds"),
            "Unix timestamp of the last successful reconciliation pass",
        ))?;
        registry.register(Box::new(last_sync_timestamp_seconds.clone()))?;

        let dns_operations_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_dns_operations_total"),
                "Total number of DNS record operations by operation and status",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(dns_operations_total.clone()))?;

        let events_received_total = CounterVec::new(
            Opts::new(
                format!("{METRICS_NAMESPACE}_events_received_total"),
                "Total number of cluster events received by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(events_received_total.clone()))?;

        Ok(Self {
            registry,
            ready: AtomicBool::new(false),
            sync_total,
            sync_errors_total,
            sync_duration_seconds,
            dns_records_total,
            eligible_nodes,
            last_sync_timestamp_seconds,
            dns_operations_total,
            events_received_total,
        })
    }

    /// Whether the first successful pass has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Gather and encode all metrics in Prometheus text format
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl ReconcileObserver for Metrics {
    fn pass_started(&self) -> PassTimer {
        PassTimer::start()
    }

    fn pass_finished(&self, timer: PassTimer, outcome: &ReconciliationOutcome) {
        self.sync_total.inc();
        self.sync_duration_seconds.observe(timer.elapsed().as_secs_f64());
        #[allow(clippy::cast_precision_loss)]
        {
            self.dns_records_total.set(outcome.addresses_desired as f64);
            self.eligible_nodes.set(outcome.eligible_nodes as f64);
        }

        match &outcome.error {
            Some(error) => self
                .sync_errors_total
                .with_label_values(&[error.error_type()])
                .inc(),
            #[allow(clippy::cast_precision_loss)]
            None => self
                .last_sync_timestamp_seconds
                .set(Utc::now().timestamp() as f64),
        }
    }

    fn mark_ready(&self) {
        if !self.ready.swap(true, Ordering::AcqRel) {
            info!("Controller marked as ready");
        }
    }

    fn event_received(&self, kind: EventKind) {
        self.events_received_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    fn dns_operation(&self, operation: &str, ok: bool) {
        let status = if ok { STATUS_SUCCESS } else { STATUS_ERROR };
        self.dns_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }
}
