// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Control loop.
//!
//! The controller runs one reconciliation pass at startup and then waits for
//! whichever comes first:
//!
//! - **shutdown** - return `Ok(())`
//! - **fatal watch error** - return [`ControllerError::Watch`]
//! - **cluster event** - wait the debounce window, drain queued events, reconcile
//! - **timer tick** - reconcile
//!
//! Passes run inline in the loop, so at most one is ever in flight. Triggers
//! that arrive during a pass are picked up by the next wait.
//!
//! # Debounce
//!
//! The debounce window is fixed: it starts at the first event and is not
//! extended by later events. Events queued by the time it ends are coalesced
//! into the same pass. A burst longer than the window may therefore produce a
//! second pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::cloudflare::DnsProvider;
use crate::config::Config;
use crate::errors::{ControllerError, WatchError};
use crate::metrics::ReconcileObserver;
use crate::nomad::{watch_events, EventTopics, Orchestrator, WatchPolicy};
use crate::reconcilers::{reconcile_once, PassSettings};
use crate::shutdown::{is_shutdown, wait_for_shutdown, ShutdownReceiver};
use crate::types::{ClusterEvent, ReconciliationOutcome};

/// Scheduling settings for the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Job and hostname to reconcile
    pub pass: PassSettings,
    /// Fixed wait between an event and the pass it triggers
    pub debounce: Duration,
    /// Period of the fallback timer
    pub sync_interval: Duration,
    /// Capacity of the event queue between watcher and loop
    pub queue_capacity: usize,
    /// When the event watcher gives up
    pub watch_policy: WatchPolicy,
}

impl ControllerSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            pass: PassSettings::new(&config.job_name, &config.dns_record_name),
            debounce: config.debounce(),
            sync_interval: config.sync_interval(),
            queue_capacity: config.event_queue_capacity,
            watch_policy: WatchPolicy {
                max_failures: config.watch_max_failures,
            },
        }
    }
}

enum Trigger {
    Event(ClusterEvent),
    Timer,
}

/// Keeps the hostname's address records in line with the job's nodes.
pub struct Controller {
    orchestrator: Arc<dyn Orchestrator>,
    dns: Arc<dyn DnsProvider>,
    observer: Arc<dyn ReconcileObserver>,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        dns: Arc<dyn DnsProvider>,
        observer: Arc<dyn ReconcileObserver>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            orchestrator,
            dns,
            observer,
            settings,
        }
    }

    /// Start the event watcher and run the control loop until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Watch`] if the event watcher fails
    /// irrecoverably.
    pub async fn run(&self, shutdown: ShutdownReceiver) -> Result<(), ControllerError> {
        let (events_tx, events_rx) = mpsc::channel(self.settings.queue_capacity.max(1));
        let (fatal_tx, fatal_rx) = oneshot::channel();

        let watcher = tokio::spawn(watch_and_report(
            self.orchestrator.clone(),
            EventTopics::for_job(&self.settings.pass.job_name),
            events_tx,
            fatal_tx,
            shutdown.clone(),
            self.settings.watch_policy,
        ));

        let result = self.run_with_events(events_rx, fatal_rx, shutdown).await;

        // The watcher stops on shutdown, on its own failure, or once the queue
        // receiver above is dropped.
        if let Err(e) = watcher.await {
            warn!(error = %e, "Event watcher task did not finish cleanly");
        }
        result
    }

    /// Run the control loop on an existing event queue.
    ///
    /// `fatal` carries at most one terminal watcher error. If `events` closes
    /// without a fatal error, the loop keeps running on the timer alone.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Watch`] when a fatal watcher error arrives.
    pub async fn run_with_events(
        &self,
        mut events: mpsc::Receiver<ClusterEvent>,
        mut fatal: oneshot::Receiver<WatchError>,
        mut shutdown: ShutdownReceiver,
    ) -> Result<(), ControllerError> {
        info!(
            job = %self.settings.pass.job_name,
            record = %self.settings.pass.record_name,
            sync_interval = ?self.settings.sync_interval,
            debounce = ?self.settings.debounce,
            "Starting control loop"
        );

        if is_shutdown(&shutdown) {
            return Ok(());
        }

        let mut ready = false;
        info!("Running startup reconciliation");
        if self.reconcile(&mut shutdown, &mut ready).await.is_none() {
            return Ok(());
        }

        let period = self.settings.sync_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut events_open = true;
        let mut fatal_open = true;

        loop {
            let trigger = tokio::select! {
                biased;

                () = wait_for_shutdown(&mut shutdown) => {
                    info!("Control loop stopping on shutdown");
                    return Ok(());
                }
                result = &mut fatal, if fatal_open => match result {
                    Ok(e) => {
                        error!(error = %e, "Event watcher failed, stopping control loop");
                        return Err(ControllerError::Watch(e));
                    }
                    Err(_) => {
                        fatal_open = false;
                        continue;
                    }
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => Trigger::Event(event),
                    None => {
                        warn!("Event queue closed, continuing on the periodic timer only");
                        events_open = false;
                        continue;
                    }
                },
                _ = ticker.tick() => Trigger::Timer,
            };

            match trigger {
                Trigger::Event(event) => {
                    self.observer.event_received(event.kind);
                    debug!(
                        kind = %event.kind,
                        node_id = %event.node_id,
                        job_id = %event.job_id,
                        "Received cluster event, debouncing"
                    );

                    tokio::select! {
                        () = tokio::time::sleep(self.settings.debounce) => {}
                        () = wait_for_shutdown(&mut shutdown) => {
                            info!("Control loop stopping on shutdown");
                            return Ok(());
                        }
                    }

                    let mut coalesced = 0usize;
                    while let Ok(queued) = events.try_recv() {
                        self.observer.event_received(queued.kind);
                        coalesced += 1;
                    }
                    info!(
                        kind = %event.kind,
                        coalesced,
                        "Reconciling after cluster event"
                    );
                }
                Trigger::Timer => {
                    info!("Running periodic reconciliation");
                }
            }

            if self.reconcile(&mut shutdown, &mut ready).await.is_none() {
                return Ok(());
            }
        }
    }

    /// Run one pass; `None` if shutdown interrupted it.
    async fn reconcile(
        &self,
        shutdown: &mut ShutdownReceiver,
        ready: &mut bool,
    ) -> Option<ReconciliationOutcome> {
        let pass = reconcile_once(
            self.orchestrator.as_ref(),
            self.dns.as_ref(),
            &self.settings.pass,
            self.observer.as_ref(),
        );

        let outcome = tokio::select! {
            outcome = pass => outcome,
            () = wait_for_shutdown(shutdown) => {
                warn!("Shutdown requested, abandoning reconciliation in flight");
                return None;
            }
        };

        if outcome.is_success() && !*ready {
            self.observer.mark_ready();
            *ready = true;
        }
        Some(outcome)
    }
}

async fn watch_and_report(
    orchestrator: Arc<dyn Orchestrator>,
    topics: EventTopics,
    events: mpsc::Sender<ClusterEvent>,
    fatal: oneshot::Sender<WatchError>,
    shutdown: ShutdownReceiver,
    policy: WatchPolicy,
) {
    if let Err(e) = watch_events(orchestrator, topics, events, shutdown, policy).await {
        // The loop may already be gone; nothing left to report to.
        let _ = fatal.send(e);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
