// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Event source adapter.
//!
//! Consumes the Nomad event stream and forwards a normalized
//! [`ClusterEvent`] for every event on the allow-list
//! (see [`EventKind::ALL`]). Everything else on the stream is dropped silently;
//! the stream carries many event types the controller does not care about.
//!
//! # Payload decoding
//!
//! The payload schema belongs to Nomad and changes between versions, so every
//! field is looked up and narrowed individually. A field that is missing or has
//! the wrong JSON type is treated as absent; decoding never fails an event.
//!
//! # Failure handling
//!
//! A stream that cannot be opened, reports an error, or is closed by the server
//! counts as one failed attempt. [`WatchPolicy::max_failures`] decides how many
//! attempts are made before [`watch_events`] gives up and returns a
//! [`WatchError`], which the control loop treats as terminal.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::types::{EventTopics, RawEvent};
use super::Orchestrator;
use crate::constants::DEFAULT_WATCH_MAX_FAILURES;
use crate::errors::{OrchestratorError, WatchError};
use crate::shutdown::{wait_for_shutdown, ShutdownReceiver};
use crate::types::{ClusterEvent, EventKind};

/// Pause before re-opening a failed stream, multiplied by the attempt count.
const RECONNECT_DELAY_MILLIS: u64 = 1000;

/// How many stream failures the watcher tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    /// Consecutive failed attempts after which the watcher gives up (at least 1).
    ///
    /// With the default of 1 the first failure is terminal.
    pub max_failures: u32,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_WATCH_MAX_FAILURES,
        }
    }
}

/// Normalize one raw stream event.
///
/// Returns `None` for event types off the allow-list and for events that fail
/// the [`ClusterEvent::is_valid`] invariant (e.g. a zero stream index).
#[must_use]
pub fn normalize_event(raw: &RawEvent) -> Option<ClusterEvent> {
    let kind = EventKind::from_event_type(&raw.event_type)?;

    let timestamp = DateTime::from_timestamp_nanos(i64::try_from(raw.index).unwrap_or(i64::MAX));

    let node_id = payload_id(
        &raw.payload,
        "NodeID",
        &[("Allocation", "NodeID"), ("Node", "ID")],
    );
    let job_id = payload_id(
        &raw.payload,
        "JobID",
        &[("Allocation", "JobID"), ("Job", "ID")],
    );

    let details = json!({ "raw": serde_json::to_value(raw).unwrap_or(Value::Null) });

    let event = ClusterEvent {
        kind,
        timestamp,
        node_id,
        job_id,
        details,
    };

    if event.is_valid() {
        Some(event)
    } else {
        debug!(event_type = %raw.event_type, index = raw.index, "Dropping invalid event");
        None
    }
}

/// Top-level string field of the payload, if present and a non-empty string.
fn payload_field(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Id under the top-level `key`, or from the nested objects when the payload
/// has no such key. A top-level value that is not a string yields `""`.
fn payload_id(payload: &Value, key: &str, nested: &[(&str, &str)]) -> String {
    if payload.get(key).is_some() {
        return payload_field(payload, key).unwrap_or_default();
    }
    nested
        .iter()
        .find_map(|(object, field)| nested_field(payload, object, field))
        .unwrap_or_default()
}

/// String field of an object nested in the payload (e.g. `Allocation.NodeID`).
fn nested_field(payload: &Value, object: &str, key: &str) -> Option<String> {
    payload.get(object).and_then(|inner| payload_field(inner, key))
}

/// Why a single stream session ended.
enum SessionEnd {
    Shutdown,
    ReceiverGone,
    Failed(OrchestratorError),
}

/// Watch the event stream and forward accepted events into `sender`.
///
/// Sending awaits when the queue is full, so a slow control loop slows the
/// watcher down instead of losing events.
///
/// Returns `Ok(())` when shutdown is requested or the receiving side is gone.
///
/// # Errors
///
/// Returns [`WatchError`] once `policy.max_failures` consecutive stream sessions
/// have failed.
pub async fn watch_events(
    orchestrator: Arc<dyn Orchestrator>,
    topics: EventTopics,
    sender: mpsc::Sender<ClusterEvent>,
    mut shutdown: ShutdownReceiver,
    policy: WatchPolicy,
) -> Result<(), WatchError> {
    info!("Starting Nomad event consumer");
    let max_failures = policy.max_failures.max(1);
    let mut failures = 0u32;

    loop {
        let end = run_session(
            orchestrator.as_ref(),
            &topics,
            &sender,
            &mut shutdown,
            &mut failures,
        )
        .await;

        let source = match end {
            SessionEnd::Shutdown => {
                info!("Event consumer stopping on shutdown");
                return Ok(());
            }
            SessionEnd::ReceiverGone => {
                info!("Event queue closed, event consumer stopping");
                return Ok(());
            }
            SessionEnd::Failed(source) => source,
        };

        failures += 1;
        if failures >= max_failures {
            error!(
                error = %source,
                attempts = failures,
                "Event stream failed, giving up"
            );
            return Err(WatchError {
                attempts: failures,
                source,
            });
        }

        let delay = Duration::from_millis(RECONNECT_DELAY_MILLIS * u64::from(failures));
        warn!(
            error = %source,
            attempts = failures,
            max_failures,
            retry_after = ?delay,
            "Event stream failed, reconnecting"
        );
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = wait_for_shutdown(&mut shutdown) => return Ok(()),
        }
    }
}

async fn run_session(
    orchestrator: &dyn Orchestrator,
    topics: &EventTopics,
    sender: &mpsc::Sender<ClusterEvent>,
    shutdown: &mut ShutdownReceiver,
    failures: &mut u32,
) -> SessionEnd {
    let mut stream = tokio::select! {
        result = orchestrator.event_stream(topics) => match result {
            Ok(stream) => stream,
            Err(e) => return SessionEnd::Failed(e),
        },
        () = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
    };

    loop {
        let item = tokio::select! {
            item = stream.next() => item,
            () = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
        };

        let frame = match item {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return SessionEnd::Failed(e),
            None => return SessionEnd::Failed(OrchestratorError::StreamClosed),
        };

        // A healthy frame resets the escalation counter.
        *failures = 0;

        for raw in &frame.events {
            let Some(event) = normalize_event(raw) else {
                continue;
            };

            debug!(
                kind = %event.kind,
                node_id = %event.node_id,
                job_id = %event.job_id,
                "Forwarding cluster event"
            );

            tokio::select! {
                result = sender.send(event) => {
                    if result.is_err() {
                        return SessionEnd::ReceiverGone;
                    }
                }
                () = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
            }
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod events_tests;
