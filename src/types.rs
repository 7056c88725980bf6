// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Core data model shared by the reconciliation pipeline.
//!
//! Every value in this module is owned by a single reconciliation pass (or a
//! single event hand-off) and is rebuilt from the upstream APIs on every pass.
//! Nothing here is cached across passes.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NODE_STATUS_READY;
use crate::errors::ReconcileError;

/// One Nomad client node that runs an allocation of the watched job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Node id in the Nomad cluster
    pub id: String,
    /// Human-readable node name
    pub name: String,
    /// Public address published in DNS; empty when unknown
    pub public_address: String,
    /// Nomad node status (`ready`, `down`, `initializing`, ...)
    pub status: String,
}

impl ClusterNode {
    /// A node is eligible for publication iff it is `ready` and has an address.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.status == NODE_STATUS_READY && !self.public_address.is_empty()
    }
}

/// Set of unique addresses that should be published for the hostname.
///
/// Ordered so that logs and create calls are deterministic.
pub type DesiredState = BTreeSet<String>;

/// Build the desired address set from a node set.
///
/// Ineligible nodes are ignored and colliding addresses collapse.
#[must_use]
pub fn desired_state<'a, I>(nodes: I) -> DesiredState
where
    I: IntoIterator<Item = &'a ClusterNode>,
{
    nodes
        .into_iter()
        .filter(|node| node.is_eligible())
        .map(|node| node.public_address.clone())
        .collect()
}

/// One published address record at the DNS provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned id; only known after listing or creation
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type (`A` or `AAAA`)
    pub kind: String,
    /// Address the record points at
    pub content: String,
    /// Time to live in seconds; `1` means automatic at Cloudflare
    pub ttl: i64,
}

impl DnsRecord {
    /// Negative TTLs are never valid.
    #[must_use]
    pub fn has_valid_ttl(&self) -> bool {
        self.ttl >= 0
    }
}

/// Event types forwarded from the Nomad event stream.
///
/// Any other event type is dropped by the event source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    AllocationUpdated,
    NodeUpdated,
    JobRegistered,
    JobDeregistered,
}

impl EventKind {
    /// The full allow-list, in a stable order.
    pub const ALL: [EventKind; 4] = [
        EventKind::AllocationUpdated,
        EventKind::NodeUpdated,
        EventKind::JobRegistered,
        EventKind::JobDeregistered,
    ];

    /// Parse a Nomad event type name; `None` for anything off the allow-list.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == event_type)
    }

    /// Nomad's name for this event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllocationUpdated => "AllocationUpdated",
            Self::NodeUpdated => "NodeUpdated",
            Self::JobRegistered => "JobRegistered",
            Self::JobDeregistered => "JobDeregistered",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized trigger signal handed from the event watcher to the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterEvent {
    /// Event type
    pub kind: EventKind,
    /// Derived from the stream index interpreted as nanoseconds.
    ///
    /// This is a monotonically increasing offset, not a wall-clock time.
    pub timestamp: DateTime<Utc>,
    /// Node the event refers to; empty when the payload did not say
    pub node_id: String,
    /// Job the event refers to; empty when the payload did not say
    pub job_id: String,
    /// Raw event under the `raw` key
    pub details: serde_json::Value,
}

impl ClusterEvent {
    /// Events with a zero timestamp or non-object details are never forwarded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.timestamp != DateTime::<Utc>::UNIX_EPOCH && self.details.is_object()
    }
}

/// Summary of one reconciliation pass, consumed by the metrics hook.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationOutcome {
    /// Number of unique addresses that should be published
    pub addresses_desired: usize,
    /// Number of eligible nodes found
    pub eligible_nodes: usize,
    /// Number of records listed at the provider
    pub records_observed: usize,
    /// Records created successfully
    pub created: usize,
    /// Records deleted successfully
    pub deleted: usize,
    /// Create or delete calls that failed; never fails the pass
    pub failed_operations: usize,
    /// Pass-level failure, if any
    pub error: Option<ReconcileError>,
}

impl ReconciliationOutcome {
    /// Outcome of a pass that failed before converging.
    #[must_use]
    pub fn failed(error: ReconcileError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Whether the pass listed both sides successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
