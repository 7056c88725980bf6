// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types for the subset of the Nomad HTTP API the controller consumes.
//!
//! Only the fields the controller reads are modelled; everything else in the
//! responses is ignored by serde.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{TOPIC_ALLOCATION, TOPIC_FILTER_ALL, TOPIC_JOB, TOPIC_NODE};
use crate::types::ClusterNode;

/// Entry of `GET /v1/job/:job/allocations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStub {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(rename = "JobID", default)]
    pub job_id: String,
    #[serde(rename = "ClientStatus", default)]
    pub client_status: String,
}

/// Body of `GET /v1/node/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Attributes", default)]
    pub attributes: HashMap<String, String>,
}

impl NodeRecord {
    /// Convert into the controller's node model, reading the public address
    /// from `address_attribute` (empty when the attribute is missing).
    #[must_use]
    pub fn into_cluster_node(self, address_attribute: &str) -> ClusterNode {
        let public_address = self
            .attributes
            .get(address_attribute)
            .cloned()
            .unwrap_or_default();

        ClusterNode {
            id: self.id,
            name: self.name,
            public_address,
            status: self.status,
        }
    }
}

/// One newline-delimited frame of `GET /v1/event/stream`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    #[serde(rename = "Index", default)]
    pub index: u64,
    #[serde(rename = "Events", default)]
    pub events: Vec<RawEvent>,
}

/// A single event inside an [`EventFrame`].
///
/// `payload` is kept loosely typed: its schema is versioned by Nomad, not by us.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "Topic", default)]
    pub topic: String,
    #[serde(rename = "Type", default)]
    pub event_type: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "Namespace", default)]
    pub namespace: String,
    #[serde(rename = "Index", default)]
    pub index: u64,
    #[serde(rename = "Payload", default)]
    pub payload: serde_json::Value,
}

/// Topic subscriptions for the event stream, as `(topic, filter key)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTopics {
    pub topics: Vec<(String, String)>,
}

impl EventTopics {
    /// Job events for `job` (and all jobs), plus all allocation and node events.
    #[must_use]
    pub fn for_job(job: &str) -> Self {
        Self {
            topics: vec![
                (TOPIC_JOB.to_string(), job.to_string()),
                (TOPIC_JOB.to_string(), TOPIC_FILTER_ALL.to_string()),
                (TOPIC_ALLOCATION.to_string(), TOPIC_FILTER_ALL.to_string()),
                (TOPIC_NODE.to_string(), TOPIC_FILTER_ALL.to_string()),
            ],
        }
    }

    /// Values for the repeated `topic` query parameter (`Topic:Key`).
    #[must_use]
    pub fn query_values(&self) -> Vec<String> {
        self.topics
            .iter()
            .map(|(topic, key)| format!("{topic}:{key}"))
            .collect()
    }
}
