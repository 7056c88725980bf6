// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Nomad orchestrator integration.
//!
//! This module provides everything the controller needs from Nomad:
//!
//! - [`Orchestrator`] - the three calls the reconciliation core consumes
//! - [`NomadClient`] - an HTTP implementation against the Nomad API
//! - [`events`] - the event source adapter that turns the raw event stream into
//!   [`crate::types::ClusterEvent`]s for the control loop
//!
//! # Example
//!
//! ```rust,no_run
//! use nomad_dns_controller::config::Config;
//! use nomad_dns_controller::nomad::{NomadClient, Orchestrator};
//!
//! # async fn example(config: Config) -> anyhow::Result<()> {
//! let client = NomadClient::new(&config)?;
//! let allocations = client.job_allocations("ingress").await?;
//! println!("{} allocations", allocations.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod events;
pub mod types;

pub use client::NomadClient;
pub use events::{normalize_event, watch_events, WatchPolicy};
pub use types::{AllocationStub, EventFrame, EventTopics, NodeRecord, RawEvent};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::OrchestratorError;
use crate::types::ClusterNode;

/// Live event stream: one item per decoded frame, ending after the first error.
pub type EventStream = BoxStream<'static, Result<EventFrame, OrchestratorError>>;

/// The orchestrator calls the reconciliation core depends on.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// List every allocation of `job`, in any client status.
    async fn job_allocations(&self, job: &str) -> Result<Vec<AllocationStub>, OrchestratorError>;

    /// Fetch one node by id.
    async fn node(&self, node_id: &str) -> Result<ClusterNode, OrchestratorError>;

    /// Open the event stream for `topics`.
    async fn event_stream(&self, topics: &EventTopics) -> Result<EventStream, OrchestratorError>;
}
