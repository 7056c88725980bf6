// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory collaborators for reconciliation and control loop tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::cloudflare::DnsProvider;
use crate::errors::{DnsProviderError, OrchestratorError};
use crate::metrics::{PassTimer, ReconcileObserver};
use crate::nomad::{AllocationStub, EventStream, EventTopics, Orchestrator};
use crate::types::{ClusterNode, DnsRecord, EventKind, ReconciliationOutcome};

pub fn alloc(id: &str, node_id: &str, status: &str) -> AllocationStub {
    AllocationStub {
        id: id.to_string(),
        node_id: node_id.to_string(),
        job_id: "ingress".to_string(),
        client_status: status.to_string(),
    }
}

pub fn node(id: &str, status: &str, address: &str) -> ClusterNode {
    ClusterNode {
        id: id.to_string(),
        name: format!("{id}-name"),
        public_address: address.to_string(),
        status: status.to_string(),
    }
}

pub fn record(id: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: "lb.example.com".to_string(),
        kind: "A".to_string(),
        content: content.to_string(),
        ttl: 1,
    }
}

/// Orchestrator backed by fixed allocations and nodes.
///
/// Tracks how many `job_allocations` calls overlap, and can be slowed down to
/// make overlap observable.
#[derive(Default)]
pub struct FakeOrchestrator {
    pub allocations: Mutex<Vec<AllocationStub>>,
    pub allocations_error: Mutex<Option<OrchestratorError>>,
    pub nodes: Mutex<HashMap<String, ClusterNode>>,
    pub node_lookups: Mutex<Vec<String>>,
    pub stream_error: Mutex<Option<OrchestratorError>>,
    pub list_delay: Option<Duration>,
    pub list_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeOrchestrator {
    pub fn with_nodes(allocations: Vec<AllocationStub>, nodes: Vec<ClusterNode>) -> Self {
        Self {
            allocations: Mutex::new(allocations),
            nodes: Mutex::new(nodes.into_iter().map(|n| (n.id.clone(), n)).collect()),
            ..Self::default()
        }
    }

    pub fn fail_allocations(&self, error: OrchestratorError) {
        *self.allocations_error.lock().unwrap() = Some(error);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> Vec<String> {
        self.node_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn job_allocations(&self, _job: &str) -> Result<Vec<AllocationStub>, OrchestratorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.allocations_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.allocations.lock().unwrap().clone())
    }

    async fn node(&self, node_id: &str) -> Result<ClusterNode, OrchestratorError> {
        self.node_lookups.lock().unwrap().push(node_id.to_string());
        self.nodes
            .lock()
            .unwrap()
            .get(node_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::Status {
                endpoint: format!("/v1/node/{node_id}"),
                status: 404,
                reason: "NotFound",
                message: "node not found".to_string(),
            })
    }

    async fn event_stream(&self, _topics: &EventTopics) -> Result<EventStream, OrchestratorError> {
        if let Some(error) = self.stream_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(futures::stream::pending().boxed())
    }
}

/// DNS provider holding its records in memory.
#[derive(Default)]
pub struct FakeDns {
    pub records: Mutex<Vec<DnsRecord>>,
    pub list_error: Mutex<Option<DnsProviderError>>,
    pub failing_creates: HashSet<String>,
    pub failing_deletes: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl FakeDns {
    pub fn with_records(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn contents(&self) -> Vec<String> {
        let mut contents: Vec<String> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.content.clone())
            .collect();
        contents.sort();
        contents
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn failure(operation: &'static str) -> DnsProviderError {
        DnsProviderError::Status {
            operation,
            status: 500,
            reason: "ServerError",
            message: "injected failure".to_string(),
        }
    }
}

#[async_trait]
impl DnsProvider for FakeDns {
    async fn list_records(&self, _name: &str) -> Result<Vec<DnsRecord>, DnsProviderError> {
        self.calls.lock().unwrap().push("list".to_string());
        if let Some(error) = self.list_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(&self, name: &str, address: &str) -> Result<DnsRecord, DnsProviderError> {
        self.calls.lock().unwrap().push(format!("create:{address}"));
        if self.failing_creates.contains(address) {
            return Err(Self::failure("create"));
        }
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = DnsRecord {
            id,
            name: name.to_string(),
            kind: "A".to_string(),
            content: address.to_string(),
            ttl: 1,
        };
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_record(
        &self,
        id: &str,
        _name: &str,
        address: &str,
    ) -> Result<DnsRecord, DnsProviderError> {
        self.calls.lock().unwrap().push(format!("update:{id}"));
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::failure("update"))?;
        record.content = address.to_string();
        Ok(record.clone())
    }

    async fn delete_record(&self, id: &str) -> Result<(), DnsProviderError> {
        self.calls.lock().unwrap().push(format!("delete:{id}"));
        if self.failing_deletes.contains(id) {
            return Err(Self::failure("delete"));
        }
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

/// Observer that records every hook call.
#[derive(Default)]
pub struct RecordingObserver {
    pub started: AtomicUsize,
    pub outcomes: Mutex<Vec<ReconciliationOutcome>>,
    pub ready_calls: AtomicUsize,
    pub events: Mutex<Vec<EventKind>>,
    pub operations: Mutex<Vec<(String, bool)>>,
}

impl RecordingObserver {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }

    pub fn ready_calls(&self) -> usize {
        self.ready_calls.load(Ordering::SeqCst)
    }
}

impl ReconcileObserver for RecordingObserver {
    fn pass_started(&self) -> PassTimer {
        self.started.fetch_add(1, Ordering::SeqCst);
        PassTimer::start()
    }

    fn pass_finished(&self, _timer: PassTimer, outcome: &ReconciliationOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    fn mark_ready(&self) {
        self.ready_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn event_received(&self, kind: EventKind) {
        self.events.lock().unwrap().push(kind);
    }

    fn dns_operation(&self, operation: &str, ok: bool) {
        self.operations
            .lock()
            .unwrap()
            .push((operation.to_string(), ok));
    }
}
