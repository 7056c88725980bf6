// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Node set resolution.
//!
//! Every pass reads the job's allocations and node records fresh from Nomad.
//! Nothing is cached between passes, not even for passes a few seconds apart.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::constants::ALLOCATION_STATUS_RUNNING;
use crate::errors::ReconcileError;
use crate::nomad::Orchestrator;
use crate::types::ClusterNode;

/// Resolve the eligible nodes currently running `job`.
///
/// 1. List every allocation of `job` and keep the `running` ones.
/// 2. Collapse allocations to unique node ids, in first-seen order.
/// 3. Fetch each node; a node that cannot be fetched is logged and skipped.
/// 4. Keep only eligible nodes (`ready` with a public address).
///
/// Node lookups run one after another.
///
/// # Errors
///
/// Returns [`ReconcileError::ListAllocations`] if the allocations cannot be
/// listed. Per-node failures never fail the call.
pub async fn resolve_nodes(
    orchestrator: &dyn Orchestrator,
    job: &str,
) -> Result<Vec<ClusterNode>, ReconcileError> {
    let allocations =
        orchestrator
            .job_allocations(job)
            .await
            .map_err(|source| ReconcileError::ListAllocations {
                job: job.to_string(),
                source,
            })?;

    let total_allocations = allocations.len();
    let mut seen = HashSet::new();
    let node_ids: Vec<String> = allocations
        .into_iter()
        .filter(|alloc| alloc.client_status == ALLOCATION_STATUS_RUNNING)
        .filter_map(|alloc| {
            if alloc.node_id.is_empty() {
                warn!(allocation_id = %alloc.id, "Running allocation has no node id, skipping");
                None
            } else {
                Some(alloc.node_id)
            }
        })
        .filter(|node_id| seen.insert(node_id.clone()))
        .collect();

    debug!(
        job = %job,
        allocations = total_allocations,
        running_nodes = node_ids.len(),
        "Listed job allocations"
    );

    let mut nodes = Vec::with_capacity(node_ids.len());
    for node_id in &node_ids {
        let node = match orchestrator.node(node_id).await {
            Ok(node) => node,
            Err(e) => {
                warn!(node_id = %node_id, error = %e, "Failed to look up node, skipping");
                continue;
            }
        };

        if node.is_eligible() {
            nodes.push(node);
        } else {
            debug!(
                node_id = %node.id,
                node_name = %node.name,
                status = %node.status,
                has_address = !node.public_address.is_empty(),
                "Node is not eligible"
            );
        }
    }

    Ok(nodes)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
