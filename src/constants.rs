// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Nomad DNS controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Nomad Constants
// ============================================================================

/// Default Nomad HTTP API address
pub const DEFAULT_NOMAD_ADDR: &str = "http://localhost:4646";

/// Default Nomad namespace for job, allocation and event queries
pub const DEFAULT_NOMAD_NAMESPACE: &str = "default";

/// Default name of the reverse-proxy job whose nodes are published
pub const DEFAULT_JOB_NAME: &str = "ingress";

/// Node attribute that carries the node's public address
pub const DEFAULT_NODE_ADDRESS_ATTRIBUTE: &str = "unique.network.ip-address";

/// Header used to authenticate against the Nomad API
pub const NOMAD_TOKEN_HEADER: &str = "X-Nomad-Token";

/// Allocation client status that makes an allocation count towards the node set
pub const ALLOCATION_STATUS_RUNNING: &str = "running";

/// Node status that makes a node eligible for publication
pub const NODE_STATUS_READY: &str = "ready";

/// Event stream topic for job lifecycle events
pub const TOPIC_JOB: &str = "Job";

/// Event stream topic for allocation lifecycle events
pub const TOPIC_ALLOCATION: &str = "Allocation";

/// Event stream topic for node lifecycle events
pub const TOPIC_NODE: &str = "Node";

/// Wildcard filter key accepted by the event stream
pub const TOPIC_FILTER_ALL: &str = "*";

/// Timeout for a single non-streaming Nomad or Cloudflare request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Cloudflare Constants
// ============================================================================

/// Default Cloudflare v4 API base URL
pub const DEFAULT_CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Page size used when listing DNS records
pub const CLOUDFLARE_LIST_PAGE_SIZE: u32 = 100;

/// TTL value Cloudflare interprets as "automatic"
pub const DEFAULT_DNS_RECORD_TTL_SECS: i64 = 1;

/// Record type for IPv4 address records
pub const RECORD_TYPE_A: &str = "A";

/// Record type for IPv6 address records
pub const RECORD_TYPE_AAAA: &str = "AAAA";

// ============================================================================
// Control Loop Constants
// ============================================================================

/// Fallback reconciliation interval (5 minutes)
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Fixed debounce window after an event wake (2 seconds)
pub const DEFAULT_DEBOUNCE_MILLIS: u64 = 2000;

/// Capacity of the bounded event queue between watcher and loop
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 32;

/// Number of event stream failures tolerated before the watcher gives up
pub const DEFAULT_WATCH_MAX_FAILURES: u32 = 1;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;

/// Thread name prefix for Tokio runtime workers
pub const TOKIO_THREAD_NAME: &str = "nomad-dns-controller";

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for the health and Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint
pub const HEALTH_SERVER_PATH: &str = "/health";

/// Path for the readiness endpoint
pub const READY_SERVER_PATH: &str = "/ready";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
