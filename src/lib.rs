// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Nomad DNS Controller
//!
//! Keeps a Cloudflare hostname's address records pointed at exactly the Nomad
//! nodes that currently run a reverse-proxy job (Traefik by default).
//!
//! ## Overview
//!
//! The controller reconciles DNS against the cluster:
//!
//! - at startup, once
//! - after Nomad events for the job, its allocations or nodes (debounced)
//! - on a periodic fallback timer
//!
//! Each pass lists the job's running allocations, resolves their nodes, keeps
//! the ready nodes that have a public address, and then creates or deletes
//! `A`/`AAAA` records so the hostname resolves to exactly those addresses.
//!
//! ## Modules
//!
//! - [`controller`] - the control loop and its triggers
//! - [`reconcilers`] - node resolution, record diffing and convergence
//! - [`nomad`] - Nomad API client and event source adapter
//! - [`cloudflare`] - Cloudflare DNS API client
//! - [`metrics`] - Prometheus metrics and the reconciliation observer hooks
//! - [`health`] - `/health`, `/ready` and `/metrics` HTTP endpoints
//! - [`config`] - environment and command-line configuration
//!
//! ## Example
//!
//! ```rust
//! use nomad_dns_controller::reconcilers::compute_diff;
//! use nomad_dns_controller::types::{DesiredState, DnsRecord};
//!
//! let desired: DesiredState = ["1.1.1.1".to_string(), "3.3.3.3".to_string()].into();
//! let observed = vec![
//!     DnsRecord {
//!         id: "a".to_string(),
//!         name: "lb.example.com".to_string(),
//!         kind: "A".to_string(),
//!         content: "1.1.1.1".to_string(),
//!         ttl: 1,
//!     },
//!     DnsRecord {
//!         id: "b".to_string(),
//!         name: "lb.example.com".to_string(),
//!         kind: "A".to_string(),
//!         content: "2.2.2.2".to_string(),
//!         ttl: 1,
//!     },
//! ];
//!
//! let diff = compute_diff(&desired, &observed);
//! assert_eq!(diff.to_create, vec!["3.3.3.3".to_string()]);
//! assert_eq!(diff.to_delete[0].id, "b");
//! ```

pub mod cloudflare;
pub mod config;
pub mod constants;
pub mod controller;
pub mod errors;
pub mod health;
pub mod http_errors;
pub mod metrics;
pub mod nomad;
pub mod reconcilers;
pub mod shutdown;
pub mod types;
