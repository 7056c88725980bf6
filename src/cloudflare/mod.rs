// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cloudflare DNS provider integration.
//!
//! - [`DnsProvider`] - the four record operations the reconciliation core uses
//! - [`CloudflareClient`] - an HTTP implementation against the Cloudflare v4 API
//!
//! Only address records (`A` and `AAAA`) are ever listed or written.
//!
//! # Example
//!
//! ```rust,no_run
//! use nomad_dns_controller::cloudflare::{CloudflareClient, DnsProvider};
//! use nomad_dns_controller::config::Config;
//!
//! # async fn example(config: Config) -> anyhow::Result<()> {
//! let client = CloudflareClient::new(&config)?;
//! for record in client.list_records("lb.example.com").await? {
//!     println!("{} -> {}", record.name, record.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod pagination;
pub mod types;

pub use client::{record_kind, CloudflareClient};

use async_trait::async_trait;

use crate::errors::DnsProviderError;
use crate::types::DnsRecord;

/// Address-record operations on a single DNS zone.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the `A`/`AAAA` records named `name`.
    async fn list_records(&self, name: &str) -> Result<Vec<DnsRecord>, DnsProviderError>;

    /// Create an address record; the record type follows from `address`.
    async fn create_record(&self, name: &str, address: &str) -> Result<DnsRecord, DnsProviderError>;

    /// Point an existing record at a new address.
    async fn update_record(
        &self,
        id: &str,
        name: &str,
        address: &str,
    ) -> Result<DnsRecord, DnsProviderError>;

    /// Delete a record by provider id.
    async fn delete_record(&self, id: &str) -> Result<(), DnsProviderError>;
}
