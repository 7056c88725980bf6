// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP client for the Cloudflare v4 DNS records API.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::pagination::{list_all_pages, Page};
use super::types::{join_messages, ApiEnvelope, CloudflareRecord, RecordRequest};
use super::DnsProvider;
use crate::config::Config;
use crate::constants::{
    CLOUDFLARE_LIST_PAGE_SIZE, HTTP_REQUEST_TIMEOUT_SECS, RECORD_TYPE_A, RECORD_TYPE_AAAA,
};
use crate::errors::DnsProviderError;
use crate::http_errors::{map_connection_error, map_http_error_to_reason};
use crate::types::DnsRecord;

const SERVICE: &str = "Cloudflare";

/// Operation labels used in errors, logs and metrics.
pub const OPERATION_LIST: &str = "list";
pub const OPERATION_CREATE: &str = "create";
pub const OPERATION_UPDATE: &str = "update";
pub const OPERATION_DELETE: &str = "delete";

/// Record type for an address: `A` for IPv4, `AAAA` for IPv6.
///
/// # Errors
///
/// Returns [`DnsProviderError::InvalidAddress`] if `address` is neither.
pub fn record_kind(address: &str) -> Result<&'static str, DnsProviderError> {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => Ok(RECORD_TYPE_A),
        Ok(IpAddr::V6(_)) => Ok(RECORD_TYPE_AAAA),
        Err(_) => Err(DnsProviderError::InvalidAddress {
            address: address.to_string(),
        }),
    }
}

/// Cloudflare API client scoped to one zone.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: HttpClient,
    base_url: Url,
    token: String,
    zone_id: String,
    ttl: i64,
    proxied: bool,
}

impl CloudflareClient {
    /// Create a client from the controller configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(config: &Config) -> Result<Self, DnsProviderError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DnsProviderError::Connection {
                operation: "connect",
                reason: e.to_string(),
            })?;

        Self::with_http_client(
            http,
            &config.cloudflare_api_url,
            &config.cloudflare_token,
            &config.cloudflare_zone_id,
            config.dns_record_ttl,
            config.dns_record_proxied,
        )
    }

    /// Create a client around an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid base URL.
    pub fn with_http_client(
        http: HttpClient,
        api_url: &str,
        token: &str,
        zone_id: &str,
        ttl: i64,
        proxied: bool,
    ) -> Result<Self, DnsProviderError> {
        let base_url = Url::parse(api_url)
            .map_err(|e| DnsProviderError::InvalidUrl(format!("{api_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DnsProviderError::InvalidUrl(api_url.to_string()));
        }

        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
            zone_id: zone_id.to_string(),
            ttl,
            proxied,
        })
    }

    /// `<base>/zones/<zone>/dns_records[/<id>]`
    fn records_url(&self, record_id: Option<&str>) -> Result<Url, DnsProviderError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| DnsProviderError::InvalidUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["zones", self.zone_id.as_str(), "dns_records"]);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn execute<T, B>(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<ApiEnvelope<T>, DnsProviderError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.http.request(method, url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let (_, message) = map_connection_error(SERVICE);
            DnsProviderError::Connection {
                operation,
                reason: format!("{message}: {e}"),
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DnsProviderError::Connection {
                operation,
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            let (reason, message) = map_http_error_to_reason(SERVICE, status.as_u16());
            let details = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&bytes)
                .map(|envelope| join_messages(&envelope.errors))
                .unwrap_or_default();
            let message = if details.is_empty() {
                message
            } else {
                format!("{message}: {details}")
            };
            return Err(DnsProviderError::Status {
                operation,
                status: status.as_u16(),
                reason,
                message,
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| DnsProviderError::Decode {
                operation,
                reason: e.to_string(),
            })?;

        if !envelope.success {
            return Err(DnsProviderError::Api {
                operation,
                messages: join_messages(&envelope.errors),
            });
        }

        Ok(envelope)
    }

    async fn list_page(&self, name: &str, page: u32) -> Result<Page<CloudflareRecord>, DnsProviderError> {
        let mut url = self.records_url(None)?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_pair("per_page", &CLOUDFLARE_LIST_PAGE_SIZE.to_string())
            .append_pair("page", &page.to_string());

        let envelope: ApiEnvelope<Vec<CloudflareRecord>> = self
            .execute::<_, ()>(OPERATION_LIST, Method::GET, url, None)
            .await?;

        Ok(Page {
            items: envelope.result.unwrap_or_default(),
            total_pages: envelope.result_info.map_or(0, |info| info.total_pages),
        })
    }

    async fn write_record(
        &self,
        operation: &'static str,
        method: Method,
        record_id: Option<&str>,
        name: &str,
        address: &str,
    ) -> Result<DnsRecord, DnsProviderError> {
        let kind = record_kind(address)?;
        let body = RecordRequest {
            kind,
            name,
            content: address,
            ttl: self.ttl,
            proxied: self.proxied,
        };

        let url = self.records_url(record_id)?;
        let envelope: ApiEnvelope<CloudflareRecord> =
            self.execute(operation, method, url, Some(&body)).await?;

        envelope
            .result
            .map(DnsRecord::from)
            .ok_or_else(|| DnsProviderError::Decode {
                operation,
                reason: "response has no result".to_string(),
            })
    }
}

#[async_trait]
impl DnsProvider for CloudflareClient {
    async fn list_records(&self, name: &str) -> Result<Vec<DnsRecord>, DnsProviderError> {
        let records = list_all_pages(|page| self.list_page(name, page)).await?;

        let records: Vec<DnsRecord> = records
            .into_iter()
            .filter(|r| r.kind == RECORD_TYPE_A || r.kind == RECORD_TYPE_AAAA)
            .map(DnsRecord::from)
            .collect();

        for record in records.iter().filter(|r| !r.has_valid_ttl()) {
            warn!(
                record_id = %record.id,
                ttl = record.ttl,
                "Address record reports a negative TTL"
            );
        }

        debug!(name = %name, count = records.len(), "Listed address records");
        Ok(records)
    }

    async fn create_record(&self, name: &str, address: &str) -> Result<DnsRecord, DnsProviderError> {
        let record = self
            .write_record(OPERATION_CREATE, Method::POST, None, name, address)
            .await?;
        info!(
            name = %record.name,
            kind = %record.kind,
            content = %record.content,
            record_id = %record.id,
            "Created DNS record"
        );
        Ok(record)
    }

    async fn update_record(
        &self,
        id: &str,
        name: &str,
        address: &str,
    ) -> Result<DnsRecord, DnsProviderError> {
        if id.is_empty() {
            return Err(DnsProviderError::InvalidRecordId);
        }
        let record = self
            .write_record(OPERATION_UPDATE, Method::PUT, Some(id), name, address)
            .await?;
        info!(
            name = %record.name,
            content = %record.content,
            record_id = %record.id,
            "Updated DNS record"
        );
        Ok(record)
    }

    async fn delete_record(&self, id: &str) -> Result<(), DnsProviderError> {
        if id.is_empty() {
            return Err(DnsProviderError::InvalidRecordId);
        }
        let url = self.records_url(Some(id))?;
        self.execute::<serde_json::Value, ()>(OPERATION_DELETE, Method::DELETE, url, None)
            .await?;
        info!(record_id = %id, "Deleted DNS record");
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
