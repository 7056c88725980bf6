// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types for the Cloudflare v4 DNS records API.

use serde::{Deserialize, Serialize};

use crate::types::DnsRecord;

/// Response envelope wrapped around every Cloudflare v4 result.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

/// One entry of the envelope's `errors` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Join envelope errors into `code: message` entries separated by `; `.
#[must_use]
pub fn join_messages(messages: &[ApiMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Paging metadata returned by list calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u32,
}

/// A DNS record as returned by Cloudflare.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CloudflareRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub ttl: i64,
    #[serde(default)]
    pub proxied: bool,
}

impl From<CloudflareRecord> for DnsRecord {
    fn from(record: CloudflareRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            kind: record.kind,
            content: record.content,
            ttl: record.ttl,
        }
    }
}

/// Body of a create or update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    /// Omitted when 0 so the provider applies its automatic TTL
    #[serde(skip_serializing_if = "is_unset_ttl")]
    pub ttl: i64,
    pub proxied: bool,
}

fn is_unset_ttl(ttl: &i64) -> bool {
    *ttl == 0
}
