// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the Nomad DNS controller.
//!
//! This module provides specialized error types for:
//! - Configuration loading and validation
//! - Nomad HTTP API operations (allocations, nodes, event stream)
//! - Cloudflare HTTP API operations (record listing and mutation)
//! - Reconciliation passes and the control loop's terminal result
//!
//! Errors follow the failure taxonomy of the controller: per-item failures are
//! logged and skipped by their callers, pass-level failures surface as
//! [`ReconcileError`], and only [`WatchError`] ends the control loop.

use thiserror::Error;

use crate::http_errors::REASON_UNREACHABLE;

/// Errors raised while loading or validating configuration.
///
/// These are always fatal: the process never starts the control loop with a
/// partially valid configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting has no value
    #[error("variable {variable} is not set and is required")]
    Missing {
        /// Environment variable backing the setting
        variable: &'static str,
    },

    /// A setting has a value that cannot be used
    #[error("variable {variable} is invalid: {reason}")]
    Invalid {
        /// Environment variable backing the setting
        variable: &'static str,
        /// Explanation of what is wrong with the value
        reason: String,
    },
}

/// Errors that can occur when talking to the Nomad HTTP API.
#[derive(Error, Debug, Clone)]
pub enum OrchestratorError {
    /// The request never produced an HTTP response
    #[error("failed to reach Nomad at {endpoint}: {reason}")]
    Connection {
        /// Request path that failed
        endpoint: String,
        /// Underlying transport error
        reason: String,
    },

    /// Nomad answered with a non-success status
    #[error("Nomad request {endpoint} failed: {message}")]
    Status {
        /// Request path that failed
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Classified reason from [`crate::http_errors`]
        reason: &'static str,
        /// Human-readable explanation, including the response body when present
        message: String,
    },

    /// The response body could not be decoded
    #[error("failed to decode Nomad response from {endpoint}: {reason}")]
    Decode {
        /// Request path whose body was malformed
        endpoint: String,
        /// Decoder error
        reason: String,
    },

    /// The event stream delivered an error frame or unreadable data
    #[error("Nomad event stream error: {reason}")]
    Stream {
        /// Error reported by the stream
        reason: String,
    },

    /// The server closed the event stream
    #[error("Nomad event stream closed by server")]
    StreamClosed,

    /// A request URL could not be built from the configured address
    #[error("invalid Nomad URL: {0}")]
    InvalidUrl(String),
}

impl OrchestratorError {
    /// Short category used as the `error_type` metric label.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Connection { .. } => REASON_UNREACHABLE,
            Self::Status { reason, .. } => reason,
            Self::Decode { .. } => "DecodeError",
            Self::Stream { .. } => "StreamError",
            Self::StreamClosed => "StreamClosed",
            Self::InvalidUrl(_) => "InvalidUrl",
        }
    }
}

/// Errors that can occur when talking to the Cloudflare DNS API.
#[derive(Error, Debug, Clone)]
pub enum DnsProviderError {
    /// The request never produced an HTTP response
    #[error("failed to reach Cloudflare during {operation}: {reason}")]
    Connection {
        /// Operation being performed (`list`, `create`, `update`, `delete`)
        operation: &'static str,
        /// Underlying transport error
        reason: String,
    },

    /// Cloudflare answered with a non-success status
    #[error("Cloudflare {operation} failed: {message}")]
    Status {
        /// Operation being performed
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Classified reason from [`crate::http_errors`]
        reason: &'static str,
        /// Human-readable explanation, including API error messages when present
        message: String,
    },

    /// Cloudflare answered 2xx but flagged the call as unsuccessful
    #[error("Cloudflare {operation} rejected: {messages}")]
    Api {
        /// Operation being performed
        operation: &'static str,
        /// Joined `code: message` entries from the response envelope
        messages: String,
    },

    /// The response body could not be decoded
    #[error("failed to decode Cloudflare {operation} response: {reason}")]
    Decode {
        /// Operation being performed
        operation: &'static str,
        /// Decoder error
        reason: String,
    },

    /// The record content is not an IPv4 or IPv6 address
    #[error("'{address}' is not a valid IPv4 or IPv6 address")]
    InvalidAddress {
        /// Offending content
        address: String,
    },

    /// A record id was required but empty
    #[error("record id must not be empty")]
    InvalidRecordId,

    /// A request URL could not be built from the configured base URL
    #[error("invalid Cloudflare URL: {0}")]
    InvalidUrl(String),
}

impl DnsProviderError {
    /// Short category used as the `error_type` metric label.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Connection { .. } => REASON_UNREACHABLE,
            Self::Status { reason, .. } => reason,
            Self::Api { .. } => "ApiRejected",
            Self::Decode { .. } => "DecodeError",
            Self::InvalidAddress { .. } => "InvalidAddress",
            Self::InvalidRecordId => "InvalidRecordId",
            Self::InvalidUrl(_) => "InvalidUrl",
        }
    }
}

/// Terminal failure of the event watcher.
///
/// Sent once to the control loop, which stops and returns it.
#[derive(Error, Debug, Clone)]
#[error("event watcher gave up after {attempts} failed attempt(s): {source}")]
pub struct WatchError {
    /// Number of stream sessions that failed
    pub attempts: u32,
    /// Error that ended the last session
    #[source]
    pub source: OrchestratorError,
}

/// Pass-level reconciliation failures.
///
/// A failed pass is reported through the metrics hook and retried by the next
/// trigger; it never stops the control loop.
#[derive(Error, Debug, Clone)]
pub enum ReconcileError {
    /// The job's allocations could not be listed
    #[error("failed to list allocations for job {job}: {source}")]
    ListAllocations {
        /// Job whose allocations were requested
        job: String,
        /// Underlying Nomad error
        #[source]
        source: OrchestratorError,
    },

    /// The hostname's current records could not be listed
    #[error("failed to list DNS records for {name}: {source}")]
    ListRecords {
        /// Hostname whose records were requested
        name: String,
        /// Underlying Cloudflare error
        #[source]
        source: DnsProviderError,
    },
}

impl ReconcileError {
    /// Short category used as the `error_type` metric label.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ListAllocations { source, .. } => source.error_type(),
            Self::ListRecords { source, .. } => source.error_type(),
        }
    }
}

/// Terminal result of the control loop.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The event watcher failed irrecoverably
    #[error(transparent)]
    Watch(#[from] WatchError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
