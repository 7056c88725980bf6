// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP error code mapping to failure reasons.
//!
//! This module provides utilities for mapping HTTP status codes returned by the
//! Nomad and Cloudflare APIs to short, stable reason identifiers. The reasons are
//! embedded in error messages and used as the `error_type` metric label, so a
//! failing pass can be traced to "auth", "rate limit" or "upstream down" without
//! reading response bodies.
//!
//! # Usage
//!
//! ```rust
//! use nomad_dns_controller::http_errors::map_http_error_to_reason;
//!
//! let (reason, message) = map_http_error_to_reason("Cloudflare", 403);
//! assert_eq!(reason, "AuthFailed");
//! assert!(message.contains("403"));
//!
//! let (reason, _) = map_http_error_to_reason("Nomad", 429);
//! assert_eq!(reason, "RateLimited");
//! ```

/// Request was malformed (400).
pub const REASON_BAD_REQUEST: &str = "BadRequest";

/// Credentials missing or rejected (401, 403).
pub const REASON_AUTH_FAILED: &str = "AuthFailed";

/// Requested object does not exist (404).
pub const REASON_NOT_FOUND: &str = "NotFound";

/// Upstream is throttling requests (429).
pub const REASON_RATE_LIMITED: &str = "RateLimited";

/// Upstream failed internally (500, 501).
pub const REASON_SERVER_ERROR: &str = "ServerError";

/// A proxy in front of the upstream failed (502, 503, 504).
pub const REASON_GATEWAY_ERROR: &str = "GatewayError";

/// Any other non-success status.
pub const REASON_UNEXPECTED_STATUS: &str = "UnexpectedStatus";

/// No HTTP status was received at all.
pub const REASON_UNREACHABLE: &str = "Unreachable";

/// Map HTTP status code to failure reason and message.
///
/// # Arguments
///
/// * `service` - Human-readable upstream name used in the message (e.g. `Nomad`)
/// * `status_code` - HTTP status code (e.g., 400, 404, 500)
///
/// # Returns
///
/// A tuple of `(reason, message)`.
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Reason |
/// |-----------|--------|
/// | 400 | `BadRequest` |
/// | 401, 403 | `AuthFailed` |
/// | 404 | `NotFound` |
/// | 429 | `RateLimited` |
/// | 500, 501 | `ServerError` |
/// | 502, 503, 504 | `GatewayError` |
/// | Other | `UnexpectedStatus` |
#[must_use]
pub fn map_http_error_to_reason(service: &str, status_code: u16) -> (&'static str, String) {
    match status_code {
        400 => (
            REASON_BAD_REQUEST,
            format!("Invalid request to {service} API (400)"),
        ),
        401 => (
            REASON_AUTH_FAILED,
            format!("{service} authentication required (401)"),
        ),
        403 => (
            REASON_AUTH_FAILED,
            format!("{service} authorization failed (403)"),
        ),
        404 => (
            REASON_NOT_FOUND,
            format!("Resource not found in {service} (404)"),
        ),
        429 => (
            REASON_RATE_LIMITED,
            format!("{service} API rate limit exceeded (429)"),
        ),
        500 => (
            REASON_SERVER_ERROR,
            format!("{service} API internal error (500)"),
        ),
        501 => (
            REASON_SERVER_ERROR,
            format!("Operation not supported by {service} (501)"),
        ),
        502 => (
            REASON_GATEWAY_ERROR,
            format!("Bad gateway reaching {service} (502)"),
        ),
        503 => (
            REASON_GATEWAY_ERROR,
            format!("{service} service unavailable (503)"),
        ),
        504 => (
            REASON_GATEWAY_ERROR,
            format!("Gateway timeout reaching {service} (504)"),
        ),
        _ => (
            REASON_UNEXPECTED_STATUS,
            format!("Unexpected HTTP status from {service} ({status_code})"),
        ),
    }
}

/// Map a connection failure (no HTTP status received) to a reason and message.
///
/// Use this when the HTTP client cannot reach the upstream at all: DNS
/// resolution failure, refused connection, TLS failure or timeout.
#[must_use]
pub fn map_connection_error(service: &str) -> (&'static str, String) {
    (
        REASON_UNREACHABLE,
        format!("Cannot connect to {service} API"),
    )
}

#[cfg(test)]
#[path = "http_errors_tests.rs"]
mod http_errors_tests;
