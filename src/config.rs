// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration.
//!
//! Every setting is read from an environment variable (the way the controller
//! is deployed as a Nomad job) and can be overridden with a command-line flag.
//! [`Config::load`] parses and validates in one step; a missing required value
//! stops the process before any client or loop is created.

use std::fmt;
use std::time::Duration;

use clap::Parser;

use crate::constants::{
    DEFAULT_CLOUDFLARE_API_URL, DEFAULT_DEBOUNCE_MILLIS, DEFAULT_DNS_RECORD_TTL_SECS,
    DEFAULT_EVENT_QUEUE_CAPACITY, DEFAULT_JOB_NAME, DEFAULT_NODE_ADDRESS_ATTRIBUTE,
    DEFAULT_NOMAD_ADDR, DEFAULT_NOMAD_NAMESPACE, DEFAULT_SYNC_INTERVAL_SECS,
    DEFAULT_WATCH_MAX_FAILURES, METRICS_SERVER_PORT,
};
use crate::errors::ConfigError;

/// Runtime configuration for the controller.
#[derive(Parser, Clone, PartialEq, Eq)]
#[command(name = "nomad-dns-controller", version, about)]
pub struct Config {
    /// Nomad HTTP API address
    #[arg(long, env = "NOMAD_ADDR", default_value = DEFAULT_NOMAD_ADDR)]
    pub nomad_address: String,

    /// Nomad ACL token
    #[arg(long, env = "NOMAD_TOKEN", default_value = "", hide_env_values = true)]
    pub nomad_token: String,

    /// Nomad namespace of the watched job
    #[arg(long, env = "NOMAD_NAMESPACE", default_value = DEFAULT_NOMAD_NAMESPACE)]
    pub nomad_namespace: String,

    /// Node attribute holding the public address
    #[arg(
        long,
        env = "NOMAD_NODE_ADDRESS_ATTRIBUTE",
        default_value = DEFAULT_NODE_ADDRESS_ATTRIBUTE
    )]
    pub node_address_attribute: String,

    /// Cloudflare API token with DNS edit permission on the zone
    #[arg(
        long,
        env = "CLOUDFLARE_API_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    pub cloudflare_token: String,

    /// Cloudflare zone id containing the record
    #[arg(long, env = "CLOUDFLARE_ZONE_ID", default_value = "")]
    pub cloudflare_zone_id: String,

    /// Cloudflare v4 API base URL
    #[arg(long, env = "CLOUDFLARE_API_URL", default_value = DEFAULT_CLOUDFLARE_API_URL)]
    pub cloudflare_api_url: String,

    /// Name of the reverse-proxy job whose nodes are published
    #[arg(long, env = "TRAEFIK_JOB_NAME", default_value = DEFAULT_JOB_NAME)]
    pub job_name: String,

    /// Fully qualified hostname kept in sync
    #[arg(long, env = "DNS_RECORD_NAME", default_value = "")]
    pub dns_record_name: String,

    /// TTL of created records; 1 means automatic
    #[arg(
        long,
        env = "DNS_RECORD_TTL",
        default_value_t = DEFAULT_DNS_RECORD_TTL_SECS,
        allow_negative_numbers = true
    )]
    pub dns_record_ttl: i64,

    /// Create records behind the Cloudflare proxy
    #[arg(long, env = "DNS_RECORD_PROXIED", default_value_t = false)]
    pub dns_record_proxied: bool,

    /// Port of the health and metrics server
    #[arg(long, env = "METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Seconds between fallback reconciliations
    #[arg(long, env = "SYNC_INTERVAL_SECS", default_value_t = DEFAULT_SYNC_INTERVAL_SECS)]
    pub sync_interval_secs: u64,

    /// Milliseconds to wait after an event before reconciling
    #[arg(long, env = "DEBOUNCE_MILLIS", default_value_t = DEFAULT_DEBOUNCE_MILLIS)]
    pub debounce_millis: u64,

    /// Capacity of the queue between the event watcher and the loop
    #[arg(long, env = "EVENT_QUEUE_CAPACITY", default_value_t = DEFAULT_EVENT_QUEUE_CAPACITY)]
    pub event_queue_capacity: usize,

    /// Event stream failures tolerated before the controller exits
    #[arg(long, env = "WATCH_MAX_FAILURES", default_value_t = DEFAULT_WATCH_MAX_FAILURES)]
    pub watch_max_failures: u32,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse configuration from the environment and command line, then validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first missing or invalid variable.
    /// Malformed flags (e.g. a non-numeric port) exit through clap's own reporting.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check that every required setting is present and usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first missing or invalid variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("CLOUDFLARE_API_TOKEN", &self.cloudflare_token)?;
        require("CLOUDFLARE_ZONE_ID", &self.cloudflare_zone_id)?;
        require("TRAEFIK_JOB_NAME", &self.job_name)?;
        require("DNS_RECORD_NAME", &self.dns_record_name)?;
        require("NOMAD_TOKEN", &self.nomad_token)?;
        require("NOMAD_ADDR", &self.nomad_address)?;

        if self.dns_record_ttl < 0 {
            return Err(ConfigError::Invalid {
                variable: "DNS_RECORD_TTL",
                reason: format!("must not be negative, got {}", self.dns_record_ttl),
            });
        }
        if self.sync_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                variable: "SYNC_INTERVAL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                variable: "EVENT_QUEUE_CAPACITY",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.watch_max_failures == 0 {
            return Err(ConfigError::Invalid {
                variable: "WATCH_MAX_FAILURES",
                reason: "must be at least 1".to_string(),
            });
        }
        for (variable, value) in [
            ("NOMAD_ADDR", &self.nomad_address),
            ("CLOUDFLARE_API_URL", &self.cloudflare_api_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                variable,
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Interval of the fallback timer.
    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    /// Debounce window after an event wake.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_millis)
    }
}

fn require(variable: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing { variable })
    } else {
        Ok(())
    }
}

// Tokens never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("nomad_address", &self.nomad_address)
            .field("nomad_token", &redact(&self.nomad_token))
            .field("nomad_namespace", &self.nomad_namespace)
            .field("node_address_attribute", &self.node_address_attribute)
            .field("cloudflare_token", &redact(&self.cloudflare_token))
            .field("cloudflare_zone_id", &self.cloudflare_zone_id)
            .field("cloudflare_api_url", &self.cloudflare_api_url)
            .field("job_name", &self.job_name)
            .field("dns_record_name", &self.dns_record_name)
            .field("dns_record_ttl", &self.dns_record_ttl)
            .field("dns_record_proxied", &self.dns_record_proxied)
            .field("metrics_port", &self.metrics_port)
            .field("sync_interval_secs", &self.sync_interval_secs)
            .field("debounce_millis", &self.debounce_millis)
            .field("event_queue_capacity", &self.event_queue_capacity)
            .field("watch_max_failures", &self.watch_max_failures)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
