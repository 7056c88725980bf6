// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP client for the Nomad API.
//!
//! Implements [`Orchestrator`] with three endpoints:
//!
//! - `GET /v1/job/:job/allocations?all=true`
//! - `GET /v1/node/:id`
//! - `GET /v1/event/stream` (newline-delimited JSON, kept open)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::types::{AllocationStub, EventFrame, EventTopics, NodeRecord};
use super::{EventStream, Orchestrator};
use crate::config::Config;
use crate::constants::{HTTP_REQUEST_TIMEOUT_SECS, NOMAD_TOKEN_HEADER};
use crate::errors::OrchestratorError;
use crate::http_errors::{map_connection_error, map_http_error_to_reason};
use crate::types::ClusterNode;

const SERVICE: &str = "Nomad";

/// Nomad API client.
#[derive(Debug, Clone)]
pub struct NomadClient {
    http: HttpClient,
    base_url: Url,
    token: String,
    namespace: String,
    address_attribute: String,
}

impl NomadClient {
    /// Create a client from the controller configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured address is not a valid base URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, OrchestratorError> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| OrchestratorError::Connection {
                endpoint: config.nomad_address.clone(),
                reason: e.to_string(),
            })?;

        Self::with_http_client(
            http,
            &config.nomad_address,
            &config.nomad_token,
            &config.nomad_namespace,
            &config.node_address_attribute,
        )
    }

    /// Create a client around an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is not a valid base URL.
    pub fn with_http_client(
        http: HttpClient,
        address: &str,
        token: &str,
        namespace: &str,
        address_attribute: &str,
    ) -> Result<Self, OrchestratorError> {
        let base_url = Url::parse(address)
            .map_err(|e| OrchestratorError::InvalidUrl(format!("{address}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(OrchestratorError::InvalidUrl(address.to_string()));
        }

        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
            namespace: namespace.to_string(),
            address_attribute: address_attribute.to_string(),
        })
    }

    /// Build `<base>/v1/<segments...>?namespace=<ns>`, escaping each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, OrchestratorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| OrchestratorError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        if !self.namespace.is_empty() {
            url.query_pairs_mut()
                .append_pair("namespace", &self.namespace);
        }
        Ok(url)
    }

    async fn send(&self, url: Url, timeout: Option<Duration>) -> Result<reqwest::Response, OrchestratorError> {
        let endpoint = url.path().to_string();
        let mut request = self.http.get(url);
        if !self.token.is_empty() {
            request = request.header(NOMAD_TOKEN_HEADER, &self.token);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            let (_, message) = map_connection_error(SERVICE);
            OrchestratorError::Connection {
                endpoint: endpoint.clone(),
                reason: format!("{message}: {e}"),
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (reason, message) = map_http_error_to_reason(SERVICE, status.as_u16());
        let message = if body.trim().is_empty() {
            message
        } else {
            format!("{message}: {}", body.trim())
        };
        Err(OrchestratorError::Status {
            endpoint,
            status: status.as_u16(),
            reason,
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, OrchestratorError> {
        let endpoint = url.path().to_string();
        let response = self
            .send(url, Some(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS)))
            .await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| OrchestratorError::Connection {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        serde_json::from_slice(&body).map_err(|e| OrchestratorError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Orchestrator for NomadClient {
    async fn job_allocations(&self, job: &str) -> Result<Vec<AllocationStub>, OrchestratorError> {
        let mut url = self.endpoint(&["job", job, "allocations"])?;
        url.query_pairs_mut().append_pair("all", "true");

        let allocations: Vec<AllocationStub> = self.get_json(url).await?;
        debug!(job = %job, count = allocations.len(), "Listed job allocations");
        Ok(allocations)
    }

    async fn node(&self, node_id: &str) -> Result<ClusterNode, OrchestratorError> {
        let url = self.endpoint(&["node", node_id])?;
        let record: NodeRecord = self.get_json(url).await?;
        Ok(record.into_cluster_node(&self.address_attribute))
    }

    async fn event_stream(&self, topics: &EventTopics) -> Result<EventStream, OrchestratorError> {
        let mut url = self.endpoint(&["event", "stream"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("index", "0");
            for topic in topics.query_values() {
                query.append_pair("topic", &topic);
            }
        }

        info!(topics = ?topics.query_values(), "Opening Nomad event stream");
        let response = self.send(url, None).await?;
        Ok(frame_stream(response))
    }
}

struct FrameReader {
    response: reqwest::Response,
    buffer: Vec<u8>,
    finished: bool,
}

/// Turn a streaming response body into a stream of decoded frames.
///
/// The stream yields at most one error and then ends; end of body is reported
/// as [`OrchestratorError::StreamClosed`].
fn frame_stream(response: reqwest::Response) -> EventStream {
    let reader = FrameReader {
        response,
        buffer: Vec::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(pos) = reader.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = reader.buffer.drain(..=pos).collect();
                match parse_frame(&line) {
                    Ok(Some(frame)) => return Some((Ok(frame), reader)),
                    Ok(None) => continue,
                    Err(e) => {
                        reader.finished = true;
                        reader.buffer.clear();
                        return Some((Err(e), reader));
                    }
                }
            }

            if reader.finished {
                return None;
            }

            match reader.response.chunk().await {
                Ok(Some(bytes)) => reader.buffer.extend_from_slice(&bytes),
                Ok(None) => {
                    reader.finished = true;
                    reader.buffer.clear();
                    return Some((Err(OrchestratorError::StreamClosed), reader));
                }
                Err(e) => {
                    reader.finished = true;
                    reader.buffer.clear();
                    return Some((
                        Err(OrchestratorError::Stream {
                            reason: e.to_string(),
                        }),
                        reader,
                    ));
                }
            }
        }
    }))
}

/// Decode one line of the event stream.
///
/// Blank lines yield `None`. `{}` heartbeats come back as an empty frame so
/// the consumer can tell the stream is alive. An `Error` frame or malformed
/// JSON is a stream error.
pub(crate) fn parse_frame(line: &[u8]) -> Result<Option<EventFrame>, OrchestratorError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| OrchestratorError::Stream {
            reason: format!("malformed event frame: {e}"),
        })?;

    if let Some(error) = value.get("Error").filter(|e| !e.is_null()) {
        let reason = error
            .as_str()
            .map_or_else(|| error.to_string(), ToString::to_string);
        return Err(OrchestratorError::Stream { reason });
    }

    if value.as_object().is_some_and(serde_json::Map::is_empty) {
        return Ok(Some(EventFrame::default()));
    }

    let frame: EventFrame =
        serde_json::from_value(value).map_err(|e| OrchestratorError::Stream {
            reason: format!("malformed event frame: {e}"),
        })?;
    Ok(Some(frame))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
