// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests
//!
//! Fake Nomad and Cloudflare APIs served by `wiremock`.

#![allow(dead_code)]

use nomad_dns_controller::cloudflare::CloudflareClient;
use nomad_dns_controller::nomad::NomadClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const JOB: &str = "traefik";
pub const RECORD_NAME: &str = "lb.example.com";
pub const ZONE: &str = "zone-123";
pub const RECORDS_PATH: &str = "/client/v4/zones/zone-123/dns_records";
pub const ADDRESS_ATTRIBUTE: &str = "unique.platform.aws.public-ipv4";

pub fn nomad_client(server: &MockServer) -> NomadClient {
    NomadClient::with_http_client(
        reqwest::Client::new(),
        &server.uri(),
        "nomad-secret",
        "default",
        ADDRESS_ATTRIBUTE,
    )
    .expect("valid Nomad address")
}

pub fn cloudflare_client(server: &MockServer) -> CloudflareClient {
    CloudflareClient::with_http_client(
        reqwest::Client::new(),
        &format!("{}/client/v4", server.uri()),
        "cf-secret",
        ZONE,
        1,
        false,
    )
    .expect("valid Cloudflare address")
}

pub fn allocation(id: &str, node_id: &str, status: &str) -> Value {
    json!({ "ID": id, "NodeID": node_id, "JobID": JOB, "ClientStatus": status })
}

pub fn record(id: &str, content: &str) -> Value {
    json!({
        "id": id,
        "name": RECORD_NAME,
        "type": "A",
        "content": content,
        "ttl": 1,
        "proxied": false
    })
}

pub fn envelope(result: Value) -> Value {
    json!({ "success": true, "errors": [], "result": result })
}

/// Serve the job's allocations.
pub async fn mount_allocations(server: &MockServer, allocations: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/job/{JOB}/allocations")))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(allocations)))
        .mount(server)
        .await;
}

/// Serve one node with the given status and public address.
pub async fn mount_node(server: &MockServer, id: &str, status: &str, address: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/node/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": id,
            "Name": format!("{id}-name"),
            "Status": status,
            "Attributes": { ADDRESS_ATTRIBUTE: address }
        })))
        .mount(server)
        .await;
}

/// Serve a single page of existing records.
pub async fn mount_records(server: &MockServer, records: Vec<Value>) {
    let count = records.len();
    Mock::given(method("GET"))
        .and(path(RECORDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": records,
            "result_info": { "page": 1, "per_page": 100, "total_pages": 1, "total_count": count }
        })))
        .mount(server)
        .await;
}
