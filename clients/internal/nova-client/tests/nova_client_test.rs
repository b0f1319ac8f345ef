// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Request/response behaviour of `NovaClient` against a mocked compute API

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use nova_client::types::ServerStatus;
use nova_client::{NovaClient, NovaError};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn install_crypto_provider() {
    // reqwest is built without a bundled provider; mirror the binary's install.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

async fn setup() -> (MockServer, NovaClient) {
    install_crypto_provider();
    let server = MockServer::start().await;
    let client = NovaClient::new(
        &format!("{}/v2.1", server.uri()),
        SecretString::from("test-token".to_string()),
        Duration::from_secs(5),
    )
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn get_server_sends_token_and_microversion() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/vm1-id"))
        .and(header("X-Auth-Token", "test-token"))
        .and(header("X-OpenStack-Nova-API-Version", "2.25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "server": {
                "id": "vm1-id",
                "name": "vm1",
                "status": "MIGRATING",
                "OS-EXT-SRV-ATTR:host": "node-1",
                "addresses": {}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vm = client.get_server("vm1-id").await.unwrap();
    assert_eq!(vm.status, ServerStatus::Migrating);
    assert_eq!(vm.host.as_deref(), Some("node-1"));
}

#[tokio::test]
async fn hypervisors_keep_api_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/os-hypervisors/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hypervisors": [
                {"id": 2, "hypervisor_hostname": "node-3"},
                {"id": 1, "hypervisor_hostname": "node-1"},
                {"id": 3, "hypervisor_hostname": "node-2"}
            ]
        })))
        .mount(&server)
        .await;

    let names: Vec<String> = client
        .list_hypervisors()
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.hypervisor_hostname)
        .collect();
    assert_eq!(names, vec!["node-3", "node-1", "node-2"]);
}

#[tokio::test]
async fn servers_on_host_query_all_projects() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/detail"))
        .and(query_param("host", "node-1"))
        .and(query_param("all_tenants", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [
                {"id": "a", "name": "vm1", "status": "ACTIVE", "OS-EXT-SRV-ATTR:host": "node-1"},
                {"id": "b", "name": "vm2", "status": "ACTIVE", "OS-EXT-SRV-ATTR:host": "node-1"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let servers = client.list_servers_on_host("node-1").await.unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[1].name, "vm2");
}

#[tokio::test]
async fn live_migrate_posts_action_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2.1/servers/vm1-id/action"))
        .and(body_json(json!({
            "os-migrateLive": {"host": "node-2", "block_migration": true}
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    client
        .live_migrate("vm1-id", Some("node-2"), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn fault_envelope_becomes_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "itemNotFound": {"code": 404, "message": "Instance missing could not be found."}
        })))
        .mount(&server)
        .await;

    let err = client.get_server("missing").await.unwrap_err();
    match err {
        NovaError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Instance missing could not be found.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_migration_reports_reason() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2.1/servers/vm1-id/action"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "badRequest": {"code": 400, "message": "Compute service of node-9 is unavailable at this time."}
        })))
        .mount(&server)
        .await;

    let err = client
        .live_migrate("vm1-id", Some("node-9"), true)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Compute API returned 400: Compute service of node-9 is unavailable at this time."
    );
}
