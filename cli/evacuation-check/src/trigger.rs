// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Starting a host evacuation

use std::sync::Arc;

use async_trait::async_trait;
use nova_client::NovaError;
use serde::Serialize;
use thiserror::Error;

use crate::compute::ComputeApi;
use crate::nova_cli::{NovaCli, host_evacuate_live_args, parse_evacuate_table};

/// Outcome of the live-migration request for one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRequest {
    pub server_id: String,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("failed to launch evacuation command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("evacuation command exited with {}: {stderr}", exit_status(.status))]
    CommandFailed { status: Option<i32>, stderr: String },

    #[error("{} live-migration request(s) rejected: {}", rejected_count(.0), describe_rejections(.0))]
    Rejected(Vec<MigrationRequest>),

    #[error(transparent)]
    Compute(#[from] NovaError),
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn rejected_count(requests: &[MigrationRequest]) -> usize {
    requests.iter().filter(|r| !r.accepted).count()
}

fn describe_rejections(requests: &[MigrationRequest]) -> String {
    requests
        .iter()
        .filter(|r| !r.accepted)
        .map(|r| match &r.error {
            Some(e) => format!("{} ({e})", r.server_id),
            None => r.server_id.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_accepted(requests: Vec<MigrationRequest>) -> Result<Vec<MigrationRequest>, TriggerError> {
    if requests.iter().all(|r| r.accepted) {
        Ok(requests)
    } else {
        Err(TriggerError::Rejected(requests))
    }
}

/// Something that can move every instance off `source_host`
#[async_trait]
pub trait EvacuationTrigger: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    async fn evacuate(
        &self,
        source_host: &str,
        target_host: &str,
    ) -> Result<Vec<MigrationRequest>, TriggerError>;
}

/// Runs `nova host-evacuate-live --target-host <target> --block-migrate <source>`
#[derive(Debug, Clone, Default)]
pub struct NovaCliTrigger {
    pub cli: NovaCli,
}

impl NovaCliTrigger {
    pub fn new(cli: NovaCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl EvacuationTrigger for NovaCliTrigger {
    fn name(&self) -> &'static str {
        "nova-cli"
    }

    async fn evacuate(
        &self,
        source_host: &str,
        target_host: &str,
    ) -> Result<Vec<MigrationRequest>, TriggerError> {
        let stdout = self
            .cli
            .run(&host_evacuate_live_args(target_host, source_host))
            .await?;
        check_accepted(parse_evacuate_table(&stdout))
    }
}

/// Issues `os-migrateLive` for every server on the source host, the way
/// the CLI's `host-evacuate-live` does internally.
pub struct ApiTrigger {
    compute: Arc<dyn ComputeApi>,
    block_migration: bool,
}

impl ApiTrigger {
    pub fn new(compute: Arc<dyn ComputeApi>) -> Self {
        Self {
            compute,
            block_migration: true,
        }
    }
}

#[async_trait]
impl EvacuationTrigger for ApiTrigger {
    fn name(&self) -> &'static str {
        "compute-api"
    }

    async fn evacuate(
        &self,
        source_host: &str,
        target_host: &str,
    ) -> Result<Vec<MigrationRequest>, TriggerError> {
        let servers = self.compute.list_servers_on_host(source_host).await?;
        tracing::info!(
            source_host,
            target_host,
            count = servers.len(),
            "requesting live migrations"
        );

        let mut requests = Vec::with_capacity(servers.len());
        for server in servers {
            let result = self
                .compute
                .live_migrate(&server.id, Some(target_host), self.block_migration)
                .await;
            if let Err(e) = &result {
                tracing::warn!(server = %server.id, error = %e, "live migration rejected");
            }
            requests.push(MigrationRequest {
                server_id: server.id,
                accepted: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            });
        }
        check_accepted(requests)
    }
}
