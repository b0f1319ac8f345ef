// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Outcome of a successful evacuation check

use nova_api::{Server, ServerStatus};
use serde::Serialize;

use crate::trigger::MigrationRequest;

/// Final state of one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceOutcome {
    pub id: String,
    pub name: String,
    pub host: String,
    pub status: ServerStatus,
}

impl From<&Server> for InstanceOutcome {
    fn from(server: &Server) -> Self {
        Self {
            id: server.id.clone(),
            name: server.name.clone(),
            host: server.host.clone().unwrap_or_default(),
            status: server.status.clone(),
        }
    }
}

/// A ping that got a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingOutcome {
    /// Instance the ping ran inside
    pub from: String,
    /// Instance that was pinged
    pub to: String,
    pub ip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvacuationReport {
    pub source_host: String,
    pub target_host: String,
    pub trigger: String,
    /// Per-server requests, when the trigger reports them
    pub migration_requests: Vec<MigrationRequest>,
    pub instances: Vec<InstanceOutcome>,
    pub pings: Vec<PingOutcome>,
    /// Middle element of an odd-length instance list, never pinged
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_self_pairs: Vec<String>,
    pub converged_after_secs: f64,
}
