// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! In-memory cloud for driving the evacuation flow
//!
//! - `FakeCloud` implements `ComputeApi`; live migrations it accepts finish
//!   after a configurable number of status polls
//! - `RecordingTrigger` evacuates through the fake cloud and remembers the
//!   hosts it was called with
//! - `RecordingCheck` records pings and fails those aimed at chosen IPs

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use evacuation_check::network_check::CheckError;
use evacuation_check::trigger::TriggerError;
use evacuation_check::{
    ComputeApi, ConnectivityCheck, EvacuationTrigger, Environment, Keypair, MigrationRequest,
};
use nova_api::{Hypervisor, Server, ServerStatus};
use nova_client::NovaError;

/// What a migrating server looks like once its polls run out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    /// `ACTIVE` on the requested target
    Active,
    /// `ERROR`, host unchanged
    Error,
    /// Never leaves `MIGRATING`
    Stuck,
    /// `ACTIVE`, but on some other host
    WrongHost(String),
    /// `ACTIVE`, with the host attribute no longer returned
    HostHidden,
}

#[derive(Debug, Clone)]
struct Migration {
    target: String,
    polls_left: usize,
}

#[derive(Debug, Default)]
struct CloudState {
    hypervisors: Vec<Hypervisor>,
    servers: Vec<Server>,
    migrations: BTreeMap<String, Migration>,
    rejected: HashSet<String>,
    migrate_calls: Vec<(String, Option<String>, bool)>,
    get_calls: usize,
}

pub struct FakeCloud {
    state: Mutex<CloudState>,
    polls_to_land: usize,
    landing: Landing,
}

pub fn hypervisor(id: usize, name: &str) -> Hypervisor {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "hypervisor_hostname": name,
        "state": "up",
        "status": "enabled",
    }))
    .unwrap()
}

pub fn server(name: &str, host: Option<&str>, fixed_ip: &str) -> Server {
    let mut value = serde_json::json!({
        "id": format!("{name}-id"),
        "name": name,
        "status": "ACTIVE",
        "addresses": {"net04": [
            {"addr": fixed_ip, "version": 4, "OS-EXT-IPS:type": "fixed"}
        ]},
    });
    if let Some(host) = host {
        value["OS-EXT-SRV-ATTR:host"] = serde_json::json!(host);
    }
    serde_json::from_value(value).unwrap()
}

impl FakeCloud {
    pub fn new(hypervisors: &[&str]) -> Self {
        let state = CloudState {
            hypervisors: hypervisors
                .iter()
                .enumerate()
                .map(|(i, name)| hypervisor(i + 1, name))
                .collect(),
            ..CloudState::default()
        };
        Self {
            state: Mutex::new(state),
            polls_to_land: 2,
            landing: Landing::Active,
        }
    }

    pub fn with_server(self, server: Server) -> Self {
        self.state.lock().unwrap().servers.push(server);
        self
    }

    /// Add `name` on `host` with fixed IP `ip`
    pub fn with_vm(self, name: &str, host: &str, ip: &str) -> Self {
        self.with_server(server(name, Some(host), ip))
    }

    pub fn with_landing(mut self, landing: Landing) -> Self {
        self.landing = landing;
        self
    }

    pub fn with_polls_to_land(mut self, polls: usize) -> Self {
        self.polls_to_land = polls;
        self
    }

    /// Make `os-migrateLive` fail for this server
    pub fn reject_migration(self, server_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected
            .insert(server_id.to_string());
        self
    }

    pub fn migrate_calls(&self) -> Vec<(String, Option<String>, bool)> {
        self.state.lock().unwrap().migrate_calls.clone()
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    fn start_migration(&self, id: &str, target: &str) -> Result<(), NovaError> {
        let mut state = self.state.lock().unwrap();
        if state.rejected.contains(id) {
            return Err(NovaError::Api {
                status: 400,
                message: format!("Migration pre-check error: {id} cannot be moved"),
            });
        }
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| NovaError::Api {
                status: 404,
                message: format!("Instance {id} could not be found."),
            })?;
        server.status = ServerStatus::Migrating;
        state.migrations.insert(
            id.to_string(),
            Migration {
                target: target.to_string(),
                polls_left: self.polls_to_land,
            },
        );
        Ok(())
    }

    /// Start migrations for everything on `source` that is not rejected
    pub fn evacuate_host(&self, source: &str, target: &str) -> Vec<MigrationRequest> {
        let ids: Vec<String> = {
            let state = self.state.lock().unwrap();
            state
                .servers
                .iter()
                .filter(|s| s.host.as_deref() == Some(source))
                .map(|s| s.id.clone())
                .collect()
        };
        ids.into_iter()
            .map(|id| {
                let result = self.start_migration(&id, target);
                MigrationRequest {
                    server_id: id,
                    accepted: result.is_ok(),
                    error: result.err().map(|e| e.to_string()),
                }
            })
            .collect()
    }
}

#[async_trait]
impl ComputeApi for FakeCloud {
    async fn get_server(&self, id: &str) -> Result<Server, NovaError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;

        let landed = match state.migrations.get_mut(id) {
            Some(m) if m.polls_left > 0 => {
                m.polls_left -= 1;
                None
            }
            Some(m) if self.landing != Landing::Stuck => Some(m.target.clone()),
            _ => None,
        };
        if let Some(target) = landed {
            state.migrations.remove(id);
            if let Some(server) = state.servers.iter_mut().find(|s| s.id == id) {
                match &self.landing {
                    Landing::Active => {
                        server.host = Some(target);
                        server.status = ServerStatus::Active;
                    }
                    Landing::Error => server.status = ServerStatus::Error,
                    Landing::WrongHost(host) => {
                        server.host = Some(host.clone());
                        server.status = ServerStatus::Active;
                    }
                    Landing::HostHidden => {
                        server.host = None;
                        server.status = ServerStatus::Active;
                    }
                    Landing::Stuck => {}
                }
            }
        }

        state
            .servers
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| NovaError::Api {
                status: 404,
                message: format!("Instance {id} could not be found."),
            })
    }

    async fn list_hypervisors(&self) -> Result<Vec<Hypervisor>, NovaError> {
        Ok(self.state.lock().unwrap().hypervisors.clone())
    }

    async fn list_servers_on_host(&self, host: &str) -> Result<Vec<Server>, NovaError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .servers
            .iter()
            .filter(|s| s.host.as_deref() == Some(host))
            .cloned()
            .collect())
    }

    async fn live_migrate(
        &self,
        id: &str,
        host: Option<&str>,
        block_migration: bool,
    ) -> Result<(), NovaError> {
        self.state.lock().unwrap().migrate_calls.push((
            id.to_string(),
            host.map(str::to_string),
            block_migration,
        ));
        self.start_migration(id, host.unwrap_or_default())
    }
}

/// Evacuates through a `FakeCloud`, as `nova host-evacuate-live` would
pub struct RecordingTrigger {
    cloud: Arc<FakeCloud>,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingTrigger {
    pub fn new(cloud: Arc<FakeCloud>) -> Self {
        Self {
            cloud,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(source, target)` of every evacuation requested
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvacuationTrigger for RecordingTrigger {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn evacuate(
        &self,
        source_host: &str,
        target_host: &str,
    ) -> Result<Vec<MigrationRequest>, TriggerError> {
        self.calls
            .lock()
            .unwrap()
            .push((source_host.to_string(), target_host.to_string()));
        Ok(self.cloud.evacuate_host(source_host, target_host))
    }
}

/// Remembers every ping and fails the ones aimed at `unreachable` IPs
#[derive(Default)]
pub struct RecordingCheck {
    pings: Mutex<Vec<(String, String)>>,
    unreachable: HashSet<String>,
}

impl RecordingCheck {
    pub fn unreachable(ip: &str) -> Self {
        Self {
            unreachable: HashSet::from([ip.to_string()]),
            ..Self::default()
        }
    }

    /// `(from server id, ip)` of every ping attempted
    pub fn pings(&self) -> Vec<(String, String)> {
        self.pings.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectivityCheck for RecordingCheck {
    async fn check_ping(
        &self,
        _env: &Environment,
        from: &Server,
        _keypair: &Keypair,
        ip_to_ping: &str,
    ) -> Result<(), CheckError> {
        self.pings
            .lock()
            .unwrap()
            .push((from.id.clone(), ip_to_ping.to_string()));
        if self.unreachable.contains(ip_to_ping) {
            return Err(CheckError::PingFailed {
                from: from.name.clone(),
                to: ip_to_ping.to_string(),
                detail: "1 packets transmitted, 0 received".to_string(),
            });
        }
        Ok(())
    }
}

pub fn keypair() -> Keypair {
    Keypair {
        private_key: PathBuf::from("/tmp/evacuation-test.pem"),
    }
}

pub fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| format!("{n}-id")).collect()
}
