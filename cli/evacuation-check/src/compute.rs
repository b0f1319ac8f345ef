// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Compute API seam used by the evacuation flow

use async_trait::async_trait;
use nova_api::{Hypervisor, Server};
use nova_client::{NovaClient, NovaError};

/// The compute operations the evacuation flow and the API trigger rely on.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Re-read a server's current state
    async fn get_server(&self, id: &str) -> Result<Server, NovaError>;

    async fn list_hypervisors(&self) -> Result<Vec<Hypervisor>, NovaError>;

    async fn list_servers_on_host(&self, host: &str) -> Result<Vec<Server>, NovaError>;

    async fn live_migrate(
        &self,
        id: &str,
        host: Option<&str>,
        block_migration: bool,
    ) -> Result<(), NovaError>;
}

#[async_trait]
impl ComputeApi for NovaClient {
    async fn get_server(&self, id: &str) -> Result<Server, NovaError> {
        NovaClient::get_server(self, id).await
    }

    async fn list_hypervisors(&self) -> Result<Vec<Hypervisor>, NovaError> {
        NovaClient::list_hypervisors(self).await
    }

    async fn list_servers_on_host(&self, host: &str) -> Result<Vec<Server>, NovaError> {
        NovaClient::list_servers_on_host(self, host).await
    }

    async fn live_migrate(
        &self,
        id: &str,
        host: Option<&str>,
        block_migration: bool,
    ) -> Result<(), NovaError> {
        NovaClient::live_migrate(self, id, host, block_migration).await
    }
}
