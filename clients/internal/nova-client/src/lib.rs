// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! OpenStack Compute (Nova) API Client
//!
//! A small hand-written client covering the endpoints the evacuation checks
//! need:
//!
//! - `GET /servers/{id}` - refresh a single instance
//! - `GET /servers/detail?host=..&all_tenants=1` - instances on a host
//! - `GET /os-hypervisors/detail` - compute hosts
//! - `POST /servers/{id}/action` with `os-migrateLive`
//!
//! Every request carries the Keystone token and pins the compute API
//! microversion (see [`nova_api::DEFAULT_MICROVERSION`]).
//!
//! ```ignore
//! use nova_client::NovaClient;
//!
//! let client = NovaClient::new(compute_url, session.token().clone(), Duration::from_secs(30))?;
//! for hv in client.list_hypervisors().await? {
//!     println!("{}", hv.hypervisor_hostname);
//! }
//! ```

use std::time::Duration;

use keystone_auth::AUTH_TOKEN_HEADER;
use nova_api::{
    DEFAULT_MICROVERSION, Fault, Hypervisor, HypervisorList, LiveMigrateAction,
    MICROVERSION_HEADER, Server, ServerEnvelope, ServerList,
};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

pub use nova_api as types;

/// Compute client errors
#[derive(Debug, Error)]
pub enum NovaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Compute API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode compute API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid compute URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Compute URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
}

/// Authenticated compute API client
#[derive(Clone, Debug)]
pub struct NovaClient {
    http: Client,
    base_url: Url,
    token: SecretString,
    microversion: String,
}

impl NovaClient {
    /// Create a client for the compute endpoint at `base_url` (as listed in
    /// the service catalog, e.g. `http://host:8774/v2.1`).
    pub fn new(base_url: &str, token: SecretString, timeout: Duration) -> Result<Self, NovaError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http_client(base_url, token, http)
    }

    /// Create a client on top of an existing reqwest client
    pub fn with_http_client(
        base_url: &str,
        token: SecretString,
        http: Client,
    ) -> Result<Self, NovaError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(NovaError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url,
            token,
            microversion: DEFAULT_MICROVERSION.to_string(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, NovaError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| NovaError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTH_TOKEN_HEADER, self.token.expose_secret())
            .header(MICROVERSION_HEADER, &self.microversion)
            .header(
                "OpenStack-API-Version",
                format!("compute {}", self.microversion),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn check(response: Response) -> Result<Response, NovaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = Fault::from_body(&body)
            .map(|f| f.message)
            .unwrap_or_else(|| body.trim().to_string());
        tracing::debug!(status = status.as_u16(), %message, "compute API error");
        Err(NovaError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, NovaError> {
        tracing::debug!(%url, "GET");
        let response = self.authorize(self.http.get(url)).send().await?;
        let body = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch the current state of a server
    pub async fn get_server(&self, id: &str) -> Result<Server, NovaError> {
        let url = self.url(&["servers", id])?;
        let envelope: ServerEnvelope = self.get_json(url).await?;
        Ok(envelope.server)
    }

    /// List servers of every project currently placed on `host`
    pub async fn list_servers_on_host(&self, host: &str) -> Result<Vec<Server>, NovaError> {
        let mut url = self.url(&["servers", "detail"])?;
        url.query_pairs_mut()
            .append_pair("host", host)
            .append_pair("all_tenants", "1");
        let list: ServerList = self.get_json(url).await?;
        Ok(list.servers)
    }

    /// List compute hosts, in the order the API returns them
    pub async fn list_hypervisors(&self) -> Result<Vec<Hypervisor>, NovaError> {
        let url = self.url(&["os-hypervisors", "detail"])?;
        let list: HypervisorList = self.get_json(url).await?;
        Ok(list.hypervisors)
    }

    /// Ask Nova to live-migrate a server. Returns once the request is
    /// accepted (202); the migration itself runs asynchronously.
    pub async fn live_migrate(
        &self,
        id: &str,
        host: Option<&str>,
        block_migration: bool,
    ) -> Result<(), NovaError> {
        let url = self.url(&["servers", id, "action"])?;
        let body = LiveMigrateAction::new(host.map(str::to_string), block_migration);
        tracing::debug!(%url, server = id, ?host, block_migration, "POST os-migrateLive");
        let response = self
            .authorize(self.http.post(url))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
