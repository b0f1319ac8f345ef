// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! OpenStack Identity (Keystone v3) authentication
//!
//! Obtains a project-scoped token with the `password` method and exposes
//! the service catalog that comes back with it, so callers can locate the
//! compute endpoint without hard-coding URLs.
//!
//! # Authentication Flow
//!
//! 1. Build a [`KeystoneConfig`], usually from the `OS_*` variables of an
//!    openrc file
//! 2. Call [`authenticate`], which POSTs to `{auth_url}/auth/tokens`
//! 3. Read the token from the `X-Subject-Token` response header and the
//!    catalog from the body
//! 4. Resolve a service URL with [`Session::endpoint`]
//!
//! # Example
//!
//! ```ignore
//! use keystone_auth::{KeystoneConfig, Interface, authenticate};
//! use secrecy::SecretString;
//!
//! let password = SecretString::from("admin".to_string());
//! let config = KeystoneConfig::new("http://10.109.1.2:5000/v3", "admin", password, "admin");
//! let session = authenticate(&reqwest::Client::new(), &config).await?;
//! let nova_url = session.endpoint("compute", Interface::Public, None)?;
//! ```

pub mod catalog;
pub mod error;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use url::Url;

pub use catalog::{CatalogEntry, Endpoint, Interface, find_endpoint};
pub use error::AuthError;

/// Header Keystone returns the issued token in
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Header compute and other services expect the token in
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Password-method credentials and project scope
#[derive(Clone, Debug)]
pub struct KeystoneConfig {
    /// Identity endpoint, with or without a trailing `/v3`
    pub auth_url: String,
    pub username: String,
    pub password: SecretString,
    pub project_name: String,
    pub user_domain_name: String,
    pub project_domain_name: String,
}

impl KeystoneConfig {
    /// Create a config scoped to `project_name`, with both domains set to
    /// `Default`.
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            username: username.into(),
            password,
            project_name: project_name.into(),
            user_domain_name: "Default".to_string(),
            project_domain_name: "Default".to_string(),
        }
    }

    pub fn with_domains(
        mut self,
        user_domain_name: impl Into<String>,
        project_domain_name: impl Into<String>,
    ) -> Self {
        self.user_domain_name = user_domain_name.into();
        self.project_domain_name = project_domain_name.into();
        self
    }

    /// `{auth_url}/auth/tokens`, adding the `/v3` segment when the
    /// configured URL stops at the service root.
    pub fn tokens_url(&self) -> Result<Url, AuthError> {
        let trimmed = self.auth_url.trim_end_matches('/');
        let base = if trimmed.ends_with("/v3") {
            format!("{trimmed}/")
        } else {
            format!("{trimmed}/v3/")
        };
        Ok(Url::parse(&base)?.join("auth/tokens")?)
    }

    fn request_body(&self) -> serde_json::Value {
        json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": self.username,
                            "domain": {"name": self.user_domain_name},
                            "password": self.password.expose_secret(),
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": self.project_name,
                        "domain": {"name": self.project_domain_name},
                    }
                }
            }
        })
    }
}

/// An issued token and the catalog it is valid for
#[derive(Clone, Debug)]
pub struct Session {
    token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
    pub catalog: Vec<CatalogEntry>,
}

impl Session {
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn endpoint(
        &self,
        service_type: &str,
        interface: Interface,
        region: Option<&str>,
    ) -> Result<&str, AuthError> {
        find_endpoint(&self.catalog, service_type, interface, region)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Request a project-scoped token from Keystone
pub async fn authenticate(
    client: &reqwest::Client,
    config: &KeystoneConfig,
) -> Result<Session, AuthError> {
    let url = config.tokens_url()?;
    tracing::debug!(
        %url,
        user = %config.username,
        project = %config.project_name,
        "requesting keystone token"
    );

    let response = client
        .post(url)
        .json(&config.request_body())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let token = response
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| SecretString::from(v.to_string()))
        .ok_or(AuthError::MissingToken)?;

    let body = response.bytes().await?;
    let parsed: TokenResponse = serde_json::from_slice(&body)?;

    tracing::info!(
        expires_at = ?parsed.token.expires_at,
        services = parsed.token.catalog.len(),
        "obtained keystone token"
    );

    Ok(Session {
        token,
        expires_at: parsed.token.expires_at,
        catalog: parsed.token.catalog,
    })
}
