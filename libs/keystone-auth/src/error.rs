// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Error types for keystone-auth

use thiserror::Error;

/// Errors that can occur while authenticating against Keystone
#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport-level failure talking to the identity service
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured auth URL could not be parsed or joined
    #[error("Invalid auth URL: {0}")]
    Url(#[from] url::ParseError),

    /// Keystone answered with a non-success status
    #[error("Authentication rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The token response carried no `X-Subject-Token` header
    #[error("Identity service response had no X-Subject-Token header")]
    MissingToken,

    /// The response body did not have the expected shape
    #[error("Failed to decode token response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No catalog endpoint matched the requested service
    #[error(
        "No {interface} endpoint for service type '{service_type}'{}",
        region_suffix(.region)
    )]
    NoEndpoint {
        service_type: String,
        interface: String,
        region: Option<String>,
    },
}

fn region_suffix(region: &Option<String>) -> String {
    region
        .as_ref()
        .map(|r| format!(" in region '{r}'"))
        .unwrap_or_default()
}
