// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Hypervisor (compute host) records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A compute host from `GET /os-hypervisors/detail`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypervisor {
    /// Integer before microversion 2.53, UUID string after
    pub id: Value,
    pub hypervisor_hostname: String,
    /// `up` or `down`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// `enabled` or `disabled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
}

/// `{"hypervisors": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypervisorList {
    pub hypervisors: Vec<Hypervisor>,
}
