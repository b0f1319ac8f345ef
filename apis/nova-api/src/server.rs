// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Server (instance) records

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::EnumString;

/// Server status as reported in the `status` field.
///
/// Nova adds statuses over time, so anything unrecognised is kept verbatim
/// in [`ServerStatus::Other`] instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Active,
    Build,
    Deleted,
    Error,
    HardReboot,
    Migrating,
    Password,
    Paused,
    Reboot,
    Rebuild,
    Rescue,
    Resize,
    RevertResize,
    Shelved,
    ShelvedOffloaded,
    Shutoff,
    SoftDeleted,
    Suspended,
    Unknown,
    VerifyResize,
    #[strum(default)]
    Other(String),
}

impl ServerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Build => "BUILD",
            Self::Deleted => "DELETED",
            Self::Error => "ERROR",
            Self::HardReboot => "HARD_REBOOT",
            Self::Migrating => "MIGRATING",
            Self::Password => "PASSWORD",
            Self::Paused => "PAUSED",
            Self::Reboot => "REBOOT",
            Self::Rebuild => "REBUILD",
            Self::Rescue => "RESCUE",
            Self::Resize => "RESIZE",
            Self::RevertResize => "REVERT_RESIZE",
            Self::Shelved => "SHELVED",
            Self::ShelvedOffloaded => "SHELVED_OFFLOADED",
            Self::Shutoff => "SHUTOFF",
            Self::SoftDeleted => "SOFT_DELETED",
            Self::Suspended => "SUSPENDED",
            Self::Unknown => "UNKNOWN",
            Self::VerifyResize => "VERIFY_RESIZE",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ServerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServerStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // The `Other` fallback makes parsing infallible.
        Ok(ServerStatus::from_str(&raw).unwrap_or(ServerStatus::Other(raw)))
    }
}

/// Kind of address attached to a server port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Fixed,
    Floating,
}

/// One entry of a server's `addresses` map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub addr: String,
    pub version: u8,
    /// Absent on clouds without the extended-IPs extension
    #[serde(
        rename = "OS-EXT-IPS:type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<AddressType>,
    #[serde(
        rename = "OS-EXT-IPS-MAC:mac_addr",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mac_addr: Option<String>,
}

/// A compute instance as returned by `GET /servers/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    /// Compute host the instance currently runs on. Only visible to admins.
    #[serde(
        rename = "OS-EXT-SRV-ATTR:host",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub host: Option<String>,
    #[serde(
        rename = "OS-EXT-SRV-ATTR:hypervisor_hostname",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hypervisor_hostname: Option<String>,
    #[serde(
        rename = "OS-EXT-STS:task_state",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub task_state: Option<String>,
    /// Network name to addresses on that network
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<ServerAddress>>,
}

/// Addresses of an instance split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceIps {
    pub fixed: Option<String>,
    pub floating: Option<String>,
}

impl Server {
    pub fn is_active(&self) -> bool {
        self.status == ServerStatus::Active
    }

    /// First fixed and first floating address, walking networks in name
    /// order. Addresses without an `OS-EXT-IPS:type` count as fixed.
    pub fn ips(&self) -> InstanceIps {
        let mut ips = InstanceIps::default();
        for addr in self.addresses.values().flatten() {
            let slot = match addr.kind {
                Some(AddressType::Floating) => &mut ips.floating,
                Some(AddressType::Fixed) | None => &mut ips.fixed,
            };
            if slot.is_none() {
                *slot = Some(addr.addr.clone());
            }
        }
        ips
    }
}

/// `{"server": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEnvelope {
    pub server: Server,
}

/// `{"servers": [...]}` from `GET /servers/detail`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerList {
    pub servers: Vec<Server>,
}
