// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Typed records for the subset of the OpenStack Compute (Nova) v2.1 API
//! used by the evacuation checks.
//!
//! Nova exposes admin-only placement data through extension attributes with
//! namespaced keys such as `OS-EXT-SRV-ATTR:host`. Those are modelled here as
//! ordinary typed fields with serde renames, so consumers never do dynamic
//! key lookups on raw JSON.
//!
//! Response bodies are wrapped in single-key envelopes (`{"server": {...}}`,
//! `{"hypervisors": [...]}`); the envelope types are exported alongside the
//! records they carry.

pub mod actions;
pub mod fault;
pub mod hypervisor;
pub mod server;

pub use actions::{LiveMigrate, LiveMigrateAction};
pub use fault::Fault;
pub use hypervisor::{Hypervisor, HypervisorList};
pub use server::{
    AddressType, InstanceIps, Server, ServerAddress, ServerEnvelope, ServerList, ServerStatus,
};

/// Microversion requested by default. 2.25 is the first version where
/// `os-migrateLive` takes a boolean `block_migration` and no longer accepts
/// `disk_over_commit`.
pub const DEFAULT_MICROVERSION: &str = "2.25";

/// Header carrying the requested compute API microversion.
pub const MICROVERSION_HEADER: &str = "X-OpenStack-Nova-API-Version";
