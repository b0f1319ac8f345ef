// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Live-evacuate a compute host and verify the result
//!
//! The library holds the flow and its collaborators so they can be driven
//! with in-memory fakes; the `evacuation-check` binary wires them to a
//! real cloud.

pub mod compute;
pub mod config;
pub mod flow;
pub mod network_check;
pub mod nova_cli;
pub mod output;
pub mod report;
pub mod trigger;

#[cfg(all(test, unix))]
mod test_support;

pub use compute::ComputeApi;
pub use flow::{CONVERGENCE_TIMEOUT, EvacuationFlow, FlowError, FlowOptions};
pub use network_check::{ConnectivityCheck, Environment, Keypair, SshPingCheck};
pub use report::EvacuationReport;
pub use trigger::{ApiTrigger, EvacuationTrigger, MigrationRequest, NovaCliTrigger};
