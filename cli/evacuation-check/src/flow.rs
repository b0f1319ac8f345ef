// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Evacuation verification flow
//!
//! Given instances that all run on one compute host, the flow:
//!
//! 1. Picks a target hypervisor other than the instances' current host
//! 2. Asks the [`EvacuationTrigger`] to block-migrate everything off the
//!    source host onto the target
//! 3. Polls until every instance reports `ACTIVE` (120 s limit)
//! 4. Re-reads every instance and asserts it landed on the target host
//! 5. Pings between mirrored pairs of instances from inside the guests
//!
//! Every failure is fatal and returned as a [`FlowError`].

use std::sync::Arc;
use std::time::Duration;

use nova_api::{Hypervisor, ServerStatus};
use nova_client::NovaError;
use thiserror::Error;
use tokio::time::Instant;
use wait_util::{DEFAULT_INTERVAL, WaitConfig, WaitError, wait_for};

use crate::compute::ComputeApi;
use crate::network_check::{CheckError, ConnectivityCheck, Environment, Keypair};
use crate::report::{EvacuationReport, InstanceOutcome, PingOutcome};
use crate::trigger::{EvacuationTrigger, TriggerError};

/// How long instances get to come back `ACTIVE` after the evacuation starts
pub const CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(2 * 60);

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("at least 2 instances are required for the pairwise ping check, got {found}")]
    NotEnoughInstances { found: usize },

    #[error("instance {server} is listed more than once")]
    DuplicateInstance { server: String },

    #[error("at least 2 compute hosts are required, found {found}")]
    NotEnoughHypervisors { found: usize },

    #[error("instance {server} does not report a host (admin credentials required)")]
    MissingHost { server: String },

    #[error("no hypervisor other than {source_host} is available")]
    NoTargetHost { source_host: String },

    #[error("target host {host} is not a hypervisor distinct from the source host")]
    InvalidTargetHost { host: String },

    #[error("compute API error: {0}")]
    Compute(#[from] NovaError),

    #[error("evacuation failed: {0}")]
    Trigger(#[from] TriggerError),

    #[error("timed out after {elapsed:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        elapsed: Duration,
    },

    #[error("instance {server} went to {status} while waiting for ACTIVE")]
    InstanceError { server: String, status: ServerStatus },

    #[error("instance {server} is on {actual}, expected {expected}")]
    Placement {
        server: String,
        expected: String,
        actual: String,
    },

    #[error("instance {server} is {status}, expected ACTIVE")]
    NotActive { server: String, status: ServerStatus },

    #[error("network check failed: {0}")]
    Connectivity(#[from] CheckError),
}

impl From<WaitError<FlowError>> for FlowError {
    fn from(e: WaitError<FlowError>) -> Self {
        match e {
            WaitError::Timeout {
                waiting_for,
                elapsed,
                ..
            } => FlowError::Timeout {
                waiting_for,
                elapsed,
            },
            WaitError::Aborted(inner) => inner,
        }
    }
}

/// First hypervisor, in listing order, whose hostname differs from
/// `source_host`.
pub fn select_target_host<'a>(
    hypervisors: &'a [Hypervisor],
    source_host: &str,
) -> Option<&'a str> {
    hypervisors
        .iter()
        .map(|h| h.hypervisor_hostname.as_str())
        .find(|name| *name != source_host)
}

/// Pair each element with its mirror: `(items[i], items[n - 1 - i])`.
///
/// For odd lengths the middle element is paired with itself.
pub fn pair_mirror<T>(items: &[T]) -> impl Iterator<Item = (&T, &T)> {
    items.iter().zip(items.iter().rev())
}

/// Tunables for a flow run
#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// Use this host instead of picking the first other hypervisor
    pub target_host: Option<String>,
    pub poll_interval: Duration,
    pub convergence_timeout: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            target_host: None,
            poll_interval: DEFAULT_INTERVAL,
            convergence_timeout: CONVERGENCE_TIMEOUT,
        }
    }
}

/// The evacuation verification flow and its collaborators
pub struct EvacuationFlow {
    compute: Arc<dyn ComputeApi>,
    trigger: Arc<dyn EvacuationTrigger>,
    checker: Arc<dyn ConnectivityCheck>,
    options: FlowOptions,
}

impl EvacuationFlow {
    pub fn new(
        compute: Arc<dyn ComputeApi>,
        trigger: Arc<dyn EvacuationTrigger>,
        checker: Arc<dyn ConnectivityCheck>,
    ) -> Self {
        Self {
            compute,
            trigger,
            checker,
            options: FlowOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FlowOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the whole flow against `instance_ids`, which must all currently
    /// run on the same host.
    pub async fn run(
        &self,
        instance_ids: &[String],
        env: &Environment,
        keypair: &Keypair,
    ) -> Result<EvacuationReport, FlowError> {
        if instance_ids.len() < 2 {
            return Err(FlowError::NotEnoughInstances {
                found: instance_ids.len(),
            });
        }

        for (i, id) in instance_ids.iter().enumerate() {
            if instance_ids[..i].contains(id) {
                return Err(FlowError::DuplicateInstance { server: id.clone() });
            }
        }

        let hypervisors = self.compute.list_hypervisors().await?;
        if hypervisors.len() < 2 {
            return Err(FlowError::NotEnoughHypervisors {
                found: hypervisors.len(),
            });
        }

        let first = self.compute.get_server(&instance_ids[0]).await?;
        let source_host = first.host.clone().ok_or_else(|| FlowError::MissingHost {
            server: first.id.clone(),
        })?;
        let target_host = self.resolve_target(&hypervisors, &source_host)?;

        tracing::info!(
            %source_host,
            %target_host,
            trigger = self.trigger.name(),
            instances = instance_ids.len(),
            "starting live evacuation"
        );
        let requests = self.trigger.evacuate(&source_host, &target_host).await?;

        let started = Instant::now();
        let config = WaitConfig::new(self.options.convergence_timeout)
            .with_interval(self.options.poll_interval);
        wait_for(config, "instances to become ACTIVE", || {
            self.all_active(instance_ids)
        })
        .await?;
        let converged_after = started.elapsed();
        tracing::info!(?converged_after, "all instances ACTIVE");

        let mut servers = Vec::with_capacity(instance_ids.len());
        for id in instance_ids {
            let server = self.compute.get_server(id).await?;
            let Some(actual) = server.host.clone() else {
                return Err(FlowError::MissingHost { server: server.id });
            };
            if actual != target_host {
                return Err(FlowError::Placement {
                    server: server.id,
                    expected: target_host,
                    actual,
                });
            }
            if !server.is_active() {
                return Err(FlowError::NotActive {
                    server: server.id,
                    status: server.status,
                });
            }
            servers.push(server);
        }

        let mut pings = Vec::new();
        let mut skipped_self_pairs = Vec::new();
        let last = servers.len() - 1;
        for (i, (from, to)) in pair_mirror(&servers).enumerate() {
            if i == last - i {
                tracing::warn!(server = %from.id, "skipping self-pair in odd-length instance list");
                skipped_self_pairs.push(from.id.clone());
                continue;
            }
            let ip = to.ips().fixed.ok_or_else(|| CheckError::NoAddress {
                server: to.name.clone(),
            })?;
            self.checker.check_ping(env, from, keypair, &ip).await?;
            pings.push(PingOutcome {
                from: from.id.clone(),
                to: to.id.clone(),
                ip,
            });
        }

        Ok(EvacuationReport {
            source_host,
            target_host,
            trigger: self.trigger.name().to_string(),
            migration_requests: requests,
            instances: servers.iter().map(InstanceOutcome::from).collect(),
            pings,
            skipped_self_pairs,
            converged_after_secs: converged_after.as_secs_f64(),
        })
    }

    fn resolve_target(
        &self,
        hypervisors: &[Hypervisor],
        source_host: &str,
    ) -> Result<String, FlowError> {
        match &self.options.target_host {
            Some(host) => {
                let listed = hypervisors.iter().any(|h| h.hypervisor_hostname == *host);
                if !listed || host == source_host {
                    return Err(FlowError::InvalidTargetHost { host: host.clone() });
                }
                Ok(host.clone())
            }
            None => select_target_host(hypervisors, source_host)
                .map(str::to_string)
                .ok_or_else(|| FlowError::NoTargetHost {
                    source_host: source_host.to_string(),
                }),
        }
    }

    /// One poll: `Some(())` once every instance is `ACTIVE`. An instance in
    /// `ERROR` ends the wait.
    async fn all_active(&self, instance_ids: &[String]) -> Result<Option<()>, FlowError> {
        let mut pending = 0usize;
        for id in instance_ids {
            let server = self.compute.get_server(id).await?;
            if server.status == ServerStatus::Error {
                return Err(FlowError::InstanceError {
                    server: server.id,
                    status: server.status,
                });
            }
            if !server.is_active() {
                tracing::debug!(server = %server.id, status = %server.status, "not active yet");
                pending += 1;
            }
        }
        Ok((pending == 0).then_some(()))
    }
}
