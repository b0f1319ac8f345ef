// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Guest-to-guest connectivity checks
//!
//! A check logs into the source instance over `ssh` with the instance
//! keypair and pings an address from inside the guest. Guests need a moment
//! to settle after a migration, so the check retries until a ping gets a
//! reply or the check timeout runs out.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use nova_api::Server;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{Instant, timeout};
use wait_util::{WaitConfig, WaitError, wait_for};

/// Default time a single ping check may take, including retries.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Credential used to log into instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    /// Private half of the keypair injected into the instances
    pub private_key: PathBuf,
}

/// Which instance address to ssh to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressPreference {
    /// Floating IP, falling back to the fixed IP
    #[default]
    Floating,
    /// Fixed IP only (needs a jump host inside the tenant network)
    Fixed,
}

/// How instances are reached for connectivity checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub login: String,
    /// `ssh -J` destination, e.g. a controller with a leg in the tenant net
    pub jump_host: Option<String>,
    pub address: AddressPreference,
    pub ssh_options: Vec<String>,
    pub ping_count: u32,
    pub check_timeout: Duration,
    pub retry_interval: Duration,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            login: "cirros".to_string(),
            jump_host: None,
            address: AddressPreference::Floating,
            ssh_options: vec![
                "StrictHostKeyChecking=no".to_string(),
                "UserKnownHostsFile=/dev/null".to_string(),
                "BatchMode=yes".to_string(),
                "ConnectTimeout=10".to_string(),
            ],
            ping_count: 1,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            retry_interval: Duration::from_secs(5),
        }
    }
}

impl Environment {
    /// The address used to log into `server`
    pub fn login_address(&self, server: &Server) -> Result<String, CheckError> {
        let ips = server.ips();
        let addr = match self.address {
            AddressPreference::Floating => ips.floating.or(ips.fixed),
            AddressPreference::Fixed => ips.fixed,
        };
        addr.ok_or_else(|| CheckError::NoAddress {
            server: server.name.clone(),
        })
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("instance {server} has no usable address")]
    NoAddress { server: String },

    #[error("ping from {from} to {to} failed: {detail}")]
    PingFailed {
        from: String,
        to: String,
        detail: String,
    },

    #[error("failed to launch ssh: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Performs a ping from inside one instance
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn check_ping(
        &self,
        env: &Environment,
        from: &Server,
        keypair: &Keypair,
        ip_to_ping: &str,
    ) -> Result<(), CheckError>;
}

/// Packet counts from a ping summary line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingSummary {
    pub transmitted: u32,
    pub received: u32,
}

/// Parse the statistics line of iputils or busybox ping:
///
/// ```text
/// 3 packets transmitted, 3 received, 0% packet loss, time 2003ms
/// 3 packets transmitted, 3 packets received, 0% packet loss
/// ```
pub fn parse_ping_summary(output: &str) -> Option<PingSummary> {
    let line = output.lines().find(|l| l.contains("packets transmitted"))?;
    let mut parts = line.split(',');
    let leading_number = |part: Option<&str>| -> Option<u32> {
        part?.split_whitespace().next()?.parse().ok()
    };
    let transmitted = leading_number(parts.next())?;
    let received = leading_number(parts.next())?;
    Some(PingSummary {
        transmitted,
        received,
    })
}

/// Pings through the system `ssh` client
#[derive(Debug, Clone)]
pub struct SshPingCheck {
    pub ssh_program: String,
}

impl Default for SshPingCheck {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
        }
    }
}

impl SshPingCheck {
    /// Arguments passed to `ssh` for one ping attempt
    pub fn command_args(
        env: &Environment,
        keypair: &Keypair,
        login_address: &str,
        ip_to_ping: &str,
    ) -> Vec<String> {
        let mut args = vec!["-i".to_string(), keypair.private_key.display().to_string()];
        for opt in &env.ssh_options {
            args.push("-o".to_string());
            args.push(opt.clone());
        }
        if let Some(jump) = &env.jump_host {
            args.push("-J".to_string());
            args.push(jump.clone());
        }
        args.push(format!("{}@{}", env.login, login_address));
        args.extend([
            "ping".to_string(),
            "-c".to_string(),
            env.ping_count.to_string(),
            ip_to_ping.to_string(),
        ]);
        args
    }

    async fn attempt(&self, args: &[String]) -> Result<Result<PingSummary, String>, CheckError> {
        let output = Command::new(&self.ssh_program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(CheckError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_ping_summary(&stdout) {
            Some(summary) if output.status.success() && summary.received > 0 => Ok(Ok(summary)),
            Some(summary) => Ok(Err(format!(
                "{} packets transmitted, {} received",
                summary.transmitted, summary.received
            ))),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Ok(Err(format!("{} ({})", stderr.trim(), output.status)))
            }
        }
    }
}

#[async_trait]
impl ConnectivityCheck for SshPingCheck {
    async fn check_ping(
        &self,
        env: &Environment,
        from: &Server,
        keypair: &Keypair,
        ip_to_ping: &str,
    ) -> Result<(), CheckError> {
        let login_address = env.login_address(from)?;
        let args = Self::command_args(env, keypair, &login_address, ip_to_ping);
        let last_failure: Mutex<Option<String>> = Mutex::new(None);

        let config = WaitConfig::new(env.check_timeout).with_interval(env.retry_interval);
        let deadline = Instant::now() + env.check_timeout;
        let waiting_for = format!("ping {ip_to_ping} from {}", from.name);
        let (args, last) = (&args, &last_failure);
        let result = wait_for(config, &waiting_for, || async move {
            // A hung ssh or guest ping must not outlive the check.
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok(outcome) = timeout(remaining, self.attempt(args)).await else {
                tracing::debug!(from = %from.name, to = ip_to_ping, "ping attempt cut off");
                // Keep the summary of an attempt that did finish.
                if let Ok(mut slot) = last.lock() {
                    slot.get_or_insert_with(|| format!("no answer within {remaining:?}"));
                }
                return Ok(None);
            };
            match outcome {
                Err(e) => Err(e),
                Ok(Ok(summary)) => Ok(Some(summary)),
                Ok(Err(failure)) => {
                    tracing::debug!(
                        from = %from.name,
                        to = ip_to_ping,
                        %failure,
                        "ping attempt failed"
                    );
                    if let Ok(mut slot) = last.lock() {
                        *slot = Some(failure);
                    }
                    Ok(None)
                }
            }
        })
        .await;

        match result {
            Ok(summary) => {
                tracing::info!(
                    from = %from.name,
                    to = ip_to_ping,
                    received = summary.received,
                    "ping succeeded"
                );
                Ok(())
            }
            Err(WaitError::Aborted(e)) => Err(e),
            Err(WaitError::Timeout { elapsed, .. }) => {
                let last = last_failure
                    .lock()
                    .ok()
                    .and_then(|l| l.clone())
                    .unwrap_or_else(|| "none completed".to_string());
                Err(CheckError::PingFailed {
                    from: from.name.clone(),
                    to: ip_to_ping.to_string(),
                    detail: format!("no reply within {elapsed:?}; last attempt: {last}"),
                })
            }
        }
    }
}
