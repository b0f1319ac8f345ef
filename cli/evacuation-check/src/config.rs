// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Run configuration
//!
//! Settings come from, in order of precedence:
//! 1. Command-line flags and their environment variables (`OS_*`, `NOVA_URL`)
//! 2. An optional JSON config file (`--config`)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use keystone_auth::{Interface, KeystoneConfig};
use secrecy::SecretString;
use serde::Deserialize;

use crate::flow::{CONVERGENCE_TIMEOUT, FlowOptions};
use crate::network_check::{AddressPreference, Environment, Keypair};
use crate::nova_cli::{Launcher, NovaCli};

/// Default HTTP timeout for Keystone and compute API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenStack credentials, named after the usual `openrc` variables
#[derive(Debug, Clone, Default, Args)]
pub struct OpenStackArgs {
    /// Keystone URL, e.g. http://controller:5000/v3
    #[arg(long, env = "OS_AUTH_URL")]
    pub os_auth_url: Option<String>,

    #[arg(long, env = "OS_USERNAME")]
    pub os_username: Option<String>,

    #[arg(long, env = "OS_PASSWORD", hide_env_values = true)]
    pub os_password: Option<String>,

    #[arg(long, env = "OS_PROJECT_NAME")]
    pub os_project_name: Option<String>,

    /// [default: Default]
    #[arg(long, env = "OS_USER_DOMAIN_NAME")]
    pub os_user_domain_name: Option<String>,

    /// [default: Default]
    #[arg(long, env = "OS_PROJECT_DOMAIN_NAME")]
    pub os_project_domain_name: Option<String>,

    #[arg(long, env = "OS_REGION_NAME")]
    pub os_region_name: Option<String>,

    /// Catalog interface for the compute endpoint [default: public]
    #[arg(long, env = "OS_INTERFACE")]
    pub os_interface: Option<Interface>,

    /// Compute endpoint; with --token, skips Keystone entirely
    #[arg(long, env = "NOVA_URL")]
    pub compute_url: Option<String>,

    /// Pre-issued token for --compute-url
    #[arg(long, env = "OS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// HTTP request timeout in seconds [default: 30]
    #[arg(long)]
    pub http_timeout: Option<u64>,
}

/// How the evacuation is started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// Run `nova host-evacuate-live`
    #[default]
    Cli,
    /// Issue `os-migrateLive` for each server directly
    Api,
}

#[derive(Debug, Clone, Default, Args)]
pub struct TriggerArgs {
    /// Evacuation trigger [default: cli]
    #[arg(long, value_enum)]
    pub trigger: Option<TriggerKind>,

    /// Path to the nova client [default: nova]
    #[arg(long)]
    pub nova_bin: Option<String>,

    /// Run the nova client on this host over ssh (e.g. root@controller)
    #[arg(long)]
    pub cli_via: Option<String>,

    /// openrc file to source on the --cli-via host
    #[arg(long, requires = "cli_via")]
    pub cli_env_file: Option<String>,
}

/// Guest access for the ping checks
#[derive(Debug, Clone, Default, Args)]
pub struct CheckArgs {
    /// Private key of the keypair the instances were booted with
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Guest login user [default: cirros]
    #[arg(long)]
    pub login: Option<String>,

    /// ssh jump host used to reach the instances
    #[arg(long)]
    pub jump: Option<String>,

    /// Instance address to ssh to [default: floating]
    #[arg(long, value_enum)]
    pub address: Option<AddressPreference>,

    /// Extra `ssh -o` option; replaces the defaults when given
    #[arg(long = "ssh-option", value_name = "OPTION")]
    pub ssh_options: Vec<String>,

    /// Seconds a single ping check may keep retrying [default: 180]
    #[arg(long)]
    pub ping_timeout: Option<u64>,
}

/// Everything that shapes a run, apart from the instance list and output
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// JSON config file filling in anything not set by flags or environment
    #[arg(long, env = "EVACUATION_CHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Evacuate onto this hypervisor instead of the first other one
    #[arg(long)]
    pub target_host: Option<String>,

    /// Seconds between instance status polls [default: 1]
    #[arg(long)]
    pub interval: Option<u64>,

    #[command(flatten, next_help_heading = "OpenStack")]
    pub openstack: OpenStackArgs,

    #[command(flatten, next_help_heading = "Evacuation trigger")]
    pub trigger: TriggerArgs,

    #[command(flatten, next_help_heading = "Connectivity check")]
    pub check: CheckArgs,
}

/// Contents of a `--config` file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub project_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub project_domain_name: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<Interface>,
    pub compute_url: Option<String>,
    pub token: Option<SecretString>,
    pub http_timeout_secs: Option<u64>,

    pub target_host: Option<String>,
    pub interval_secs: Option<u64>,

    pub trigger: Option<TriggerKind>,
    pub nova_bin: Option<String>,
    pub cli_via: Option<String>,
    pub cli_env_file: Option<String>,

    pub key: Option<PathBuf>,
    pub login: Option<String>,
    pub jump: Option<String>,
    pub address: Option<AddressPreference>,
    pub ssh_options: Option<Vec<String>>,
    pub ping_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load configuration from a JSON file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// How to reach the compute API
#[derive(Debug, Clone)]
pub enum ComputeAccess {
    /// Authenticate and look the compute endpoint up in the catalog
    Keystone {
        config: KeystoneConfig,
        interface: Interface,
        region: Option<String>,
    },
    /// Use a known endpoint and token as-is
    Direct {
        compute_url: String,
        token: SecretString,
    },
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub access: ComputeAccess,
    pub http_timeout: Duration,
    pub trigger: TriggerKind,
    pub nova_cli: NovaCli,
    pub flow: FlowOptions,
    pub environment: Environment,
    pub keypair: Keypair,
}

impl Settings {
    /// Read the config file named by `args`, if any, and resolve
    pub async fn load(args: &RunArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path).await?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: &RunArgs, file: FileConfig) -> Result<Self> {
        let access = resolve_access(&args.openstack, &file)?;
        let http_timeout = args
            .openstack
            .http_timeout
            .or(file.http_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        let trigger = args.trigger.trigger.or(file.trigger).unwrap_or_default();
        let nova_cli = resolve_nova_cli(&args.trigger, &file);

        let mut flow = FlowOptions {
            target_host: args.target_host.clone().or(file.target_host),
            convergence_timeout: CONVERGENCE_TIMEOUT,
            ..FlowOptions::default()
        };
        if let Some(secs) = args.interval.or(file.interval_secs) {
            if secs == 0 {
                bail!("--interval must be at least 1 second");
            }
            flow.poll_interval = Duration::from_secs(secs);
        }

        let Some(private_key) = args.check.key.clone().or(file.key) else {
            bail!("no instance private key given: pass --key or set \"key\" in the config file");
        };

        let mut environment = Environment::default();
        if let Some(login) = args.check.login.clone().or(file.login) {
            environment.login = login;
        }
        environment.jump_host = args.check.jump.clone().or(file.jump);
        if let Some(address) = args.check.address.or(file.address) {
            environment.address = address;
        }
        if !args.check.ssh_options.is_empty() {
            environment.ssh_options = args.check.ssh_options.clone();
        } else if let Some(options) = file.ssh_options {
            environment.ssh_options = options;
        }
        if let Some(secs) = args.check.ping_timeout.or(file.ping_timeout_secs) {
            environment.check_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            access,
            http_timeout,
            trigger,
            nova_cli,
            flow,
            environment,
            keypair: Keypair { private_key },
        })
    }
}

fn resolve_nova_cli(args: &TriggerArgs, file: &FileConfig) -> NovaCli {
    let mut cli = NovaCli::default();
    if let Some(program) = args.nova_bin.clone().or_else(|| file.nova_bin.clone()) {
        cli.program = program;
    }
    if let Some(destination) = args.cli_via.clone().or_else(|| file.cli_via.clone()) {
        cli.launcher = Launcher::Remote {
            destination,
            env_file: args
                .cli_env_file
                .clone()
                .or_else(|| file.cli_env_file.clone()),
        };
    }
    cli
}

/// Pick direct access when both a compute URL and a token are known,
/// otherwise require a complete set of Keystone password credentials.
pub fn resolve_access(args: &OpenStackArgs, file: &FileConfig) -> Result<ComputeAccess> {
    let compute_url = args.compute_url.clone().or_else(|| file.compute_url.clone());
    let token = args
        .token
        .clone()
        .map(SecretString::from)
        .or_else(|| file.token.clone());
    if let (Some(compute_url), Some(token)) = (compute_url, token) {
        return Ok(ComputeAccess::Direct { compute_url, token });
    }

    let auth_url = args.os_auth_url.clone().or_else(|| file.auth_url.clone());
    let username = args.os_username.clone().or_else(|| file.username.clone());
    let password = args
        .os_password
        .clone()
        .map(SecretString::from)
        .or_else(|| file.password.clone());
    let project_name = args
        .os_project_name
        .clone()
        .or_else(|| file.project_name.clone());

    let (Some(auth_url), Some(username), Some(password), Some(project_name)) =
        (auth_url, username, password, project_name)
    else {
        bail!(
            "no OpenStack credentials: set OS_AUTH_URL, OS_USERNAME, OS_PASSWORD and \
             OS_PROJECT_NAME (or the matching --os-* flags), or NOVA_URL with OS_TOKEN"
        );
    };

    let user_domain = args
        .os_user_domain_name
        .clone()
        .or_else(|| file.user_domain_name.clone())
        .unwrap_or_else(|| "Default".to_string());
    let project_domain = args
        .os_project_domain_name
        .clone()
        .or_else(|| file.project_domain_name.clone())
        .unwrap_or_else(|| "Default".to_string());

    Ok(ComputeAccess::Keystone {
        config: KeystoneConfig::new(auth_url, username, password, project_name)
            .with_domains(user_domain, project_domain),
        interface: args.os_interface.or(file.interface).unwrap_or_default(),
        region: args
            .os_region_name
            .clone()
            .or_else(|| file.region_name.clone()),
    })
}
