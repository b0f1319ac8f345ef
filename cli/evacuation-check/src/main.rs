// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! evacuation-check: live-evacuate the host running a set of instances onto
//! another hypervisor, then verify placement and guest connectivity.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use evacuation_check::config::{ComputeAccess, RunArgs, Settings, TriggerKind};
use evacuation_check::{
    ApiTrigger, ComputeApi, EvacuationFlow, EvacuationTrigger, NovaCliTrigger, SshPingCheck,
    output,
};
use nova_client::NovaClient;
use secrecy::SecretString;

#[derive(Parser)]
#[command(
    name = "evacuation-check",
    version,
    about = "Live-evacuate a compute host and verify the instances survive",
    long_about = "Block-migrates every instance off the host running the given \
                  instances, waits for them to come back ACTIVE on the target \
                  hypervisor, and pings between them from inside the guests."
)]
struct Cli {
    /// Instance IDs, all on the same compute host (at least 2)
    #[arg(required = true, num_args = 1.., value_name = "INSTANCE")]
    instances: Vec<String>,

    #[command(flatten)]
    run: RunArgs,

    /// Output the report as JSON
    #[arg(short, long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

async fn build_compute(settings: &Settings) -> Result<NovaClient> {
    let http = reqwest::Client::builder()
        .timeout(settings.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let (url, token): (String, SecretString) = match &settings.access {
        ComputeAccess::Direct { compute_url, token } => (compute_url.clone(), token.clone()),
        ComputeAccess::Keystone {
            config,
            interface,
            region,
        } => {
            let session = keystone_auth::authenticate(&http, config)
                .await
                .context("Keystone authentication failed")?;
            let url = session
                .endpoint("compute", *interface, region.as_deref())
                .context("No compute endpoint in the service catalog")?
                .to_string();
            (url, session.token().clone())
        }
    };

    tracing::info!(compute_url = %url, "using compute endpoint");
    NovaClient::with_http_client(&url, token, http).context("Invalid compute endpoint")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "evacuation_check=debug,nova_client=debug,keystone_auth=debug,wait_util=debug"
    } else {
        "evacuation_check=info,keystone_auth=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()),
        ))
        .with_writer(std::io::stderr)
        .init();

    // reqwest is built without a bundled provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let settings = Settings::load(&cli.run).await?;
    let compute: Arc<dyn ComputeApi> = Arc::new(build_compute(&settings).await?);

    let trigger: Arc<dyn EvacuationTrigger> = match settings.trigger {
        TriggerKind::Cli => Arc::new(NovaCliTrigger::new(settings.nova_cli.clone())),
        TriggerKind::Api => Arc::new(ApiTrigger::new(compute.clone())),
    };

    let flow = EvacuationFlow::new(compute, trigger, Arc::new(SshPingCheck::default()))
        .with_options(settings.flow.clone());
    let report = flow
        .run(&cli.instances, &settings.environment, &settings.keypair)
        .await?;

    if cli.json {
        output::print_json(&report)?;
    } else {
        output::print_report(&report);
    }
    Ok(())
}
