// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use del_namespace::config::{RunConfig, Whitelist};
use del_namespace::constants::defaults;
use del_namespace::coordinator;
use del_namespace::kubernetes::{
    create_client, KubeDiscoverer, KubeResourceClient, KubeconfigSelection,
};

/// Force delete kubernetes namespace(s) including all resources with blocking finalizers
#[derive(Parser, Debug)]
#[command(name = "kubectl-del-namespace", bin_name = "kubectl del-namespace", version)]
#[command(about = "Force delete namespace")]
struct Cli {
    /// Namespaces to delete
    #[arg(required = true, value_name = "NAMESPACE")]
    namespaces: Vec<String>,

    /// Force remove all finalizers
    #[arg(long)]
    yes: bool,

    /// Await timeout before failing the command
    #[arg(long, default_value = defaults::TIMEOUT, value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Force remove all finalizers after the grace period was reached
    #[arg(long, default_value = defaults::GRACE_PERIOD, value_parser = humantime::parse_duration)]
    grace_period: Duration,

    /// Whitelist resources from which the finalizers are removed.
    /// If not set all resources are targeted.
    #[arg(long, value_delimiter = ',')]
    resources: Vec<String>,

    #[command(flatten)]
    kubeconfig: KubeconfigSelection,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,del_namespace={level},kubectl_del_namespace={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = RunConfig::new(
        cli.namespaces,
        cli.yes,
        cli.timeout,
        cli.grace_period,
        Whitelist::new(cli.resources),
    )?;

    let client = create_client(&cli.kubeconfig)
        .await
        .context("Failed to connect to Kubernetes cluster")?;
    info!("Connected to Kubernetes cluster");

    let discoverer = KubeDiscoverer::new(client.clone());
    let resources = Arc::new(KubeResourceClient::new(client));

    coordinator::run(Arc::new(config), &discoverer, resources).await?;

    info!("Done");
    Ok(())
}
