// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation from kubeconfig selection flags

use crate::error::{Error, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Which kubeconfig, context, cluster and user to connect with
#[derive(clap::Args, Debug, Clone, Default)]
pub struct KubeconfigSelection {
    /// Path to the kubeconfig file to use, defaults to $KUBECONFIG or ~/.kube/config
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// The name of the kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// The name of the kubeconfig cluster to use
    #[arg(long)]
    pub cluster: Option<String>,

    /// The name of the kubeconfig user to use
    #[arg(long)]
    pub user: Option<String>,
}

impl KubeconfigSelection {
    fn options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            cluster: self.cluster.clone(),
            user: self.user.clone(),
        }
    }

    fn is_default(&self) -> bool {
        self.kubeconfig.is_none()
            && self.context.is_none()
            && self.cluster.is_none()
            && self.user.is_none()
    }
}

/// Create a Kubernetes client, inferring the config when nothing was selected
#[instrument(skip(selection))]
pub async fn create_client(selection: &KubeconfigSelection) -> Result<Client> {
    let config = load_config(selection).await?;
    debug!("Using cluster {}", config.cluster_url);

    Client::try_from(config)
        .map_err(|e| Error::Kubeconfig(format!("Failed to create client: {}", e)))
}

async fn load_config(selection: &KubeconfigSelection) -> Result<Config> {
    if selection.is_default() {
        return Config::infer()
            .await
            .map_err(|e| Error::Kubeconfig(format!("Failed to infer config: {}", e)));
    }

    let options = selection.options();
    match &selection.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::Kubeconfig(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| Error::Kubeconfig(format!("Failed to create config: {}", e)))
        }
        None => Config::from_kubeconfig(&options)
            .await
            .map_err(|e| Error::Kubeconfig(format!("Failed to create config: {}", e))),
    }
}
