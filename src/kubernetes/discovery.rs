// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API discovery: enumerates every group version and its resource kinds

use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::Client;
use tracing::{debug, instrument};

/// Enumerates the resource kinds served by the cluster, one list per group version.
#[async_trait]
pub trait Discoverer: Send + Sync {
    async fn groups_and_resources(&self) -> Result<Vec<APIResourceList>>;
}

/// Discovery backed by the API server's `/api` and `/apis` endpoints
#[derive(Clone)]
pub struct KubeDiscoverer {
    client: Client,
}

impl KubeDiscoverer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Discoverer for KubeDiscoverer {
    #[instrument(skip(self))]
    async fn groups_and_resources(&self) -> Result<Vec<APIResourceList>> {
        let mut lists = Vec::new();

        let core = self
            .client
            .list_core_api_versions()
            .await
            .map_err(|e| Error::Discovery(format!("Failed to list core API versions: {}", e)))?;

        for version in &core.versions {
            debug!("Discovering core API version {}", version);
            let resources = self
                .client
                .list_core_api_resources(version)
                .await
                .map_err(|e| {
                    Error::Discovery(format!("Failed to list resources for {}: {}", version, e))
                })?;
            lists.push(resources);
        }

        let groups = self
            .client
            .list_api_groups()
            .await
            .map_err(|e| Error::Discovery(format!("Failed to list API groups: {}", e)))?;

        for group in &groups.groups {
            for version in &group.versions {
                debug!("Discovering API group version {}", version.group_version);
                let resources = self
                    .client
                    .list_api_group_resources(&version.group_version)
                    .await
                    .map_err(|e| {
                        Error::Discovery(format!(
                            "Failed to list resources for {}: {}",
                            version.group_version, e
                        ))
                    })?;
                lists.push(resources);
            }
        }

        Ok(lists)
    }
}
