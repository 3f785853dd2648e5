// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Finalizer cleanup: one concurrent task per resource kind strips finalizers
//! from every object of that kind in the namespace.

use crate::config::Whitelist;
use crate::error::Result;
use crate::kubernetes::ResourceClient;
use crate::retry::RetryPolicy;
use crate::tasks::TaskGroup;
use crate::types::ResourceDefinition;
use kube::ResourceExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Remove finalizers from all objects in `namespace` of every kind in `catalog`.
///
/// Without `force` objects carrying finalizers are only reported. The first
/// unrecoverable error cancels the remaining kinds and is returned.
pub async fn cleanup(
    token: CancellationToken,
    catalog: Arc<[ResourceDefinition]>,
    client: Arc<dyn ResourceClient>,
    namespace: &str,
    whitelist: Arc<Whitelist>,
    force: bool,
    policy: &RetryPolicy,
) -> Result<()> {
    let mut group = TaskGroup::new(token);
    info!(
        "Checking {} resource kinds in namespace {} for finalizers",
        catalog.len(),
        namespace
    );

    for index in 0..catalog.len() {
        let catalog = catalog.clone();
        let client = client.clone();
        let whitelist = whitelist.clone();
        let policy = policy.clone();
        let namespace = namespace.to_string();
        let token = group.token();
        let span = info_span!("cleanup", namespace = %namespace, resource = %catalog[index]);

        group.spawn(
            async move {
                let resource = &catalog[index];
                let client = client.as_ref();
                let whitelist = whitelist.as_ref();
                let ns = namespace.as_str();

                let cleared = policy
                    .retry(&token, &resource.qualified_name(), move || {
                        clean_resource(client, resource, ns, whitelist, force)
                    })
                    .await?;

                if cleared > 0 {
                    info!("Removed finalizers from {} objects", cleared);
                }
                Ok(())
            }
            .instrument(span),
        );
    }

    group.wait().await
}

/// One cleanup pass over a single resource kind, always working on a fresh list.
///
/// Returns the number of objects whose finalizers were removed.
pub async fn clean_resource(
    client: &dyn ResourceClient,
    resource: &ResourceDefinition,
    namespace: &str,
    whitelist: &Whitelist,
    force: bool,
) -> Result<usize> {
    let objects = client.list(resource, namespace).await?;
    let qualified = resource.qualified_name();
    let mut cleared = 0;

    for mut object in objects {
        // The list is already scoped, this guards against a misbehaving client
        if object.metadata.namespace.as_deref() != Some(namespace) {
            debug!(
                "Ignoring {} from namespace {:?}",
                object.name_any(),
                object.metadata.namespace
            );
            continue;
        }

        if object.finalizers().is_empty() {
            continue;
        }

        info!(
            "resource has finalizers: {}.{} [{}] => {:?}",
            object.name_any(),
            namespace,
            qualified,
            object.finalizers()
        );

        if !whitelist.allows(&qualified) {
            info!("resource [{}] not whitelisted", qualified);
            continue;
        }

        if force {
            object.metadata.finalizers = None;
            if let Err(e) = client.update(resource, &object).await {
                warn!("failed to remove finalizer, backoff: {}", e);
                return Err(e);
            }
            cleared += 1;
        }
    }

    Ok(cleared)
}
