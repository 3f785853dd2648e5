// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Top-level driver: discovery, then one task per namespace under a shared
//! cancellation token and an overall deadline.

use crate::catalog::build_catalog;
use crate::cleanup::cleanup;
use crate::config::{RunConfig, Whitelist};
use crate::error::{Error, Result};
use crate::kubernetes::{Discoverer, ResourceClient};
use crate::retry::RetryPolicy;
use crate::tasks::TaskGroup;
use crate::types::ResourceDefinition;
use crate::watcher::{await_deletion, verify_namespace, WatchOutcome};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

/// Remove every namespace in `config`, failing fast on the first error.
pub async fn run(
    config: Arc<RunConfig>,
    discoverer: &dyn Discoverer,
    client: Arc<dyn ResourceClient>,
) -> Result<()> {
    run_with_policy(config, discoverer, client, RetryPolicy::default()).await
}

pub async fn run_with_policy(
    config: Arc<RunConfig>,
    discoverer: &dyn Discoverer,
    client: Arc<dyn ResourceClient>,
    policy: RetryPolicy,
) -> Result<()> {
    let token = CancellationToken::new();
    let work = remove_namespaces(config.clone(), discoverer, client, policy, token.clone());
    tokio::pin!(work);

    tokio::select! {
        result = &mut work => result,
        _ = tokio::time::sleep(config.timeout) => {
            warn!(
                "Timeout of {} reached, cancelling",
                humantime::format_duration(config.timeout)
            );
            // Dropping the work aborts every task still blocked on the cluster
            token.cancel();
            Err(Error::Timeout(config.timeout))
        }
    }
}

async fn remove_namespaces(
    config: Arc<RunConfig>,
    discoverer: &dyn Discoverer,
    client: Arc<dyn ResourceClient>,
    policy: RetryPolicy,
    token: CancellationToken,
) -> Result<()> {
    let catalog: Arc<[ResourceDefinition]> = tokio::select! {
        _ = token.cancelled() => return Err(Error::Cancelled),
        catalog = build_catalog(discoverer) => catalog?.into(),
    };
    let whitelist = Arc::new(config.whitelist.clone());

    if config.whitelist.is_empty() {
        info!("No --resources given, finalizers of every resource kind are eligible");
    }

    if !config.force {
        info!(
            "Dry run, only reporting finalizers. \
             Pass --yes to delete namespaces and remove finalizers"
        );
    }

    let mut group = TaskGroup::new(token);
    for namespace in &config.namespaces {
        let task = remove_namespace(
            namespace.clone(),
            config.clone(),
            catalog.clone(),
            client.clone(),
            whitelist.clone(),
            policy.clone(),
            group.token(),
        );
        group.spawn(task.instrument(info_span!("namespace", namespace = %namespace)));
    }

    group.wait().await
}

async fn remove_namespace(
    namespace: String,
    config: Arc<RunConfig>,
    catalog: Arc<[ResourceDefinition]>,
    client: Arc<dyn ResourceClient>,
    whitelist: Arc<Whitelist>,
    policy: RetryPolicy,
    token: CancellationToken,
) -> Result<()> {
    tokio::select! {
        _ = token.cancelled() => return Err(Error::Cancelled),
        verified = verify_namespace(client.as_ref(), &namespace) => { verified?; }
    }

    if config.force {
        match await_deletion(client.as_ref(), &namespace, config.grace_period, &token).await? {
            WatchOutcome::Deleted => {
                info!("Namespace {} terminated gracefully", namespace);
                return Ok(());
            }
            WatchOutcome::Cancelled => return Ok(()),
            WatchOutcome::GracePeriodReached => {}
        }
    }

    cleanup(
        token.child_token(),
        catalog,
        client,
        &namespace,
        whitelist,
        config.force,
        &policy,
    )
    .await?;

    info!("Finished namespace {}", namespace);
    Ok(())
}
