// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace deletion: issue the delete, then race the namespace watch against
//! the grace period and the caller's cancellation.

use crate::constants::api::PHASE_TERMINATING;
use crate::error::{Error, Result};
use crate::kubernetes::{NamespaceWatch, ResourceClient};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::WatchEvent;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

/// The parts of a namespace watch event that drive the deletion race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEvent {
    pub kind: EventKind,
    pub name: String,
    pub phase: Option<String>,
}

impl NamespaceEvent {
    /// Extract the typed view from a raw watch event.
    ///
    /// Bookmarks carry no object and yield `None`. Error events and objects
    /// without a name are rejected.
    pub fn parse(event: WatchEvent<Namespace>) -> Result<Option<Self>> {
        let (kind, namespace) = match event {
            WatchEvent::Added(ns) => (EventKind::Added, ns),
            WatchEvent::Modified(ns) => (EventKind::Modified, ns),
            WatchEvent::Deleted(ns) => (EventKind::Deleted, ns),
            WatchEvent::Bookmark(_) => return Ok(None),
            WatchEvent::Error(status) => {
                return Err(Error::MalformedWatchEvent(format!(
                    "watch error {} ({}): {}",
                    status.code, status.reason, status.message
                )))
            }
        };

        let Some(name) = namespace.metadata.name else {
            return Err(Error::MalformedWatchEvent(format!(
                "{:?} event for a namespace without a name",
                kind
            )));
        };

        Ok(Some(NamespaceEvent {
            kind,
            name,
            phase: namespace.status.and_then(|s| s.phase),
        }))
    }

    pub fn is_terminating(&self) -> bool {
        self.phase.as_deref() == Some(PHASE_TERMINATING)
    }
}

/// How the wait for graceful deletion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The namespace is gone, nothing left to clean up
    Deleted,
    /// Still present after the grace period, finalizers must be removed
    GracePeriodReached,
    /// The run was cancelled or hit its deadline
    Cancelled,
}

/// Confirm that the namespace exists before touching it
pub async fn verify_namespace(client: &dyn ResourceClient, namespace: &str) -> Result<Namespace> {
    let ns = client.get_namespace(namespace).await?;
    debug!(
        "Namespace {} found in phase {:?}",
        namespace,
        ns.status.as_ref().and_then(|s| s.phase.as_deref())
    );
    Ok(ns)
}

/// Delete the namespace and wait for it to disappear, at most `grace_period`.
///
/// The watch is opened before the delete call so a fast deletion is not missed.
#[instrument(skip(client, token))]
pub async fn await_deletion(
    client: &dyn ResourceClient,
    namespace: &str,
    grace_period: Duration,
    token: &CancellationToken,
) -> Result<WatchOutcome> {
    let mut events = tokio::select! {
        biased;
        _ = token.cancelled() => return Ok(WatchOutcome::Cancelled),
        events = client.watch_namespace(namespace) => events?,
    };
    tokio::select! {
        biased;
        _ = token.cancelled() => return Ok(WatchOutcome::Cancelled),
        deleted = client.delete_namespace(namespace) => deleted?,
    }
    info!(
        "Deleted namespace {}, waiting up to {} for it to terminate",
        namespace,
        humantime::format_duration(grace_period)
    );

    let grace = tokio::time::sleep(grace_period);
    tokio::pin!(grace);
    let mut watching = true;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Cancelled while waiting for namespace {}", namespace);
                return Ok(WatchOutcome::Cancelled);
            }
            _ = &mut grace => {
                info!("grace period reached, removing finalizers");
                return Ok(WatchOutcome::GracePeriodReached);
            }
            next = events.next(), if watching => {
                let raw = match next {
                    Some(raw) => raw?,
                    None => {
                        debug!("Watch on namespace {} closed by the server, reopening", namespace);
                        let reopened = tokio::select! {
                            biased;
                            _ = token.cancelled() => return Ok(WatchOutcome::Cancelled),
                            reopened = reopen_watch(client, namespace) => reopened,
                        };
                        match reopened {
                            Ok(Some(stream)) => events = stream,
                            Ok(None) => {
                                info!("Namespace {} deleted", namespace);
                                return Ok(WatchOutcome::Deleted);
                            }
                            Err(e) => {
                                warn!(
                                    "Failed to reopen watch on namespace {}, \
                                     waiting for the grace period: {}",
                                    namespace, e
                                );
                                watching = false;
                            }
                        }
                        continue;
                    }
                };

                let Some(event) = NamespaceEvent::parse(raw)? else {
                    continue;
                };

                if event.name != namespace {
                    continue;
                }

                match event.kind {
                    EventKind::Deleted => {
                        info!("Namespace {} deleted", namespace);
                        return Ok(WatchOutcome::Deleted);
                    }
                    EventKind::Modified if event.is_terminating() => {
                        info!("deleting namespace, awaiting grace period");
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Open a fresh watch, then check the namespace still exists so a deletion
/// between the two watches is not missed. `None` means it is gone.
async fn reopen_watch(
    client: &dyn ResourceClient,
    namespace: &str,
) -> Result<Option<NamespaceWatch>> {
    let events = client.watch_namespace(namespace).await?;
    match client.get_namespace(namespace).await {
        Ok(_) => Ok(Some(events)),
        Err(Error::NamespaceNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
