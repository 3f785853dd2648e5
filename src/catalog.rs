// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds the set of resource kinds whose instances may carry finalizers
//! inside a namespace: every namespaced, listable kind the cluster serves.

use crate::constants::api::VERB_LIST;
use crate::error::{Error, Result};
use crate::kubernetes::Discoverer;
use crate::types::ResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use std::fmt;
use tracing::{debug, info, instrument};

/// A parsed `group/version` string; the core group has an empty group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn parse(group_version: &str) -> Result<Self> {
        let invalid = || {
            Error::InvalidGroupVersion(format!(
                "unexpected GroupVersion string: {:?}",
                group_version
            ))
        };

        let (group, version) = match group_version.split_once('/') {
            None => ("", group_version),
            Some((group, version)) => {
                if group.is_empty() || version.contains('/') {
                    return Err(invalid());
                }
                (group, version)
            }
        };

        if version.is_empty() {
            return Err(invalid());
        }

        Ok(GroupVersion {
            group: group.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

/// Why a discovered resource kind is left out of the catalog
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{0} is a subresource")]
    Subresource(String),

    #[error("expected namespaced resource, {0} is cluster scoped")]
    NotNamespaced(String),

    #[error("expected listable resource, {0} does not support list")]
    NotListable(String),
}

/// Accept a resource kind only if it is namespaced and supports `list`
pub fn validate_resource(
    gv: &GroupVersion,
    resource: &APIResource,
) -> std::result::Result<ResourceDefinition, Rejection> {
    if resource.name.contains('/') {
        return Err(Rejection::Subresource(resource.name.clone()));
    }

    if !resource.namespaced {
        return Err(Rejection::NotNamespaced(resource.name.clone()));
    }

    let definition = ResourceDefinition {
        group: gv.group.clone(),
        version: gv.version.clone(),
        resource: resource.name.clone(),
        kind: resource.kind.clone(),
        namespaced: resource.namespaced,
        verbs: resource.verbs.iter().cloned().collect(),
    };

    if !definition.supports(VERB_LIST) {
        return Err(Rejection::NotListable(definition.resource));
    }

    Ok(definition)
}

/// Discover every namespaced, listable resource kind, in discovery order.
///
/// Failing to enumerate group versions, or to parse one, aborts the run.
/// Rejected kinds are skipped with a debug diagnostic.
#[instrument(skip(discoverer))]
pub async fn build_catalog(discoverer: &dyn Discoverer) -> Result<Vec<ResourceDefinition>> {
    let lists = discoverer.groups_and_resources().await?;
    let mut catalog = Vec::new();

    for list in &lists {
        debug!("Discover resource group {}", list.group_version);
        let gv = GroupVersion::parse(&list.group_version)?;

        for resource in &list.resources {
            debug!("Discover resource {}.{}.{}", resource.name, gv.group, gv.version);

            match validate_resource(&gv, resource) {
                Ok(definition) => catalog.push(definition),
                Err(rejection) => debug!("Skipping resource: {}", rejection),
            }
        }
    }

    info!(
        "Discovered {} namespaced resource kinds in {} group versions",
        catalog.len(),
        lists.len()
    );
    Ok(catalog)
}
