// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::discovery::ApiResource;
use std::collections::BTreeSet;
use std::fmt;

/// One resource kind known to the cluster, as reported by API discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    pub group: String,
    pub version: String,
    /// Plural resource name, e.g. `configmaps`
    pub resource: String,
    pub kind: String,
    pub namespaced: bool,
    pub verbs: BTreeSet<String>,
}

impl ResourceDefinition {
    /// Name used for whitelist matching: `<resource>.<group>`, or the bare
    /// resource name for the core group.
    pub fn qualified_name(&self) -> String {
        if self.group.is_empty() {
            self.resource.clone()
        } else {
            format!("{}.{}", self.resource, self.group)
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn supports(&self, verb: &str) -> bool {
        self.verbs.contains(verb)
    }

    /// Build the kube-rs resource descriptor used to address dynamic objects
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: self.kind.clone(),
            plural: self.resource.clone(),
        }
    }
}

impl fmt::Display for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.qualified_name(), self.version)
    }
}
