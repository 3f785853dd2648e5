// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::time::Duration;

/// Allow-list of qualified resource names (`<resource>.<group>`, or bare
/// `<resource>` for the core group). Empty means every kind is eligible.
///
/// Entries are not checked against discovery, an unknown name simply
/// never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist(BTreeSet<String>);

impl Whitelist {
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            resources
                .into_iter()
                .map(Into::into)
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether finalizers may be removed from objects of the given kind
    pub fn allows(&self, qualified_name: &str) -> bool {
        self.is_empty() || self.0.contains(qualified_name)
    }
}

/// Run configuration, built once from the command line
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Namespaces to remove, in argument order without duplicates
    pub namespaces: Vec<String>,
    /// Delete namespaces and strip finalizers; otherwise only report them
    pub force: bool,
    pub timeout: Duration,
    pub grace_period: Duration,
    pub whitelist: Whitelist,
}

impl RunConfig {
    pub fn new(
        namespaces: Vec<String>,
        force: bool,
        timeout: Duration,
        grace_period: Duration,
        whitelist: Whitelist,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut unique = Vec::with_capacity(namespaces.len());
        for ns in namespaces {
            let ns = ns.trim().to_string();
            if ns.is_empty() {
                return Err(Error::Config("namespace name must not be empty".to_string()));
            }
            if seen.insert(ns.clone()) {
                unique.push(ns);
            }
        }

        if unique.is_empty() {
            return Err(Error::Config("expected at least one namespace".to_string()));
        }

        Ok(RunConfig {
            namespaces: unique,
            force,
            timeout,
            grace_period,
            whitelist,
        })
    }
}
