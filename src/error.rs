// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("API discovery failed: {0}")]
    Discovery(String),

    #[error("Invalid group version: {0}")]
    InvalidGroupVersion(String),

    #[error("Namespace {0} not found")]
    NamespaceNotFound(String),

    #[error("Failed to watch namespace {namespace}: {source}")]
    WatchOpen {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to delete namespace {namespace}: {source}")]
    DeleteNamespace {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("Malformed watch event: {0}")]
    MalformedWatchEvent(String),

    #[error("Malformed object: {0}")]
    MalformedObject(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timed out after {}", format_duration(.0))]
    Timeout(Duration),
}

impl Error {
    /// Errors from the cluster API during list/update are transient and retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Kube(_))
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

fn format_duration(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

pub type Result<T> = std::result::Result<T, Error>;
