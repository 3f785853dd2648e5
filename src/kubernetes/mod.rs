// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes collaborators: client creation, API discovery and object access.

pub mod client;
pub mod discovery;
pub mod resources;

pub use client::{create_client, KubeconfigSelection};
pub use discovery::{Discoverer, KubeDiscoverer};
pub use resources::{KubeResourceClient, NamespaceWatch, ResourceClient};
