// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access to namespaced objects of any kind and to the namespace collection

use crate::error::{Error, Result};
use crate::types::ResourceDefinition;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, DynamicObject, ListParams, PostParams, WatchEvent, WatchParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

/// Stream of raw watch events for the namespace collection
pub type NamespaceWatch = BoxStream<'static, Result<WatchEvent<Namespace>>>;

/// Operations performed against the cluster while removing a namespace.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// List every object of `resource` in `namespace`
    async fn list(&self, resource: &ResourceDefinition, namespace: &str)
        -> Result<Vec<DynamicObject>>;

    /// Replace an object with the given copy; fails with 409 if it changed since it was read
    async fn update(&self, resource: &ResourceDefinition, object: &DynamicObject) -> Result<()>;

    /// Get a namespace by name, `Error::NamespaceNotFound` if it does not exist
    async fn get_namespace(&self, name: &str) -> Result<Namespace>;

    async fn delete_namespace(&self, name: &str) -> Result<()>;

    /// Watch the namespace collection restricted to a single name
    async fn watch_namespace(&self, name: &str) -> Result<NamespaceWatch>;
}

/// `ResourceClient` talking to the API server through kube-rs
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    #[instrument(skip(self, resource), fields(resource = %resource))]
    async fn list(
        &self,
        resource: &ResourceDefinition,
        namespace: &str,
    ) -> Result<Vec<DynamicObject>> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &resource.api_resource());
        let list = api.list(&ListParams::default()).await?;
        debug!("Listed {} objects", list.items.len());
        Ok(list.items)
    }

    #[instrument(skip(self, resource, object), fields(resource = %resource, name = %object.name_any()))]
    async fn update(&self, resource: &ResourceDefinition, object: &DynamicObject) -> Result<()> {
        let Some(name) = object.metadata.name.as_deref() else {
            return Err(Error::MalformedObject(format!(
                "{} object without a name",
                resource.qualified_name()
            )));
        };
        let Some(namespace) = object.metadata.namespace.as_deref() else {
            return Err(Error::MalformedObject(format!(
                "{} object {} without a namespace",
                resource.qualified_name(),
                name
            )));
        };

        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &resource.api_resource());
        api.replace(name, &PostParams::default(), object).await?;
        Ok(())
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace> {
        match self.namespaces().get(name).await {
            Ok(ns) => Ok(ns),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                Err(Error::NamespaceNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        self.namespaces()
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|source| Error::DeleteNamespace {
                namespace: name.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn watch_namespace(&self, name: &str) -> Result<NamespaceWatch> {
        let wp = WatchParams::default().fields(&format!("metadata.name={}", name));
        let stream = self
            .namespaces()
            .watch(&wp, "0")
            .await
            .map_err(|source| Error::WatchOpen {
                namespace: name.to_string(),
                source,
            })?;

        Ok(stream.map_err(Error::from).boxed())
    }
}
