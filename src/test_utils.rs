// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock HTTP service for the kube-rs backed collaborators and
//! in-memory fakes of the discovery and resource traits.

use crate::error::{Error, Result};
use crate::kubernetes::{Discoverer, NamespaceWatch, ResourceClient};
use crate::types::ResourceDefinition;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use http::{Request, Response};
use k8s_openapi::api::core::v1::{Namespace, NamespaceStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::api::{DynamicObject, ObjectMeta, WatchEvent};
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PUT requests matching the path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Add a response for DELETE requests matching the path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Prefix match on whole path segments, so /api never answers /apis
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(&format!("{}/", p)) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("path", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// A kube API error with the given HTTP status code
pub fn api_error(code: u16, reason: &str) -> Error {
    Error::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("injected {}", reason),
        reason: reason.to_string(),
        code,
    }))
}

/// Discovery entry for a resource kind
pub fn api_resource(name: &str, kind: &str, namespaced: bool, verbs: &[&str]) -> APIResource {
    APIResource {
        name: name.to_string(),
        singular_name: String::new(),
        namespaced,
        kind: kind.to_string(),
        verbs: verbs.iter().map(|v| v.to_string()).collect(),
        ..Default::default()
    }
}

pub fn resource_list(group_version: &str, resources: Vec<APIResource>) -> APIResourceList {
    APIResourceList {
        group_version: group_version.to_string(),
        resources,
    }
}

/// Namespaced, listable resource definition
pub fn resource_definition(group: &str, resource: &str, kind: &str) -> ResourceDefinition {
    ResourceDefinition {
        group: group.to_string(),
        version: "v1".to_string(),
        resource: resource.to_string(),
        kind: kind.to_string(),
        namespaced: true,
        verbs: BTreeSet::from(["list".to_string(), "update".to_string()]),
    }
}

pub fn dynamic_object(
    resource: &ResourceDefinition,
    name: &str,
    namespace: &str,
    finalizers: &[&str],
) -> DynamicObject {
    let mut object = DynamicObject::new(name, &resource.api_resource()).within(namespace);
    if !finalizers.is_empty() {
        object.metadata.finalizers = Some(finalizers.iter().map(|f| f.to_string()).collect());
    }
    object
}

pub fn namespace(name: &str, phase: Option<&str>) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: phase.map(|p| NamespaceStatus {
            phase: Some(p.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Discoverer returning a fixed answer
pub struct FakeDiscoverer {
    lists: Option<Vec<APIResourceList>>,
}

impl FakeDiscoverer {
    pub fn new(lists: Vec<APIResourceList>) -> Self {
        Self { lists: Some(lists) }
    }

    /// A discoverer whose enumeration always fails
    pub fn failing() -> Self {
        Self { lists: None }
    }
}

#[async_trait]
impl Discoverer for FakeDiscoverer {
    async fn groups_and_resources(&self) -> Result<Vec<APIResourceList>> {
        self.lists
            .clone()
            .ok_or_else(|| Error::Discovery("injected discovery failure".to_string()))
    }
}

/// How the fake API server reacts to a namespace delete call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehaviour {
    /// Namespace goes to Terminating and is removed right away
    Immediate,
    /// Namespace stays in Terminating until the test drops it
    StuckTerminating,
    /// The delete call never returns
    Hang,
}

#[derive(Debug, Default, Clone, Copy)]
enum ListFailure {
    #[default]
    None,
    /// Fail the next n calls with a retryable error
    Transient(usize),
    /// Fail every call with a non-retryable error
    Fatal,
}

struct FakeState {
    namespaces: BTreeMap<String, Namespace>,
    objects: BTreeMap<String, Vec<DynamicObject>>,
    list_failures: HashMap<String, ListFailure>,
    update_conflicts: HashMap<String, usize>,
    list_calls: HashMap<String, usize>,
    updates: Vec<(String, String)>,
    deletes: Vec<String>,
    watches: Vec<String>,
    watch_senders: Vec<mpsc::UnboundedSender<Result<WatchEvent<Namespace>>>>,
    extra_events: Vec<Result<WatchEvent<Namespace>>>,
    fail_watch: bool,
    delete_behaviour: DeleteBehaviour,
}

/// In-memory cluster implementing `ResourceClient`, recording every call
pub struct FakeCluster {
    state: Mutex<FakeState>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                namespaces: BTreeMap::new(),
                objects: BTreeMap::new(),
                list_failures: HashMap::new(),
                update_conflicts: HashMap::new(),
                list_calls: HashMap::new(),
                updates: Vec::new(),
                deletes: Vec::new(),
                watches: Vec::new(),
                watch_senders: Vec::new(),
                extra_events: Vec::new(),
                fail_watch: false,
                delete_behaviour: DeleteBehaviour::StuckTerminating,
            }),
        }
    }

    pub fn with_namespace(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .insert(name.to_string(), namespace(name, Some("Active")));
        self
    }

    pub fn with_object(self, resource: &ResourceDefinition, object: DynamicObject) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .entry(resource.qualified_name())
            .or_default()
            .push(object);
        self
    }

    pub fn with_delete_behaviour(self, behaviour: DeleteBehaviour) -> Self {
        self.state.lock().unwrap().delete_behaviour = behaviour;
        self
    }

    /// Fail the next `times` list calls for a kind with a 500
    pub fn with_transient_list_failures(self, resource: &ResourceDefinition, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .list_failures
            .insert(resource.qualified_name(), ListFailure::Transient(times));
        self
    }

    /// Fail every list call for a kind with a non-retryable error
    pub fn with_fatal_list_failure(self, resource: &ResourceDefinition) -> Self {
        self.state
            .lock()
            .unwrap()
            .list_failures
            .insert(resource.qualified_name(), ListFailure::Fatal);
        self
    }

    /// Reject the next `times` updates for a kind with 409 Conflict
    pub fn with_update_conflicts(self, resource: &ResourceDefinition, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .update_conflicts
            .insert(resource.qualified_name(), times);
        self
    }

    /// Events delivered on every watch right after it is opened
    pub fn with_watch_events(self, events: Vec<Result<WatchEvent<Namespace>>>) -> Self {
        self.state.lock().unwrap().extra_events = events;
        self
    }

    pub fn with_failing_watch(self) -> Self {
        self.state.lock().unwrap().fail_watch = true;
        self
    }

    pub fn list_calls(&self, resource: &ResourceDefinition) -> usize {
        self.state
            .lock()
            .unwrap()
            .list_calls
            .get(&resource.qualified_name())
            .copied()
            .unwrap_or(0)
    }

    /// Updates issued so far as `(qualified resource, object name)`
    pub fn updates(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn watches(&self) -> Vec<String> {
        self.state.lock().unwrap().watches.clone()
    }

    pub fn object(&self, resource: &ResourceDefinition, name: &str) -> Option<DynamicObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&resource.qualified_name())
            .and_then(|objects| objects.iter().find(|o| o.name_any() == name).cloned())
    }

    /// End every open watch stream, as the API server does on its watch timeout
    pub fn close_watches(&self) {
        self.state.lock().unwrap().watch_senders.clear();
    }

    /// Remove a namespace without notifying any watch
    pub fn forget_namespace(&self, name: &str) {
        self.state.lock().unwrap().namespaces.remove(name);
    }

    fn record_delete(&self, name: &str) -> DeleteBehaviour {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(name.to_string());
        let behaviour = state.delete_behaviour;

        let terminating = namespace(name, Some("Terminating"));
        let mut events = vec![WatchEvent::Modified(terminating.clone())];
        match behaviour {
            DeleteBehaviour::Immediate => {
                state.namespaces.remove(name);
                events.push(WatchEvent::Deleted(terminating));
            }
            DeleteBehaviour::StuckTerminating => {
                state.namespaces.insert(name.to_string(), terminating);
            }
            DeleteBehaviour::Hang => return behaviour,
        }

        for sender in &state.watch_senders {
            for event in &events {
                let _ = sender.unbounded_send(Ok(clone_event(event)));
            }
        }
        behaviour
    }

    /// Push an event to every open watch
    pub fn emit(&self, event: WatchEvent<Namespace>) {
        let state = self.state.lock().unwrap();
        for sender in &state.watch_senders {
            let _ = sender.unbounded_send(Ok(clone_event(&event)));
        }
    }
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new()
    }
}

fn clone_event(event: &WatchEvent<Namespace>) -> WatchEvent<Namespace> {
    match event {
        WatchEvent::Added(ns) => WatchEvent::Added(ns.clone()),
        WatchEvent::Modified(ns) => WatchEvent::Modified(ns.clone()),
        WatchEvent::Deleted(ns) => WatchEvent::Deleted(ns.clone()),
        WatchEvent::Bookmark(b) => WatchEvent::Bookmark(b.clone()),
        WatchEvent::Error(e) => WatchEvent::Error(e.clone()),
    }
}

#[async_trait]
impl ResourceClient for FakeCluster {
    async fn list(
        &self,
        resource: &ResourceDefinition,
        _namespace: &str,
    ) -> Result<Vec<DynamicObject>> {
        let mut state = self.state.lock().unwrap();
        let key = resource.qualified_name();
        *state.list_calls.entry(key.clone()).or_default() += 1;

        match state.list_failures.get(&key).copied().unwrap_or_default() {
            ListFailure::None => {}
            ListFailure::Transient(0) => {}
            ListFailure::Transient(n) => {
                state.list_failures.insert(key, ListFailure::Transient(n - 1));
                return Err(api_error(500, "InternalError"));
            }
            ListFailure::Fatal => {
                return Err(Error::MalformedObject(format!("injected failure for {}", key)));
            }
        }

        // Objects of every namespace are returned, callers filter
        Ok(state.objects.get(&key).cloned().unwrap_or_default())
    }

    async fn update(&self, resource: &ResourceDefinition, object: &DynamicObject) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let key = resource.qualified_name();

        if let Some(remaining) = state.update_conflicts.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(api_error(409, "Conflict"));
            }
        }

        let name = object.name_any();
        let objects = state.objects.entry(key.clone()).or_default();
        match objects.iter_mut().find(|o| o.name_any() == name) {
            Some(stored) => *stored = object.clone(),
            None => return Err(api_error(404, "NotFound")),
        }
        state.updates.push((key, name));
        Ok(())
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace> {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NamespaceNotFound(name.to_string()))
    }

    async fn delete_namespace(&self, name: &str) -> Result<()> {
        if self.record_delete(name) == DeleteBehaviour::Hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn watch_namespace(&self, name: &str) -> Result<NamespaceWatch> {
        let mut state = self.state.lock().unwrap();
        state.watches.push(name.to_string());

        if state.fail_watch {
            return Err(Error::WatchOpen {
                namespace: name.to_string(),
                source: kube::Error::Api(ErrorResponse {
                    status: "Failure".to_string(),
                    message: "injected watch failure".to_string(),
                    reason: "Forbidden".to_string(),
                    code: 403,
                }),
            });
        }

        let (tx, rx) = mpsc::unbounded();
        for event in state.extra_events.drain(..) {
            let _ = tx.unbounded_send(event);
        }
        state.watch_senders.push(tx);
        Ok(rx.boxed())
    }
}
