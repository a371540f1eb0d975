//! Existence-gated synchronizer.
//!
//! The orchestrator offers no create-or-update primitive, so every
//! mutation here is check-then-act: look up the named resource, then
//! create or update depending on what the lookup said. The check and
//! the act are two API calls; two concurrent callers can interleave
//! between them. That race is accepted and left to the caller to
//! tolerate (the orchestrator still rejects the duplicate create).

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::client::ClusterApi;
use crate::error::ClusterResult;
use crate::resource::ClusterResource;

/// Outcome of a guarded create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The resource was absent and has been submitted.
    Created,
    /// A live resource already carries this name; nothing was mutated.
    AlreadyExists,
}

/// Outcome of a guarded update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The live resource was replaced with the new manifest.
    Updated,
    /// No live resource carries this name; nothing was mutated.
    NotFound,
}

/// Drives the orchestrator toward a manifest, one guarded call at a
/// time. Stateless apart from the client handle; no retries.
#[derive(Clone)]
pub struct Synchronizer {
    api: Arc<dyn ClusterApi>,
}

impl Synchronizer {
    pub fn new(api: Arc<dyn ClusterApi>) -> Self {
        Synchronizer { api }
    }

    /// Create the resource unless a live one already holds the name.
    /// Refuses silent overwrite: an existing resource aborts the call
    /// without mutation.
    pub async fn ensure_created(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
        manifest: &Value,
    ) -> ClusterResult<CreateOutcome> {
        if self.api.get(resource, namespace, name).await?.is_some() {
            debug!(%resource, %namespace, %name, "already live, refusing create");
            return Ok(CreateOutcome::AlreadyExists);
        }
        self.api.create(resource, namespace, manifest).await?;
        info!(%resource, %namespace, %name, "created");
        Ok(CreateOutcome::Created)
    }

    /// Update the resource only if it already exists; no upsert.
    pub async fn ensure_updated(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
        manifest: &Value,
    ) -> ClusterResult<UpdateOutcome> {
        if self.api.get(resource, namespace, name).await?.is_none() {
            debug!(%resource, %namespace, %name, "not live, refusing update");
            return Ok(UpdateOutcome::NotFound);
        }
        self.api.update(resource, namespace, name, manifest).await?;
        info!(%resource, %namespace, %name, "updated");
        Ok(UpdateOutcome::Updated)
    }

    /// Submit the delete without an existence pre-check; the attempt is
    /// the guard. Orchestrator errors (including 404) propagate.
    pub async fn ensure_deleted(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<()> {
        self.api.delete(resource, namespace, name).await?;
        info!(%resource, %namespace, %name, "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryClusterApi;
    use serde_json::json;

    fn synchronizer() -> (Arc<MemoryClusterApi>, Synchronizer) {
        let api = Arc::new(MemoryClusterApi::new());
        (api.clone(), Synchronizer::new(api))
    }

    fn manifest(name: &str) -> Value {
        json!({ "metadata": { "name": name, "namespace": "ns" } })
    }

    #[tokio::test]
    async fn create_when_absent() {
        let (api, sync) = synchronizer();
        let outcome = sync
            .ensure_created(ClusterResource::Deployment, "ns", "api", &manifest("api"))
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
        assert!(api.contains(ClusterResource::Deployment, "ns", "api"));
    }

    #[tokio::test]
    async fn create_refuses_overwrite() {
        let (api, sync) = synchronizer();
        let original = json!({ "metadata": { "name": "api", "namespace": "ns" }, "v": 1 });
        api.create(ClusterResource::Deployment, "ns", &original)
            .await
            .unwrap();

        let outcome = sync
            .ensure_created(ClusterResource::Deployment, "ns", "api", &manifest("api"))
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);

        // The live manifest is untouched.
        let live = api.get(ClusterResource::Deployment, "ns", "api").await.unwrap().unwrap();
        assert_eq!(live["v"], 1);
    }

    #[tokio::test]
    async fn update_requires_prior_create() {
        let (_, sync) = synchronizer();
        let outcome = sync
            .ensure_updated(ClusterResource::Service, "ns", "svc", &manifest("svc"))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn update_replaces_live_manifest() {
        let (api, sync) = synchronizer();
        api.create(ClusterResource::Service, "ns", &manifest("svc"))
            .await
            .unwrap();

        let replacement = json!({ "metadata": { "name": "svc", "namespace": "ns" }, "v": 2 });
        let outcome = sync
            .ensure_updated(ClusterResource::Service, "ns", "svc", &replacement)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        let live = api.get(ClusterResource::Service, "ns", "svc").await.unwrap().unwrap();
        assert_eq!(live["v"], 2);
    }

    #[tokio::test]
    async fn delete_propagates_orchestrator_error() {
        let (api, sync) = synchronizer();
        api.create(ClusterResource::Ingress, "ns", &manifest("edge"))
            .await
            .unwrap();

        sync.ensure_deleted(ClusterResource::Ingress, "ns", "edge")
            .await
            .unwrap();
        assert!(api.is_empty());

        let err = sync
            .ensure_deleted(ClusterResource::Ingress, "ns", "edge")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
