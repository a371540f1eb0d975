//! In-memory cluster API for tests and dry-run mode.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::ClusterApi;
use crate::error::{ClusterError, ClusterResult};
use crate::resource::ClusterResource;

type Key = (ClusterResource, String, String);

/// A cluster that lives in a `HashMap`. Mirrors the orchestrator's
/// status behavior: 409 on duplicate create, 404 on update/delete of an
/// absent resource.
#[derive(Default)]
pub struct MemoryClusterApi {
    resources: Mutex<HashMap<Key, Value>>,
}

impl MemoryClusterApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live resources, all kinds.
    pub fn len(&self) -> usize {
        self.resources.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, resource: ClusterResource, namespace: &str, name: &str) -> bool {
        self.resources
            .lock()
            .unwrap()
            .contains_key(&(resource, namespace.to_string(), name.to_string()))
    }

    fn manifest_name(manifest: &Value) -> ClusterResult<String> {
        manifest
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClusterError::Serialize("manifest has no metadata.name".to_string()))
    }
}

#[async_trait]
impl ClusterApi for MemoryClusterApi {
    async fn get(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<Value>> {
        let resources = self.resources.lock().unwrap();
        Ok(resources
            .get(&(resource, namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(
        &self,
        resource: ClusterResource,
        namespace: &str,
        manifest: &Value,
    ) -> ClusterResult<()> {
        let name = Self::manifest_name(manifest)?;
        let mut resources = self.resources.lock().unwrap();
        let key = (resource, namespace.to_string(), name.clone());
        if resources.contains_key(&key) {
            return Err(ClusterError::Api {
                status: 409,
                message: format!("{resource} {namespace}/{name} already exists"),
            });
        }
        resources.insert(key, manifest.clone());
        Ok(())
    }

    async fn update(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
        manifest: &Value,
    ) -> ClusterResult<()> {
        let mut resources = self.resources.lock().unwrap();
        let key = (resource, namespace.to_string(), name.to_string());
        if !resources.contains_key(&key) {
            return Err(ClusterError::Api {
                status: 404,
                message: format!("{resource} {namespace}/{name} not found"),
            });
        }
        resources.insert(key, manifest.clone());
        Ok(())
    }

    async fn delete(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<()> {
        let mut resources = self.resources.lock().unwrap();
        let key = (resource, namespace.to_string(), name.to_string());
        if resources.remove(&key).is_none() {
            return Err(ClusterError::Api {
                status: 404,
                message: format!("{resource} {namespace}/{name} not found"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(name: &str) -> Value {
        json!({ "metadata": { "name": name, "namespace": "ns" } })
    }

    #[tokio::test]
    async fn create_then_get() {
        let api = MemoryClusterApi::new();
        api.create(ClusterResource::Deployment, "ns", &manifest("api"))
            .await
            .unwrap();
        let found = api.get(ClusterResource::Deployment, "ns", "api").await.unwrap();
        assert!(found.is_some());
        // Distinct kind, same name: separate resource.
        assert!(api.get(ClusterResource::Service, "ns", "api").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let api = MemoryClusterApi::new();
        api.create(ClusterResource::Service, "ns", &manifest("svc"))
            .await
            .unwrap();
        let err = api
            .create(ClusterResource::Service, "ns", &manifest("svc"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn update_absent_is_not_found() {
        let api = MemoryClusterApi::new();
        let err = api
            .update(ClusterResource::Ingress, "ns", "edge", &manifest("edge"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_and_errors_when_absent() {
        let api = MemoryClusterApi::new();
        api.create(ClusterResource::PersistentVolumeClaim, "ns", &manifest("data"))
            .await
            .unwrap();
        api.delete(ClusterResource::PersistentVolumeClaim, "ns", "data")
            .await
            .unwrap();
        assert!(api.is_empty());
        let err = api
            .delete(ClusterResource::PersistentVolumeClaim, "ns", "data")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
