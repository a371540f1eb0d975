//! The orchestrator client trait and its HTTP implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClusterError, ClusterResult};
use crate::resource::ClusterResource;

/// Raw resource access against the orchestrator. All addressing is by
/// (kind, namespace, name); manifests travel as JSON documents.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch a resource; `Ok(None)` when the orchestrator reports 404.
    async fn get(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<Value>>;

    /// Submit a new resource to the namespaced collection.
    async fn create(
        &self,
        resource: ClusterResource,
        namespace: &str,
        manifest: &Value,
    ) -> ClusterResult<()>;

    /// Replace an existing named resource.
    async fn update(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
        manifest: &Value,
    ) -> ClusterResult<()>;

    /// Delete a named resource. Absence is an orchestrator error (404),
    /// propagated like any other.
    async fn delete(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<()>;
}

/// REST client against the orchestrator API server.
#[derive(Clone)]
pub struct HttpClusterApi {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpClusterApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        HttpClusterApi {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn check(response: reqwest::Response) -> ClusterResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClusterError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn get(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<Option<Value>> {
        let path = resource.resource_path(namespace, name);
        debug!(%resource, %namespace, %name, "cluster get");
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        let value = response
            .json()
            .await
            .map_err(|e| ClusterError::Serialize(e.to_string()))?;
        Ok(Some(value))
    }

    async fn create(
        &self,
        resource: ClusterResource,
        namespace: &str,
        manifest: &Value,
    ) -> ClusterResult<()> {
        let path = resource.collection_path(namespace);
        debug!(%resource, %namespace, "cluster create");
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(manifest)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
        manifest: &Value,
    ) -> ClusterResult<()> {
        let path = resource.resource_path(namespace, name);
        debug!(%resource, %namespace, %name, "cluster update");
        let response = self
            .request(reqwest::Method::PUT, &path)
            .json(manifest)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(
        &self,
        resource: ClusterResource,
        namespace: &str,
        name: &str,
    ) -> ClusterResult<()> {
        let path = resource.resource_path(namespace, name);
        debug!(%resource, %namespace, %name, "cluster delete");
        let response = self.request(reqwest::Method::DELETE, &path).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
