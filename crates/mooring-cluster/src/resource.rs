//! Orchestrator resource kinds and their REST paths.

use std::fmt;

/// The five orchestrator resource kinds Mooring manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterResource {
    Deployment,
    StatefulSet,
    Service,
    Ingress,
    PersistentVolumeClaim,
}

impl ClusterResource {
    /// API group prefix for this kind ("/apis/apps/v1" or "/api/v1").
    fn group_prefix(&self) -> &'static str {
        match self {
            ClusterResource::Deployment | ClusterResource::StatefulSet => "/apis/apps/v1",
            ClusterResource::Ingress => "/apis/networking.k8s.io/v1",
            ClusterResource::Service | ClusterResource::PersistentVolumeClaim => "/api/v1",
        }
    }

    /// Plural resource segment used in paths.
    fn plural(&self) -> &'static str {
        match self {
            ClusterResource::Deployment => "deployments",
            ClusterResource::StatefulSet => "statefulsets",
            ClusterResource::Service => "services",
            ClusterResource::Ingress => "ingresses",
            ClusterResource::PersistentVolumeClaim => "persistentvolumeclaims",
        }
    }

    /// Path of the namespaced collection, for create.
    pub fn collection_path(&self, namespace: &str) -> String {
        format!(
            "{}/namespaces/{}/{}",
            self.group_prefix(),
            namespace,
            self.plural()
        )
    }

    /// Path of one named resource, for get/update/delete.
    pub fn resource_path(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.collection_path(namespace), name)
    }
}

impl fmt::Display for ClusterResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ClusterResource::Deployment => "Deployment",
            ClusterResource::StatefulSet => "StatefulSet",
            ClusterResource::Service => "Service",
            ClusterResource::Ingress => "Ingress",
            ClusterResource::PersistentVolumeClaim => "PersistentVolumeClaim",
        };
        f.write_str(kind)
    }
}
