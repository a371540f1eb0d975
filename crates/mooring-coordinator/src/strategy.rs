//! Per-kind strategies plugged into the generic coordinator.
//!
//! A strategy answers three questions about one resource kind: which
//! cluster resource realizes it, whether a descriptor is acceptable, and
//! what manifest it translates to. Everything else (ordering, gating,
//! bookkeeping) lives in the coordinator and is shared by all kinds.

use mooring_cluster::ClusterResource;
use mooring_core::{Middleware, NetworkService, Record, Route, Volume, Workload};
use mooring_manifest::{
    middleware_manifest, route_manifest, service_manifest, volume_manifest, workload_manifest,
    TranslatePolicy,
};
use serde_json::Value;

use crate::error::{CoordinatorError, CoordinatorResult};

pub trait Strategy: Send + Sync {
    type Record: Record;

    /// Human-readable kind name for errors and logs.
    fn kind(&self) -> &'static str;

    fn resource(&self) -> ClusterResource;

    fn validate(&self, record: &Self::Record) -> CoordinatorResult<()>;

    /// Translate the descriptor to its wire manifest. Pure; never talks
    /// to the cluster or the store.
    fn manifest(&self, record: &Self::Record) -> CoordinatorResult<Value>;
}

fn require(condition: bool, message: &str) -> CoordinatorResult<()> {
    if condition {
        Ok(())
    } else {
        Err(CoordinatorError::Validation(message.to_string()))
    }
}

fn require_identity(record: &impl Record) -> CoordinatorResult<()> {
    require(!record.name().is_empty(), "name must not be empty")?;
    require(!record.namespace().is_empty(), "namespace must not be empty")
}

// ── Workload ──────────────────────────────────────────────────────

pub struct WorkloadStrategy {
    policy: TranslatePolicy,
}

impl WorkloadStrategy {
    pub fn new(policy: TranslatePolicy) -> Self {
        WorkloadStrategy { policy }
    }
}

impl Strategy for WorkloadStrategy {
    type Record = Workload;

    fn kind(&self) -> &'static str {
        "workload"
    }

    fn resource(&self) -> ClusterResource {
        ClusterResource::Deployment
    }

    fn validate(&self, record: &Workload) -> CoordinatorResult<()> {
        require_identity(record)?;
        require(!record.image.is_empty(), "image must not be empty")?;
        require(record.replicas > 0, "replicas must be positive")?;
        require(record.cpu_max > 0.0, "cpu limit must be positive")?;
        require(record.memory_max > 0.0, "memory limit must be positive")
    }

    fn manifest(&self, record: &Workload) -> CoordinatorResult<Value> {
        Ok(serde_json::to_value(workload_manifest(record, &self.policy))?)
    }
}

// ── Middleware ────────────────────────────────────────────────────

pub struct MiddlewareStrategy {
    policy: TranslatePolicy,
}

impl MiddlewareStrategy {
    pub fn new(policy: TranslatePolicy) -> Self {
        MiddlewareStrategy { policy }
    }
}

impl Strategy for MiddlewareStrategy {
    type Record = Middleware;

    fn kind(&self) -> &'static str {
        "middleware"
    }

    fn resource(&self) -> ClusterResource {
        ClusterResource::StatefulSet
    }

    fn validate(&self, record: &Middleware) -> CoordinatorResult<()> {
        require_identity(record)?;
        require(!record.image.is_empty(), "image must not be empty")?;
        require(record.replicas > 0, "replicas must be positive")?;
        require(record.cpu > 0.0, "cpu limit must be positive")?;
        require(record.memory > 0.0, "memory limit must be positive")?;
        for storage in &record.storage {
            require(!storage.name.is_empty(), "storage name must not be empty")?;
            require(storage.size_gi > 0.0, "storage size must be positive")?;
        }
        Ok(())
    }

    fn manifest(&self, record: &Middleware) -> CoordinatorResult<Value> {
        Ok(serde_json::to_value(middleware_manifest(record, &self.policy))?)
    }
}

// ── Network service ───────────────────────────────────────────────

pub struct ServiceStrategy {
    policy: TranslatePolicy,
}

impl ServiceStrategy {
    pub fn new(policy: TranslatePolicy) -> Self {
        ServiceStrategy { policy }
    }
}

impl Strategy for ServiceStrategy {
    type Record = NetworkService;

    fn kind(&self) -> &'static str {
        "service"
    }

    fn resource(&self) -> ClusterResource {
        ClusterResource::Service
    }

    fn validate(&self, record: &NetworkService) -> CoordinatorResult<()> {
        require_identity(record)?;
        require(
            !record.workload_name.is_empty(),
            "workload name must not be empty",
        )?;
        require(!record.ports.is_empty(), "at least one port is required")
    }

    fn manifest(&self, record: &NetworkService) -> CoordinatorResult<Value> {
        Ok(serde_json::to_value(service_manifest(record, &self.policy))?)
    }
}

// ── Route ─────────────────────────────────────────────────────────

pub struct RouteStrategy {
    policy: TranslatePolicy,
}

impl RouteStrategy {
    pub fn new(policy: TranslatePolicy) -> Self {
        RouteStrategy { policy }
    }
}

impl Strategy for RouteStrategy {
    type Record = Route;

    fn kind(&self) -> &'static str {
        "route"
    }

    fn resource(&self) -> ClusterResource {
        ClusterResource::Ingress
    }

    fn validate(&self, record: &Route) -> CoordinatorResult<()> {
        require_identity(record)?;
        require(!record.host.is_empty(), "host must not be empty")?;
        require(!record.paths.is_empty(), "at least one path rule is required")?;
        for path in &record.paths {
            require(path.path.starts_with('/'), "path must start with '/'")?;
            require(
                !path.backend_service.is_empty(),
                "backend service must not be empty",
            )?;
        }
        Ok(())
    }

    fn manifest(&self, record: &Route) -> CoordinatorResult<Value> {
        Ok(serde_json::to_value(route_manifest(record, &self.policy))?)
    }
}

// ── Volume ────────────────────────────────────────────────────────

pub struct VolumeStrategy {
    policy: TranslatePolicy,
}

impl VolumeStrategy {
    pub fn new(policy: TranslatePolicy) -> Self {
        VolumeStrategy { policy }
    }
}

impl Strategy for VolumeStrategy {
    type Record = Volume;

    fn kind(&self) -> &'static str {
        "volume"
    }

    fn resource(&self) -> ClusterResource {
        ClusterResource::PersistentVolumeClaim
    }

    fn validate(&self, record: &Volume) -> CoordinatorResult<()> {
        require_identity(record)?;
        require(
            !record.storage_class.is_empty(),
            "storage class must not be empty",
        )?;
        require(
            record.request_size_gi > 0.0,
            "requested size must be positive",
        )
    }

    fn manifest(&self, record: &Volume) -> CoordinatorResult<Value> {
        Ok(serde_json::to_value(volume_manifest(record, &self.policy))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_validation_rejects_bad_size() {
        let strategy = VolumeStrategy::new(TranslatePolicy::default());
        let volume = Volume {
            id: 0,
            name: "data".to_string(),
            namespace: "ns".to_string(),
            access_mode: String::new(),
            storage_class: "rbd".to_string(),
            request_size_gi: 0.0,
            volume_mode: String::new(),
        };
        let err = strategy.validate(&volume).unwrap_err();
        assert!(matches!(err, CoordinatorError::Validation(_)));
    }

    #[test]
    fn route_validation_rejects_relative_path() {
        let strategy = RouteStrategy::new(TranslatePolicy::default());
        let route = Route {
            id: 0,
            name: "edge".to_string(),
            namespace: "ns".to_string(),
            host: "a.example.com".to_string(),
            paths: vec![mooring_core::RoutePath {
                path: "api".to_string(),
                backend_service: "svc".to_string(),
                backend_port: 80,
            }],
        };
        assert!(strategy.validate(&route).is_err());
    }

    #[test]
    fn manifest_is_serializable_json() {
        let strategy = VolumeStrategy::new(TranslatePolicy::default());
        let volume = Volume {
            id: 0,
            name: "data".to_string(),
            namespace: "ns".to_string(),
            access_mode: "ReadWriteOnce".to_string(),
            storage_class: "rbd".to_string(),
            request_size_gi: 10.0,
            volume_mode: String::new(),
        };
        let manifest = strategy.manifest(&volume).unwrap();
        assert_eq!(manifest["kind"], "PersistentVolumeClaim");
        assert_eq!(
            manifest["spec"]["resources"]["requests"]["storage"],
            "10.000000Gi"
        );
    }
}
