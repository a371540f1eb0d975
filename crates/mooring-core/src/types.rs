//! Domain descriptors for the five resource kinds.
//!
//! Identifiers are store-assigned and immutable once created; they are
//! never sent to the orchestrator, which addresses everything by
//! namespace + name. Child collections are exclusively owned by their
//! parent: they live and die with it and carry no identity of their own.
//! Port and route-path order is significant (manifest generation must be
//! deterministic); env and storage order is not.

use serde::{Deserialize, Serialize};

/// Common accessors the generic coordinator and store need from every
/// descriptor kind.
pub trait Record: Clone + Send + Sync {
    /// Store-assigned identifier; 0 means "not yet persisted".
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    /// Orchestrator resource name (unique per kind).
    fn name(&self) -> &str;
    fn namespace(&self) -> &str;
}

macro_rules! impl_record {
    ($ty:ty) => {
        impl Record for $ty {
            fn id(&self) -> i64 {
                self.id
            }
            fn set_id(&mut self, id: i64) {
                self.id = id;
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn namespace(&self) -> &str {
                &self.namespace
            }
        }
    };
}

/// Environment variable injected into a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

// ── Workload ──────────────────────────────────────────────────────

/// A declared compute workload, realized as a Deployment in the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub namespace: String,
    /// Owning team, for bookkeeping only.
    #[serde(default)]
    pub team_id: i64,
    pub image: String,
    pub replicas: i32,
    /// CPU limit in cores; the request is derived from this by policy.
    pub cpu_max: f64,
    /// Memory limit in GiB; the request is derived from this by policy.
    pub memory_max: f64,
    /// Always | Never | IfNotPresent; anything else normalizes to Always.
    #[serde(default)]
    pub pull_policy: String,
    #[serde(default)]
    pub restart_policy: String,
    /// Ordered; order is preserved through the store.
    #[serde(default)]
    pub ports: Vec<WorkloadPort>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

/// A container port exposed by a workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadPort {
    pub container_port: i32,
    /// TCP | UDP | SCTP; anything else normalizes to TCP.
    #[serde(default)]
    pub protocol: String,
}

impl_record!(Workload);

// ── Middleware ────────────────────────────────────────────────────

/// A stateful middleware instance (database, cache, message broker),
/// realized as a StatefulSet with per-replica volume claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Middleware {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub namespace: String,
    /// Middleware catalogue type (mysql, redis, ...).
    #[serde(default)]
    pub type_id: i64,
    #[serde(default)]
    pub version_id: i64,
    pub image: String,
    pub replicas: i32,
    /// CPU limit in cores; request derived by policy.
    pub cpu: f64,
    /// Memory limit in GiB; request derived by policy.
    pub memory: f64,
    /// Ordered; order is preserved through the store.
    #[serde(default)]
    pub ports: Vec<MiddlewarePort>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub storage: Vec<MiddlewareStorage>,
    /// Generated bootstrap credentials, if any.
    #[serde(default)]
    pub config: Option<MiddlewareConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewarePort {
    pub port: i32,
    #[serde(default)]
    pub protocol: String,
}

/// A persistent volume claim template entry for a middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareStorage {
    pub name: String,
    /// Requested size in GiB.
    pub size_gi: f64,
    pub mount_path: String,
    pub storage_class: String,
    /// ReadWriteOnce | ReadOnlyMany | ReadWriteMany | ReadWriteOncePod.
    #[serde(default)]
    pub access_mode: String,
}

/// Bootstrap account material for a provisioned middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    #[serde(default)]
    pub root_user: String,
    #[serde(default)]
    pub root_password: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

impl_record!(Middleware);

/// A catalogue entry describing a middleware product (mysql, redis, ...).
/// Instances reference it through `Middleware::type_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareType {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Logo URL shown by frontends.
    #[serde(default)]
    pub logo_url: String,
    /// Versions offered for this type.
    #[serde(default)]
    pub versions: Vec<MiddlewareVersion>,
}

/// One deployable version of a middleware type. The container image an
/// instance runs is `docker_image:version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareVersion {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub type_id: i64,
    /// Image repository, without tag.
    pub docker_image: String,
    /// Image tag.
    pub version: String,
}

impl MiddlewareVersion {
    /// Full image reference for this version.
    pub fn image(&self) -> String {
        format!("{}:{}", self.docker_image, self.version)
    }
}

// ── Network service ───────────────────────────────────────────────

/// A declared network service, realized as a Service in the cluster.
/// The selector targets the named workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkService {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub namespace: String,
    /// Name of the workload this service fronts.
    pub workload_name: String,
    /// ClusterIP | NodePort | LoadBalancer | ExternalName; anything else
    /// normalizes to ClusterIP.
    #[serde(default)]
    pub service_type: String,
    /// Only meaningful for ExternalName services.
    #[serde(default)]
    pub external_name: String,
    #[serde(default)]
    pub team_id: i64,
    /// Ordered; order is preserved through the store.
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: i32,
    pub target_port: i32,
    /// Only meaningful for NodePort services; 0 lets the cluster pick.
    #[serde(default)]
    pub node_port: i32,
    #[serde(default)]
    pub protocol: String,
}

impl_record!(NetworkService);

// ── Route ─────────────────────────────────────────────────────────

/// A declared ingress route: one host, ordered path rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub namespace: String,
    pub host: String,
    /// Ordered; order is preserved through the store.
    #[serde(default)]
    pub paths: Vec<RoutePath>,
}

/// A single path rule backing a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    /// URL path prefix, e.g. "/api".
    pub path: String,
    pub backend_service: String,
    pub backend_port: i32,
}

impl_record!(Route);

// ── Volume ────────────────────────────────────────────────────────

/// A declared persistent volume, realized as a PersistentVolumeClaim.
/// Volumes own no child collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub namespace: String,
    /// ReadWriteOnce | ReadOnlyMany | ReadWriteMany | ReadWriteOncePod.
    #[serde(default)]
    pub access_mode: String,
    pub storage_class: String,
    /// Requested size in GiB.
    pub request_size_gi: f64,
    /// Filesystem | Block; anything else normalizes to Filesystem.
    #[serde(default)]
    pub volume_mode: String,
}

impl_record!(Volume);
