//! mooring-cluster — orchestrator API client and synchronizer.
//!
//! The orchestrator (an external Kubernetes-style API server) owns live
//! cluster state. This crate provides:
//!
//! - [`ClusterApi`]: the object-safe client trait, addressed by
//!   (resource kind, namespace, name) with JSON manifest payloads
//! - [`HttpClusterApi`]: the production implementation over REST
//! - [`MemoryClusterApi`]: an in-memory implementation for tests and
//!   dry-run mode
//! - [`Synchronizer`]: the check-then-act layer that converts raw API
//!   calls into Created / AlreadyExists / Updated / NotFound outcomes
//!
//! Nothing here retries; orchestrator errors surface unmodified to the
//! coordinator.

pub mod client;
pub mod error;
pub mod memory;
pub mod resource;
pub mod sync;

pub use client::{ClusterApi, HttpClusterApi};
pub use error::{ClusterError, ClusterResult};
pub use memory::MemoryClusterApi;
pub use resource::ClusterResource;
pub use sync::{CreateOutcome, Synchronizer, UpdateOutcome};
