//! mooring-coordinator — lifecycle coordination per resource kind.
//!
//! The coordinator ties the other layers together: it validates a
//! descriptor, asks the translator for a manifest, gates the mutation
//! through the synchronizer, and records the result in the store. The
//! flow is identical for every kind, so there is exactly one coordinator,
//! generic over a per-kind [`Strategy`].

pub mod coordinator;
pub mod error;
pub mod strategy;

pub use coordinator::Coordinator;
pub use error::{CoordinatorError, CoordinatorResult};
pub use strategy::{
    MiddlewareStrategy, RouteStrategy, ServiceStrategy, Strategy, VolumeStrategy, WorkloadStrategy,
};
