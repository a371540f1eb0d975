//! mooring-core — shared domain types for the Mooring control plane.
//!
//! A *descriptor* is Mooring's own representation of a declared resource,
//! independent of the orchestrator's manifest schema and of the store's
//! row layout. The five kinds (workload, middleware, network service,
//! route, volume) each have one descriptor type here; every other crate
//! speaks in these types at its boundary.

pub mod config;
pub mod types;

pub use config::MooringConfig;
pub use types::*;
