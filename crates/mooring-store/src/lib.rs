//! mooring-store — relational bookkeeping for declared resources.
//!
//! One parent table per resource kind, one child table per owned
//! collection, linked by a foreign key to the parent's rowid. Child rows
//! have no identity of their own: they are written when the parent is
//! inserted, replaced wholesale on resync, and removed with the parent
//! inside a single transaction.
//!
//! Backed by SQLite via sqlx. `open` gives a file-backed pool for the
//! daemon, `open_in_memory` an ephemeral one for tests. The store is the
//! authoritative source for queries; it never talks to the orchestrator.

pub mod catalogue;
pub mod error;
pub mod middleware;
pub mod pool;
pub mod record;
pub mod route;
pub mod service;
pub mod volume;
pub mod workload;

pub use catalogue::CatalogueStore;
pub use error::{StoreError, StoreResult};
pub use middleware::MiddlewareStore;
pub use pool::{ensure_tables, open, open_in_memory};
pub use record::RecordStore;
pub use route::RouteStore;
pub use service::ServiceStore;
pub use volume::VolumeStore;
pub use workload::WorkloadStore;
