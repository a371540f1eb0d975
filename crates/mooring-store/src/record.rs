//! The per-kind store abstraction consumed by the coordinator.

use async_trait::async_trait;
use mooring_core::Record;

use crate::error::StoreResult;

/// CRUD over one resource kind's parent table and its owned child
/// tables. Implementations are thin sqlx wrappers; all of them share
/// the same guarantees:
///
/// - `insert` writes the parent row, then every child row, and returns
///   the store-assigned identifier.
/// - `find_by_id` / `find_all` eagerly load every owned child
///   collection, ordered by child rowid (insertion order).
/// - `update` overwrites parent scalar columns only.
/// - `replace_children` deletes and reinserts every child collection in
///   one transaction.
/// - `delete` removes every child row and the parent row in one
///   transaction; any failure rolls the whole delete back.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    async fn insert(&self, record: &R) -> StoreResult<i64>;

    async fn find_by_id(&self, id: i64) -> StoreResult<R>;

    async fn find_all(&self) -> StoreResult<Vec<R>>;

    async fn update(&self, record: &R) -> StoreResult<()>;

    async fn replace_children(&self, record: &R) -> StoreResult<()>;

    async fn delete(&self, id: i64) -> StoreResult<()>;
}
