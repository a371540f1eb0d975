//! Volume records. The only kind without child tables, so every
//! operation is a single statement.

use async_trait::async_trait;
use mooring_core::Volume;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::RecordStore;

#[derive(Clone)]
pub struct VolumeStore {
    pool: SqlitePool,
}

impl VolumeStore {
    pub fn new(pool: SqlitePool) -> Self {
        VolumeStore { pool }
    }

    fn from_row(row: &SqliteRow) -> Volume {
        Volume {
            id: row.get("id"),
            name: row.get("name"),
            namespace: row.get("namespace"),
            access_mode: row.get("access_mode"),
            storage_class: row.get("storage_class"),
            request_size_gi: row.get("request_size_gi"),
            volume_mode: row.get("volume_mode"),
        }
    }
}

#[async_trait]
impl RecordStore<Volume> for VolumeStore {
    async fn insert(&self, record: &Volume) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO volumes
             (name, namespace, access_mode, storage_class, request_size_gi, volume_mode)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(&record.access_mode)
        .bind(&record.storage_class)
        .bind(record.request_size_gi)
        .bind(&record.volume_mode)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        debug!(id, name = %record.name, "volume stored");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Volume> {
        let row = sqlx::query("SELECT * FROM volumes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("volume {id}")))?;
        Ok(Self::from_row(&row))
    }

    async fn find_all(&self) -> StoreResult<Vec<Volume>> {
        let rows = sqlx::query("SELECT * FROM volumes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::from_row).collect())
    }

    async fn update(&self, record: &Volume) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE volumes SET
             name = ?, namespace = ?, access_mode = ?, storage_class = ?,
             request_size_gi = ?, volume_mode = ?
             WHERE id = ?",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(&record.access_mode)
        .bind(&record.storage_class)
        .bind(record.request_size_gi)
        .bind(&record.volume_mode)
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("volume {}", record.id)));
        }
        Ok(())
    }

    async fn replace_children(&self, _record: &Volume) -> StoreResult<()> {
        // Volumes own no child collections.
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM volumes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("volume {id}")));
        }
        debug!(id, "volume deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_in_memory;

    fn test_volume() -> Volume {
        Volume {
            id: 0,
            name: "data-1".to_string(),
            namespace: "ns1".to_string(),
            access_mode: "ReadWriteOnce".to_string(),
            storage_class: "rbd".to_string(),
            request_size_gi: 10.0,
            volume_mode: "Filesystem".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_round_trips() {
        let store = VolumeStore::new(open_in_memory().await.unwrap());
        let mut volume = test_volume();
        volume.id = store.insert(&volume).await.unwrap();

        let found = store.find_by_id(volume.id).await.unwrap();
        assert_eq!(found, volume);
    }

    #[tokio::test]
    async fn duplicate_name_in_namespace_is_rejected() {
        let store = VolumeStore::new(open_in_memory().await.unwrap());
        store.insert(&test_volume()).await.unwrap();

        let err = store.insert(&test_volume()).await.unwrap_err();
        assert!(!err.is_not_found());

        // Same name in a different namespace is fine.
        let mut other = test_volume();
        other.namespace = "ns2".to_string();
        store.insert(&other).await.unwrap();
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = VolumeStore::new(open_in_memory().await.unwrap());
        let mut volume = test_volume();
        volume.id = 7;
        assert!(store.update(&volume).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = VolumeStore::new(open_in_memory().await.unwrap());
        let id = store.insert(&test_volume()).await.unwrap();

        store.delete(id).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap_err().is_not_found());
    }
}
