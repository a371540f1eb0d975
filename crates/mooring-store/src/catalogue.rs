//! Middleware catalogue: the types on offer and their deployable
//! versions. Instances reference the catalogue by id; the image an
//! instance runs is resolved from its version entry at declaration time.

use mooring_core::{MiddlewareType, MiddlewareVersion};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

#[derive(Clone)]
pub struct CatalogueStore {
    pool: SqlitePool,
}

impl CatalogueStore {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogueStore { pool }
    }

    fn type_from_row(row: &SqliteRow) -> MiddlewareType {
        MiddlewareType {
            id: row.get("id"),
            name: row.get("name"),
            logo_url: row.get("logo_url"),
            versions: vec![],
        }
    }

    fn version_from_row(row: &SqliteRow) -> MiddlewareVersion {
        MiddlewareVersion {
            id: row.get("id"),
            type_id: row.get("type_id"),
            docker_image: row.get("docker_image"),
            version: row.get("version"),
        }
    }

    /// Register a type and any versions carried with it.
    pub async fn insert_type(&self, entry: &MiddlewareType) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("INSERT INTO middleware_types (name, logo_url) VALUES (?, ?)")
            .bind(&entry.name)
            .bind(&entry.logo_url)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();
        for version in &entry.versions {
            sqlx::query(
                "INSERT INTO middleware_versions (type_id, docker_image, version)
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(&version.docker_image)
            .bind(&version.version)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!(id, name = %entry.name, "middleware type registered");
        Ok(id)
    }

    pub async fn update_type(&self, entry: &MiddlewareType) -> StoreResult<()> {
        let result = sqlx::query("UPDATE middleware_types SET name = ?, logo_url = ? WHERE id = ?")
            .bind(&entry.name)
            .bind(&entry.logo_url)
            .bind(entry.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("middleware type {}", entry.id)));
        }
        Ok(())
    }

    /// Remove a type and all of its versions in one transaction.
    pub async fn delete_type(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM middleware_versions WHERE type_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM middleware_types WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("middleware type {id}")));
        }
        tx.commit().await?;
        debug!(id, "middleware type removed");
        Ok(())
    }

    pub async fn find_type_by_id(&self, id: i64) -> StoreResult<MiddlewareType> {
        let row = sqlx::query("SELECT * FROM middleware_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("middleware type {id}")))?;
        let mut entry = Self::type_from_row(&row);
        entry.versions = self.find_versions_by_type(id).await?;
        Ok(entry)
    }

    pub async fn find_all_types(&self) -> StoreResult<Vec<MiddlewareType>> {
        let rows = sqlx::query("SELECT * FROM middleware_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut types = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut entry = Self::type_from_row(row);
            entry.versions = self.find_versions_by_type(entry.id).await?;
            types.push(entry);
        }
        Ok(types)
    }

    /// Add a version under an existing type.
    pub async fn insert_version(&self, version: &MiddlewareVersion) -> StoreResult<i64> {
        // The parent must exist; versions never dangle.
        self.find_type_row(version.type_id).await?;
        let result = sqlx::query(
            "INSERT INTO middleware_versions (type_id, docker_image, version)
             VALUES (?, ?, ?)",
        )
        .bind(version.type_id)
        .bind(&version.docker_image)
        .bind(&version.version)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_version_by_id(&self, id: i64) -> StoreResult<MiddlewareVersion> {
        let row = sqlx::query("SELECT * FROM middleware_versions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("middleware version {id}")))?;
        Ok(Self::version_from_row(&row))
    }

    pub async fn find_versions_by_type(&self, type_id: i64) -> StoreResult<Vec<MiddlewareVersion>> {
        let rows = sqlx::query(
            "SELECT * FROM middleware_versions WHERE type_id = ? ORDER BY id",
        )
        .bind(type_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(Self::version_from_row).collect())
    }

    /// Full image reference for a version id ("mysql:8.0").
    pub async fn image_for_version(&self, version_id: i64) -> StoreResult<String> {
        Ok(self.find_version_by_id(version_id).await?.image())
    }

    async fn find_type_row(&self, id: i64) -> StoreResult<()> {
        sqlx::query("SELECT id FROM middleware_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("middleware type {id}")))?;
        Ok(())
    }
}
