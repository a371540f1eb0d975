//! Pool construction and schema bootstrap.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Open (or create) a file-backed database.
pub async fn open(path: &Path) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Open(e.to_string()))?;
    ensure_tables(&pool).await?;
    debug!(?path, "metadata store opened");
    Ok(pool)
}

/// Open an ephemeral in-memory database (for testing and dry-run). A
/// single never-recycled connection keeps the database alive for the
/// pool's lifetime.
pub async fn open_in_memory() -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| StoreError::Open(e.to_string()))?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Open(e.to_string()))?;
    ensure_tables(&pool).await?;
    debug!("in-memory metadata store opened");
    Ok(pool)
}

/// Create every parent and child table if absent. Idempotent; safe to
/// run on every startup.
pub async fn ensure_tables(pool: &SqlitePool) -> StoreResult<()> {
    const DDL: &[&str] = &[
        // Workloads.
        "CREATE TABLE IF NOT EXISTS workloads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            team_id INTEGER NOT NULL DEFAULT 0,
            image TEXT NOT NULL,
            replicas INTEGER NOT NULL,
            cpu_max REAL NOT NULL,
            memory_max REAL NOT NULL,
            pull_policy TEXT NOT NULL DEFAULT '',
            restart_policy TEXT NOT NULL DEFAULT '',
            UNIQUE (namespace, name)
        )",
        "CREATE TABLE IF NOT EXISTS workload_ports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workload_id INTEGER NOT NULL,
            container_port INTEGER NOT NULL,
            protocol TEXT NOT NULL DEFAULT ''
        )",
        "CREATE TABLE IF NOT EXISTS workload_env (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workload_id INTEGER NOT NULL,
            env_key TEXT NOT NULL,
            env_value TEXT NOT NULL
        )",
        // Middleware.
        "CREATE TABLE IF NOT EXISTS middlewares (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            type_id INTEGER NOT NULL DEFAULT 0,
            version_id INTEGER NOT NULL DEFAULT 0,
            image TEXT NOT NULL,
            replicas INTEGER NOT NULL,
            cpu REAL NOT NULL,
            memory REAL NOT NULL,
            UNIQUE (namespace, name)
        )",
        "CREATE TABLE IF NOT EXISTS middleware_ports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            middleware_id INTEGER NOT NULL,
            port INTEGER NOT NULL,
            protocol TEXT NOT NULL DEFAULT ''
        )",
        "CREATE TABLE IF NOT EXISTS middleware_env (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            middleware_id INTEGER NOT NULL,
            env_key TEXT NOT NULL,
            env_value TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS middleware_storage (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            middleware_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            size_gi REAL NOT NULL,
            mount_path TEXT NOT NULL,
            storage_class TEXT NOT NULL,
            access_mode TEXT NOT NULL DEFAULT ''
        )",
        "CREATE TABLE IF NOT EXISTS middleware_configs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            middleware_id INTEGER NOT NULL,
            root_user TEXT NOT NULL DEFAULT '',
            root_password TEXT NOT NULL DEFAULT '',
            plain_user TEXT NOT NULL DEFAULT '',
            plain_password TEXT NOT NULL DEFAULT '',
            database_name TEXT NOT NULL DEFAULT ''
        )",
        // Middleware catalogue.
        "CREATE TABLE IF NOT EXISTS middleware_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            logo_url TEXT NOT NULL DEFAULT '',
            UNIQUE (name)
        )",
        "CREATE TABLE IF NOT EXISTS middleware_versions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_id INTEGER NOT NULL,
            docker_image TEXT NOT NULL,
            version TEXT NOT NULL
        )",
        // Network services.
        "CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            workload_name TEXT NOT NULL,
            service_type TEXT NOT NULL DEFAULT '',
            external_name TEXT NOT NULL DEFAULT '',
            team_id INTEGER NOT NULL DEFAULT 0,
            UNIQUE (namespace, name)
        )",
        "CREATE TABLE IF NOT EXISTS service_ports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service_id INTEGER NOT NULL,
            port INTEGER NOT NULL,
            target_port INTEGER NOT NULL,
            node_port INTEGER NOT NULL DEFAULT 0,
            protocol TEXT NOT NULL DEFAULT ''
        )",
        // Routes.
        "CREATE TABLE IF NOT EXISTS routes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            host TEXT NOT NULL,
            UNIQUE (namespace, name)
        )",
        "CREATE TABLE IF NOT EXISTS route_paths (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            route_id INTEGER NOT NULL,
            path TEXT NOT NULL,
            backend_service TEXT NOT NULL,
            backend_port INTEGER NOT NULL
        )",
        // Volumes (no children).
        "CREATE TABLE IF NOT EXISTS volumes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            namespace TEXT NOT NULL,
            access_mode TEXT NOT NULL DEFAULT '',
            storage_class TEXT NOT NULL,
            request_size_gi REAL NOT NULL,
            volume_mode TEXT NOT NULL DEFAULT '',
            UNIQUE (namespace, name)
        )",
    ];

    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_tables_is_idempotent() {
        let pool = open_in_memory().await.unwrap();
        ensure_tables(&pool).await.unwrap();
        ensure_tables(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("mooring.db");

        {
            let pool = open(&db_path).await.unwrap();
            sqlx::query(
                "INSERT INTO volumes (name, namespace, storage_class, request_size_gi)
                 VALUES ('data', 'ns', 'rbd', 10.0)",
            )
            .execute(&pool)
            .await
            .unwrap();
            pool.close().await;
        }

        let pool = open(&db_path).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM volumes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }
}
