//! Middleware records: parent table plus ports, env, storage, and an
//! optional config row.

use async_trait::async_trait;
use mooring_core::{EnvVar, Middleware, MiddlewareConfig, MiddlewarePort, MiddlewareStorage};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::RecordStore;

#[derive(Clone)]
pub struct MiddlewareStore {
    pool: SqlitePool,
}

impl MiddlewareStore {
    pub fn new(pool: SqlitePool) -> Self {
        MiddlewareStore { pool }
    }

    /// All middleware instances of one catalogue type, children loaded.
    pub async fn find_all_by_type_id(&self, type_id: i64) -> StoreResult<Vec<Middleware>> {
        let rows = sqlx::query("SELECT * FROM middlewares WHERE type_id = ? ORDER BY id")
            .bind(type_id)
            .fetch_all(&self.pool)
            .await?;
        let mut middlewares = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut middleware = Self::from_row(row);
            self.load_children(&mut middleware).await?;
            middlewares.push(middleware);
        }
        Ok(middlewares)
    }

    fn from_row(row: &SqliteRow) -> Middleware {
        Middleware {
            id: row.get("id"),
            name: row.get("name"),
            namespace: row.get("namespace"),
            type_id: row.get("type_id"),
            version_id: row.get("version_id"),
            image: row.get("image"),
            replicas: row.get("replicas"),
            cpu: row.get("cpu"),
            memory: row.get("memory"),
            ports: vec![],
            env: vec![],
            storage: vec![],
            config: None,
        }
    }

    async fn load_children(&self, middleware: &mut Middleware) -> StoreResult<()> {
        let rows = sqlx::query(
            "SELECT port, protocol FROM middleware_ports
             WHERE middleware_id = ? ORDER BY id",
        )
        .bind(middleware.id)
        .fetch_all(&self.pool)
        .await?;
        middleware.ports = rows
            .iter()
            .map(|row| MiddlewarePort {
                port: row.get("port"),
                protocol: row.get("protocol"),
            })
            .collect();

        let rows = sqlx::query(
            "SELECT env_key, env_value FROM middleware_env
             WHERE middleware_id = ? ORDER BY id",
        )
        .bind(middleware.id)
        .fetch_all(&self.pool)
        .await?;
        middleware.env = rows
            .iter()
            .map(|row| EnvVar {
                key: row.get("env_key"),
                value: row.get("env_value"),
            })
            .collect();

        let rows = sqlx::query(
            "SELECT name, size_gi, mount_path, storage_class, access_mode
             FROM middleware_storage WHERE middleware_id = ? ORDER BY id",
        )
        .bind(middleware.id)
        .fetch_all(&self.pool)
        .await?;
        middleware.storage = rows
            .iter()
            .map(|row| MiddlewareStorage {
                name: row.get("name"),
                size_gi: row.get("size_gi"),
                mount_path: row.get("mount_path"),
                storage_class: row.get("storage_class"),
                access_mode: row.get("access_mode"),
            })
            .collect();

        let row = sqlx::query(
            "SELECT root_user, root_password, plain_user, plain_password, database_name
             FROM middleware_configs WHERE middleware_id = ?",
        )
        .bind(middleware.id)
        .fetch_optional(&self.pool)
        .await?;
        middleware.config = row.map(|row| MiddlewareConfig {
            root_user: row.get("root_user"),
            root_password: row.get("root_password"),
            user: row.get("plain_user"),
            password: row.get("plain_password"),
            database: row.get("database_name"),
        });
        Ok(())
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        record: &Middleware,
    ) -> StoreResult<()> {
        for port in &record.ports {
            sqlx::query(
                "INSERT INTO middleware_ports (middleware_id, port, protocol)
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(port.port)
            .bind(&port.protocol)
            .execute(&mut **tx)
            .await?;
        }
        for env in &record.env {
            sqlx::query(
                "INSERT INTO middleware_env (middleware_id, env_key, env_value)
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(&env.key)
            .bind(&env.value)
            .execute(&mut **tx)
            .await?;
        }
        for storage in &record.storage {
            sqlx::query(
                "INSERT INTO middleware_storage
                 (middleware_id, name, size_gi, mount_path, storage_class, access_mode)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&storage.name)
            .bind(storage.size_gi)
            .bind(&storage.mount_path)
            .bind(&storage.storage_class)
            .bind(&storage.access_mode)
            .execute(&mut **tx)
            .await?;
        }
        if let Some(config) = &record.config {
            sqlx::query(
                "INSERT INTO middleware_configs
                 (middleware_id, root_user, root_password, plain_user, plain_password,
                  database_name)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&config.root_user)
            .bind(&config.root_password)
            .bind(&config.user)
            .bind(&config.password)
            .bind(&config.database)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn delete_children(tx: &mut Transaction<'_, Sqlite>, id: i64) -> StoreResult<()> {
        for table in [
            "middleware_ports",
            "middleware_env",
            "middleware_storage",
            "middleware_configs",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE middleware_id = ?"))
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore<Middleware> for MiddlewareStore {
    async fn insert(&self, record: &Middleware) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO middlewares
             (name, namespace, type_id, version_id, image, replicas, cpu, memory)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(record.type_id)
        .bind(record.version_id)
        .bind(&record.image)
        .bind(record.replicas)
        .bind(record.cpu)
        .bind(record.memory)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        Self::insert_children(&mut tx, id, record).await?;
        tx.commit().await?;
        debug!(id, name = %record.name, "middleware stored");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Middleware> {
        let row = sqlx::query("SELECT * FROM middlewares WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("middleware {id}")))?;
        let mut middleware = Self::from_row(&row);
        self.load_children(&mut middleware).await?;
        Ok(middleware)
    }

    async fn find_all(&self) -> StoreResult<Vec<Middleware>> {
        let rows = sqlx::query("SELECT * FROM middlewares ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut middlewares = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut middleware = Self::from_row(row);
            self.load_children(&mut middleware).await?;
            middlewares.push(middleware);
        }
        Ok(middlewares)
    }

    async fn update(&self, record: &Middleware) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE middlewares SET
             name = ?, namespace = ?, type_id = ?, version_id = ?, image = ?,
             replicas = ?, cpu = ?, memory = ?
             WHERE id = ?",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(record.type_id)
        .bind(record.version_id)
        .bind(&record.image)
        .bind(record.replicas)
        .bind(record.cpu)
        .bind(record.memory)
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("middleware {}", record.id)));
        }
        Ok(())
    }

    async fn replace_children(&self, record: &Middleware) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_children(&mut tx, record.id).await?;
        Self::insert_children(&mut tx, record.id, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_children(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM middlewares WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("middleware {id}")));
        }
        tx.commit().await?;
        debug!(id, "middleware deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_in_memory;

    fn test_middleware() -> Middleware {
        Middleware {
            id: 0,
            name: "orders-db".to_string(),
            namespace: "prod".to_string(),
            type_id: 1,
            version_id: 4,
            image: "mysql:8.0".to_string(),
            replicas: 3,
            cpu: 2.0,
            memory: 4.0,
            ports: vec![MiddlewarePort {
                port: 3306,
                protocol: "TCP".to_string(),
            }],
            env: vec![EnvVar {
                key: "MYSQL_ROOT_PASSWORD".to_string(),
                value: "secret".to_string(),
            }],
            storage: vec![MiddlewareStorage {
                name: "data".to_string(),
                size_gi: 20.0,
                mount_path: "/var/lib/mysql".to_string(),
                storage_class: "rbd".to_string(),
                access_mode: "ReadWriteOnce".to_string(),
            }],
            config: Some(MiddlewareConfig {
                root_user: "root".to_string(),
                root_password: "secret".to_string(),
                user: "orders".to_string(),
                password: "orders-pw".to_string(),
                database: "orders".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn insert_round_trips_all_children() {
        let store = MiddlewareStore::new(open_in_memory().await.unwrap());
        let mut middleware = test_middleware();
        middleware.id = store.insert(&middleware).await.unwrap();

        let found = store.find_by_id(middleware.id).await.unwrap();
        assert_eq!(found, middleware);
    }

    #[tokio::test]
    async fn missing_config_row_loads_as_none() {
        let store = MiddlewareStore::new(open_in_memory().await.unwrap());
        let mut middleware = test_middleware();
        middleware.config = None;
        middleware.id = store.insert(&middleware).await.unwrap();

        let found = store.find_by_id(middleware.id).await.unwrap();
        assert!(found.config.is_none());
    }

    #[tokio::test]
    async fn find_all_by_type_id_filters() {
        let store = MiddlewareStore::new(open_in_memory().await.unwrap());
        let mut mysql = test_middleware();
        let mut redis = test_middleware();
        redis.name = "session-cache".to_string();
        redis.type_id = 2;
        mysql.id = store.insert(&mysql).await.unwrap();
        redis.id = store.insert(&redis).await.unwrap();

        let of_type = store.find_all_by_type_id(2).await.unwrap();
        assert_eq!(of_type, vec![redis]);
    }

    #[tokio::test]
    async fn delete_removes_every_child_table() {
        let pool = open_in_memory().await.unwrap();
        let store = MiddlewareStore::new(pool.clone());
        let id = store.insert(&test_middleware()).await.unwrap();

        store.delete(id).await.unwrap();

        for table in [
            "middleware_ports",
            "middleware_env",
            "middleware_storage",
            "middleware_configs",
        ] {
            let (count,): (i64,) =
                sqlx::query_as(&format!("SELECT COUNT(*) FROM {table} WHERE middleware_id = ?"))
                    .bind(id)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert_eq!(count, 0, "{table} not emptied");
        }
    }

    #[tokio::test]
    async fn replace_children_swaps_config() {
        let store = MiddlewareStore::new(open_in_memory().await.unwrap());
        let mut middleware = test_middleware();
        middleware.id = store.insert(&middleware).await.unwrap();

        middleware.config = Some(MiddlewareConfig {
            root_user: "admin".to_string(),
            root_password: "rotated".to_string(),
            user: "orders".to_string(),
            password: "rotated-pw".to_string(),
            database: "orders".to_string(),
        });
        middleware.storage.clear();
        store.replace_children(&middleware).await.unwrap();

        let found = store.find_by_id(middleware.id).await.unwrap();
        assert_eq!(found.config.as_ref().unwrap().root_password, "rotated");
        assert!(found.storage.is_empty());
    }
}
