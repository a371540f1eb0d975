//! Route records: parent table plus an ordered path-rule child table.

use async_trait::async_trait;
use mooring_core::{Route, RoutePath};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::RecordStore;

#[derive(Clone)]
pub struct RouteStore {
    pool: SqlitePool,
}

impl RouteStore {
    pub fn new(pool: SqlitePool) -> Self {
        RouteStore { pool }
    }

    fn from_row(row: &SqliteRow) -> Route {
        Route {
            id: row.get("id"),
            name: row.get("name"),
            namespace: row.get("namespace"),
            host: row.get("host"),
            paths: vec![],
        }
    }

    async fn load_children(&self, route: &mut Route) -> StoreResult<()> {
        // Path order decides match precedence; keep insertion order.
        let rows = sqlx::query(
            "SELECT path, backend_service, backend_port FROM route_paths
             WHERE route_id = ? ORDER BY id",
        )
        .bind(route.id)
        .fetch_all(&self.pool)
        .await?;
        route.paths = rows
            .iter()
            .map(|row| RoutePath {
                path: row.get("path"),
                backend_service: row.get("backend_service"),
                backend_port: row.get("backend_port"),
            })
            .collect();
        Ok(())
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        record: &Route,
    ) -> StoreResult<()> {
        for path in &record.paths {
            sqlx::query(
                "INSERT INTO route_paths (route_id, path, backend_service, backend_port)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&path.path)
            .bind(&path.backend_service)
            .bind(path.backend_port)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore<Route> for RouteStore {
    async fn insert(&self, record: &Route) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("INSERT INTO routes (name, namespace, host) VALUES (?, ?, ?)")
            .bind(&record.name)
            .bind(&record.namespace)
            .bind(&record.host)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();
        Self::insert_children(&mut tx, id, record).await?;
        tx.commit().await?;
        debug!(id, name = %record.name, "route stored");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Route> {
        let row = sqlx::query("SELECT * FROM routes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("route {id}")))?;
        let mut route = Self::from_row(&row);
        self.load_children(&mut route).await?;
        Ok(route)
    }

    async fn find_all(&self) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query("SELECT * FROM routes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut routes = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut route = Self::from_row(row);
            self.load_children(&mut route).await?;
            routes.push(route);
        }
        Ok(routes)
    }

    async fn update(&self, record: &Route) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE routes SET name = ?, namespace = ?, host = ? WHERE id = ?")
                .bind(&record.name)
                .bind(&record.namespace)
                .bind(&record.host)
                .bind(record.id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("route {}", record.id)));
        }
        Ok(())
    }

    async fn replace_children(&self, record: &Route) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM route_paths WHERE route_id = ?")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_children(&mut tx, record.id, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM route_paths WHERE route_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM routes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("route {id}")));
        }
        tx.commit().await?;
        debug!(id, "route deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_in_memory;

    fn test_route() -> Route {
        Route {
            id: 0,
            name: "shop".to_string(),
            namespace: "prod".to_string(),
            host: "shop.example.com".to_string(),
            paths: vec![
                RoutePath {
                    path: "/api".to_string(),
                    backend_service: "api-svc".to_string(),
                    backend_port: 80,
                },
                RoutePath {
                    path: "/static".to_string(),
                    backend_service: "cdn-svc".to_string(),
                    backend_port: 8080,
                },
                RoutePath {
                    path: "/".to_string(),
                    backend_service: "web-svc".to_string(),
                    backend_port: 80,
                },
            ],
        }
    }

    #[tokio::test]
    async fn insert_preserves_path_precedence_order() {
        let store = RouteStore::new(open_in_memory().await.unwrap());
        let mut route = test_route();
        route.id = store.insert(&route).await.unwrap();

        let found = store.find_by_id(route.id).await.unwrap();
        assert_eq!(found, route);
        let paths: Vec<&str> = found.paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/api", "/static", "/"]);
    }

    #[tokio::test]
    async fn replace_children_reorders_paths() {
        let store = RouteStore::new(open_in_memory().await.unwrap());
        let mut route = test_route();
        route.id = store.insert(&route).await.unwrap();

        route.paths.swap(0, 2);
        store.replace_children(&route).await.unwrap();

        let found = store.find_by_id(route.id).await.unwrap();
        assert_eq!(found.paths[0].path, "/");
        assert_eq!(found.paths[2].path, "/api");
    }

    #[tokio::test]
    async fn failed_delete_rolls_back_path_rows() {
        let pool = open_in_memory().await.unwrap();
        let store = RouteStore::new(pool.clone());
        let mut route = test_route();
        route.id = store.insert(&route).await.unwrap();

        // Inject a failure after the child deletes: aborting the parent
        // delete must roll the whole transaction back.
        sqlx::query(
            "CREATE TRIGGER fail_route_delete BEFORE DELETE ON routes
             BEGIN SELECT RAISE(ABORT, 'injected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        assert!(store.delete(route.id).await.is_err());

        let found = store.find_by_id(route.id).await.unwrap();
        assert_eq!(found.paths.len(), 3, "child rows must survive the rollback");

        sqlx::query("DROP TRIGGER fail_route_delete")
            .execute(&pool)
            .await
            .unwrap();

        store.delete(route.id).await.unwrap();
        assert!(store.find_by_id(route.id).await.unwrap_err().is_not_found());
    }
}
