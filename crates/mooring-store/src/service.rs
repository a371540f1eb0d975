//! Network service records: parent table plus a ports child table.

use async_trait::async_trait;
use mooring_core::{NetworkService, ServicePort};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::RecordStore;

#[derive(Clone)]
pub struct ServiceStore {
    pool: SqlitePool,
}

impl ServiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceStore { pool }
    }

    fn from_row(row: &SqliteRow) -> NetworkService {
        NetworkService {
            id: row.get("id"),
            name: row.get("name"),
            namespace: row.get("namespace"),
            workload_name: row.get("workload_name"),
            service_type: row.get("service_type"),
            external_name: row.get("external_name"),
            team_id: row.get("team_id"),
            ports: vec![],
        }
    }

    async fn load_children(&self, service: &mut NetworkService) -> StoreResult<()> {
        let rows = sqlx::query(
            "SELECT port, target_port, node_port, protocol FROM service_ports
             WHERE service_id = ? ORDER BY id",
        )
        .bind(service.id)
        .fetch_all(&self.pool)
        .await?;
        service.ports = rows
            .iter()
            .map(|row| ServicePort {
                port: row.get("port"),
                target_port: row.get("target_port"),
                node_port: row.get("node_port"),
                protocol: row.get("protocol"),
            })
            .collect();
        Ok(())
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        record: &NetworkService,
    ) -> StoreResult<()> {
        for port in &record.ports {
            sqlx::query(
                "INSERT INTO service_ports (service_id, port, target_port, node_port, protocol)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(port.port)
            .bind(port.target_port)
            .bind(port.node_port)
            .bind(&port.protocol)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore<NetworkService> for ServiceStore {
    async fn insert(&self, record: &NetworkService) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO services
             (name, namespace, workload_name, service_type, external_name, team_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(&record.workload_name)
        .bind(&record.service_type)
        .bind(&record.external_name)
        .bind(record.team_id)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        Self::insert_children(&mut tx, id, record).await?;
        tx.commit().await?;
        debug!(id, name = %record.name, "service stored");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<NetworkService> {
        let row = sqlx::query("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("service {id}")))?;
        let mut service = Self::from_row(&row);
        self.load_children(&mut service).await?;
        Ok(service)
    }

    async fn find_all(&self) -> StoreResult<Vec<NetworkService>> {
        let rows = sqlx::query("SELECT * FROM services ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut services = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut service = Self::from_row(row);
            self.load_children(&mut service).await?;
            services.push(service);
        }
        Ok(services)
    }

    async fn update(&self, record: &NetworkService) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE services SET
             name = ?, namespace = ?, workload_name = ?, service_type = ?,
             external_name = ?, team_id = ?
             WHERE id = ?",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(&record.workload_name)
        .bind(&record.service_type)
        .bind(&record.external_name)
        .bind(record.team_id)
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("service {}", record.id)));
        }
        Ok(())
    }

    async fn replace_children(&self, record: &NetworkService) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM service_ports WHERE service_id = ?")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_children(&mut tx, record.id, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM service_ports WHERE service_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("service {id}")));
        }
        tx.commit().await?;
        debug!(id, "service deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_in_memory;

    fn test_service() -> NetworkService {
        NetworkService {
            id: 0,
            name: "api-svc".to_string(),
            namespace: "prod".to_string(),
            workload_name: "api".to_string(),
            service_type: "NodePort".to_string(),
            external_name: String::new(),
            team_id: 3,
            ports: vec![
                ServicePort {
                    port: 80,
                    target_port: 8080,
                    node_port: 30080,
                    protocol: "TCP".to_string(),
                },
                ServicePort {
                    port: 443,
                    target_port: 8443,
                    node_port: 0,
                    protocol: "TCP".to_string(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn insert_round_trips_with_port_order() {
        let store = ServiceStore::new(open_in_memory().await.unwrap());
        let mut service = test_service();
        service.id = store.insert(&service).await.unwrap();

        let found = store.find_by_id(service.id).await.unwrap();
        assert_eq!(found, service);
        assert_eq!(found.ports[0].node_port, 30080);
    }

    #[tokio::test]
    async fn update_retargets_workload() {
        let store = ServiceStore::new(open_in_memory().await.unwrap());
        let mut service = test_service();
        service.id = store.insert(&service).await.unwrap();

        service.workload_name = "api-v2".to_string();
        store.update(&service).await.unwrap();

        let found = store.find_by_id(service.id).await.unwrap();
        assert_eq!(found.workload_name, "api-v2");
    }

    #[tokio::test]
    async fn delete_cascades_to_ports() {
        let pool = open_in_memory().await.unwrap();
        let store = ServiceStore::new(pool.clone());
        let id = store.insert(&test_service()).await.unwrap();

        store.delete(id).await.unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM service_ports WHERE service_id = ?")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0);
    }
}
