//! Workload records: parent table plus ports and env child tables.

use async_trait::async_trait;
use mooring_core::{EnvVar, Workload, WorkloadPort};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::RecordStore;

#[derive(Clone)]
pub struct WorkloadStore {
    pool: SqlitePool,
}

impl WorkloadStore {
    pub fn new(pool: SqlitePool) -> Self {
        WorkloadStore { pool }
    }

    fn from_row(row: &SqliteRow) -> Workload {
        Workload {
            id: row.get("id"),
            name: row.get("name"),
            namespace: row.get("namespace"),
            team_id: row.get("team_id"),
            image: row.get("image"),
            replicas: row.get("replicas"),
            cpu_max: row.get("cpu_max"),
            memory_max: row.get("memory_max"),
            pull_policy: row.get("pull_policy"),
            restart_policy: row.get("restart_policy"),
            ports: vec![],
            env: vec![],
        }
    }

    async fn load_children(&self, workload: &mut Workload) -> StoreResult<()> {
        // Ordered by rowid: port order is part of the declared state.
        let rows = sqlx::query(
            "SELECT container_port, protocol FROM workload_ports
             WHERE workload_id = ? ORDER BY id",
        )
        .bind(workload.id)
        .fetch_all(&self.pool)
        .await?;
        workload.ports = rows
            .iter()
            .map(|row| WorkloadPort {
                container_port: row.get("container_port"),
                protocol: row.get("protocol"),
            })
            .collect();

        let rows = sqlx::query(
            "SELECT env_key, env_value FROM workload_env
             WHERE workload_id = ? ORDER BY id",
        )
        .bind(workload.id)
        .fetch_all(&self.pool)
        .await?;
        workload.env = rows
            .iter()
            .map(|row| EnvVar {
                key: row.get("env_key"),
                value: row.get("env_value"),
            })
            .collect();
        Ok(())
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        record: &Workload,
    ) -> StoreResult<()> {
        for port in &record.ports {
            sqlx::query(
                "INSERT INTO workload_ports (workload_id, container_port, protocol)
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(port.container_port)
            .bind(&port.protocol)
            .execute(&mut **tx)
            .await?;
        }
        for env in &record.env {
            sqlx::query(
                "INSERT INTO workload_env (workload_id, env_key, env_value)
                 VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(&env.key)
            .bind(&env.value)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore<Workload> for WorkloadStore {
    async fn insert(&self, record: &Workload) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO workloads
             (name, namespace, team_id, image, replicas, cpu_max, memory_max,
              pull_policy, restart_policy)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(record.team_id)
        .bind(&record.image)
        .bind(record.replicas)
        .bind(record.cpu_max)
        .bind(record.memory_max)
        .bind(&record.pull_policy)
        .bind(&record.restart_policy)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        Self::insert_children(&mut tx, id, record).await?;
        tx.commit().await?;
        debug!(id, name = %record.name, "workload stored");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Workload> {
        let row = sqlx::query("SELECT * FROM workloads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("workload {id}")))?;
        let mut workload = Self::from_row(&row);
        self.load_children(&mut workload).await?;
        Ok(workload)
    }

    async fn find_all(&self) -> StoreResult<Vec<Workload>> {
        let rows = sqlx::query("SELECT * FROM workloads ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut workloads = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut workload = Self::from_row(row);
            self.load_children(&mut workload).await?;
            workloads.push(workload);
        }
        Ok(workloads)
    }

    async fn update(&self, record: &Workload) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE workloads SET
             name = ?, namespace = ?, team_id = ?, image = ?, replicas = ?,
             cpu_max = ?, memory_max = ?, pull_policy = ?, restart_policy = ?
             WHERE id = ?",
        )
        .bind(&record.name)
        .bind(&record.namespace)
        .bind(record.team_id)
        .bind(&record.image)
        .bind(record.replicas)
        .bind(record.cpu_max)
        .bind(record.memory_max)
        .bind(&record.pull_policy)
        .bind(&record.restart_policy)
        .bind(record.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("workload {}", record.id)));
        }
        Ok(())
    }

    async fn replace_children(&self, record: &Workload) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM workload_ports WHERE workload_id = ?")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workload_env WHERE workload_id = ?")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        Self::insert_children(&mut tx, record.id, record).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM workload_ports WHERE workload_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workload_env WHERE workload_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM workloads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("workload {id}")));
        }
        tx.commit().await?;
        debug!(id, "workload deleted");
        Ok(())
    }
}
