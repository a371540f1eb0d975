//! The generic lifecycle coordinator.
//!
//! One implementation drives all five resource kinds; the kind-specific
//! parts come in through a [`Strategy`]. Every mutation follows the same
//! ordering: validate, translate, gate against live cluster state, then
//! record. The cluster call always precedes the store write, so a store
//! failure can leave a live resource with no record. That window is not
//! compensated, only logged; the next create attempt for the same name
//! reports it as already existing.

use std::sync::Arc;

use mooring_core::Record;
use mooring_store::RecordStore;
use tracing::{info, instrument, warn};

use mooring_cluster::{CreateOutcome, Synchronizer, UpdateOutcome};

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::strategy::Strategy;

pub struct Coordinator<S: Strategy> {
    strategy: S,
    sync: Synchronizer,
    store: Arc<dyn RecordStore<S::Record>>,
}

impl<S: Strategy> Coordinator<S> {
    pub fn new(strategy: S, sync: Synchronizer, store: Arc<dyn RecordStore<S::Record>>) -> Self {
        Coordinator {
            strategy,
            sync,
            store,
        }
    }

    fn described(&self, record: &S::Record) -> String {
        format!(
            "{} {}/{}",
            self.strategy.kind(),
            record.namespace(),
            record.name()
        )
    }

    /// Declare a new resource: create it in the cluster, then record it.
    /// Returns the descriptor with its store-assigned id.
    #[instrument(skip_all, fields(kind = self.strategy.kind()))]
    pub async fn add(&self, mut record: S::Record) -> CoordinatorResult<S::Record> {
        self.strategy.validate(&record)?;
        let manifest = self.strategy.manifest(&record)?;

        let outcome = self
            .sync
            .ensure_created(
                self.strategy.resource(),
                record.namespace(),
                record.name(),
                &manifest,
            )
            .await?;
        if outcome == CreateOutcome::AlreadyExists {
            return Err(CoordinatorError::AlreadyExists(self.described(&record)));
        }

        match self.store.insert(&record).await {
            Ok(id) => {
                record.set_id(id);
                info!(id, name = %record.name(), "resource declared");
                Ok(record)
            }
            Err(err) => {
                // The resource is live but unrecorded. Later creates for
                // this name will report AlreadyExists.
                warn!(
                    name = %record.name(),
                    namespace = %record.namespace(),
                    %err,
                    "created in cluster but not recorded"
                );
                Err(err.into())
            }
        }
    }

    /// Replace the live manifest and resync the record. Requires the
    /// resource to already be live; there is no upsert. Name and
    /// namespace are immutable after creation: the stored row decides
    /// which live resource an id addresses, so a descriptor carrying a
    /// different identity is rejected before any cluster call.
    #[instrument(skip_all, fields(kind = self.strategy.kind()))]
    pub async fn update(&self, record: S::Record) -> CoordinatorResult<S::Record> {
        self.strategy.validate(&record)?;

        let stored = self.store.find_by_id(record.id()).await?;
        if stored.name() != record.name() || stored.namespace() != record.namespace() {
            return Err(CoordinatorError::Validation(format!(
                "{} identity is immutable, stored as {}/{}",
                self.strategy.kind(),
                stored.namespace(),
                stored.name(),
            )));
        }

        let manifest = self.strategy.manifest(&record)?;
        let outcome = self
            .sync
            .ensure_updated(
                self.strategy.resource(),
                record.namespace(),
                record.name(),
                &manifest,
            )
            .await?;
        if outcome == UpdateOutcome::NotFound {
            return Err(CoordinatorError::MustCreateFirst(self.described(&record)));
        }

        self.store.update(&record).await?;
        self.store.replace_children(&record).await?;
        info!(id = record.id(), name = %record.name(), "resource updated");
        Ok(record)
    }

    /// Retract a declared resource: remove it from the cluster, then
    /// drop its record and children in one transaction.
    #[instrument(skip_all, fields(kind = self.strategy.kind()))]
    pub async fn delete(&self, id: i64) -> CoordinatorResult<()> {
        let record = self.store.find_by_id(id).await?;
        self.sync
            .ensure_deleted(self.strategy.resource(), record.namespace(), record.name())
            .await?;
        self.store.delete(id).await?;
        info!(id, name = %record.name(), "resource retracted");
        Ok(())
    }

    /// Read one record from the store; never consults the cluster.
    pub async fn find_by_id(&self, id: i64) -> CoordinatorResult<S::Record> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Read every record from the store; never consults the cluster.
    pub async fn find_all(&self) -> CoordinatorResult<Vec<S::Record>> {
        Ok(self.store.find_all().await?)
    }
}
