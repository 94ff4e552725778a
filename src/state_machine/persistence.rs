use super::domain::{StatusCommit, WorkflowDomain, WorkflowEntity};
use super::errors::{PersistenceError, PersistenceResult};
use crate::store::EntityStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Couples committed transitions to the entity's stored status
#[async_trait]
pub trait StatusPersistence<D: WorkflowDomain>: Send + Sync {
    /// Load the stored entity a machine is rehydrated from
    async fn load(&self, entity_id: Uuid) -> PersistenceResult<Option<D::Entity>>;

    /// Write `to` into the stored record of `entity` if it differs from the
    /// entity's last known status. Returns the record as now stored.
    async fn persist_status(
        &self,
        entity: &D::Entity,
        to: D::State,
        at: DateTime<Utc>,
    ) -> PersistenceResult<D::Entity>;
}

/// Status persistence backed by an [`EntityStore`]
pub struct StoreStatusPersistence<D: WorkflowDomain> {
    store: Arc<dyn EntityStore<D::Entity>>,
}

impl<D: WorkflowDomain> StoreStatusPersistence<D> {
    pub fn new(store: Arc<dyn EntityStore<D::Entity>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<D: WorkflowDomain> StatusPersistence<D> for StoreStatusPersistence<D> {
    async fn load(&self, entity_id: Uuid) -> PersistenceResult<Option<D::Entity>> {
        Ok(self.store.get(entity_id).await?)
    }

    async fn persist_status(
        &self,
        entity: &D::Entity,
        to: D::State,
        at: DateTime<Utc>,
    ) -> PersistenceResult<D::Entity> {
        if entity.status() == to {
            return Ok(entity.clone());
        }

        let mut updated = entity.clone();
        updated.apply_committed_status(to, at, StatusCommit::new());

        self.store
            .save(updated)
            .await
            .map_err(|e| PersistenceError::StatusSaveFailed {
                domain: D::NAME,
                entity_id: entity.id().to_string(),
                reason: e.to_string(),
            })
    }
}
