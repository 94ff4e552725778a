use super::{EntityStore, StoreResult};
use crate::state_machine::domain::WorkflowEntity;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

/// Process-local entity store
///
/// Records live in a `DashMap`; a separate insertion log keeps list results in
/// creation order.
#[derive(Debug)]
pub struct InMemoryStore<E: WorkflowEntity> {
    records: DashMap<Uuid, E>,
    insertion_order: RwLock<Vec<Uuid>>,
}

impl<E: WorkflowEntity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            insertion_order: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn ordered(&self, filter: impl Fn(&E) -> bool) -> Vec<E> {
        self.insertion_order
            .read()
            .iter()
            .filter_map(|id| self.records.get(id).map(|entry| entry.value().clone()))
            .filter(|entity| filter(entity))
            .collect()
    }
}

impl<E: WorkflowEntity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: WorkflowEntity> EntityStore<E> for InMemoryStore<E> {
    async fn get(&self, id: Uuid) -> StoreResult<Option<E>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, entity: E) -> StoreResult<E> {
        let id = entity.id();
        if self.records.insert(id, entity.clone()).is_none() {
            self.insertion_order.write().push(id);
        }
        Ok(entity)
    }

    async fn list_by_parent(&self, parent_id: Uuid) -> StoreResult<Vec<E>> {
        Ok(self.ordered(|entity| entity.parent_id() == Some(parent_id)))
    }

    async fn list_all(&self) -> StoreResult<Vec<E>> {
        Ok(self.ordered(|_| true))
    }

    async fn count_by_parent_and_status_not(
        &self,
        parent_id: Uuid,
        status: E::Status,
    ) -> StoreResult<u64> {
        let count = self
            .records
            .iter()
            .filter(|entry| {
                let entity = entry.value();
                entity.parent_id() == Some(parent_id) && entity.status() != status
            })
            .count();
        Ok(count as u64)
    }
}
