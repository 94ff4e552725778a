use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Guard serializing work on one entity; released on drop
pub type EntityGuard = OwnedMutexGuard<()>;

/// Per-entity async mutexes.
///
/// Distinct ids never contend. The map only grows; [`EntityLocks::prune`]
/// drops entries nobody currently holds or waits on.
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`
    pub async fn acquire(&self, id: Uuid) -> EntityGuard {
        // Clone the mutex out so the map shard is not held across the await
        let lock = Arc::clone(self.locks.entry(id).or_default().value());
        lock.lock_owned().await
    }

    /// Remove idle entries
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
