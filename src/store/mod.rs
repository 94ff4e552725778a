//! # Entity Stores
//!
//! Key-based storage for workflow entities. The engine only needs four
//! operations: fetch by id, save, list children of a parent and count children
//! whose status differs from a given one.
//!
//! - [`InMemoryStore`] keeps records in a `DashMap` and is used by tests and
//!   embedded deployments.
//! - [`postgres`] maps orders and tasks onto PostgreSQL tables through SQLx.

pub mod memory;
pub mod postgres;

use crate::state_machine::domain::WorkflowEntity;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryStore;
pub use postgres::{PgOrderStore, PgTaskStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: Uuid, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract consumed by the workflow engine
#[async_trait]
pub trait EntityStore<E: WorkflowEntity>: Send + Sync {
    /// Fetch an entity by id; `None` when absent
    async fn get(&self, id: Uuid) -> StoreResult<Option<E>>;

    /// Insert or replace an entity, returning the stored record
    async fn save(&self, entity: E) -> StoreResult<E>;

    /// Entities owned by `parent_id`, in creation order
    async fn list_by_parent(&self, parent_id: Uuid) -> StoreResult<Vec<E>>;

    /// Every stored entity, in creation order
    async fn list_all(&self) -> StoreResult<Vec<E>>;

    /// Number of entities owned by `parent_id` whose status is not `status`
    async fn count_by_parent_and_status_not(
        &self,
        parent_id: Uuid,
        status: E::Status,
    ) -> StoreResult<u64>;
}
