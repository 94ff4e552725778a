//! # State Machine Service
//!
//! Entry point exposed to calling layers. Every operation on an entity runs
//! under that entity's lock, so "read persisted state, evaluate, commit,
//! persist, run actions" never interleaves for one id.

use super::context::TransitionContext;
use super::domain::{OrderDomain, TaskDomain, WorkflowDomain, WorkflowEntity};
use super::graph::TransitionGraph;
use super::locks::{EntityGuard, EntityLocks};
use super::machine::StateMachine;
use super::persistence::StatusPersistence;
use crate::error::{Result, WorkflowError};
use std::sync::Arc;
use uuid::Uuid;

pub struct StateMachineService<D: WorkflowDomain> {
    machine: StateMachine<D>,
    persistence: Arc<dyn StatusPersistence<D>>,
    locks: EntityLocks,
}

pub type OrderStateMachineService = StateMachineService<OrderDomain>;
pub type TaskStateMachineService = StateMachineService<TaskDomain>;

impl<D: WorkflowDomain> StateMachineService<D> {
    pub fn new(graph: Arc<TransitionGraph<D>>, persistence: Arc<dyn StatusPersistence<D>>) -> Self {
        Self {
            machine: StateMachine::new(graph, Arc::clone(&persistence)),
            persistence,
            locks: EntityLocks::new(),
        }
    }

    pub fn machine(&self) -> &StateMachine<D> {
        &self.machine
    }

    pub fn graph(&self) -> &TransitionGraph<D> {
        self.machine.graph()
    }

    /// Hold the entity's lock for work that must not interleave with transitions
    pub async fn lock(&self, entity_id: Uuid) -> EntityGuard {
        self.locks.acquire(entity_id).await
    }

    /// Establish a machine for `entity` at its persisted status.
    ///
    /// Idempotent and write-free: the machine is rehydrated, validated against
    /// the graph and released. Returns the working state.
    pub async fn initialize(&self, entity: &D::Entity) -> Result<D::State> {
        let _guard = self.locks.acquire(entity.id()).await;
        let handle = self.machine.instantiate(entity.clone())?;
        let state = handle.state();
        self.machine.teardown(handle);

        tracing::debug!(domain = D::NAME, entity_id = %entity.id(), state = %state, "Machine initialized");
        Ok(state)
    }

    /// Send an event with an optional free-text reason
    pub async fn send_event(&self, entity_id: Uuid, event: D::Event, reason: Option<String>) -> Result<bool> {
        let context = TransitionContext::new(entity_id, event).with_optional_reason(reason);
        self.send_event_with_context(context).await
    }

    /// Send an event carrying a fully built transition context
    pub async fn send_event_with_context(&self, context: TransitionContext<D::Event>) -> Result<bool> {
        let _guard = self.locks.acquire(context.entity_id).await;

        let entity = self
            .persistence
            .load(context.entity_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(D::NAME, context.entity_id))?;

        let mut handle = self.machine.instantiate(entity)?;
        let outcome = self.machine.apply_event(&mut handle, &context).await;
        self.machine.teardown(handle);

        Ok(outcome?)
    }

    /// Persisted status of an entity
    pub async fn current_state(&self, entity_id: Uuid) -> Result<D::State> {
        self.persistence
            .load(entity_id)
            .await?
            .map(|entity| entity.status())
            .ok_or_else(|| WorkflowError::not_found(D::NAME, entity_id))
    }

    /// Events the entity's persisted status currently accepts
    pub async fn available_events(&self, entity_id: Uuid) -> Result<Vec<D::Event>> {
        let state = self.current_state(entity_id).await?;
        Ok(self.graph().events_from(state))
    }
}
