//! # State Machine Runtime
//!
//! Machines are never kept resident between events. Each event application
//! rehydrates a transient [`MachineHandle`] from the stored entity, applies one
//! event against the domain's [`TransitionGraph`] and tears the handle down.
//!
//! The protocol for one event:
//! 1. look up the arc keyed by `(state, event)`; none means rejection
//! 2. evaluate the arc's guard, if any; `false` or an error means rejection
//! 3. commit the target state and synchronously persist it
//! 4. run the arc's actions in order, logging but not propagating failures

use super::actions::ActionContext;
use super::context::TransitionContext;
use super::domain::{WorkflowDomain, WorkflowEntity};
use super::errors::{internal_error, StateMachineError, StateMachineResult};
use super::graph::TransitionGraph;
use super::persistence::StatusPersistence;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Transient machine instance bound to one entity
pub struct MachineHandle<D: WorkflowDomain> {
    entity: D::Entity,
    state: D::State,
    active: Arc<AtomicUsize>,
}

impl<D: WorkflowDomain> MachineHandle<D> {
    pub fn state(&self) -> D::State {
        self.state
    }

    pub fn entity(&self) -> &D::Entity {
        &self.entity
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity.id()
    }
}

impl<D: WorkflowDomain> Drop for MachineHandle<D> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<D: WorkflowDomain> std::fmt::Debug for MachineHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineHandle")
            .field("domain", &D::NAME)
            .field("entity_id", &self.entity.id())
            .field("state", &self.state)
            .finish()
    }
}

/// Generic runtime, instantiated once per domain
pub struct StateMachine<D: WorkflowDomain> {
    graph: Arc<TransitionGraph<D>>,
    persistence: Arc<dyn StatusPersistence<D>>,
    active: Arc<AtomicUsize>,
}

impl<D: WorkflowDomain> StateMachine<D> {
    pub fn new(graph: Arc<TransitionGraph<D>>, persistence: Arc<dyn StatusPersistence<D>>) -> Self {
        Self {
            graph,
            persistence,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn graph(&self) -> &TransitionGraph<D> {
        &self.graph
    }

    /// Number of handles instantiated and not yet torn down
    pub fn active_instances(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Build a transient machine whose working state is the entity's persisted
    /// status rather than the graph's initial state
    pub fn instantiate(&self, entity: D::Entity) -> StateMachineResult<MachineHandle<D>> {
        let state = entity.status();
        if !self.graph.is_reachable(state) {
            return Err(StateMachineError::InvalidState {
                domain: D::NAME,
                entity_id: entity.id().to_string(),
                state: state.to_string(),
            });
        }

        self.active.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(domain = D::NAME, entity_id = %entity.id(), state = %state, "Machine instantiated");

        Ok(MachineHandle {
            entity,
            state,
            active: Arc::clone(&self.active),
        })
    }

    /// Release a transient machine
    pub fn teardown(&self, handle: MachineHandle<D>) {
        tracing::trace!(domain = D::NAME, entity_id = %handle.entity_id(), "Machine torn down");
        drop(handle);
    }

    /// Events the handle's current state accepts
    pub fn available_events(&self, handle: &MachineHandle<D>) -> Vec<D::Event> {
        self.graph.events_from(handle.state)
    }

    /// Apply one event. `Ok(false)` means the event was rejected and nothing changed.
    pub async fn apply_event(
        &self,
        handle: &mut MachineHandle<D>,
        context: &TransitionContext<D::Event>,
    ) -> StateMachineResult<bool> {
        if context.entity_id != handle.entity_id() {
            return Err(internal_error(format!(
                "event for {} applied to machine of {}",
                context.entity_id,
                handle.entity_id()
            )));
        }

        let from = handle.state;
        let Some(arc) = self.graph.arc(from, context.event) else {
            tracing::warn!(
                domain = D::NAME,
                entity_id = %context.entity_id,
                state = %from,
                event = %context.event,
                "Event not accepted in current state"
            );
            return Ok(false);
        };

        if let Some(guard) = arc.guard() {
            match guard.check(context) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!(
                        domain = D::NAME,
                        entity_id = %context.entity_id,
                        event = %context.event,
                        guard = guard.description(),
                        "Guard rejected transition"
                    );
                    return Ok(false);
                }
                Err(e) => {
                    tracing::warn!(
                        domain = D::NAME,
                        entity_id = %context.entity_id,
                        event = %context.event,
                        guard = guard.description(),
                        error = %e,
                        "Guard failed; transition rejected"
                    );
                    return Ok(false);
                }
            }
        }

        let to = arc.target;
        handle.state = to;

        let persisted = self
            .persistence
            .persist_status(&handle.entity, to, Utc::now())
            .await
            .map_err(|e| {
                tracing::error!(
                    domain = D::NAME,
                    entity_id = %context.entity_id,
                    from = %from,
                    to = %to,
                    error = %e,
                    "Committed transition could not be persisted"
                );
                StateMachineError::from(e)
            })?;
        handle.entity = persisted;

        tracing::info!(
            domain = D::NAME,
            entity_id = %context.entity_id,
            from = %from,
            to = %to,
            event = %context.event,
            "State changed"
        );

        let action_context = ActionContext {
            entity: &handle.entity,
            from,
            to,
            transition: context,
        };
        for action in arc.actions() {
            if let Err(e) = action.execute(&action_context).await {
                tracing::error!(
                    domain = D::NAME,
                    entity_id = %context.entity_id,
                    action = action.description(),
                    error = %e,
                    "ActionExecutionError: post-commit action failed"
                );
            }
        }

        Ok(true)
    }
}
