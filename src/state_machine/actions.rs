use super::context::TransitionContext;
use super::domain::{OrderDomain, WorkflowDomain, WorkflowEntity, WorkflowEvent, WorkflowState};
use super::errors::{ActionError, ActionResult};
use crate::events::publisher::EventPublisher;
use crate::models::Order;
use crate::store::EntityStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Everything an action sees about a committed transition
pub struct ActionContext<'a, D: WorkflowDomain> {
    /// Entity as persisted by the commit
    pub entity: &'a D::Entity,
    pub from: D::State,
    pub to: D::State,
    pub transition: &'a TransitionContext<D::Event>,
}

/// Trait for implementing state transition actions
///
/// Actions run after the transition has been committed and persisted. A failing
/// action is reported by the runtime and never reverses the transition.
#[async_trait]
pub trait StateAction<D: WorkflowDomain>: Send + Sync {
    /// Execute the action
    async fn execute(&self, context: &ActionContext<'_, D>) -> ActionResult<()>;

    /// Get a description of this action for logging
    fn description(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Info,
    Warn,
}

/// Logs one fixed message for the arc it is attached to
#[derive(Debug, Clone)]
pub struct LogTransitionAction {
    message: &'static str,
    level: LogLevel,
}

impl LogTransitionAction {
    pub fn info(message: &'static str) -> Self {
        Self {
            message,
            level: LogLevel::Info,
        }
    }

    pub fn warn(message: &'static str) -> Self {
        Self {
            message,
            level: LogLevel::Warn,
        }
    }
}

#[async_trait]
impl<D: WorkflowDomain> StateAction<D> for LogTransitionAction {
    async fn execute(&self, context: &ActionContext<'_, D>) -> ActionResult<()> {
        let transition = context.transition;
        match self.level {
            LogLevel::Info => tracing::info!(
                domain = D::NAME,
                entity_id = %transition.entity_id,
                event = %transition.event,
                reason = transition.reason.as_deref(),
                "{}",
                self.message
            ),
            LogLevel::Warn => tracing::warn!(
                domain = D::NAME,
                entity_id = %transition.entity_id,
                event = %transition.event,
                reason = transition.reason.as_deref(),
                "{}",
                self.message
            ),
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Log transition"
    }
}

/// Records why and when an order was cancelled into its metadata
pub struct RecordCancellationAction {
    stage: &'static str,
    orders: Arc<dyn EntityStore<Order>>,
}

impl RecordCancellationAction {
    pub fn new(stage: &'static str, orders: Arc<dyn EntityStore<Order>>) -> Self {
        Self { stage, orders }
    }
}

#[async_trait]
impl StateAction<OrderDomain> for RecordCancellationAction {
    async fn execute(&self, context: &ActionContext<'_, OrderDomain>) -> ActionResult<()> {
        let transition = context.transition;
        tracing::warn!(
            order_id = %transition.entity_id,
            reason = transition.reason.as_deref(),
            "{}",
            self.stage
        );

        let mut order = context.entity.clone();
        order.merge_metadata(
            "cancellation",
            json!({
                "stage": self.stage,
                "cancelled_from": context.from.as_str(),
                "reason": transition.reason,
                "cancelled_at": transition.occurred_at,
            }),
        );

        self.orders
            .save(order)
            .await
            .map_err(|e| ActionError::AuxiliaryUpdateFailed {
                entity_type: "order",
                entity_id: transition.entity_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Record order cancellation details"
    }
}

/// Action to publish lifecycle events when state transitions occur
pub struct PublishTransitionEventAction {
    event_publisher: EventPublisher,
}

impl PublishTransitionEventAction {
    pub fn new(event_publisher: EventPublisher) -> Self {
        Self { event_publisher }
    }
}

#[derive(Debug, Serialize)]
struct TransitionPayload<'a> {
    entity_id: Uuid,
    parent_id: Option<Uuid>,
    from_state: &'static str,
    to_state: &'static str,
    event: &'static str,
    reason: Option<&'a str>,
    correlation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

/// `<domain>.<target state>`, e.g. `task.completed`
pub fn lifecycle_event_name<D: WorkflowDomain>(to: D::State) -> String {
    format!("{}.{}", D::NAME, to.as_str())
}

#[async_trait]
impl<D: WorkflowDomain> StateAction<D> for PublishTransitionEventAction {
    async fn execute(&self, context: &ActionContext<'_, D>) -> ActionResult<()> {
        let event_name = lifecycle_event_name::<D>(context.to);
        let transition = context.transition;
        let payload = TransitionPayload {
            entity_id: transition.entity_id,
            parent_id: context.entity.parent_id(),
            from_state: context.from.as_str(),
            to_state: context.to.as_str(),
            event: transition.event.event_type(),
            reason: transition.reason.as_deref(),
            correlation_id: transition.correlation_id,
            occurred_at: transition.occurred_at,
        };

        self.event_publisher
            .publish_serialized(event_name.clone(), transition.entity_id, &payload)
            .await
            .map_err(|_| ActionError::EventPublishFailed { event_name })?;

        Ok(())
    }

    fn description(&self) -> &'static str {
        "Publish lifecycle event for transition"
    }
}
