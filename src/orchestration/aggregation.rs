//! # Task Aggregation Coordinator
//!
//! Propagates task completion up to the owning order. When a task enters
//! `completed`, the coordinator counts the order's tasks that are not completed
//! and, once none remain, raises `ALL_TASKS_COMPLETED` against the order
//! machine with the completion flag set.
//!
//! Stale or duplicate completion signals are harmless: an order that is not
//! `in_progress` or `on_hold` is left alone, and any raise that does reach the
//! order machine still goes through the same deterministic, guarded graph.

use super::aggregation_queue::AggregationError;
use crate::error::Result;
use crate::models::Task;
use crate::state_machine::actions::{ActionContext, StateAction};
use crate::state_machine::errors::{ActionError, ActionResult};
use crate::state_machine::{
    OrderEvent, OrderState, OrderStateMachineService, TaskDomain, TaskState, TransitionContext,
};
use crate::store::EntityStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Signal emitted when a task's completion has been committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletionNotice {
    pub task_id: Uuid,
    pub order_id: Uuid,
    /// Correlation id of the `COMPLETE_TASK` event
    pub correlation_id: Uuid,
}

/// What the coordinator did with one notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationOutcome {
    /// `ALL_TASKS_COMPLETED` was sent; `accepted` is the order machine's answer
    Raised { accepted: bool },
    /// Some tasks of the order are still not completed
    TasksOutstanding(u64),
    /// The order was not awaiting task completion
    Suppressed { order_state: OrderState },
}

/// Receiver of task completion notices
#[async_trait]
pub trait TaskCompletionSink: Send + Sync {
    async fn task_completed(&self, notice: TaskCompletionNotice) -> std::result::Result<(), AggregationError>;
}

pub struct TaskAggregationCoordinator {
    orders: Arc<OrderStateMachineService>,
    tasks: Arc<dyn EntityStore<Task>>,
}

impl TaskAggregationCoordinator {
    pub fn new(orders: Arc<OrderStateMachineService>, tasks: Arc<dyn EntityStore<Task>>) -> Self {
        Self { orders, tasks }
    }

    pub async fn handle_task_completed(&self, notice: &TaskCompletionNotice) -> Result<AggregationOutcome> {
        let outstanding = self
            .tasks
            .count_by_parent_and_status_not(notice.order_id, TaskState::Completed)
            .await?;

        if outstanding > 0 {
            tracing::debug!(
                order_id = %notice.order_id,
                task_id = %notice.task_id,
                outstanding,
                "Order still has outstanding tasks"
            );
            return Ok(AggregationOutcome::TasksOutstanding(outstanding));
        }

        let order_state = self.orders.current_state(notice.order_id).await?;
        if !order_state.awaits_task_completion() {
            tracing::info!(
                order_id = %notice.order_id,
                task_id = %notice.task_id,
                order_state = %order_state,
                "All tasks completed but order is not awaiting them; no-op"
            );
            return Ok(AggregationOutcome::Suppressed { order_state });
        }

        let context = TransitionContext::new(notice.order_id, OrderEvent::AllTasksCompleted)
            .with_all_tasks_completed(true)
            .with_correlation_id(notice.correlation_id)
            .with_reason(format!("Task {} completed the order's task set", notice.task_id));

        let accepted = self.orders.send_event_with_context(context).await?;
        tracing::info!(
            order_id = %notice.order_id,
            accepted,
            "Raised ALL_TASKS_COMPLETED"
        );
        Ok(AggregationOutcome::Raised { accepted })
    }
}

/// Inline mode: the completing task's action drives the coordinator directly
#[async_trait]
impl TaskCompletionSink for TaskAggregationCoordinator {
    async fn task_completed(&self, notice: TaskCompletionNotice) -> std::result::Result<(), AggregationError> {
        self.handle_task_completed(&notice)
            .await
            .map(|_| ())
            .map_err(|e| AggregationError::Failed {
                order_id: notice.order_id,
                reason: e.to_string(),
            })
    }
}

/// Hands committed task completions to a [`TaskCompletionSink`]
pub struct NotifyTaskCompletedAction {
    sink: Arc<dyn TaskCompletionSink>,
}

impl NotifyTaskCompletedAction {
    pub fn new(sink: Arc<dyn TaskCompletionSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl StateAction<TaskDomain> for NotifyTaskCompletedAction {
    async fn execute(&self, context: &ActionContext<'_, TaskDomain>) -> ActionResult<()> {
        if context.to != TaskState::Completed {
            return Ok(());
        }

        let notice = TaskCompletionNotice {
            task_id: context.entity.id,
            order_id: context.entity.order_id,
            correlation_id: context.transition.correlation_id,
        };

        self.sink
            .task_completed(notice)
            .await
            .map_err(|e| ActionError::NotificationFailed {
                reason: e.to_string(),
            })
    }

    fn description(&self) -> &'static str {
        "Notify aggregation of task completion"
    }
}
