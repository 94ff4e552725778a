use super::context::TransitionContext;
use super::domain::{OrderDomain, WorkflowDomain};
use super::errors::{GuardError, GuardResult};
use super::events::OrderEvent;

/// Trait for implementing state transition guards
///
/// Guards are pure predicates over the transition context. They run before the
/// commit and must not touch the store or the entity.
pub trait StateGuard<D: WorkflowDomain>: Send + Sync {
    /// Check if a transition is allowed
    fn check(&self, context: &TransitionContext<D::Event>) -> GuardResult<bool>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Admits `ALL_TASKS_COMPLETED` only when the raiser vouches that every task is done
pub struct AllTasksCompletedGuard;

impl StateGuard<OrderDomain> for AllTasksCompletedGuard {
    fn check(&self, context: &TransitionContext<OrderEvent>) -> GuardResult<bool> {
        let completed = context
            .all_tasks_completed
            .ok_or(GuardError::MissingContext {
                field: "all_tasks_completed",
            })?;

        tracing::debug!(
            order_id = %context.entity_id,
            all_tasks_completed = completed,
            "Checking task completion guard"
        );
        Ok(completed)
    }

    fn description(&self) -> &'static str {
        "All tasks of the order must be completed"
    }
}
