use super::domain::WorkflowEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Typed metadata carried with one event application.
///
/// `all_tasks_completed` is only meaningful for the order domain's
/// `ALL_TASKS_COMPLETED` event and is read by the completion guard alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionContext<E> {
    pub entity_id: Uuid,
    pub event: E,
    pub reason: Option<String>,
    pub all_tasks_completed: Option<bool>,
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl<E: WorkflowEvent> TransitionContext<E> {
    pub fn new(entity_id: Uuid, event: E) -> Self {
        Self {
            entity_id,
            event,
            reason: None,
            all_tasks_completed: None,
            correlation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_optional_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_all_tasks_completed(mut self, completed: bool) -> Self {
        self.all_tasks_completed = Some(completed);
        self
    }

    /// Tie this event to an earlier one, e.g. the task completion that raised it
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}
