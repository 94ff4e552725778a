use super::domain::WorkflowEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that can trigger order state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// Start processing a newly created order
    ProcessOrder,
    PaymentSuccessful,
    PaymentFailed,
    RetryPayment,
    /// Raised by the aggregation coordinator once every task of the order is complete
    AllTasksCompleted,
    PlaceOnHold,
    ResumeOrder,
    ShipOrder,
    DeliverOrder,
    CompleteOrder,
    CancelOrder,
}

impl OrderEvent {
    pub const ALL: [OrderEvent; 11] = [
        Self::ProcessOrder,
        Self::PaymentSuccessful,
        Self::PaymentFailed,
        Self::RetryPayment,
        Self::AllTasksCompleted,
        Self::PlaceOnHold,
        Self::ResumeOrder,
        Self::ShipOrder,
        Self::DeliverOrder,
        Self::CompleteOrder,
        Self::CancelOrder,
    ];
}

impl WorkflowEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::ProcessOrder => "PROCESS_ORDER",
            Self::PaymentSuccessful => "PAYMENT_SUCCESSFUL",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::RetryPayment => "RETRY_PAYMENT",
            Self::AllTasksCompleted => "ALL_TASKS_COMPLETED",
            Self::PlaceOnHold => "PLACE_ON_HOLD",
            Self::ResumeOrder => "RESUME_ORDER",
            Self::ShipOrder => "SHIP_ORDER",
            Self::DeliverOrder => "DELIVER_ORDER",
            Self::CompleteOrder => "COMPLETE_ORDER",
            Self::CancelOrder => "CANCEL_ORDER",
        }
    }

    fn all() -> &'static [Self] {
        &Self::ALL
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl std::str::FromStr for OrderEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.event_type() == s)
            .ok_or_else(|| format!("Invalid order event: {s}"))
    }
}

/// Events that can trigger task state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskEvent {
    StartTask,
    CompleteTask,
    FailTask,
    /// Retry a failed task
    RetryTask,
    CancelTask,
}

impl TaskEvent {
    pub const ALL: [TaskEvent; 5] = [
        Self::StartTask,
        Self::CompleteTask,
        Self::FailTask,
        Self::RetryTask,
        Self::CancelTask,
    ];
}

impl WorkflowEvent for TaskEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StartTask => "START_TASK",
            Self::CompleteTask => "COMPLETE_TASK",
            Self::FailTask => "FAIL_TASK",
            Self::RetryTask => "RETRY_TASK",
            Self::CancelTask => "CANCEL_TASK",
        }
    }

    fn all() -> &'static [Self] {
        &Self::ALL
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

impl std::str::FromStr for TaskEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.event_type() == s)
            .ok_or_else(|| format!("Invalid task event: {s}"))
    }
}
