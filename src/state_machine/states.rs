use super::domain::WorkflowState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Order has been created but not yet processed
    Created,
    /// Order is awaiting payment confirmation
    PaymentPending,
    /// Payment attempt failed
    PaymentFailed,
    /// Payment succeeded and the order's tasks are being worked
    InProgress,
    /// Order processing is temporarily paused
    OnHold,
    /// All tasks completed, order can be shipped
    ReadyForShipment,
    Shipped,
    Delivered,
    /// Order is fully completed
    Completed,
    Cancelled,
}

impl OrderState {
    pub const ALL: [OrderState; 10] = [
        Self::Created,
        Self::PaymentPending,
        Self::PaymentFailed,
        Self::InProgress,
        Self::OnHold,
        Self::ReadyForShipment,
        Self::Shipped,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// States in which the order is waiting on its tasks
    pub fn awaits_task_completion(&self) -> bool {
        matches!(self, Self::InProgress | Self::OnHold)
    }
}

impl WorkflowState for OrderState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::PaymentPending => "payment_pending",
            Self::PaymentFailed => "payment_failed",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::ReadyForShipment => "ready_for_shipment",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn all() -> &'static [Self] {
        &Self::ALL
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Invalid order state: {s}"))
    }
}

/// Task state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Initial state when task is created
    Pending,
    /// Task is currently being worked
    InProgress,
    /// Task completed successfully
    Completed,
    /// Task failed; may still be retried or cancelled
    Failed,
    Cancelled,
}

impl TaskState {
    pub const ALL: [TaskState; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    ///
    /// `Failed` is deliberately excluded: it is a declared end state of the
    /// task graph but still accepts RETRY_TASK and CANCEL_TASK.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl WorkflowState for TaskState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    fn all() -> &'static [Self] {
        &Self::ALL
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Invalid task state: {s}"))
    }
}

/// Default state for new orders
impl Default for OrderState {
    fn default() -> Self {
        Self::Created
    }
}

/// Default state for new tasks
impl Default for TaskState {
    fn default() -> Self {
        Self::Pending
    }
}
