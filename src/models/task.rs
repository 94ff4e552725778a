//! # Task Model
//!
//! A unit of work attached to exactly one order. The task type is descriptive
//! only; transition logic never looks at it.

use crate::state_machine::domain::{StatusCommit, WorkflowEntity};
use crate::state_machine::TaskState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of work an order can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    ValidateOrderDetails,
    ProcessPayment,
    CheckInventory,
    Packaging,
    ArrangeShipping,
    NotifyCustomer,
    QualityCheck,
    HandleReturn,
    GenerateInvoice,
}

impl TaskType {
    pub const ALL: [TaskType; 9] = [
        Self::ValidateOrderDetails,
        Self::ProcessPayment,
        Self::CheckInventory,
        Self::Packaging,
        Self::ArrangeShipping,
        Self::NotifyCustomer,
        Self::QualityCheck,
        Self::HandleReturn,
        Self::GenerateInvoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidateOrderDetails => "VALIDATE_ORDER_DETAILS",
            Self::ProcessPayment => "PROCESS_PAYMENT",
            Self::CheckInventory => "CHECK_INVENTORY",
            Self::Packaging => "PACKAGING",
            Self::ArrangeShipping => "ARRANGE_SHIPPING",
            Self::NotifyCustomer => "NOTIFY_CUSTOMER",
            Self::QualityCheck => "QUALITY_CHECK",
            Self::HandleReturn => "HANDLE_RETURN",
            Self::GenerateInvoice => "GENERATE_INVOICE",
        }
    }

    /// Tasks attached to every new order unless configured otherwise
    pub fn default_order_tasks() -> Vec<TaskType> {
        vec![
            Self::ValidateOrderDetails,
            Self::ProcessPayment,
            Self::CheckInventory,
        ]
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|task_type| task_type.as_str() == s)
            .ok_or_else(|| format!("Invalid task type: {s}"))
    }
}

/// A unit of fulfilment work owned by one order.
///
/// Serialize-only for the same reason as [`Order`](super::Order): a task's
/// status and `completed_at` come from committed transitions or a store.
///
/// ```compile_fail
/// let task: order_workflow::models::Task = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub order_id: Uuid,
    pub task_type: TaskType,
    status: TaskState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a new pending task for the given order
    pub fn new(order_id: Uuid, task_type: TaskType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            task_type,
            status: TaskState::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Rebuild a task from a stored record
    pub(crate) fn from_stored(
        id: Uuid,
        order_id: Uuid,
        task_type: TaskType,
        status: TaskState,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            order_id,
            task_type,
            status,
            created_at,
            updated_at,
            completed_at,
        }
    }

    pub fn status(&self) -> TaskState {
        self.status
    }

    /// When the task first entered `completed`
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

impl WorkflowEntity for Task {
    type Status = TaskState;

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        Some(self.order_id)
    }

    fn status(&self) -> TaskState {
        self.status
    }

    fn apply_committed_status(&mut self, status: TaskState, at: DateTime<Utc>, _commit: StatusCommit) {
        self.status = status;
        self.updated_at = at;
        if status == TaskState::Completed && self.completed_at.is_none() {
            self.completed_at = Some(at);
        }
    }
}
