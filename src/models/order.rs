//! # Order Model
//!
//! An order is the aggregate root of the workflow: it carries an opaque JSON
//! metadata blob (customer, items, delivery preferences) and owns a set of tasks.
//!
//! Orders are created in `created` and only move through committed transitions
//! of the order state machine.

use super::task::Task;
use crate::state_machine::domain::{StatusCommit, WorkflowEntity};
use crate::state_machine::OrderState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A customer order.
///
/// Serialize-only: status is written by committed transitions, and records
/// are rebuilt only by the stores.
///
/// ```compile_fail
/// let order: order_workflow::models::Order = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Uuid,
    status: OrderState,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order in the graph's initial state
    pub fn new(metadata: Option<Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: OrderState::default(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild an order from a stored record
    pub(crate) fn from_stored(
        id: Uuid,
        status: OrderState,
        metadata: Option<Value>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status,
            metadata,
            created_at,
            updated_at,
        }
    }

    pub fn status(&self) -> OrderState {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Replace the metadata blob. Status is untouched.
    pub fn set_metadata(&mut self, metadata: Option<Value>) {
        self.metadata = metadata;
        self.updated_at = Utc::now();
    }

    /// Insert one top-level key into the metadata object, creating the object if needed
    pub fn merge_metadata(&mut self, key: &str, value: Value) {
        let mut map = match self.metadata.take() {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("original".to_string(), other);
                map
            }
            None => serde_json::Map::new(),
        };
        map.insert(key.to_string(), value);
        self.metadata = Some(Value::Object(map));
        self.updated_at = Utc::now();
    }
}

impl WorkflowEntity for Order {
    type Status = OrderState;

    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        None
    }

    fn status(&self) -> OrderState {
        self.status
    }

    fn apply_committed_status(&mut self, status: OrderState, at: DateTime<Utc>, _commit: StatusCommit) {
        self.status = status;
        self.updated_at = at;
    }
}

/// An order together with its tasks, in creation order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub tasks: Vec<Task>,
}

impl OrderDetails {
    /// Number of tasks not yet completed
    pub fn outstanding_tasks(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.status() != crate::state_machine::TaskState::Completed)
            .count()
    }
}
