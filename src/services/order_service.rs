//! # Order Service
//!
//! Order-level operations for calling layers. Status only ever changes through
//! the order state machine; everything else here is creation, queries and
//! metadata edits.

use crate::error::{Result, WorkflowError};
use crate::logging::log_order_operation;
use crate::models::{Order, OrderDetails, Task, TaskType};
use crate::state_machine::{
    OrderEvent, OrderStateMachineService, TaskState, TaskStateMachineService, WorkflowState,
};
use crate::store::EntityStore;
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub struct OrderService {
    orders: Arc<dyn EntityStore<Order>>,
    tasks: Arc<dyn EntityStore<Task>>,
    order_machines: Arc<OrderStateMachineService>,
    task_machines: Arc<TaskStateMachineService>,
    default_task_types: Vec<TaskType>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn EntityStore<Order>>,
        tasks: Arc<dyn EntityStore<Task>>,
        order_machines: Arc<OrderStateMachineService>,
        task_machines: Arc<TaskStateMachineService>,
        default_task_types: Vec<TaskType>,
    ) -> Self {
        Self {
            orders,
            tasks,
            order_machines,
            task_machines,
            default_task_types,
        }
    }

    /// Create an order in `created` with its initial tasks in `pending`.
    ///
    /// `task_types` of `None` attaches the configured default task set;
    /// `Some(vec![])` creates an order without tasks.
    pub async fn create_order(
        &self,
        metadata: Option<Value>,
        task_types: Option<Vec<TaskType>>,
    ) -> Result<OrderDetails> {
        let order = self.orders.save(Order::new(metadata)).await?;
        self.order_machines.initialize(&order).await?;

        // Saved one by one to keep creation order; machines initialize concurrently
        let task_types = task_types.unwrap_or_else(|| self.default_task_types.clone());
        let mut tasks = Vec::with_capacity(task_types.len());
        for task_type in task_types {
            tasks.push(self.tasks.save(Task::new(order.id, task_type)).await?);
        }
        try_join_all(tasks.iter().map(|task| self.task_machines.initialize(task))).await?;

        log_order_operation(
            "create_order",
            Some(order.id),
            order.status().as_str(),
            Some(&format!("{} initial tasks", tasks.len())),
        );
        Ok(OrderDetails { order, tasks })
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("order", order_id))
    }

    /// The order with its tasks in creation order
    pub async fn get_order_details(&self, order_id: Uuid) -> Result<OrderDetails> {
        let order = self.get_order(order_id).await?;
        let tasks = self.tasks.list_by_parent(order_id).await?;
        Ok(OrderDetails { order, tasks })
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.list_all().await?)
    }

    /// Replace the order's metadata. Serialized with transitions of the same order.
    pub async fn update_metadata(&self, order_id: Uuid, metadata: Option<Value>) -> Result<Order> {
        let _guard = self.order_machines.lock(order_id).await;

        let mut order = self.get_order(order_id).await?;
        order.set_metadata(metadata);
        let order = self.orders.save(order).await?;

        log_order_operation("update_metadata", Some(order_id), order.status().as_str(), None);
        Ok(order)
    }

    /// Send an event to the order machine. `Ok(false)` means it was rejected.
    pub async fn send_event(
        &self,
        order_id: Uuid,
        event: OrderEvent,
        reason: Option<String>,
    ) -> Result<bool> {
        tracing::info!(order_id = %order_id, event = %event, "Sending order event");
        self.order_machines.send_event(order_id, event, reason).await
    }

    /// Send `COMPLETE_ORDER` and return the completed order
    pub async fn complete_order(&self, order_id: Uuid) -> Result<Order> {
        if !self
            .send_event(order_id, OrderEvent::CompleteOrder, None)
            .await?
        {
            let order = self.get_order(order_id).await?;
            return Err(WorkflowError::Validation(format!(
                "order {order_id} cannot be completed from state {}",
                order.status()
            )));
        }
        self.get_order(order_id).await
    }

    /// Whether every task of the order is completed
    pub async fn all_tasks_completed(&self, order_id: Uuid) -> Result<bool> {
        self.get_order(order_id).await?;
        let outstanding = self
            .tasks
            .count_by_parent_and_status_not(order_id, TaskState::Completed)
            .await?;
        tracing::debug!(order_id = %order_id, outstanding, "Counted outstanding tasks");
        Ok(outstanding == 0)
    }
}
