use crate::error::{Result, WorkflowError};
use crate::logging::log_task_operation;
use crate::models::{Order, Task, TaskType};
use crate::state_machine::{TaskEvent, TaskStateMachineService, WorkflowState};
use crate::store::EntityStore;
use std::sync::Arc;
use uuid::Uuid;

/// Task-level operations for calling layers
pub struct TaskService {
    orders: Arc<dyn EntityStore<Order>>,
    tasks: Arc<dyn EntityStore<Task>>,
    task_machines: Arc<TaskStateMachineService>,
}

impl TaskService {
    pub fn new(
        orders: Arc<dyn EntityStore<Order>>,
        tasks: Arc<dyn EntityStore<Task>>,
        task_machines: Arc<TaskStateMachineService>,
    ) -> Self {
        Self {
            orders,
            tasks,
            task_machines,
        }
    }

    /// Attach a new pending task to an existing order
    pub async fn create_task(&self, order_id: Uuid, task_type: TaskType) -> Result<Task> {
        self.require_order(order_id).await?;

        let task = self.tasks.save(Task::new(order_id, task_type)).await?;
        self.task_machines.initialize(&task).await?;

        log_task_operation(
            "create_task",
            Some(task.id),
            Some(order_id),
            Some(task_type.as_str()),
            task.status().as_str(),
            None,
        );
        Ok(task)
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<Task> {
        self.tasks
            .get(task_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("task", task_id))
    }

    /// Tasks of an order, in creation order
    pub async fn tasks_for_order(&self, order_id: Uuid) -> Result<Vec<Task>> {
        self.require_order(order_id).await?;
        Ok(self.tasks.list_by_parent(order_id).await?)
    }

    /// Send an event to the task machine. `Ok(false)` means it was rejected.
    ///
    /// A `COMPLETE_TASK` that is accepted notifies the aggregation coordinator
    /// from the task graph's completion action.
    pub async fn send_event(
        &self,
        task_id: Uuid,
        event: TaskEvent,
        reason: Option<String>,
    ) -> Result<bool> {
        tracing::info!(task_id = %task_id, event = %event, "Sending task event");
        self.task_machines.send_event(task_id, event, reason).await
    }

    async fn require_order(&self, order_id: Uuid) -> Result<()> {
        match self.orders.get(order_id).await? {
            Some(_) => Ok(()),
            None => Err(WorkflowError::not_found("order", order_id)),
        }
    }
}
