//! Engine builders, store doubles and helpers that walk entities through their graphs.

use async_trait::async_trait;
use order_workflow::config::{AggregationMode, WorkflowConfig};
use order_workflow::models::{Order, OrderDetails, Task, TaskType};
use order_workflow::orchestration::WorkflowEngine;
use order_workflow::state_machine::{
    OrderEvent, OrderState, TaskEvent, TaskState, TransitionContext, WorkflowEntity,
};
use order_workflow::store::{EntityStore, InMemoryStore, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub fn test_config(mode: AggregationMode) -> WorkflowConfig {
    let mut config = WorkflowConfig::default();
    config.environment = "test".to_string();
    config.aggregation.mode = mode;
    config.aggregation.queue_capacity = 16;
    config
}

pub fn inline_engine() -> WorkflowEngine {
    WorkflowEngine::in_memory(test_config(AggregationMode::Inline)).expect("inline engine")
}

/// Must be called from inside a Tokio runtime: the worker is spawned on build
pub fn queued_engine() -> WorkflowEngine {
    WorkflowEngine::in_memory(test_config(AggregationMode::Queued)).expect("queued engine")
}

/// In-memory store that counts writes and fails reads or writes on demand
#[derive(Debug)]
pub struct InstrumentedStore<E: WorkflowEntity> {
    inner: InMemoryStore<E>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    fail_gets: AtomicBool,
}

impl<E: WorkflowEntity> InstrumentedStore<E> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            fail_gets: AtomicBool::new(false),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<E: WorkflowEntity> EntityStore<E> for InstrumentedStore<E> {
    async fn get(&self, id: Uuid) -> StoreResult<Option<E>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected read failure for {id}")));
        }
        self.inner.get(id).await
    }

    async fn save(&self, entity: E) -> StoreResult<E> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "injected save failure for {}",
                entity.id()
            )));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(entity).await
    }

    async fn list_by_parent(&self, parent_id: Uuid) -> StoreResult<Vec<E>> {
        self.inner.list_by_parent(parent_id).await
    }

    async fn list_all(&self) -> StoreResult<Vec<E>> {
        self.inner.list_all().await
    }

    async fn count_by_parent_and_status_not(
        &self,
        parent_id: Uuid,
        status: E::Status,
    ) -> StoreResult<u64> {
        self.inner
            .count_by_parent_and_status_not(parent_id, status)
            .await
    }
}

/// An engine together with handles on its instrumented stores
pub struct InstrumentedEngine {
    pub engine: WorkflowEngine,
    pub orders: Arc<InstrumentedStore<Order>>,
    pub tasks: Arc<InstrumentedStore<Task>>,
}

pub fn instrumented_engine() -> InstrumentedEngine {
    let orders = Arc::new(InstrumentedStore::<Order>::new());
    let tasks = Arc::new(InstrumentedStore::<Task>::new());
    let engine = WorkflowEngine::with_stores(
        test_config(AggregationMode::Inline),
        orders.clone(),
        tasks.clone(),
    )
    .expect("instrumented engine");

    InstrumentedEngine {
        engine,
        orders,
        tasks,
    }
}

/// Expected order transition table, written out independently of the engine
pub fn order_transition(state: OrderState, event: OrderEvent) -> Option<OrderState> {
    use OrderEvent as E;
    use OrderState as S;

    match (state, event) {
        (S::Created, E::ProcessOrder) => Some(S::PaymentPending),
        (S::PaymentPending, E::PaymentSuccessful) => Some(S::InProgress),
        (S::PaymentPending, E::PaymentFailed) => Some(S::PaymentFailed),
        (S::PaymentFailed, E::RetryPayment) => Some(S::PaymentPending),
        (S::InProgress, E::AllTasksCompleted) => Some(S::ReadyForShipment),
        (S::InProgress, E::PlaceOnHold) => Some(S::OnHold),
        (S::OnHold, E::ResumeOrder) => Some(S::InProgress),
        (S::ReadyForShipment, E::ShipOrder) => Some(S::Shipped),
        (S::Shipped, E::DeliverOrder) => Some(S::Delivered),
        (S::Delivered, E::CompleteOrder) => Some(S::Completed),
        (
            S::Created
            | S::PaymentPending
            | S::PaymentFailed
            | S::InProgress
            | S::OnHold
            | S::ReadyForShipment,
            E::CancelOrder,
        ) => Some(S::Cancelled),
        _ => None,
    }
}

/// Expected task transition table
pub fn task_transition(state: TaskState, event: TaskEvent) -> Option<TaskState> {
    use TaskEvent as E;
    use TaskState as S;

    match (state, event) {
        (S::Pending, E::StartTask) => Some(S::InProgress),
        (S::InProgress, E::CompleteTask) => Some(S::Completed),
        (S::InProgress, E::FailTask) => Some(S::Failed),
        (S::Failed, E::RetryTask) => Some(S::InProgress),
        (S::Pending | S::InProgress | S::Failed, E::CancelTask) => Some(S::Cancelled),
        _ => None,
    }
}

/// Events that take a fresh order from `created` to `target`
pub fn order_path(target: OrderState) -> Vec<OrderEvent> {
    use OrderEvent as E;
    use OrderState as S;

    let in_progress = vec![E::ProcessOrder, E::PaymentSuccessful];
    let ready = [in_progress.clone(), vec![E::AllTasksCompleted]].concat();
    let shipped = [ready.clone(), vec![E::ShipOrder]].concat();
    let delivered = [shipped.clone(), vec![E::DeliverOrder]].concat();

    match target {
        S::Created => vec![],
        S::PaymentPending => vec![E::ProcessOrder],
        S::PaymentFailed => vec![E::ProcessOrder, E::PaymentFailed],
        S::InProgress => in_progress,
        S::OnHold => [in_progress, vec![E::PlaceOnHold]].concat(),
        S::ReadyForShipment => ready,
        S::Shipped => shipped,
        S::Delivered => delivered,
        S::Completed => [delivered, vec![E::CompleteOrder]].concat(),
        S::Cancelled => vec![E::CancelOrder],
    }
}

/// Events that take a fresh task from `pending` to `target`
pub fn task_path(target: TaskState) -> Vec<TaskEvent> {
    use TaskEvent as E;
    use TaskState as S;

    match target {
        S::Pending => vec![],
        S::InProgress => vec![E::StartTask],
        S::Completed => vec![E::StartTask, E::CompleteTask],
        S::Failed => vec![E::StartTask, E::FailTask],
        S::Cancelled => vec![E::CancelTask],
    }
}

/// Context for an order event. `ALL_TASKS_COMPLETED` carries the completion
/// flag, as the aggregation coordinator would send it.
pub fn order_context(order_id: Uuid, event: OrderEvent) -> TransitionContext<OrderEvent> {
    let context = TransitionContext::new(order_id, event);
    if event == OrderEvent::AllTasksCompleted {
        context.with_all_tasks_completed(true)
    } else {
        context
    }
}

pub async fn drive_order(
    engine: &WorkflowEngine,
    order_id: Uuid,
    target: OrderState,
) -> anyhow::Result<()> {
    for event in order_path(target) {
        let accepted = engine
            .order_machines()
            .send_event_with_context(order_context(order_id, event))
            .await?;
        anyhow::ensure!(accepted, "{event} rejected on the way to {target}");
    }
    Ok(())
}

pub async fn drive_task(
    engine: &WorkflowEngine,
    task_id: Uuid,
    target: TaskState,
) -> anyhow::Result<()> {
    for event in task_path(target) {
        let accepted = engine.tasks().send_event(task_id, event, None).await?;
        anyhow::ensure!(accepted, "{event} rejected on the way to {target}");
    }
    Ok(())
}

/// Start then complete a task
pub async fn finish_task(engine: &WorkflowEngine, task_id: Uuid) -> anyhow::Result<()> {
    drive_task(engine, task_id, TaskState::Completed).await
}

pub async fn order_without_tasks(engine: &WorkflowEngine) -> anyhow::Result<Uuid> {
    let details = engine.orders().create_order(None, Some(vec![])).await?;
    Ok(details.order.id)
}

pub async fn order_with_tasks(
    engine: &WorkflowEngine,
    task_types: Vec<TaskType>,
) -> anyhow::Result<OrderDetails> {
    Ok(engine.orders().create_order(None, Some(task_types)).await?)
}

/// Order with the default VALIDATE_ORDER_DETAILS / PROCESS_PAYMENT / CHECK_INVENTORY set
pub async fn order_with_default_tasks(engine: &WorkflowEngine) -> anyhow::Result<OrderDetails> {
    Ok(engine.orders().create_order(None, None).await?)
}
