//! # Workflow Engine
//!
//! Composition root. Wires stores, transition graphs, machine services, the
//! aggregation coordinator and the public services together according to
//! [`WorkflowConfig`].
//!
//! The order side is built first: the task graph's completion action needs a
//! sink that reaches the order machine, never the other way round.

use super::aggregation::{TaskAggregationCoordinator, TaskCompletionSink};
use super::aggregation_queue::AggregationWorker;
use crate::config::{AggregationMode, WorkflowConfig};
use crate::error::Result;
use crate::events::EventPublisher;
use crate::logging::init_structured_logging;
use crate::models::{Order, Task};
use crate::services::{OrderService, TaskService};
use crate::state_machine::{
    order_graph, task_graph, OrderDomain, OrderStateMachineService, StateMachineService,
    StoreStatusPersistence, TaskDomain, TaskStateMachineService,
};
use crate::store::{postgres, EntityStore, InMemoryStore, PgOrderStore, PgTaskStore};
use std::sync::Arc;

pub struct WorkflowEngine {
    config: WorkflowConfig,
    publisher: EventPublisher,
    order_machines: Arc<OrderStateMachineService>,
    task_machines: Arc<TaskStateMachineService>,
    coordinator: Arc<TaskAggregationCoordinator>,
    orders: OrderService,
    tasks: TaskService,
    worker: Option<AggregationWorker>,
}

impl WorkflowEngine {
    /// Load configuration, initialize logging and build the engine
    pub async fn bootstrap() -> Result<Self> {
        let config = WorkflowConfig::load()?;
        init_structured_logging(&config.environment, &config.logging);
        Self::from_config(config).await
    }

    /// Build on Postgres when `database.url` is set, in memory otherwise
    pub async fn from_config(config: WorkflowConfig) -> Result<Self> {
        config.validate()?;

        match config.database.url {
            Some(_) => {
                let pool = postgres::connect(&config.database).await?;
                if config.database.run_migrations {
                    postgres::run_migrations(&pool).await?;
                }
                let orders: Arc<dyn EntityStore<Order>> = Arc::new(PgOrderStore::new(pool.clone()));
                let tasks: Arc<dyn EntityStore<Task>> = Arc::new(PgTaskStore::new(pool));
                Self::with_stores(config, orders, tasks)
            }
            None => Self::in_memory(config),
        }
    }

    pub fn in_memory(config: WorkflowConfig) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(InMemoryStore::<Order>::new()),
            Arc::new(InMemoryStore::<Task>::new()),
        )
    }

    /// Build over caller-supplied stores.
    ///
    /// Queued aggregation spawns its worker, so this must run inside a Tokio
    /// runtime in that mode.
    pub fn with_stores(
        config: WorkflowConfig,
        order_store: Arc<dyn EntityStore<Order>>,
        task_store: Arc<dyn EntityStore<Task>>,
    ) -> Result<Self> {
        let publisher = EventPublisher::new(config.events.channel_capacity);

        let order_graph = order_graph(publisher.clone(), Arc::clone(&order_store))?;
        let order_machines = Arc::new(StateMachineService::new(
            Arc::new(order_graph),
            Arc::new(StoreStatusPersistence::<OrderDomain>::new(Arc::clone(&order_store))),
        ));

        let coordinator = Arc::new(TaskAggregationCoordinator::new(
            Arc::clone(&order_machines),
            Arc::clone(&task_store),
        ));

        let mut worker = None;
        let sink: Arc<dyn TaskCompletionSink> = match config.aggregation.mode {
            AggregationMode::Inline => coordinator.clone(),
            AggregationMode::Queued => {
                let (mut queued, queue) =
                    AggregationWorker::new(Arc::clone(&coordinator), config.aggregation.queue_capacity);
                queued.start()?;
                worker = Some(queued);
                Arc::new(queue)
            }
        };

        let task_graph = task_graph(publisher.clone(), sink)?;
        let task_machines = Arc::new(StateMachineService::new(
            Arc::new(task_graph),
            Arc::new(StoreStatusPersistence::<TaskDomain>::new(Arc::clone(&task_store))),
        ));

        let orders = OrderService::new(
            Arc::clone(&order_store),
            Arc::clone(&task_store),
            Arc::clone(&order_machines),
            Arc::clone(&task_machines),
            config.orders.default_task_types.clone(),
        );
        let tasks = TaskService::new(order_store, task_store, Arc::clone(&task_machines));

        tracing::info!(
            environment = %config.environment,
            aggregation_mode = ?config.aggregation.mode,
            "Workflow engine ready"
        );

        Ok(Self {
            config,
            publisher,
            order_machines,
            task_machines,
            coordinator,
            orders,
            tasks,
            worker,
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn order_machines(&self) -> &Arc<OrderStateMachineService> {
        &self.order_machines
    }

    pub fn task_machines(&self) -> &Arc<TaskStateMachineService> {
        &self.task_machines
    }

    pub fn coordinator(&self) -> &Arc<TaskAggregationCoordinator> {
        &self.coordinator
    }

    pub fn aggregation_worker(&self) -> Option<&AggregationWorker> {
        self.worker.as_ref()
    }

    /// Drain queued aggregation work. A no-op in inline mode.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.as_mut() {
            worker.shutdown().await?;
            tracing::info!("Workflow engine shut down");
        }
        Ok(())
    }
}
