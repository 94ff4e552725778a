//! # PostgreSQL Stores
//!
//! SQLx-backed stores for orders and tasks. Queries are checked at runtime so
//! the crate builds without a live database; the schema lives in `migrations/`.
//!
//! Statuses are stored as their lowercase state names (`payment_pending`) and
//! task types as their wire names (`CHECK_INVENTORY`).

use super::{EntityStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::{Order, Task, TaskType};
use crate::state_machine::{OrderState, TaskState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Open a connection pool for the configured database
pub async fn connect(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("database.url is not configured".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Connected to order workflow database"
    );
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Unavailable(format!("Migration failed: {e}")))
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    status: String,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderState>()
            .map_err(|reason| StoreError::CorruptRecord { id: row.id, reason })?;
        Ok(Order::from_stored(
            row.id,
            status,
            row.metadata,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    order_id: Uuid,
    task_type: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TaskState>()
            .map_err(|reason| StoreError::CorruptRecord { id: row.id, reason })?;
        let task_type = row
            .task_type
            .parse::<TaskType>()
            .map_err(|reason| StoreError::CorruptRecord { id: row.id, reason })?;
        Ok(Task::from_stored(
            row.id,
            row.order_id,
            task_type,
            status,
            row.created_at,
            row.updated_at,
            row.completed_at,
        ))
    }
}

/// Orders table access
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<Order> for PgOrderStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, status, metadata, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn save(&self, order: Order) -> StoreResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (id, status, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                metadata = EXCLUDED.metadata,
                updated_at = EXCLUDED.updated_at
            RETURNING id, status, metadata, created_at, updated_at
            "#,
        )
        .bind(order.id)
        .bind(order.status().to_string())
        .bind(&order.metadata)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Order::try_from(row)
    }

    async fn list_by_parent(&self, _parent_id: Uuid) -> StoreResult<Vec<Order>> {
        // Orders are aggregate roots
        Ok(Vec::new())
    }

    async fn list_all(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, status, metadata, created_at, updated_at
            FROM orders
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn count_by_parent_and_status_not(
        &self,
        _parent_id: Uuid,
        _status: OrderState,
    ) -> StoreResult<u64> {
        Ok(0)
    }
}

/// Order tasks table access
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<Task> for PgTaskStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, order_id, task_type, status, created_at, updated_at, completed_at
            FROM order_tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn save(&self, task: Task) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO order_tasks
            (id, order_id, task_type, status, created_at, updated_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at,
                completed_at = COALESCE(order_tasks.completed_at, EXCLUDED.completed_at)
            RETURNING id, order_id, task_type, status, created_at, updated_at, completed_at
            "#,
        )
        .bind(task.id)
        .bind(task.order_id)
        .bind(task.task_type.to_string())
        .bind(task.status().to_string())
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.completed_at())
        .fetch_one(&self.pool)
        .await?;

        Task::try_from(row)
    }

    async fn list_by_parent(&self, order_id: Uuid) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, order_id, task_type, status, created_at, updated_at, completed_at
            FROM order_tasks
            WHERE order_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn list_all(&self) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, order_id, task_type, status, created_at, updated_at, completed_at
            FROM order_tasks
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn count_by_parent_and_status_not(
        &self,
        order_id: Uuid,
        status: TaskState,
    ) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM order_tasks
            WHERE order_id = $1 AND status <> $2
            "#,
        )
        .bind(order_id)
        .bind(status.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}
