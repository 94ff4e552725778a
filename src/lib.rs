#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Order Workflow Core
//!
//! Workflow state-machine engine for orders and the tasks they own.
//!
//! ## Overview
//!
//! Orders and tasks each advance through a validated sequence of states in
//! response to external events. One aggregate condition, "all tasks of the
//! order are complete", feeds back into the order's own lifecycle.
//!
//! ## Architecture
//!
//! - **Transition graphs** declare, per domain, the arcs
//!   `(state, event) -> (target, guard?, actions[])`.
//! - **A generic runtime** rehydrates a transient machine from the stored entity
//!   for every event, evaluates the guard, commits, persists the new status and
//!   runs post-commit actions. Nothing is kept resident between events.
//! - **Per-entity locks** serialize the read/commit/persist sequence for one id.
//! - **The aggregation coordinator** observes task completions and raises
//!   `ALL_TASKS_COMPLETED` on the order once no task is outstanding, either
//!   inline or through a queued worker.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Graphs, runtime, guards, actions and persistence synchronization
//! - [`orchestration`] - Task-to-order aggregation and the engine composition root
//! - [`services`] - Order and task operations exposed to calling layers
//! - [`store`] - In-memory and PostgreSQL entity stores
//! - [`models`] - Order and task records
//! - [`events`] - Lifecycle event publication
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use order_workflow::config::WorkflowConfig;
//! use order_workflow::orchestration::WorkflowEngine;
//! use order_workflow::state_machine::OrderEvent;
//!
//! # async fn example() -> order_workflow::Result<()> {
//! let engine = WorkflowEngine::in_memory(WorkflowConfig::default())?;
//! let details = engine.orders().create_order(None, None).await?;
//!
//! let accepted = engine
//!     .orders()
//!     .send_event(details.order.id, OrderEvent::ProcessOrder, None)
//!     .await?;
//! assert!(accepted);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod services;
pub mod state_machine;
pub mod store;

pub use config::{AggregationMode, WorkflowConfig};
pub use error::{Result, WorkflowError};
pub use models::{Order, OrderDetails, Task, TaskType};
pub use orchestration::WorkflowEngine;
pub use state_machine::{OrderEvent, OrderState, TaskEvent, TaskState, TransitionContext};
