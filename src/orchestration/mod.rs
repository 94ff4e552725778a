//! # Orchestration
//!
//! Cross-entity coordination and engine assembly.
//!
//! - [`aggregation::TaskAggregationCoordinator`] turns task completions into the
//!   order's `ALL_TASKS_COMPLETED` event.
//! - [`aggregation_queue::AggregationWorker`] decouples that work from the task
//!   transition through a bounded queue.
//! - [`engine::WorkflowEngine`] wires everything from configuration.

pub mod aggregation;
pub mod aggregation_queue;
pub mod engine;

pub use aggregation::{
    AggregationOutcome, NotifyTaskCompletedAction, TaskAggregationCoordinator,
    TaskCompletionNotice, TaskCompletionSink,
};
pub use aggregation_queue::{AggregationError, AggregationQueue, AggregationWorker};
pub use engine::WorkflowEngine;
