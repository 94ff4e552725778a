//! # Models
//!
//! Stored entities driven by the workflow state machines. An `Order` owns its
//! `Task`s exclusively; a task's lifetime is bounded by its order's.
//!
//! Status fields are read-only outside the state machine: the only way to change
//! an entity's status is a committed transition (see [`crate::state_machine`]).

pub mod order;
pub mod task;

pub use order::{Order, OrderDetails};
pub use task::{Task, TaskType};
