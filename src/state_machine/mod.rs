// State machine module for order and task lifecycles
//
// One generic runtime, parameterized over a `WorkflowDomain`, drives both the
// order and the task machines. Machines are rehydrated from storage for every
// event and never kept resident.

pub mod actions;
pub mod context;
pub mod definitions;
pub mod domain;
pub mod errors;
pub mod events;
pub mod graph;
pub mod guards;
pub mod locks;
pub mod machine;
pub mod persistence;
pub mod service;
pub mod states;

// Re-export main types for convenient access
pub use context::TransitionContext;
pub use definitions::{order_graph, task_graph};
pub use domain::{OrderDomain, TaskDomain, WorkflowDomain, WorkflowEntity, WorkflowEvent, WorkflowState};
pub use errors::{ActionError, GuardError, PersistenceError, StateMachineError, StateMachineResult};
pub use events::{OrderEvent, TaskEvent};
pub use graph::{TransitionArc, TransitionGraph};
pub use machine::{MachineHandle, StateMachine};
pub use service::{OrderStateMachineService, StateMachineService, TaskStateMachineService};
pub use states::{OrderState, TaskState};

// Common traits and utilities
pub use actions::{ActionContext, StateAction};
pub use guards::StateGuard;
pub use persistence::{StatusPersistence, StoreStatusPersistence};
