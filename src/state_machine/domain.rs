//! # Workflow Domains
//!
//! The runtime is written once and instantiated per domain. A domain names its
//! state type, its event type and the stored entity whose status the machine
//! drives. `OrderDomain` and `TaskDomain` are the two domains of this crate.

use super::events::{OrderEvent, TaskEvent};
use super::states::{OrderState, TaskState};
use crate::models::{Order, Task};
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use uuid::Uuid;

/// A state of one domain's transition graph
pub trait WorkflowState:
    Copy + Eq + Hash + Debug + Display + Send + Sync + 'static
{
    /// Stable lowercase name, used for storage and lifecycle event names
    fn as_str(&self) -> &'static str;

    /// Every declared state of the domain
    fn all() -> &'static [Self];
}

/// An event accepted by one domain's transition graph
pub trait WorkflowEvent:
    Copy + Eq + Hash + Debug + Display + Send + Sync + 'static
{
    /// Wire name of the event (e.g. `PROCESS_ORDER`)
    fn event_type(&self) -> &'static str;

    fn all() -> &'static [Self];
}

/// Proof that a status write originates from the runtime's commit step.
///
/// Only this crate can construct a `StatusCommit`, so entity status can only be
/// changed by the persistence synchronization that follows a committed transition.
#[derive(Debug)]
pub struct StatusCommit {
    _private: (),
}

impl StatusCommit {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// A stored entity whose status is driven by a state machine
pub trait WorkflowEntity: Clone + Debug + Send + Sync + 'static {
    type Status: WorkflowState;

    fn id(&self) -> Uuid;

    /// Owning entity, if any (the order of a task)
    fn parent_id(&self) -> Option<Uuid>;

    fn status(&self) -> Self::Status;

    /// Write a committed status into the entity record
    fn apply_committed_status(&mut self, status: Self::Status, at: DateTime<Utc>, commit: StatusCommit);
}

/// Binds a state type, an event type and an entity type into one machine domain
pub trait WorkflowDomain: Send + Sync + 'static {
    type State: WorkflowState;
    type Event: WorkflowEvent;
    type Entity: WorkflowEntity<Status = Self::State>;

    /// Short lowercase name used in logs and lifecycle event names
    const NAME: &'static str;
}

/// Order lifecycle domain
#[derive(Debug, Clone, Copy)]
pub struct OrderDomain;

impl WorkflowDomain for OrderDomain {
    type State = OrderState;
    type Event = OrderEvent;
    type Entity = Order;

    const NAME: &'static str = "order";
}

/// Task lifecycle domain
#[derive(Debug, Clone, Copy)]
pub struct TaskDomain;

impl WorkflowDomain for TaskDomain {
    type State = TaskState;
    type Event = TaskEvent;
    type Entity = Task;

    const NAME: &'static str = "task";
}
