//! Lifecycle event publication for committed transitions.

pub mod publisher;

pub use publisher::{EventPublisher, LifecycleEvent, PublishError};
