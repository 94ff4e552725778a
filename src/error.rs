use crate::orchestration::aggregation_queue::AggregationError;
use crate::state_machine::errors::{PersistenceError, StateMachineError};
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced to callers of the workflow services
///
/// A rejected event is not represented here: `send_event` reports it as
/// `Ok(false)` and callers decide how to present it.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<PersistenceError> for WorkflowError {
    fn from(err: PersistenceError) -> Self {
        Self::StateMachine(err.into())
    }
}

impl From<config::ConfigError> for WorkflowError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
