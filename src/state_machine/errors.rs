use crate::store::StoreError;
use thiserror::Error;

/// Error types for state machine operations
///
/// A rejected event (no arc, or a guard said no) is not an error: the runtime
/// reports it as `Ok(false)`. These variants cover the conditions that callers
/// cannot recover from by simply sending a different event.
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Persistence operation failed after commit: {reason}")]
    PersistenceFailed { reason: String },

    #[error("Invalid {domain} state for entity {entity_id}: {state}")]
    InvalidState {
        domain: &'static str,
        entity_id: String,
        state: String,
    },

    #[error("Invalid transition graph for {domain}: {reason}")]
    InvalidGraph { domain: &'static str, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specific error type for guard evaluation failures
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Required transition context missing: {field}")]
    MissingContext { field: &'static str },
}

/// Specific error type for action execution failures
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Event publishing failed: {event_name}")]
    EventPublishFailed { event_name: String },

    #[error("Auxiliary update failed for {entity_type} {entity_id}: {reason}")]
    AuxiliaryUpdateFailed {
        entity_type: &'static str,
        entity_id: String,
        reason: String,
    },

    #[error("Notification failed: {reason}")]
    NotificationFailed { reason: String },
}

/// Specific error type for persistence synchronization
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to save status for {domain} {entity_id}: {reason}")]
    StatusSaveFailed {
        domain: &'static str,
        entity_id: String,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Only a failed status write means the commit and the store may disagree;
/// a failed read happens before any commit and stays a plain store error.
impl From<PersistenceError> for StateMachineError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Store(store) => Self::Store(store),
            save_failed @ PersistenceError::StatusSaveFailed { .. } => Self::PersistenceFailed {
                reason: save_failed.to_string(),
            },
        }
    }
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type ActionResult<T> = Result<T, ActionError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Helper function to create internal errors
pub fn internal_error(msg: impl Into<String>) -> StateMachineError {
    StateMachineError::Internal(msg.into())
}
