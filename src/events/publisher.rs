//! # Lifecycle Event Publisher
//!
//! Every committed transition is broadcast as a [`LifecycleEvent`] named
//! `<domain>.<target state>`. Delivery is best-effort: publishing with no
//! subscribers succeeds and lagging receivers miss events.
//!
//! ```rust
//! use order_workflow::events::EventPublisher;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let publisher = EventPublisher::new(16);
//! let mut receiver = publisher.subscribe();
//!
//! let order_id = uuid::Uuid::new_v4();
//! publisher
//!     .publish("order.payment_pending", order_id, json!({"from_state": "created"}))
//!     .await
//!     .unwrap();
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.name, "order.payment_pending");
//! # });
//! ```

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast publisher for order and task lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
    published: Arc<AtomicU64>,
}

/// Event that has been published
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    /// `<domain>.<state>`, e.g. `order.ready_for_shipment`
    pub name: String,
    pub entity_id: Uuid,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish an event with the given name and context
    pub async fn publish(
        &self,
        event_name: impl Into<String>,
        entity_id: Uuid,
        context: Value,
    ) -> Result<(), PublishError> {
        let event = LifecycleEvent {
            name: event_name.into(),
            entity_id,
            context,
            published_at: chrono::Utc::now(),
        };

        self.published.fetch_add(1, Ordering::Relaxed);

        // Nobody listening is fine; lifecycle events are best-effort
        if self.sender.send(event).is_err() {
            tracing::trace!(entity_id = %entity_id, "Lifecycle event dropped: no subscribers");
        }
        Ok(())
    }

    /// Serialize `payload` and publish it
    pub async fn publish_serialized<T: Serialize>(
        &self,
        event_name: impl Into<String>,
        entity_id: Uuid,
        payload: &T,
    ) -> Result<(), PublishError> {
        let context = serde_json::to_value(payload)?;
        self.publish(event_name, entity_id, context).await
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since creation, delivered or not
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
