//! Queued aggregation mode.
//!
//! Task completions are pushed onto a bounded `mpsc` channel and drained by a
//! spawned [`AggregationWorker`], decoupling the order update from the
//! transaction that completed the task. Shutdown closes the channel and drains
//! whatever was already queued.

use super::aggregation::{TaskAggregationCoordinator, TaskCompletionNotice, TaskCompletionSink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("Aggregation queue is closed")]
    QueueClosed,

    #[error("Aggregation worker is already running")]
    AlreadyStarted,

    #[error("Aggregation worker terminated abnormally: {0}")]
    WorkerPanicked(String),

    #[error("Aggregation failed for order {order_id}: {reason}")]
    Failed { order_id: Uuid, reason: String },
}

/// Sending half handed to the task graph's completion action
#[derive(Debug, Clone)]
pub struct AggregationQueue {
    sender: mpsc::Sender<TaskCompletionNotice>,
}

#[async_trait]
impl TaskCompletionSink for AggregationQueue {
    async fn task_completed(&self, notice: TaskCompletionNotice) -> Result<(), AggregationError> {
        self.sender
            .send(notice)
            .await
            .map_err(|_| AggregationError::QueueClosed)
    }
}

/// Counters exposed by the worker
#[derive(Debug, Default)]
pub struct AggregationWorkerStats {
    pub processed: AtomicU64,
    pub failed: AtomicU64,
}

pub struct AggregationWorker {
    coordinator: Arc<TaskAggregationCoordinator>,
    receiver: Option<mpsc::Receiver<TaskCompletionNotice>>,
    shutdown_tx: watch::Sender<bool>,
    task_handle: Option<JoinHandle<()>>,
    stats: Arc<AggregationWorkerStats>,
}

impl AggregationWorker {
    pub fn new(
        coordinator: Arc<TaskAggregationCoordinator>,
        capacity: usize,
    ) -> (Self, AggregationQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, _) = watch::channel(false);

        let worker = Self {
            coordinator,
            receiver: Some(receiver),
            shutdown_tx,
            task_handle: None,
            stats: Arc::new(AggregationWorkerStats::default()),
        };
        (worker, AggregationQueue { sender })
    }

    /// Spawn the drain loop
    pub fn start(&mut self) -> Result<(), AggregationError> {
        let mut receiver = self.receiver.take().ok_or(AggregationError::AlreadyStarted)?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let coordinator = Arc::clone(&self.coordinator);
        let stats = Arc::clone(&self.stats);

        let handle = tokio::spawn(async move {
            tracing::info!("Aggregation worker started");
            loop {
                tokio::select! {
                    notice = receiver.recv() => match notice {
                        Some(notice) => process(&coordinator, &stats, notice).await,
                        None => break,
                    },
                    _ = shutdown_rx.changed() => {
                        receiver.close();
                        while let Some(notice) = receiver.recv().await {
                            process(&coordinator, &stats, notice).await;
                        }
                        break;
                    }
                }
            }
            tracing::info!(
                processed = stats.processed.load(Ordering::Relaxed),
                "Aggregation worker stopped"
            );
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    pub fn stats(&self) -> &AggregationWorkerStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop accepting notices, drain the queue and wait for the loop to exit
    pub async fn shutdown(&mut self) -> Result<(), AggregationError> {
        // Receivers may already be gone if the loop ended on its own
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| AggregationError::WorkerPanicked(e.to_string()))?;
        }
        Ok(())
    }
}

async fn process(
    coordinator: &TaskAggregationCoordinator,
    stats: &AggregationWorkerStats,
    notice: TaskCompletionNotice,
) {
    match coordinator.handle_task_completed(&notice).await {
        Ok(outcome) => {
            stats.processed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(order_id = %notice.order_id, ?outcome, "Aggregation notice processed");
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            crate::logging::log_error(
                "aggregation_worker",
                "handle_task_completed",
                &e.to_string(),
                Some(&format!("order_id={} task_id={}", notice.order_id, notice.task_id)),
            );
        }
    }
}
