//! Order and task transition tables.

use super::actions::{LogTransitionAction, PublishTransitionEventAction, RecordCancellationAction};
use super::domain::{OrderDomain, TaskDomain};
use super::errors::StateMachineResult;
use super::events::{OrderEvent, TaskEvent};
use super::graph::{TransitionArc, TransitionGraph};
use super::guards::AllTasksCompletedGuard;
use super::states::{OrderState, TaskState};
use crate::events::EventPublisher;
use crate::models::Order;
use crate::orchestration::aggregation::{NotifyTaskCompletedAction, TaskCompletionSink};
use crate::store::EntityStore;
use std::sync::Arc;

type OrderArc = TransitionArc<OrderDomain>;
type TaskArc = TransitionArc<TaskDomain>;

/// Order graph: 16 arcs, terminal in `completed` and `cancelled`
pub fn order_graph(
    publisher: EventPublisher,
    orders: Arc<dyn EntityStore<Order>>,
) -> StateMachineResult<TransitionGraph<OrderDomain>> {
    use OrderEvent as E;
    use OrderState as S;

    let cancel = |source: S, stage: &'static str| {
        OrderArc::new(source, E::CancelOrder, S::Cancelled)
            .with_action(RecordCancellationAction::new(stage, Arc::clone(&orders)))
    };

    TransitionGraph::<OrderDomain>::builder(S::Created)
        .end_states([S::Completed, S::Cancelled])
        .arc(
            OrderArc::new(S::Created, E::ProcessOrder, S::PaymentPending)
                .with_action(LogTransitionAction::info("Processing order")),
        )
        .arc(cancel(S::Created, "Order cancelled at creation"))
        .arc(
            OrderArc::new(S::PaymentPending, E::PaymentSuccessful, S::InProgress)
                .with_action(LogTransitionAction::info("Payment successful; order in progress")),
        )
        .arc(
            OrderArc::new(S::PaymentPending, E::PaymentFailed, S::PaymentFailed)
                .with_action(LogTransitionAction::warn("Payment failed")),
        )
        .arc(cancel(S::PaymentPending, "Order cancelled during payment pending"))
        .arc(
            OrderArc::new(S::PaymentFailed, E::RetryPayment, S::PaymentPending)
                .with_action(LogTransitionAction::info("Retrying payment")),
        )
        .arc(cancel(S::PaymentFailed, "Order cancelled after payment failure"))
        .arc(
            OrderArc::new(S::InProgress, E::AllTasksCompleted, S::ReadyForShipment)
                .with_guard(AllTasksCompletedGuard)
                .with_action(LogTransitionAction::info("Order ready for shipment")),
        )
        .arc(cancel(S::InProgress, "Order cancelled during progress"))
        .arc(
            OrderArc::new(S::InProgress, E::PlaceOnHold, S::OnHold)
                .with_action(LogTransitionAction::info("Placing order on hold")),
        )
        .arc(
            OrderArc::new(S::OnHold, E::ResumeOrder, S::InProgress)
                .with_action(LogTransitionAction::info("Resuming order")),
        )
        .arc(cancel(S::OnHold, "Order cancelled while on hold"))
        .arc(
            OrderArc::new(S::ReadyForShipment, E::ShipOrder, S::Shipped)
                .with_action(LogTransitionAction::info("Shipping order")),
        )
        .arc(cancel(S::ReadyForShipment, "Order cancelled before shipment"))
        .arc(
            OrderArc::new(S::Shipped, E::DeliverOrder, S::Delivered)
                .with_action(LogTransitionAction::info("Delivering order")),
        )
        .arc(
            OrderArc::new(S::Delivered, E::CompleteOrder, S::Completed)
                .with_action(LogTransitionAction::info("Completing order")),
        )
        .on_every_arc(Arc::new(PublishTransitionEventAction::new(publisher)))
        .build()
}

/// Task graph: 7 arcs. `failed` is labelled final but keeps its retry and
/// cancel arcs.
pub fn task_graph(
    publisher: EventPublisher,
    completion_sink: Arc<dyn TaskCompletionSink>,
) -> StateMachineResult<TransitionGraph<TaskDomain>> {
    use TaskEvent as E;
    use TaskState as S;

    TransitionGraph::<TaskDomain>::builder(S::Pending)
        .end_states([S::Completed, S::Failed, S::Cancelled])
        .arc(
            TaskArc::new(S::Pending, E::StartTask, S::InProgress)
                .with_action(LogTransitionAction::info("Starting task")),
        )
        .arc(
            TaskArc::new(S::Pending, E::CancelTask, S::Cancelled)
                .with_action(LogTransitionAction::warn("Task cancelled before starting")),
        )
        .arc(
            TaskArc::new(S::InProgress, E::CompleteTask, S::Completed)
                .with_action(LogTransitionAction::info("Completing task"))
                .with_action(NotifyTaskCompletedAction::new(completion_sink)),
        )
        .arc(
            TaskArc::new(S::InProgress, E::FailTask, S::Failed)
                .with_action(LogTransitionAction::warn("Task failed")),
        )
        .arc(
            TaskArc::new(S::InProgress, E::CancelTask, S::Cancelled)
                .with_action(LogTransitionAction::warn("Task cancelled while in progress")),
        )
        .arc(
            TaskArc::new(S::Failed, E::RetryTask, S::InProgress)
                .with_action(LogTransitionAction::info("Retrying task")),
        )
        .arc(
            TaskArc::new(S::Failed, E::CancelTask, S::Cancelled)
                .with_action(LogTransitionAction::warn("Task cancelled after failure")),
        )
        .on_every_arc(Arc::new(PublishTransitionEventAction::new(publisher)))
        .build()
}
