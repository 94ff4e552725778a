use crate::common::inline_engine;
use order_workflow::state_machine::guards::AllTasksCompletedGuard;
use order_workflow::state_machine::{
    GuardError, OrderEvent, OrderState, StateGuard, TransitionContext,
};
use uuid::Uuid;

#[test]
fn test_guard_description() {
    assert_eq!(
        AllTasksCompletedGuard.description(),
        "All tasks of the order must be completed"
    );
}

#[test]
fn test_missing_flag_is_a_guard_error() {
    let context = TransitionContext::new(Uuid::new_v4(), OrderEvent::AllTasksCompleted);
    let result = AllTasksCompletedGuard.check(&context);
    assert!(matches!(
        result,
        Err(GuardError::MissingContext {
            field: "all_tasks_completed"
        })
    ));
}

#[test]
fn test_only_the_ready_for_shipment_arc_is_guarded() {
    let engine = inline_engine();
    let graph = engine.order_machines().graph();

    let guarded: Vec<_> = graph
        .arcs()
        .filter(|arc| arc.is_guarded())
        .map(|arc| (arc.source, arc.event, arc.target))
        .collect();
    assert_eq!(
        guarded,
        vec![(
            OrderState::InProgress,
            OrderEvent::AllTasksCompleted,
            OrderState::ReadyForShipment
        )]
    );
    assert!(engine.task_machines().graph().arcs().all(|arc| !arc.is_guarded()));
}
