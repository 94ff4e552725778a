use crate::common::{drive_order, inline_engine, order_context, order_transition, order_without_tasks};
use order_workflow::state_machine::{OrderEvent, OrderState, TransitionContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_every_order_pair_follows_the_transition_table() -> anyhow::Result<()> {
    let engine = inline_engine();

    for state in OrderState::ALL {
        for event in OrderEvent::ALL {
            let order_id = order_without_tasks(&engine).await?;
            drive_order(&engine, order_id, state).await?;

            let accepted = engine
                .order_machines()
                .send_event_with_context(order_context(order_id, event))
                .await?;
            let expected = order_transition(state, event);
            assert_eq!(accepted, expected.is_some(), "({state}, {event})");

            let persisted = engine.orders().get_order(order_id).await?.status();
            assert_eq!(persisted, expected.unwrap_or(state), "({state}, {event})");
        }
    }

    assert_eq!(engine.order_machines().machine().active_instances(), 0);
    Ok(())
}

#[tokio::test]
async fn test_ready_for_shipment_requires_completion_flag() -> anyhow::Result<()> {
    let engine = inline_engine();
    let order_id = order_without_tasks(&engine).await?;
    drive_order(&engine, order_id, OrderState::InProgress).await?;

    // Plain send_event carries no flag
    let accepted = engine
        .orders()
        .send_event(order_id, OrderEvent::AllTasksCompleted, None)
        .await?;
    assert!(!accepted);

    let flag_false = TransitionContext::new(order_id, OrderEvent::AllTasksCompleted)
        .with_all_tasks_completed(false);
    assert!(!engine.order_machines().send_event_with_context(flag_false).await?);
    assert_eq!(
        engine.orders().get_order(order_id).await?.status(),
        OrderState::InProgress
    );

    let flag_true = TransitionContext::new(order_id, OrderEvent::AllTasksCompleted)
        .with_all_tasks_completed(true);
    assert!(engine.order_machines().send_event_with_context(flag_true).await?);
    assert_eq!(
        engine.orders().get_order(order_id).await?.status(),
        OrderState::ReadyForShipment
    );
    Ok(())
}

#[tokio::test]
async fn test_terminal_orders_reject_every_event() -> anyhow::Result<()> {
    let engine = inline_engine();

    for terminal in [OrderState::Completed, OrderState::Cancelled] {
        let order_id = order_without_tasks(&engine).await?;
        drive_order(&engine, order_id, terminal).await?;
        let before = engine.orders().get_order(order_id).await?;

        for event in OrderEvent::ALL {
            let accepted = engine
                .order_machines()
                .send_event_with_context(order_context(order_id, event))
                .await?;
            assert!(!accepted, "{terminal} accepted {event}");
        }

        let after = engine.orders().get_order(order_id).await?;
        assert_eq!(after, before);
        assert!(engine.order_machines().available_events(order_id).await?.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn test_available_events_follow_declaration_order() -> anyhow::Result<()> {
    let engine = inline_engine();
    let order_id = order_without_tasks(&engine).await?;

    assert_eq!(
        engine.order_machines().available_events(order_id).await?,
        vec![OrderEvent::ProcessOrder, OrderEvent::CancelOrder]
    );

    drive_order(&engine, order_id, OrderState::InProgress).await?;
    assert_eq!(
        engine.order_machines().available_events(order_id).await?,
        vec![
            OrderEvent::AllTasksCompleted,
            OrderEvent::CancelOrder,
            OrderEvent::PlaceOnHold
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_payment_retry_loop() -> anyhow::Result<()> {
    let engine = inline_engine();
    let order_id = order_without_tasks(&engine).await?;
    drive_order(&engine, order_id, OrderState::PaymentFailed).await?;

    for _ in 0..3 {
        assert!(engine.orders().send_event(order_id, OrderEvent::RetryPayment, None).await?);
        assert!(engine.orders().send_event(order_id, OrderEvent::PaymentFailed, None).await?);
    }
    assert!(engine.orders().send_event(order_id, OrderEvent::RetryPayment, None).await?);
    assert!(engine.orders().send_event(order_id, OrderEvent::PaymentSuccessful, None).await?);
    assert_eq!(
        engine.order_machines().current_state(order_id).await?,
        OrderState::InProgress
    );
    Ok(())
}

#[tokio::test]
async fn test_cancellation_records_stage_in_metadata() -> anyhow::Result<()> {
    let engine = inline_engine();
    let details = engine
        .orders()
        .create_order(Some(json!({ "customer": "c-1042" })), Some(vec![]))
        .await?;
    let order_id = details.order.id;
    drive_order(&engine, order_id, OrderState::PaymentPending).await?;

    let accepted = engine
        .orders()
        .send_event(
            order_id,
            OrderEvent::CancelOrder,
            Some("customer changed their mind".to_string()),
        )
        .await?;
    assert!(accepted);

    let order = engine.orders().get_order(order_id).await?;
    assert_eq!(order.status(), OrderState::Cancelled);

    let metadata = order.metadata.expect("metadata");
    assert_eq!(metadata["customer"], "c-1042");
    assert_eq!(
        metadata["cancellation"]["stage"],
        "Order cancelled during payment pending"
    );
    assert_eq!(metadata["cancellation"]["cancelled_from"], "payment_pending");
    assert_eq!(
        metadata["cancellation"]["reason"],
        "customer changed their mind"
    );
    Ok(())
}

#[tokio::test]
async fn test_transitions_publish_lifecycle_events() -> anyhow::Result<()> {
    let engine = inline_engine();
    let mut events = engine.publisher().subscribe();

    let order_id = order_without_tasks(&engine).await?;
    drive_order(&engine, order_id, OrderState::Completed).await?;

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.entity_id, order_id);
        names.push(event.name);
    }
    assert_eq!(
        names,
        vec![
            "order.payment_pending",
            "order.in_progress",
            "order.ready_for_shipment",
            "order.shipped",
            "order.delivered",
            "order.completed",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_event_publishes_nothing() -> anyhow::Result<()> {
    let engine = inline_engine();
    let order_id = order_without_tasks(&engine).await?;
    let published = engine.publisher().published_count();

    assert!(!engine.orders().send_event(order_id, OrderEvent::ShipOrder, None).await?);
    assert_eq!(engine.publisher().published_count(), published);
    Ok(())
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let engine = inline_engine();
    let err = engine
        .orders()
        .send_event(Uuid::new_v4(), OrderEvent::ProcessOrder, None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = engine
        .order_machines()
        .current_state(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
