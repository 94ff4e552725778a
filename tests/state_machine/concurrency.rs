use crate::common::{drive_order, inline_engine, order_without_tasks};
use order_workflow::state_machine::{OrderEvent, OrderState};
use serde_json::json;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_events_on_one_order_apply_once() -> anyhow::Result<()> {
    let engine = Arc::new(inline_engine());
    let order_id = order_without_tasks(&engine).await?;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .orders()
                    .send_event(order_id, OrderEvent::ProcessOrder, None)
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        if handle.await?? {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(
        engine.order_machines().current_state(order_id).await?,
        OrderState::PaymentPending
    );
    assert_eq!(engine.order_machines().machine().active_instances(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_events_resolve_in_commit_order() -> anyhow::Result<()> {
    let engine = Arc::new(inline_engine());
    let order_id = order_without_tasks(&engine).await?;
    drive_order(&engine, order_id, OrderState::PaymentPending).await?;

    let events = [
        OrderEvent::PaymentSuccessful,
        OrderEvent::PaymentFailed,
        OrderEvent::CancelOrder,
    ];
    let handles: Vec<_> = events
        .into_iter()
        .map(|event| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let accepted = engine.orders().send_event(order_id, event, None).await?;
                Ok::<_, order_workflow::WorkflowError>((event, accepted))
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        let (event, accepted) = handle.await??;
        if accepted {
            winners.push(event);
        }
    }

    // Payment success and failure exclude each other; cancellation is
    // accepted from every state either of them leads to
    assert!(winners.contains(&OrderEvent::CancelOrder));
    assert!(
        !(winners.contains(&OrderEvent::PaymentSuccessful)
            && winners.contains(&OrderEvent::PaymentFailed))
    );
    assert_eq!(
        engine.order_machines().current_state(order_id).await?,
        OrderState::Cancelled
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_metadata_updates_never_clobber_status() -> anyhow::Result<()> {
    let engine = Arc::new(inline_engine());
    let order_id = order_without_tasks(&engine).await?;

    let transitions = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { drive_order(&engine, order_id, OrderState::Shipped).await })
    };
    let updates = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for revision in 0..20 {
                engine
                    .orders()
                    .update_metadata(order_id, Some(json!({ "revision": revision })))
                    .await?;
            }
            Ok::<_, order_workflow::WorkflowError>(())
        })
    };

    transitions.await??;
    updates.await??;

    let order = engine.orders().get_order(order_id).await?;
    assert_eq!(order.status(), OrderState::Shipped);
    assert_eq!(order.metadata, Some(json!({ "revision": 19 })));
    Ok(())
}
