use crate::common::{drive_order, finish_task, inline_engine, order_with_tasks, order_without_tasks};
use order_workflow::models::TaskType;
use order_workflow::state_machine::{OrderEvent, OrderState, TaskState};
use order_workflow::WorkflowError;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_order_with_default_tasks() -> anyhow::Result<()> {
    let engine = inline_engine();
    let metadata = json!({ "customer": "c-7", "items": [{ "sku": "A-1", "qty": 2 }] });
    let details = engine
        .orders()
        .create_order(Some(metadata.clone()), None)
        .await?;

    assert_eq!(details.order.status(), OrderState::Created);
    assert_eq!(details.order.metadata, Some(metadata));
    assert_eq!(details.tasks.len(), 3);
    assert!(details
        .tasks
        .iter()
        .all(|task| task.order_id == details.order.id && task.status() == TaskState::Pending));
    assert_eq!(details.outstanding_tasks(), 3);

    let fetched = engine.orders().get_order_details(details.order.id).await?;
    assert_eq!(fetched, details);
    Ok(())
}

#[tokio::test]
async fn test_create_order_with_explicit_tasks() -> anyhow::Result<()> {
    let engine = inline_engine();
    let details = order_with_tasks(
        &engine,
        vec![TaskType::QualityCheck, TaskType::Packaging, TaskType::QualityCheck],
    )
    .await?;

    let types: Vec<_> = details.tasks.iter().map(|task| task.task_type).collect();
    assert_eq!(
        types,
        vec![TaskType::QualityCheck, TaskType::Packaging, TaskType::QualityCheck]
    );

    let empty = engine.orders().create_order(None, Some(vec![])).await?;
    assert!(empty.tasks.is_empty());
    assert!(engine.orders().all_tasks_completed(empty.order.id).await?);
    Ok(())
}

#[tokio::test]
async fn test_list_orders_in_creation_order() -> anyhow::Result<()> {
    let engine = inline_engine();
    let first = order_without_tasks(&engine).await?;
    let second = order_without_tasks(&engine).await?;

    let ids: Vec<_> = engine
        .orders()
        .list_orders()
        .await?
        .into_iter()
        .map(|order| order.id)
        .collect();
    assert_eq!(ids, vec![first, second]);
    Ok(())
}

#[tokio::test]
async fn test_update_metadata_leaves_status_alone() -> anyhow::Result<()> {
    let engine = inline_engine();
    let order_id = order_without_tasks(&engine).await?;
    drive_order(&engine, order_id, OrderState::PaymentPending).await?;

    let updated = engine
        .orders()
        .update_metadata(order_id, Some(json!({ "gift_wrap": true })))
        .await?;
    assert_eq!(updated.status(), OrderState::PaymentPending);
    assert_eq!(updated.metadata, Some(json!({ "gift_wrap": true })));

    let cleared = engine.orders().update_metadata(order_id, None).await?;
    assert_eq!(cleared.metadata, None);
    assert_eq!(
        engine.orders().get_order(order_id).await?.status(),
        OrderState::PaymentPending
    );
    Ok(())
}

#[tokio::test]
async fn test_complete_order() -> anyhow::Result<()> {
    let engine = inline_engine();
    let order_id = order_without_tasks(&engine).await?;
    drive_order(&engine, order_id, OrderState::Shipped).await?;

    let err = engine.orders().complete_order(order_id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    assert!(engine.orders().send_event(order_id, OrderEvent::DeliverOrder, None).await?);
    let completed = engine.orders().complete_order(order_id).await?;
    assert_eq!(completed.status(), OrderState::Completed);
    assert!(completed.is_terminal());
    Ok(())
}

#[tokio::test]
async fn test_all_tasks_completed_tracks_task_status() -> anyhow::Result<()> {
    let engine = inline_engine();
    let details =
        order_with_tasks(&engine, vec![TaskType::Packaging, TaskType::GenerateInvoice]).await?;
    let order_id = details.order.id;

    assert!(!engine.orders().all_tasks_completed(order_id).await?);
    finish_task(&engine, details.tasks[0].id).await?;
    assert!(!engine.orders().all_tasks_completed(order_id).await?);
    finish_task(&engine, details.tasks[1].id).await?;
    assert!(engine.orders().all_tasks_completed(order_id).await?);

    let refreshed = engine.orders().get_order_details(order_id).await?;
    assert_eq!(refreshed.outstanding_tasks(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_order_queries_are_not_found() {
    let engine = inline_engine();
    let missing = Uuid::new_v4();

    assert!(engine.orders().get_order(missing).await.unwrap_err().is_not_found());
    assert!(engine
        .orders()
        .get_order_details(missing)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(engine
        .orders()
        .update_metadata(missing, None)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(engine
        .orders()
        .all_tasks_completed(missing)
        .await
        .unwrap_err()
        .is_not_found());
}
