//! Claim ordering and eligibility
//!
//! Priority first, FIFO inside a level, `scheduledFor` respected, and no
//! task handed out twice under concurrent claimers.

mod common;

use common::Harness;
use std::collections::HashSet;
use std::sync::Arc;
use taskhive_core::domain::{TaskPriority, TaskStatus, TaskType};

/// Same priority: claimed in creation order
#[tokio::test]
async fn test_fifo_within_priority_level() {
    let h = Harness::new();

    let mut created = Vec::new();
    for _ in 0..5 {
        created.push(h.create(TaskType::GenerateReport, TaskPriority::Normal).await.id);
        h.clock.advance(1);
    }

    let mut claimed = Vec::new();
    while let Some(task) = h.scheduler.claim_next().await.unwrap() {
        claimed.push(task.id);
    }
    assert_eq!(claimed, created);
}

/// Identical timestamps fall back to insertion order
#[tokio::test]
async fn test_fifo_with_identical_timestamps() {
    let h = Harness::new();

    let first = h.create(TaskType::SendNotification, TaskPriority::High).await;
    let second = h.create(TaskType::SendNotification, TaskPriority::High).await;
    assert_eq!(first.created_at, second.created_at);

    assert_eq!(h.scheduler.claim_next().await.unwrap().unwrap().id, first.id);
    assert_eq!(h.scheduler.claim_next().await.unwrap().unwrap().id, second.id);
}

/// Higher priority wins regardless of age
#[tokio::test]
async fn test_priority_order() {
    let h = Harness::new();

    let low = h.create(TaskType::CleanupData, TaskPriority::Low).await;
    h.clock.advance(10);
    let normal = h.create(TaskType::CleanupData, TaskPriority::Normal).await;
    h.clock.advance(10);
    let critical = h.create(TaskType::CleanupData, TaskPriority::Critical).await;
    h.clock.advance(10);
    let high = h.create(TaskType::CleanupData, TaskPriority::High).await;

    let peeked = h.scheduler.peek_next().await.unwrap().unwrap();
    assert_eq!(peeked.id, critical.id);
    assert_eq!(peeked.status, TaskStatus::Pending, "peek does not claim");

    let mut order = Vec::new();
    while let Some(task) = h.scheduler.claim_next().await.unwrap() {
        order.push(task.id);
    }
    assert_eq!(order, vec![critical.id, high.id, normal.id, low.id]);
}

/// A future `scheduledFor` hides the task until the clock reaches it
#[tokio::test]
async fn test_scheduled_for_respected() {
    let h = Harness::new();
    let due_at = common::START_MILLIS + 60_000;

    let deferred = h
        .tasks
        .create(
            common::request(TaskType::GenerateReport)
                .with_priority(TaskPriority::Critical)
                .scheduled_for(due_at),
        )
        .await
        .unwrap();

    assert!(h.scheduler.claim_next().await.unwrap().is_none());

    h.clock.set(due_at - 1);
    assert!(h.scheduler.claim_next().await.unwrap().is_none());

    // Eligible exactly at scheduledFor
    h.clock.set(due_at);
    let claimed = h.scheduler.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, deferred.id);
    assert_eq!(claimed.status, TaskStatus::Processing);
    assert_eq!(claimed.started_at, Some(due_at));
}

/// Deferred high-priority work does not block due lower-priority work
#[tokio::test]
async fn test_deferred_task_skipped_for_due_task() {
    let h = Harness::new();

    h.tasks
        .create(
            common::request(TaskType::GenerateReport)
                .with_priority(TaskPriority::Critical)
                .scheduled_for(common::START_MILLIS + 3_600_000),
        )
        .await
        .unwrap();
    let due = h.create(TaskType::GenerateReport, TaskPriority::Low).await;

    let claimed = h.scheduler.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, due.id);
    assert!(h.scheduler.claim_next().await.unwrap().is_none());
}

/// Cancelled tasks are never claimed
#[tokio::test]
async fn test_cancelled_task_not_claimed() {
    let h = Harness::new();
    let task = h.create(TaskType::UpdateLeaderboard, TaskPriority::Critical).await;
    h.tasks.cancel(&task.id, None).await.unwrap();

    assert!(h.scheduler.claim_next().await.unwrap().is_none());
}

/// Many claimers racing over one store: each task goes to exactly one
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_no_duplicates() {
    let h = Arc::new(Harness::new());
    for i in 0..40 {
        let priority = if i % 3 == 0 {
            TaskPriority::High
        } else {
            TaskPriority::Normal
        };
        h.create(TaskType::ProcessSubmission, priority).await;
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let scheduler = h.scheduler.clone();
        handles.push(tokio::spawn(async move {
            let mut mine = Vec::new();
            // Contention may yield None early; keep going until the pool is dry
            for _ in 0..200 {
                match scheduler.claim_next().await.unwrap() {
                    Some(task) => mine.push(task.id),
                    None if scheduler.peek_next().await.unwrap().is_none() => break,
                    None => tokio::task::yield_now().await,
                }
            }
            mine
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }

    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(all.len(), 40, "every task claimed");
    assert_eq!(unique.len(), 40, "no task claimed twice");

    let stats = h.tasks.statistics().await.unwrap();
    assert_eq!(stats.by_status.processing, 40);
    assert_eq!(stats.by_status.pending, 0);
}
