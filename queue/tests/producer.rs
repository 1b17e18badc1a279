//! Producer lifecycle against the nullable broker.

use std::time::Duration;

use intake_nullables::{NullBroker, NullSleep};
use intake_queue::{QueueError, QueueProducer, RetryPolicy, DEFAULT_QUEUE_NAME};
use serde::Serialize;

#[derive(Serialize)]
struct Message<'a> {
    id: &'a str,
    #[serde(rename = "ageIdentity")]
    age_identity: &'a str,
}

async fn connected(broker: &NullBroker) -> QueueProducer {
    QueueProducer::connect(
        broker,
        DEFAULT_QUEUE_NAME,
        &RetryPolicy::default(),
        &NullSleep::new(),
    )
    .await
    .expect("producer connects")
}

#[tokio::test]
async fn connect_declares_durable_queue_once() {
    let broker = NullBroker::new();
    let producer = connected(&broker).await;

    assert_eq!(producer.queue_name(), "rag_tasks");
    assert_eq!(broker.connect_calls(), 1);
    assert_eq!(broker.declared_queues(), vec!["rag_tasks".to_string()]);
}

#[tokio::test]
async fn connect_retries_with_fixed_backoff() {
    let broker = NullBroker::new();
    broker.fail_next_connects(3);
    let sleep = NullSleep::new();

    let producer = QueueProducer::connect(&broker, "rag_tasks", &RetryPolicy::default(), &sleep)
        .await
        .unwrap();

    assert_eq!(broker.connect_calls(), 4);
    assert_eq!(sleep.slept(), vec![Duration::from_secs(3); 3]);
    assert!(!producer.is_closed().await);
}

#[tokio::test]
async fn connect_gives_up_after_ten_attempts() {
    let broker = NullBroker::new();
    broker.fail_next_connects(u32::MAX);
    let sleep = NullSleep::new();

    let err = QueueProducer::connect(&broker, "rag_tasks", &RetryPolicy::default(), &sleep)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, QueueError::ConnectFailed { attempts: 10 }));
    assert_eq!(broker.connect_calls(), 10);
    assert_eq!(sleep.slept().len(), 9);
    assert!(broker.declared_queues().is_empty());
}

#[tokio::test]
async fn publish_sends_persistent_json() {
    let broker = NullBroker::new();
    let producer = connected(&broker).await;

    producer
        .publish(&Message {
            id: "6f1c2e4a-0b6d-4b8e-9f3a-2c1d0e9f8a7b",
            age_identity: "30-40",
        })
        .await
        .unwrap();

    let published = broker.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].queue, "rag_tasks");
    assert!(published[0].persistent);
    let body: serde_json::Value = serde_json::from_slice(&published[0].payload).unwrap();
    assert_eq!(body["ageIdentity"], "30-40");
}

#[tokio::test]
async fn publish_failure_is_surfaced_not_dropped() {
    let broker = NullBroker::new();
    let producer = connected(&broker).await;
    broker.fail_publishes(true);

    let err = producer.publish(&serde_json::json!({"x": 1})).await.unwrap_err();
    assert!(matches!(err, QueueError::Publish(_)));
    assert!(broker.published().is_empty());
}

#[tokio::test]
async fn concurrent_publishes_are_all_delivered() {
    let broker = NullBroker::new();
    let producer = std::sync::Arc::new(connected(&broker).await);

    let tasks: Vec<_> = (0..16)
        .map(|n| {
            let producer = producer.clone();
            tokio::spawn(async move { producer.publish(&serde_json::json!({ "n": n })).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(broker.published().len(), 16);
}

#[tokio::test]
async fn close_is_best_effort_and_final() {
    let broker = NullBroker::new();
    let producer = connected(&broker).await;
    broker.fail_close(true);

    producer.close().await;
    assert!(producer.is_closed().await);
    producer.close().await;

    let err = producer.publish(&serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, QueueError::Closed));
}
