//! Tests for the fan-out broker

use std::sync::Arc;
use std::time::Duration;

use super::*;

fn topic(app: &str, proc_: &str, host: &str) -> Topic {
    Topic::new(app, proc_, host).unwrap()
}

// ============================================================================
// Subscription lifecycle
// ============================================================================

#[tokio::test]
async fn test_subscribe_registers() {
    let broker = Broker::new();

    let a = broker.subscribe(TopicMatcher::default()).await;
    let b = broker.subscribe(TopicMatcher::default()).await;

    assert_ne!(a.id(), b.id());
    assert_eq!(broker.subscriber_count().await, 2);
}

#[tokio::test]
async fn test_unsubscribe_closes_queue() {
    let broker = Broker::new();
    let mut sub = broker.subscribe(TopicMatcher::default()).await;

    broker.unsubscribe(&mut sub).await.unwrap();

    assert_eq!(broker.subscriber_count().await, 0);
    assert!(sub.recv().await.is_none());
}

#[tokio::test]
async fn test_unsubscribe_discards_buffered() {
    let broker = Broker::new();
    let mut sub = broker.subscribe(TopicMatcher::default()).await;

    broker
        .notify(&LogRecord::new(1, "buffered"), &topic("a", "b", "c"))
        .await;
    broker.unsubscribe(&mut sub).await.unwrap();

    assert!(sub.recv().await.is_none());
}

#[tokio::test]
async fn test_double_unsubscribe_is_an_error() {
    let broker = Broker::new();
    let mut sub = broker.subscribe(TopicMatcher::default()).await;

    broker.unsubscribe(&mut sub).await.unwrap();
    let result = broker.unsubscribe(&mut sub).await;

    assert_eq!(
        result,
        Err(BrokerError::SubscriptionNotFound { id: sub.id() })
    );
}

#[tokio::test]
async fn test_unsubscribe_from_wrong_broker() {
    let first = Broker::new();
    let second = Broker::new();
    let mut sub = first.subscribe(TopicMatcher::default()).await;

    assert!(second.unsubscribe(&mut sub).await.is_err());
    assert_eq!(first.subscriber_count().await, 1);

    first
        .notify(&LogRecord::new(1, "still open"), &topic("a", "b", "c"))
        .await;
    assert_eq!(sub.recv().await.unwrap().record.raw, "still open");
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test]
async fn test_notify_reaches_only_matching_subscribers() {
    let broker = Broker::new();
    let mut web = broker
        .subscribe(TopicMatcher::from_globs("web", "*", "*"))
        .await;
    let mut db = broker.subscribe(TopicMatcher::from_globs("db", "*", "*")).await;
    let mut all = broker.subscribe(TopicMatcher::default()).await;

    let delivered = broker
        .notify(&LogRecord::new(1000, "hello"), &topic("web", "api", "h1"))
        .await;
    assert_eq!(delivered, 2);

    let msg = web.try_recv().unwrap();
    assert_eq!(msg.topic, topic("web", "api", "h1"));
    assert_eq!(msg.record, LogRecord::new(1000, "hello"));
    assert_eq!(all.try_recv().unwrap(), msg);
    assert!(db.try_recv().is_none());
}

#[tokio::test]
async fn test_fan_out_over_many_matchers() {
    let broker = Broker::new();
    let apps = ["a", "b", "c", "d"];

    let mut subs = Vec::new();
    for app in apps {
        subs.push(broker.subscribe(TopicMatcher::from_globs(app, "*", "*")).await);
    }

    for app in apps {
        broker
            .notify(&LogRecord::new(1, format!("from {app}")), &topic(app, "p", "h"))
            .await;
    }

    for (sub, app) in subs.iter_mut().zip(apps) {
        let msg = sub.try_recv().unwrap();
        assert_eq!(msg.topic.app(), app);
        assert_eq!(msg.record.raw, format!("from {app}"));
        assert!(sub.try_recv().is_none());
    }
}

#[tokio::test]
async fn test_invalid_matcher_receives_nothing() {
    let broker = Broker::new();
    let mut sub = broker.subscribe(TopicMatcher::new("(", "", "")).await;

    let delivered = broker
        .notify(&LogRecord::new(1, "x"), &topic("(", "p", "h"))
        .await;

    assert_eq!(delivered, 0);
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn test_per_sender_order_preserved() {
    let broker = Broker::with_queue_capacity(128);
    let mut sub = broker.subscribe(TopicMatcher::default()).await;
    let t = topic("web", "api", "h1");

    for i in 0..100 {
        broker.notify(&LogRecord::new(i, i.to_string()), &t).await;
    }

    for i in 0..100 {
        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.record.timestamp, i);
    }
}

#[tokio::test]
async fn test_notify_skips_dropped_subscription() {
    let broker = Broker::new();
    let dropped = broker.subscribe(TopicMatcher::default()).await;
    let mut live = broker.subscribe(TopicMatcher::default()).await;
    drop(dropped);

    let delivered = broker
        .notify(&LogRecord::new(1, "x"), &topic("a", "b", "c"))
        .await;

    assert_eq!(delivered, 1);
    assert!(live.try_recv().is_some());
    assert_eq!(broker.stats().await.skipped_closed, 1);
}

// ============================================================================
// Backpressure
// ============================================================================

#[tokio::test]
async fn test_notify_waits_on_full_queue() {
    let broker = Arc::new(Broker::with_queue_capacity(1));
    let mut sub = broker.subscribe(TopicMatcher::default()).await;
    let t = topic("a", "b", "c");

    broker.notify(&LogRecord::new(1, "first"), &t).await;

    let mut pending = {
        let broker = Arc::clone(&broker);
        let t = t.clone();
        tokio::spawn(async move { broker.notify(&LogRecord::new(2, "second"), &t).await })
    };

    let blocked = tokio::time::timeout(Duration::from_millis(50), &mut pending).await;
    assert!(blocked.is_err(), "notify should wait while the queue is full");

    assert_eq!(sub.recv().await.unwrap().record.raw, "first");
    assert_eq!(pending.await.unwrap(), 1);
    assert_eq!(sub.recv().await.unwrap().record.raw, "second");
}

#[tokio::test]
async fn test_unsubscribe_releases_blocked_notify() {
    let broker = Arc::new(Broker::with_queue_capacity(1));
    let mut sub = broker.subscribe(TopicMatcher::default()).await;
    let t = topic("a", "b", "c");

    broker.notify(&LogRecord::new(1, "fills"), &t).await;

    let pending = {
        let broker = Arc::clone(&broker);
        tokio::spawn(async move { broker.notify(&LogRecord::new(2, "blocked"), &t).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(2), broker.unsubscribe(&mut sub))
        .await
        .expect("unsubscribe should not deadlock")
        .unwrap();

    let delivered = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("notify should be released")
        .unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(broker.subscriber_count().await, 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publish_and_subscribe() {
    let broker = Arc::new(Broker::with_queue_capacity(8));
    let mut tasks = Vec::new();

    for s in 0..4 {
        let broker = Arc::clone(&broker);
        tasks.push(tokio::spawn(async move {
            for _ in 0..10 {
                let mut sub = broker
                    .subscribe(TopicMatcher::from_globs(&format!("app{s}"), "*", "*"))
                    .await;
                tokio::task::yield_now().await;
                while sub.try_recv().is_some() {}
                broker.unsubscribe(&mut sub).await.unwrap();
            }
        }));
    }

    for p in 0..4 {
        let broker = Arc::clone(&broker);
        tasks.push(tokio::spawn(async move {
            let t = Topic::new(format!("app{p}"), "proc", "host").unwrap();
            for i in 0..50 {
                broker.notify(&LogRecord::new(i, "line"), &t).await;
            }
        }));
    }

    for task in tasks {
        tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .expect("task should finish")
            .unwrap();
    }

    let stats = broker.stats().await;
    assert_eq!(stats.notified, 200);
    assert_eq!(stats.subscribed, 40);
    assert_eq!(stats.unsubscribed, 40);
    assert_eq!(stats.subscribers, 0);
}
