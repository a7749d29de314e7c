//! Tests for the broker registry

use super::*;

#[test]
fn test_get_or_create_reuses_broker() {
    let registry = BrokerRegistry::new();

    let a = registry.get_or_create("alice");
    let b = registry.get_or_create("alice");

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_users_are_isolated() {
    let registry = BrokerRegistry::new();

    let alice = registry.get_or_create("alice");
    let bob = registry.get_or_create("bob");
    let default = registry.get_or_create("");

    assert!(!Arc::ptr_eq(&alice, &bob));
    assert!(!Arc::ptr_eq(&alice, &default));
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_get_does_not_create() {
    let registry = BrokerRegistry::new();
    assert!(registry.get("nobody").is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_queue_capacity_propagates() {
    let registry = BrokerRegistry::with_queue_capacity(7);
    assert_eq!(registry.get_or_create("x").queue_capacity(), 7);
}

#[tokio::test]
async fn test_stats_sorted_by_user() {
    let registry = BrokerRegistry::new();
    registry.get_or_create("zed");
    registry.get_or_create("amy");

    let stats = registry.stats().await;
    let names: Vec<&str> = stats.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["amy", "zed"]);
}

#[test]
fn test_concurrent_get_or_create_single_broker() {
    let registry = Arc::new(BrokerRegistry::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.get_or_create("shared"))
        })
        .collect();

    let brokers: Vec<Arc<Broker>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for broker in &brokers[1..] {
        assert!(Arc::ptr_eq(&brokers[0], broker));
    }
    assert_eq!(registry.len(), 1);
}
