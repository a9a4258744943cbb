//! Routing of commands across several containers.

use super::test_utils::*;
use overlayq::{ContainerConfig, Policy, Registry};

#[tokio::test(start_paused = true)]
async fn test_containers_are_independent() {
    let registry = Registry::default();
    let toasts = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 2 }));
    let banner = registry.register("banner", ContainerConfig::new(Policy::OneByOne));

    let t = show(&registry, "toasts", "t");
    show(&registry, "banner", "b");
    settle().await;

    registry.dismiss_all(&["banner"], true);
    settle().await;
    assert_eq!(main_ids(&toasts), vec![t]);
    assert!(main_ids(&banner).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_bulk_dismiss_spans_listed_containers() {
    let registry = Registry::default();
    let toasts = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 2 }));
    let modal = registry.register("modal", ContainerConfig::new(Policy::OneByOneWaitFinish));
    let banner = registry.register("banner", ContainerConfig::new(Policy::OneByOne));

    show(&registry, "toasts", "a");
    show(&registry, "modal", "b");
    show(&registry, "modal", "c");
    let d = show(&registry, "banner", "d");
    settle().await;

    registry.dismiss_all(&["toasts", "modal", "missing"], false);
    settle().await;
    assert!(toasts.snapshot().is_empty());
    assert!(modal.snapshot().is_empty());
    assert_eq!(main_ids(&banner), vec![d]);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_with_wrong_container_is_noop() {
    let registry = Registry::default();
    let toasts = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 2 }));
    registry.register("banner", ContainerConfig::new(Policy::OneByOne));

    let a = show(&registry, "toasts", "a");
    settle().await;
    registry.dismiss(a, "banner", true);
    settle().await;
    assert_eq!(main_ids(&toasts), vec![a]);
}

#[tokio::test(start_paused = true)]
async fn test_query_reflects_earlier_actions() {
    let registry = Registry::default();
    let handle = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 1 }));

    let a = show(&registry, "toasts", "a");
    let b = show(&registry, "toasts", "b");
    let snapshot = handle.query().await.unwrap();
    let main: Vec<_> = snapshot.main.iter().map(|view| view.id).collect();
    let waiting: Vec<_> = snapshot.temporary.iter().map(|view| view.id).collect();
    assert_eq!(main, vec![a]);
    assert_eq!(waiting, vec![b]);

    let listed: Vec<_> = registry.query("toasts").iter().map(|view| view.id).collect();
    assert_eq!(listed, vec![a, b]);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_changes() {
    let registry = Registry::default();
    let handle = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 2 }));
    let mut rx = handle.subscribe();

    let a = show(&registry, "toasts", "a");
    rx.changed().await.unwrap();
    let ids: Vec<_> = rx.borrow_and_update().main.iter().map(|view| view.id).collect();
    assert_eq!(ids, vec![a]);
}
