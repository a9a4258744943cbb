//! Producer-side presence cells and disappear callbacks.

use super::test_utils::*;
use overlayq::{ContainerConfig, Policy, Registry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_clearing_presence_dismisses_item() {
    let registry = Registry::default();
    let handle = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 3 }));

    let (a, a_presence) = show_tracked(&registry, "toasts", "a");
    let b = show(&registry, "toasts", "b");
    settle().await;
    assert_eq!(main_ids(&handle), vec![a, b]);

    a_presence.set(false);
    settle().await;
    assert_eq!(main_ids(&handle), vec![b]);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_presence_of_waiting_item_removes_it() {
    let registry = Registry::default();
    let handle = registry.register("modal", ContainerConfig::new(Policy::OneByOneWaitFinish));

    let a = show(&registry, "modal", "a");
    let (_b, b_presence) = show_tracked(&registry, "modal", "b");
    let c = show(&registry, "modal", "c");
    settle().await;

    b_presence.set(false);
    settle().await;
    assert_eq!(main_ids(&handle), vec![a]);
    assert_eq!(temp_ids(&handle), vec![c]);
}

#[tokio::test(start_paused = true)]
async fn test_presence_cleared_before_admission() {
    let registry = Registry::default();
    let handle = registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 3 }));

    let (_a, a_presence) = show_tracked(&registry, "toasts", "a");
    a_presence.set(false);
    settle().await;
    settle().await;
    assert!(main_ids(&handle).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dismissal_writes_presence_false() {
    let registry = Registry::default();
    registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 3 }));

    let (a, a_presence) = show_tracked(&registry, "toasts", "a");
    settle().await;
    assert!(a_presence.get());

    registry.dismiss(a, "toasts", true);
    settle().await;
    assert!(!a_presence.get());
}

#[tokio::test(start_paused = true)]
async fn test_disappear_callback_fires_once() {
    let registry = Registry::default();
    registry.register("toasts", ContainerConfig::new(Policy::Multiple { capacity: 3 }));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = registry
        .show(
            spec("a").on_disappear(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            "toasts",
            true,
        )
        .unwrap();
    settle().await;

    registry.dismiss(id, "toasts", true);
    registry.dismiss_all(&["toasts"], true);
    settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_show_on_unknown_container_releases_presence() {
    let registry = Registry::default();
    let presence = overlayq::Presence::new();
    let shown = registry.show(spec("lost").with_presence(presence.clone()), "nowhere", true);
    assert!(shown.is_none());
    assert!(!presence.get());
}
