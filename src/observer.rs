//! Renderer-side hooks fired as items enter and leave a container's main queue.

use crate::item::Item;
use tracing::debug;

/// Container-level callbacks. Implementations must not block: they run on the
/// scheduler's task.
pub trait ContainerObserver: Send + Sync {
    /// An item entered the main queue and became visible.
    fn on_appear(&self, _container: &str, _item: &Item, _animated: bool) {}

    /// An item left the system. `animated` is only ever true for main-queue
    /// removals.
    fn on_disappear(&self, _container: &str, _item: &Item, _animated: bool) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ContainerObserver for NoopObserver {}

/// Emits a debug trace per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ContainerObserver for TracingObserver {
    fn on_appear(&self, container: &str, item: &Item, animated: bool) {
        debug!(container, item_id = %item.id(), animated, "Item appeared");
    }

    fn on_disappear(&self, container: &str, item: &Item, animated: bool) {
        debug!(container, item_id = %item.id(), animated, "Item disappeared");
    }
}
