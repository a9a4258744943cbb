//! Overlay items and the producer-owned presence cell.

use crate::style::{resolve_display, DisplayConfig, Placement, ResolvedDisplay};
use crate::types::{ItemId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::DropGuard;

/// Callback invoked once when an item leaves the system.
pub type DisappearCallback = Box<dyn FnOnce(ItemId) + Send + 'static>;

/// Two-way boolean cell shared between a producer and the scheduler.
///
/// The producer may flip it to `false` at any time to request dismissal.
/// The scheduler only ever writes `false`, when the item leaves its queues.
#[derive(Clone)]
pub struct Presence {
    cell: Arc<watch::Sender<bool>>,
}

impl Presence {
    /// Create a cell that starts out `true` (item requested visible).
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { cell: Arc::new(tx) }
    }

    pub fn get(&self) -> bool {
        *self.cell.borrow()
    }

    /// Producer-side write. Setting `false` acts as an out-of-band dismissal.
    pub fn set(&self, value: bool) {
        self.cell.send_replace(value);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.cell.subscribe()
    }

    /// Scheduler-side write. Returns whether the cell actually changed.
    pub(crate) fn release(&self) -> bool {
        self.cell.send_if_modified(|present| {
            if *present {
                *present = false;
                true
            } else {
                false
            }
        })
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presence").field("value", &self.get()).finish()
    }
}

/// Producer-facing description of an item before admission.
pub struct ItemSpec {
    pub payload: Value,
    pub config: DisplayConfig,
    pub presence: Option<Presence>,
    pub on_disappear: Option<DisappearCallback>,
}

impl ItemSpec {
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
            config: DisplayConfig::default(),
            presence: None,
            on_disappear: None,
        }
    }

    pub fn with_config(mut self, config: DisplayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn on_disappear<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(ItemId) + Send + 'static,
    {
        self.on_disappear = Some(Box::new(callback));
        self
    }
}

/// An admitted unit of work.
///
/// The payload and display configuration are carried through untouched; only
/// the renderer interprets them.
pub struct Item {
    id: ItemId,
    payload: Value,
    config: DisplayConfig,
    presence: Option<Presence>,
    inserted_at: Option<Timestamp>,
    /// Tie-breaker for items inserted at the same wall-clock instant
    insertion_seq: u64,
    on_disappear: Option<DisappearCallback>,
    /// Cancels the presence watcher once the item is gone
    watch_guard: Option<DropGuard>,
}

impl Item {
    /// Assign a fresh identity to a producer spec.
    pub fn from_spec(spec: ItemSpec) -> Self {
        Self {
            id: ItemId::next(),
            payload: spec.payload,
            config: spec.config,
            presence: spec.presence,
            inserted_at: None,
            insertion_seq: 0,
            on_disappear: spec.on_disappear,
            watch_guard: None,
        }
    }

    pub fn new(payload: impl Into<Value>) -> Self {
        Self::from_spec(ItemSpec::new(payload))
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn presence(&self) -> Option<&Presence> {
        self.presence.as_ref()
    }

    /// Set when the item moves into the main queue; `None` while waiting.
    pub fn inserted_at(&self) -> Option<Timestamp> {
        self.inserted_at
    }

    pub(crate) fn insertion_key(&self) -> Option<(Timestamp, u64)> {
        self.inserted_at.map(|at| (at, self.insertion_seq))
    }

    pub(crate) fn mark_inserted(&mut self, at: Timestamp, seq: u64) {
        self.inserted_at = Some(at);
        self.insertion_seq = seq;
    }

    pub(crate) fn clear_inserted(&mut self) {
        self.inserted_at = None;
    }

    pub(crate) fn attach_watch_guard(&mut self, guard: DropGuard) {
        self.watch_guard = Some(guard);
    }

    /// Read-only copy for snapshots and renderers, resolved against defaults only.
    pub fn view(&self) -> ItemView {
        self.view_in(&DisplayConfig::default(), Placement::PerItem)
    }

    /// Read-only copy with display settings merged against the container's.
    pub fn view_in(&self, container: &DisplayConfig, placement: Placement) -> ItemView {
        ItemView {
            id: self.id,
            payload: self.payload.clone(),
            config: self.config.clone(),
            display: resolve_display(&self.config, container, placement),
            inserted_at: self.inserted_at,
        }
    }

    /// Final step of the item lifecycle: release the presence cell, fire the
    /// disappear callback and stop the presence watcher.
    pub(crate) fn retire(mut self) {
        if let Some(presence) = &self.presence {
            presence.release();
        }
        if let Some(callback) = self.on_disappear.take() {
            callback(self.id);
        }
        drop(self.watch_guard.take());
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .field("inserted_at", &self.inserted_at)
            .field("has_presence", &self.presence.is_some())
            .finish()
    }
}

/// Snapshot of an item as seen by queries and renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub payload: Value,
    pub config: DisplayConfig,
    pub display: ResolvedDisplay,
    pub inserted_at: Option<Timestamp>,
}
