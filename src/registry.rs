//! Container registry: routes producer commands to per-container schedulers.
//!
//! Each registered name owns one scheduler task reachable through a
//! [`ContainerHandle`]. The name map is the only state shared between
//! containers; it is guarded by a mutex so register, unregister and dispatch
//! serialize against each other.
//!
//! Every failure here is recoverable: unknown containers are logged and turn
//! into no-ops, and a duplicate registration replaces the previous container.

use crate::action::{Action, Control};
use crate::clock::{Clock, SystemClock};
use crate::config::{ContainerConfig, OverlayConfig};
use crate::item::{Item, ItemSpec, ItemView};
use crate::observer::{ContainerObserver, TracingObserver};
use crate::scheduler::{QueueScheduler, Snapshot};
use crate::types::ItemId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Handle to a running container scheduler.
///
/// Cheap to clone. Actions sent after the scheduler stopped are dropped and
/// release any presence cell they carry.
#[derive(Clone)]
pub struct ContainerHandle {
    name: Arc<str>,
    actions: mpsc::UnboundedSender<Action>,
    control: mpsc::UnboundedSender<Control>,
    snapshot: watch::Receiver<Snapshot>,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ContainerHandle {
    pub(crate) fn new(
        name: &str,
        actions: mpsc::UnboundedSender<Action>,
        control: mpsc::UnboundedSender<Control>,
        snapshot: watch::Receiver<Snapshot>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            actions,
            control,
            snapshot,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an action for the scheduler. Returns `false` if it has stopped.
    pub fn send(&self, action: Action) -> bool {
        match self.actions.send(action) {
            Ok(()) => true,
            Err(mpsc::error::SendError(action)) => {
                debug!(container = %self.name, action = action.kind(), "Container closed, action dropped");
                action.discard();
                false
            }
        }
    }

    /// Change the capacity of a `Multiple` container. Bypasses input shaping.
    pub fn set_capacity(&self, capacity: usize) -> bool {
        self.control.send(Control::SetCapacity(capacity)).is_ok()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified whenever the queues change; renderers watch this.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    /// Snapshot taken in order with previously sent actions.
    ///
    /// Returns `None` if the scheduler stopped or input shaping dropped the query.
    pub async fn query(&self) -> Option<Snapshot> {
        let (reply, rx) = oneshot::channel();
        if !self.send(Action::Query { reply }) {
            return None;
        }
        rx.await.ok()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.actions.is_closed()
    }

    /// Request teardown; queues are emptied on the scheduler task.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Request teardown and wait until the scheduler has emptied its queues.
    pub async fn shutdown(&self) {
        self.close();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(container = %self.name, error = %e, "Scheduler task ended abnormally");
            }
        }
    }
}

impl std::fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Maps container names to their schedulers.
pub struct Registry {
    containers: Mutex<HashMap<String, ContainerHandle>>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn ContainerObserver>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TracingObserver))
    }
}

impl Registry {
    pub fn new(clock: Arc<dyn Clock>, observer: Arc<dyn ContainerObserver>) -> Self {
        Self {
            containers: Mutex::new(HashMap::new()),
            clock,
            observer,
        }
    }

    /// Register every container declared in `config`.
    pub fn from_config(
        config: &OverlayConfig,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn ContainerObserver>,
    ) -> Self {
        let registry = Self::new(clock, observer);
        for name in config.container_names() {
            registry.register(name, config.containers[name].clone());
        }
        registry
    }

    /// Start a scheduler for `name` and return its handle.
    ///
    /// An existing registration under the same name is logged as an error and
    /// torn down; its handles stop accepting actions. An invalid configuration
    /// is logged and replaced by [`ContainerConfig::sanitized`].
    pub fn register(&self, name: &str, config: ContainerConfig) -> ContainerHandle {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                error!(container = name, error = %e, "Invalid container configuration, clamping");
                config.sanitized()
            }
        };
        let mut containers = self.containers.lock();
        if let Some(previous) = containers.remove(name) {
            error!(container = name, "Container already registered, replacing previous scheduler");
            previous.close();
        }
        let handle = QueueScheduler::spawn(
            name,
            &config,
            Arc::clone(&self.clock),
            Arc::clone(&self.observer),
        );
        containers.insert(name.to_string(), handle.clone());
        handle
    }

    /// Remove `name` and request its teardown. No-op if absent.
    pub fn unregister(&self, name: &str) {
        let removed = self.containers.lock().remove(name);
        if let Some(handle) = removed {
            handle.close();
        }
    }

    /// Remove `name` and wait until its queues have been emptied.
    pub async fn disconnect(&self, name: &str) {
        let removed = self.containers.lock().remove(name);
        if let Some(handle) = removed {
            handle.shutdown().await;
        }
    }

    /// Disconnect every container.
    pub async fn shutdown(&self) {
        let handles: Vec<ContainerHandle> =
            self.containers.lock().drain().map(|(_, handle)| handle).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }

    pub fn channel(&self, name: &str) -> Option<ContainerHandle> {
        self.containers.lock().get(name).cloned()
    }

    pub fn count(&self) -> usize {
        self.containers.lock().len()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Send `action` to `name`; logs and drops it if the container is unknown.
    pub fn dispatch(&self, action: Action, name: &str) {
        let containers = self.containers.lock();
        match containers.get(name) {
            Some(handle) => {
                handle.send(action);
            }
            None => {
                error!(container = name, action = action.kind(), "Dispatch to unknown container");
                drop(containers);
                action.discard();
            }
        }
    }

    /// Admit a new item into `name`. Returns its id, or `None` for an unknown container.
    pub fn show(&self, spec: ItemSpec, name: &str, animated: bool) -> Option<ItemId> {
        let item = Item::from_spec(spec);
        let id = item.id();
        let containers = self.containers.lock();
        match containers.get(name) {
            Some(handle) => handle.send(Action::show(item, animated)).then_some(id),
            None => {
                error!(container = name, "Show on unknown container");
                drop(containers);
                item.retire();
                None
            }
        }
    }

    pub fn dismiss(&self, id: ItemId, name: &str, animated: bool) {
        self.dispatch(Action::dismiss(id, animated), name);
    }

    pub fn dismiss_all<S: AsRef<str>>(&self, names: &[S], animated: bool) {
        for name in names {
            self.dispatch(Action::DismissAll { animated }, name.as_ref());
        }
    }

    pub fn dismiss_showing<S: AsRef<str>>(&self, names: &[S], animated: bool) {
        for name in names {
            self.dispatch(Action::DismissShowing { animated }, name.as_ref());
        }
    }

    pub fn dismiss_topmost<S: AsRef<str>>(&self, names: &[S], animated: bool) {
        for name in names {
            self.dispatch(Action::DismissTopmost { animated }, name.as_ref());
        }
    }

    /// Change the capacity of a `Multiple` container at runtime.
    pub fn set_capacity(&self, name: &str, capacity: usize) {
        match self.channel(name) {
            Some(handle) => {
                handle.set_capacity(capacity);
            }
            None => error!(container = name, "Capacity change for unknown container"),
        }
    }

    /// Items of `name`, visible ones first, from the last published snapshot.
    ///
    /// Actions the scheduler has not processed yet are not reflected; use
    /// [`ContainerHandle::query`] for an answer ordered after earlier sends.
    /// Empty for an unknown container.
    pub fn query(&self, name: &str) -> Vec<ItemView> {
        match self.channel(name) {
            Some(handle) => handle.snapshot().items().cloned().collect(),
            None => {
                error!(container = name, "Query on unknown container");
                Vec::new()
            }
        }
    }
}
