//! Queue scheduler: one task per container.
//!
//! The task is the container's confined context. It owns the [`QueueState`],
//! the input [`shaping`] buffer and the pending promotion timer, and is the
//! only code that touches them. Producers reach it through the action channel
//! held by a [`ContainerHandle`].

pub mod state;
pub(crate) mod shaping;

pub use state::{PromotionTicket, QueueState};

use crate::action::{Action, Control};
use crate::clock::Clock;
use crate::config::ContainerConfig;
use crate::item::{Item, ItemView};
use crate::observer::ContainerObserver;
use crate::policy::Verbosity;
use crate::registry::ContainerHandle;
use serde::{Deserialize, Serialize};
use shaping::Shaper;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Published view of a container's queues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Visible items, in insertion order
    pub main: Vec<ItemView>,
    /// Waiting items, in promotion order
    pub temporary: Vec<ItemView>,
}

impl Snapshot {
    /// `main` followed by `temporary`.
    pub fn items(&self) -> impl Iterator<Item = &ItemView> {
        self.main.iter().chain(self.temporary.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.temporary.is_empty()
    }
}

pub(crate) struct QueueScheduler {
    state: QueueState,
    shaper: Shaper,
    delay: Duration,
    verbosity: Verbosity,
    actions: mpsc::UnboundedReceiver<Action>,
    control: mpsc::UnboundedReceiver<Control>,
    control_tx: mpsc::UnboundedSender<Control>,
    snapshot_tx: watch::Sender<Snapshot>,
    cancel: CancellationToken,
    promotion: Option<(Instant, PromotionTicket)>,
    published_revision: u64,
}

impl QueueScheduler {
    /// Start a scheduler task for `name`. Must be called inside a tokio runtime.
    pub(crate) fn spawn(
        name: &str,
        config: &ContainerConfig,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn ContainerObserver>,
    ) -> ContainerHandle {
        let (action_tx, actions) = mpsc::unbounded_channel();
        let (control_tx, control) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let cancel = CancellationToken::new();

        let scheduler = QueueScheduler {
            state: QueueState::new(name, config.policy, config.display_order, clock, observer)
                .with_display(config.display.clone(), config.placement),
            shaper: Shaper::new(config.input_shaping),
            delay: config.delay(),
            verbosity: config.verbosity,
            actions,
            control,
            control_tx: control_tx.clone(),
            snapshot_tx,
            cancel: cancel.clone(),
            promotion: None,
            published_revision: 0,
        };

        if config.verbosity.logs_lifecycle() {
            info!(
                container = name,
                policy = config.policy.name(),
                capacity = config.policy.capacity(),
                delay_ms = config.delay_ms,
                "Container connected"
            );
        }

        let task = tokio::spawn(scheduler.run());
        ContainerHandle::new(name, action_tx, control_tx, snapshot_rx, cancel, task)
    }

    async fn run(mut self) {
        loop {
            let shaping_deadline = self.shaper.deadline();
            let promotion_deadline = self.promotion.map(|(at, _)| at);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(control) = self.control.recv() => self.apply_control(control),
                received = self.actions.recv() => match received {
                    Some(action) => self.receive(action),
                    None => break,
                },
                _ = sleep_until_deadline(shaping_deadline) => {
                    if let Some(action) = self.shaper.on_deadline(Instant::now()) {
                        self.process(action);
                    }
                }
                _ = sleep_until_deadline(promotion_deadline) => self.fire_promotion(),
            }

            self.publish();
        }

        self.teardown();
    }

    fn receive(&mut self, action: Action) {
        if self.verbosity.logs_actions() {
            info!(container = %self.state.container(), action = action.kind(), "Action received");
        } else {
            trace!(container = %self.state.container(), action = action.kind(), "Action received");
        }

        if let Some(action) = self.shaper.offer(action, Instant::now()) {
            self.process(action);
        }
    }

    fn process(&mut self, action: Action) {
        let action = match action {
            Action::Show { mut item, animated } => {
                self.watch_presence(&mut item);
                Action::Show { item, animated }
            }
            other => other,
        };
        let ticket = self.state.handle(action);
        self.arm(ticket);
    }

    fn apply_control(&mut self, control: Control) {
        let ticket = match control {
            Control::PresenceLost(id) => {
                debug!(container = %self.state.container(), item_id = %id, "Presence cleared by producer");
                self.state.dismiss(id, true)
            }
            Control::SetCapacity(capacity) => self.state.set_capacity(capacity),
        };
        self.arm(ticket);
    }

    fn arm(&mut self, ticket: Option<PromotionTicket>) {
        if let Some(ticket) = ticket {
            trace!(container = %self.state.container(), delay_ms = self.delay.as_millis() as u64, "Promotion scheduled");
            self.promotion = Some((Instant::now() + self.delay, ticket));
        }
    }

    fn fire_promotion(&mut self) {
        if let Some((_, ticket)) = self.promotion.take() {
            let promoted = self.state.promote(ticket);
            trace!(container = %self.state.container(), promoted, "Promotion fired");
        }
    }

    /// Turn a producer flipping the presence cell into an out-of-band dismissal.
    fn watch_presence(&self, item: &mut Item) {
        let Some(presence) = item.presence() else {
            return;
        };
        let mut rx = presence.subscribe();
        let token = self.cancel.child_token();
        let control = self.control_tx.clone();
        let id = item.id();
        item.attach_watch_guard(token.clone().drop_guard());

        tokio::spawn(async move {
            let lost = tokio::select! {
                biased;
                _ = token.cancelled() => false,
                changed = async { rx.wait_for(|present| !*present).await.map(|_| ()) } => {
                    changed.is_ok()
                }
            };
            if lost {
                let _ = control.send(Control::PresenceLost(id));
            }
        });
    }

    fn publish(&mut self) {
        let revision = self.state.revision();
        if revision != self.published_revision {
            self.published_revision = revision;
            self.snapshot_tx.send_replace(self.state.snapshot());
        }
    }

    fn teardown(&mut self) {
        self.promotion = None;
        // shows still queued behind the cancellation never reach the state
        self.actions.close();
        while let Ok(action) = self.actions.try_recv() {
            action.discard();
        }
        self.shaper.clear();
        self.state.teardown();
        self.publish();
        if self.verbosity.logs_lifecycle() {
            info!(container = %self.state.container(), "Container disconnected");
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
