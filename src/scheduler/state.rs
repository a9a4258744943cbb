//! Per-container queue engine.
//!
//! `QueueState` is the sole mutator of a container's `main` and `temporary`
//! queues. It is synchronous: the owning task decides when time passes and
//! calls [`QueueState::promote`] once a requested promotion delay elapses.

use crate::action::Action;
use crate::clock::Clock;
use crate::item::Item;
use crate::observer::ContainerObserver;
use crate::policy::{DisplayOrder, Policy};
use crate::scheduler::Snapshot;
use crate::style::{DisplayConfig, Placement};
use crate::types::ItemId;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{trace, warn};

/// Permission to run one delayed promotion.
///
/// Tickets from before a teardown or a newer request are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionTicket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueKind {
    Main,
    Temporary,
}

pub struct QueueState {
    container: String,
    policy: Policy,
    display_order: DisplayOrder,
    display: DisplayConfig,
    placement: Placement,
    main: Vec<Item>,
    temporary: VecDeque<Item>,
    /// A promotion is scheduled and has not fired yet
    transferring: bool,
    generation: u64,
    insertion_seq: u64,
    revision: u64,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn ContainerObserver>,
}

impl QueueState {
    pub fn new(
        container: impl Into<String>,
        policy: Policy,
        display_order: DisplayOrder,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn ContainerObserver>,
    ) -> Self {
        Self {
            container: container.into(),
            policy,
            display_order,
            display: DisplayConfig::default(),
            placement: Placement::default(),
            main: Vec::new(),
            temporary: VecDeque::new(),
            transferring: false,
            generation: 0,
            insertion_seq: 0,
            revision: 0,
            clock,
            observer,
        }
    }

    /// Container-level display settings merged into every snapshot view.
    pub fn with_display(mut self, display: DisplayConfig, placement: Placement) -> Self {
        self.display = display;
        self.placement = placement;
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn main(&self) -> &[Item] {
        &self.main
    }

    pub fn temporary(&self) -> impl Iterator<Item = &Item> {
        self.temporary.iter()
    }

    pub fn main_ids(&self) -> Vec<ItemId> {
        self.main.iter().map(Item::id).collect()
    }

    pub fn temporary_ids(&self) -> Vec<ItemId> {
        self.temporary.iter().map(Item::id).collect()
    }

    pub fn is_transferring(&self) -> bool {
        self.transferring
    }

    /// Bumped on every queue mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Snapshot {
        let view = |item: &Item| item.view_in(&self.display, self.placement);
        Snapshot {
            main: self.main.iter().map(view).collect(),
            temporary: self.temporary.iter().map(view).collect(),
        }
    }

    /// Apply one action; returns a ticket when a delayed promotion must be armed.
    pub fn handle(&mut self, action: Action) -> Option<PromotionTicket> {
        match action {
            Action::Show { item, animated } => self.show(item, animated),
            Action::Dismiss { id, animated } => self.dismiss(id, animated),
            Action::DismissAll { animated } => self.dismiss_all(animated),
            Action::DismissShowing { animated } => self.dismiss_showing(animated),
            Action::DismissTopmost { animated } => self.dismiss_topmost(animated),
            Action::Query { reply } => {
                let _ = reply.send(self.snapshot());
                None
            }
        }
    }

    pub fn show(&mut self, item: Item, animated: bool) -> Option<PromotionTicket> {
        match self.policy {
            Policy::OneByOne => {
                // the outgoing item always animates its hand-off
                let outgoing: Vec<Item> = self.main.drain(..).collect();
                for old in outgoing {
                    self.revision += 1;
                    self.finish_removal(old, true);
                }
                self.push_main(item, animated);
            }
            Policy::OneByOneWaitFinish => {
                if self.main.is_empty() {
                    self.push_main(item, animated);
                } else {
                    self.push_temp(item);
                }
            }
            Policy::Multiple { capacity } => {
                if self.main.len() < capacity && self.temporary.is_empty() {
                    self.push_main(item, animated);
                } else {
                    self.push_temp(item);
                }
            }
        }
        None
    }

    /// Remove an item from whichever queue holds it. Unknown ids are ignored.
    pub fn dismiss(&mut self, id: ItemId, animated: bool) -> Option<PromotionTicket> {
        match self.remove(id) {
            Some((item, QueueKind::Main)) => {
                self.finish_removal(item, animated);
                self.after_main_shrunk()
            }
            Some((item, QueueKind::Temporary)) => {
                self.finish_removal(item, false);
                None
            }
            None => {
                trace!(container = %self.container, item_id = %id, "Dismiss for unknown item ignored");
                None
            }
        }
    }

    /// Empty both queues. `temporary` is drained first so that emptying
    /// `main` never has anything left to promote.
    pub fn dismiss_all(&mut self, animated: bool) -> Option<PromotionTicket> {
        self.drain_temporary();
        let showing: Vec<Item> = self.main.drain(..).collect();
        for item in showing {
            self.revision += 1;
            self.finish_removal(item, animated);
        }
        None
    }

    pub fn dismiss_showing(&mut self, animated: bool) -> Option<PromotionTicket> {
        if self.main.is_empty() {
            return None;
        }
        let showing: Vec<Item> = self.main.drain(..).collect();
        for item in showing {
            self.revision += 1;
            self.finish_removal(item, animated);
        }
        self.after_main_shrunk()
    }

    pub fn dismiss_topmost(&mut self, animated: bool) -> Option<PromotionTicket> {
        let id = self.topmost()?;
        self.dismiss(id, animated)
    }

    /// The main-queue item `dismiss_topmost` would remove.
    pub fn topmost(&self) -> Option<ItemId> {
        let keyed = self
            .main
            .iter()
            .filter_map(|item| item.insertion_key().map(|key| (key, item.id())));
        let chosen = match self.display_order {
            DisplayOrder::Ascending => keyed.max_by_key(|(key, _)| *key),
            DisplayOrder::Descending => keyed.min_by_key(|(key, _)| *key),
        };
        chosen.map(|(_, id)| id)
    }

    /// Change the capacity of a `Multiple` container at runtime.
    ///
    /// Growing requests a promotion. Shrinking moves the newest surplus items
    /// back to the front of `temporary` so `main` never exceeds capacity.
    pub fn set_capacity(&mut self, capacity: usize) -> Option<PromotionTicket> {
        let Policy::Multiple { capacity: current } = self.policy else {
            warn!(
                container = %self.container,
                policy = self.policy.name(),
                "Capacity change ignored for single-slot policy"
            );
            return None;
        };
        if capacity == 0 {
            warn!(container = %self.container, current, "Capacity 0 rejected, keeping current capacity");
            return None;
        }
        self.policy = Policy::Multiple { capacity };

        if capacity > current {
            return self.request_promotion();
        }

        if self.main.len() > capacity {
            let surplus = self.main.split_off(capacity);
            for mut item in surplus.into_iter().rev() {
                self.observer.on_disappear(&self.container, &item, true);
                item.clear_inserted();
                self.temporary.push_front(item);
            }
            self.revision += 1;
        }
        None
    }

    /// Run a promotion armed by an earlier ticket.
    ///
    /// Returns the number of items moved from `temporary` to `main`.
    pub fn promote(&mut self, ticket: PromotionTicket) -> usize {
        if !self.transferring || ticket.generation != self.generation {
            return 0;
        }
        self.transferring = false;

        let mut promoted = 0;
        while self.main.len() < self.policy.capacity() {
            let Some(item) = self.temporary.pop_front() else {
                break;
            };
            self.push_main(item, true);
            promoted += 1;
        }
        promoted
    }

    /// Container disconnect: invalidate any pending promotion and empty both
    /// queues without animation.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.transferring = false;
        self.drain_temporary();
        let showing: Vec<Item> = self.main.drain(..).collect();
        for item in showing {
            self.revision += 1;
            self.finish_removal(item, false);
        }
    }

    fn push_main(&mut self, mut item: Item, animated: bool) {
        self.insertion_seq += 1;
        item.mark_inserted(self.clock.now(), self.insertion_seq);
        self.observer.on_appear(&self.container, &item, animated);
        self.main.push(item);
        self.revision += 1;
    }

    fn push_temp(&mut self, item: Item) {
        self.temporary.push_back(item);
        self.revision += 1;
    }

    fn remove_from(&mut self, queue: QueueKind, id: ItemId) -> Option<Item> {
        let removed = match queue {
            QueueKind::Main => {
                let pos = self.main.iter().position(|item| item.id() == id)?;
                Some(self.main.remove(pos))
            }
            QueueKind::Temporary => {
                let pos = self.temporary.iter().position(|item| item.id() == id)?;
                self.temporary.remove(pos)
            }
        };
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    fn remove(&mut self, id: ItemId) -> Option<(Item, QueueKind)> {
        if let Some(item) = self.remove_from(QueueKind::Main, id) {
            return Some((item, QueueKind::Main));
        }
        self.remove_from(QueueKind::Temporary, id)
            .map(|item| (item, QueueKind::Temporary))
    }

    fn drain_temporary(&mut self) {
        while let Some(item) = self.temporary.pop_front() {
            self.revision += 1;
            self.finish_removal(item, false);
        }
    }

    fn finish_removal(&self, item: Item, animated: bool) {
        self.observer.on_disappear(&self.container, &item, animated);
        item.retire();
    }

    fn after_main_shrunk(&mut self) -> Option<PromotionTicket> {
        match self.policy {
            Policy::OneByOne => None,
            Policy::OneByOneWaitFinish if self.main.is_empty() => self.request_promotion(),
            Policy::Multiple { capacity } if self.main.len() < capacity => {
                self.request_promotion()
            }
            _ => None,
        }
    }

    fn request_promotion(&mut self) -> Option<PromotionTicket> {
        if self.transferring || self.temporary.is_empty() {
            return None;
        }
        self.transferring = true;
        Some(PromotionTicket {
            generation: self.generation,
        })
    }
}
