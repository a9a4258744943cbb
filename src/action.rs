//! Commands sent to a container's scheduler.

use crate::item::Item;
use crate::scheduler::Snapshot;
use crate::types::ItemId;
use tokio::sync::oneshot;

/// Producer and controller vocabulary.
#[derive(Debug)]
pub enum Action {
    Show { item: Item, animated: bool },
    Dismiss { id: ItemId, animated: bool },
    DismissAll { animated: bool },
    DismissShowing { animated: bool },
    DismissTopmost { animated: bool },
    /// Reply with `main` followed by `temporary`, in order with other actions
    Query { reply: oneshot::Sender<Snapshot> },
}

impl Action {
    pub fn show(item: Item, animated: bool) -> Self {
        Action::Show { item, animated }
    }

    pub fn dismiss(id: ItemId, animated: bool) -> Self {
        Action::Dismiss { id, animated }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Show { .. } => "show",
            Action::Dismiss { .. } => "dismiss",
            Action::DismissAll { .. } => "dismiss_all",
            Action::DismissShowing { .. } => "dismiss_showing",
            Action::DismissTopmost { .. } => "dismiss_topmost",
            Action::Query { .. } => "query",
        }
    }

    /// Release whatever the action carries when it is dropped undelivered.
    pub(crate) fn discard(self) {
        if let Action::Show { item, .. } = self {
            item.retire();
        }
    }
}

/// Out-of-band messages that bypass input shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    /// The producer flipped the item's presence cell to `false`.
    PresenceLost(ItemId),
    SetCapacity(usize),
}
