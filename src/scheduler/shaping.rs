//! Input shaping: debounce and latest-wins coalescing of incoming actions.
//!
//! The shaper only buffers; it never sleeps. The scheduler task asks for the
//! current [`Shaper::deadline`] and calls [`Shaper::on_deadline`] when it
//! passes, so shaping windows die together with the task.

use crate::action::Action;
use crate::policy::InputShaping;
use tokio::time::Instant;

pub(crate) struct Shaper {
    mode: InputShaping,
    pending: Option<Action>,
    deadline: Option<Instant>,
}

impl Shaper {
    pub(crate) fn new(mode: InputShaping) -> Self {
        Self {
            mode,
            pending: None,
            deadline: None,
        }
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Feed one arrival. Returns the action if it should be delivered now.
    pub(crate) fn offer(&mut self, action: Action, now: Instant) -> Option<Action> {
        match self.mode {
            InputShaping::None => Some(action),
            InputShaping::Debounce { .. } => {
                self.replace_pending(action);
                self.deadline = self.window_end(now);
                None
            }
            InputShaping::Latest { .. } => {
                if self.deadline.is_none() {
                    self.deadline = self.window_end(now);
                    Some(action)
                } else {
                    self.replace_pending(action);
                    None
                }
            }
        }
    }

    /// The current window closed. Returns the buffered action, if any.
    pub(crate) fn on_deadline(&mut self, now: Instant) -> Option<Action> {
        let released = self.pending.take();
        self.deadline = match (self.mode, &released) {
            (InputShaping::Latest { .. }, Some(_)) => self.window_end(now),
            _ => None,
        };
        released
    }

    /// Drop anything buffered without delivering it.
    pub(crate) fn clear(&mut self) {
        self.deadline = None;
        if let Some(action) = self.pending.take() {
            action.discard();
        }
    }

    fn window_end(&self, now: Instant) -> Option<Instant> {
        self.mode.window().map(|window| now + window)
    }

    fn replace_pending(&mut self, action: Action) {
        if let Some(superseded) = self.pending.replace(action) {
            superseded.discard();
        }
    }
}
