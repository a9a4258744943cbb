//! Random action sequences against a single container's queue engine.

use overlayq::clock::ManualClock;
use overlayq::observer::NoopObserver;
use overlayq::scheduler::{PromotionTicket, QueueState};
use overlayq::{DisplayOrder, Item, ItemId, Policy};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Show(bool),
    Dismiss(usize),
    DismissAll,
    DismissShowing,
    DismissTopmost,
    FirePromotion,
    SetCapacity(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<bool>().prop_map(Op::Show),
        3 => any::<usize>().prop_map(Op::Dismiss),
        1 => Just(Op::DismissAll),
        1 => Just(Op::DismissShowing),
        1 => Just(Op::DismissTopmost),
        3 => Just(Op::FirePromotion),
        1 => (0usize..5).prop_map(Op::SetCapacity),
    ]
}

fn policy_strategy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::OneByOne),
        Just(Policy::OneByOneWaitFinish),
        (1usize..5).prop_map(|capacity| Policy::Multiple { capacity }),
    ]
}

fn order_strategy() -> impl Strategy<Value = DisplayOrder> {
    prop_oneof![Just(DisplayOrder::Ascending), Just(DisplayOrder::Descending)]
}

struct Harness {
    state: QueueState,
    clock: Arc<ManualClock>,
    pending: Option<PromotionTicket>,
    shown: Vec<ItemId>,
}

impl Harness {
    fn new(policy: Policy, order: DisplayOrder) -> Self {
        let clock = Arc::new(ManualClock::default());
        let state = QueueState::new("prop", policy, order, clock.clone(), Arc::new(NoopObserver));
        Self {
            state,
            clock,
            pending: None,
            shown: Vec::new(),
        }
    }

    fn arm(&mut self, ticket: Option<PromotionTicket>) {
        if let Some(ticket) = ticket {
            assert!(self.pending.is_none(), "second promotion requested while one is in flight");
            self.pending = Some(ticket);
        }
    }

    fn apply(&mut self, op: &Op) {
        self.clock.advance(Duration::from_millis(1));
        match op {
            Op::Show(animated) => {
                let item = Item::new(json!(self.shown.len()));
                self.shown.push(item.id());
                let ticket = self.state.show(item, *animated);
                self.arm(ticket);
            }
            Op::Dismiss(index) => {
                if self.shown.is_empty() {
                    return;
                }
                let id = self.shown[index % self.shown.len()];
                let ticket = self.state.dismiss(id, true);
                self.arm(ticket);

                // a second dismissal of the same id changes nothing
                let revision = self.state.revision();
                assert!(self.state.dismiss(id, true).is_none());
                assert_eq!(self.state.revision(), revision);
            }
            Op::DismissAll => {
                let ticket = self.state.dismiss_all(true);
                self.arm(ticket);
                assert!(self.state.main().is_empty());
                assert_eq!(self.state.temporary().count(), 0);
            }
            Op::DismissShowing => {
                let ticket = self.state.dismiss_showing(true);
                self.arm(ticket);
                assert!(self.state.main().is_empty());
            }
            Op::DismissTopmost => {
                let expected = self.state.topmost();
                let ticket = self.state.dismiss_topmost(true);
                self.arm(ticket);
                if let Some(id) = expected {
                    assert!(!self.state.main_ids().contains(&id));
                }
            }
            Op::FirePromotion => {
                let Some(ticket) = self.pending.take() else {
                    return;
                };
                let waiting_before = self.state.temporary_ids();
                let main_before = self.state.main_ids();
                let promoted = self.state.promote(ticket);

                // promotion takes from the head of temporary, in order
                assert_eq!(self.state.temporary_ids(), waiting_before[promoted..].to_vec());
                let mut expected_main = main_before;
                expected_main.extend_from_slice(&waiting_before[..promoted]);
                assert_eq!(self.state.main_ids(), expected_main);
                assert!(!self.state.is_transferring());

                // a fired ticket cannot be replayed
                assert_eq!(self.state.promote(ticket), 0);
            }
            Op::SetCapacity(capacity) => {
                let ticket = self.state.set_capacity(*capacity);
                self.arm(ticket);
            }
        }
    }

    fn check_invariants(&self) {
        let main = self.state.main_ids();
        let waiting = self.state.temporary_ids();
        let capacity = self.state.policy().capacity();

        assert!(main.len() <= capacity, "main holds {} items over capacity {}", main.len(), capacity);
        if matches!(self.state.policy(), Policy::OneByOne) {
            assert!(waiting.is_empty());
        }

        let mut seen = HashSet::new();
        for id in main.iter().chain(waiting.iter()) {
            assert!(seen.insert(*id), "{} held twice", id);
        }

        assert!(self.state.main().iter().all(|item| item.inserted_at().is_some()));
        assert!(self.state.temporary().all(|item| item.inserted_at().is_none()));

        assert_eq!(self.state.is_transferring(), self.pending.is_some());

        // waiting items are never stranded with free room and nothing scheduled
        if main.len() < capacity && !waiting.is_empty() {
            assert!(self.state.is_transferring());
        }
    }
}

#[test]
fn test_random_action_sequences_keep_invariants() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                policy_strategy(),
                order_strategy(),
                prop::collection::vec(op_strategy(), 1..80),
            ),
            |(policy, order, ops)| {
                let mut harness = Harness::new(policy, order);
                for op in &ops {
                    harness.apply(op);
                    harness.check_invariants();
                }
                Ok(())
            },
        )
        .unwrap();
}

#[test]
fn test_teardown_invalidates_pending_promotion() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(2usize..6, 1usize..4), |(shown, capacity)| {
            let mut harness = Harness::new(Policy::Multiple { capacity }, DisplayOrder::Ascending);
            for _ in 0..shown + capacity {
                harness.apply(&Op::Show(true));
            }
            harness.apply(&Op::Dismiss(0));

            let ticket = harness.pending.take();
            harness.state.teardown();
            if let Some(ticket) = ticket {
                assert_eq!(harness.state.promote(ticket), 0);
            }
            assert!(harness.state.main().is_empty());
            assert_eq!(harness.state.temporary().count(), 0);
            Ok(())
        })
        .unwrap();
}

proptest! {
    #[test]
    fn prop_multiple_admits_in_fifo_order(capacity in 1usize..5, count in 1usize..20) {
        let mut harness = Harness::new(Policy::Multiple { capacity }, DisplayOrder::Ascending);
        for _ in 0..count {
            harness.apply(&Op::Show(true));
        }

        // drain by repeatedly dismissing the oldest visible item
        let mut visible_order = Vec::new();
        while let Some(&oldest) = harness.state.main_ids().first() {
            visible_order.push(oldest);
            let ticket = harness.state.dismiss(oldest, true);
            harness.arm(ticket);
            harness.apply(&Op::FirePromotion);
        }

        prop_assert_eq!(visible_order, harness.shown.clone());
    }
}
