//! Property sweep: under arbitrary interleavings of gestures, scroll
//! ticks, and timer deliveries, the active index never leaves its range,
//! the scroll lock mirrors ownership, and every return to idle restores
//! the document's native state.

use proptest::prelude::*;
use stepgate_core::testkit::{FakeDocument, FakeGroup, FakeScheduler};
use stepgate_core::{
    ControlMsg, Controller, InputEvent, KeyPress, Phase, StepKey, TouchEnd, TouchStart,
    WheelEvent,
};
use web_time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Op {
    WheelDown,
    WheelUp,
    Key(StepKey),
    SwipeUp,
    SwipeDown,
    Tick,
    /// Let wall-clock time pass, delivering any due timers in order.
    Advance(u16),
    /// A native scroll (only lands when the body is not frozen).
    ScrollTo(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let keys = prop_oneof![
        Just(StepKey::Down),
        Just(StepKey::Up),
        Just(StepKey::PageDown),
        Just(StepKey::PageUp),
        Just(StepKey::Space),
        Just(StepKey::Home),
        Just(StepKey::End),
        Just(StepKey::Escape),
    ];
    prop_oneof![
        Just(Op::WheelDown),
        Just(Op::WheelUp),
        keys.prop_map(Op::Key),
        Just(Op::SwipeUp),
        Just(Op::SwipeDown),
        Just(Op::Tick),
        (0u16..1500).prop_map(Op::Advance),
        (0u16..1400).prop_map(Op::ScrollTo),
    ]
}

/// Minimal deterministic pump: scheduled messages become due at
/// `now + delay` (frames at one nominal 16ms frame) and re-enter dispatch
/// in due order when time advances.
struct Sim {
    ctl: Controller,
    doc: FakeDocument,
    sched: FakeScheduler,
    t0: Instant,
    offset_ms: u64,
    queue: Vec<(u64, u64, ControlMsg)>,
    seq: u64,
}

impl Sim {
    fn new(ctl: Controller, doc: FakeDocument) -> Self {
        Self {
            ctl,
            doc,
            sched: FakeScheduler::new(),
            t0: Instant::now(),
            offset_ms: 0,
            queue: Vec::new(),
            seq: 0,
        }
    }

    fn now(&self) -> Instant {
        self.t0 + Duration::from_millis(self.offset_ms)
    }

    fn dispatch(&mut self, msg: ControlMsg) {
        let now = self.now();
        self.ctl.dispatch(msg, &mut self.doc, &mut self.sched, now);
        self.collect();
    }

    fn collect(&mut self) {
        for msg in self.sched.take_frames() {
            self.queue.push((self.offset_ms + 16, self.seq, msg));
            self.seq += 1;
        }
        for (delay, msg) in self.sched.take_timers() {
            let due = self.offset_ms + delay.as_millis() as u64;
            self.queue.push((due, self.seq, msg));
            self.seq += 1;
        }
    }

    fn advance(&mut self, ms: u64) {
        let target = self.offset_ms + ms;
        loop {
            let next = self
                .queue
                .iter()
                .enumerate()
                .filter(|(_, (due, _, _))| *due <= target)
                .min_by_key(|(_, (due, seq, _))| (*due, *seq))
                .map(|(i, _)| i);
            let Some(i) = next else {
                break;
            };
            let (due, _, msg) = self.queue.remove(i);
            self.offset_ms = self.offset_ms.max(due);
            self.dispatch(msg);
        }
        self.offset_ms = target;
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::WheelDown => self.dispatch(gesture_wheel(30.0)),
            Op::WheelUp => self.dispatch(gesture_wheel(-30.0)),
            Op::Key(key) => {
                self.dispatch(ControlMsg::Gesture(InputEvent::Key(KeyPress::new(*key))));
            }
            Op::SwipeUp => {
                self.dispatch(ControlMsg::Gesture(InputEvent::TouchStart(TouchStart::new(
                    500.0,
                ))));
                self.dispatch(ControlMsg::Gesture(InputEvent::TouchEnd(TouchEnd::new(
                    380.0,
                ))));
            }
            Op::SwipeDown => {
                self.dispatch(ControlMsg::Gesture(InputEvent::TouchStart(TouchStart::new(
                    300.0,
                ))));
                self.dispatch(ControlMsg::Gesture(InputEvent::TouchEnd(TouchEnd::new(
                    420.0,
                ))));
            }
            Op::Tick => self.dispatch(ControlMsg::ActivationTick),
            Op::Advance(ms) => self.advance(u64::from(*ms)),
            Op::ScrollTo(y) => {
                if !self.doc.scroll_locked {
                    self.doc.scroll = f64::from(*y);
                }
                self.dispatch(ControlMsg::ActivationTick);
            }
        }
    }

    fn check_shared(&self) {
        if let Phase::Active(active) = self.ctl.phase() {
            assert!(active.index < active.len, "index escaped its range");
        }
        if let Some(cursor) = self.ctl.state().cursor() {
            assert!(cursor.group < self.doc.groups.len());
            assert!(cursor.index < self.doc.groups[cursor.group].sections.len());
        }
        assert!(self.doc.scroll.is_finite());
    }
}

fn gesture_wheel(delta: f64) -> ControlMsg {
    ControlMsg::Gesture(InputEvent::Wheel(WheelEvent::new(delta)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(192))]

    #[test]
    fn locked_stage_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let doc = FakeDocument::new(800.0).with_group(FakeGroup::uniform(200.0, 4, 200.0));
        let mut sim = Sim::new(Controller::locked_stage(), doc);
        sim.dispatch(ControlMsg::ActivationTick);

        for op in &ops {
            sim.apply(op);
            sim.check_shared();
            // The body freeze mirrors ownership exactly, on every
            // observation point.
            prop_assert_eq!(sim.doc.scroll_locked, sim.ctl.state().is_active());
            if sim.ctl.state().is_active() {
                prop_assert!(sim.doc.active_panel(0).is_some(), "one active panel");
            }
        }

        // Flush all pending timers; whatever phase remains must have left
        // the shared document resources consistent.
        sim.advance(5_000);
        sim.check_shared();
        if matches!(sim.ctl.phase(), Phase::Idle) {
            prop_assert!(!sim.doc.scroll_locked);
            prop_assert!(sim.doc.snap_enabled, "snap must be re-armed at rest");
        }
    }

    #[test]
    fn snap_assist_invariants(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let doc = FakeDocument::new(600.0).with_group(FakeGroup::uniform(0.0, 3, 600.0));
        let mut sim = Sim::new(Controller::snap_assist(), doc);
        let t0 = sim.now();
        sim.ctl.initialize(&mut sim.doc, &mut sim.sched, t0);
        sim.collect();

        for op in &ops {
            sim.apply(op);
            sim.check_shared();
            // Snap assist never touches the shared document resources.
            prop_assert!(!sim.doc.scroll_locked);
            prop_assert!(sim.doc.snap_enabled);
            prop_assert!(!sim.ctl.state().is_active(), "no persistent ownership");
        }

        sim.advance(5_000);
        sim.check_shared();
    }
}
