#![forbid(unsafe_code)]

//! Deterministic scenario playback for Stepgate controllers.
//!
//! [`Driver`] owns a controller, a fake document, and a virtual clock. A
//! scenario feeds timestamped inputs; scheduled messages (settle timers,
//! frame callbacks, cooldowns) become due on the virtual clock and re-enter
//! dispatch in due order, exactly as a host event loop would deliver them.
//! Every dispatch is recorded as a [`TraceRecord`] so tests and the replay
//! binary can assert on — or print — the full decision history.
//!
//! Replays are fully deterministic: same scenario in, same trace out.

use web_time::{Duration, Instant};

use stepgate_core::testkit::{FakeDocument, FakeScheduler};
use stepgate_core::{ControlMsg, Controller, Dispatch, Phase};

/// Nominal frame delay for `defer_frame` callbacks on the virtual clock.
const FRAME_MS: u64 = 16;

/// One dispatched message and everything observable about its outcome.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    /// Virtual time of the dispatch, in milliseconds from scenario start.
    pub at_ms: u64,
    /// Whether the message came from the script or from the scheduler.
    pub origin: Origin,
    /// The message itself.
    pub msg: ControlMsg,
    /// The dispatch outcome.
    pub dispatch: Dispatch,
    /// Whether a group was owned after the dispatch.
    pub active: bool,
    /// Scroll offset after the dispatch.
    pub scroll: f64,
}

/// Where a dispatched message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Fed by the scenario script.
    Script,
    /// Due on the virtual clock (timer or frame callback).
    Scheduled,
}

/// Virtual-clock playback of one controller against one fake document.
#[derive(Debug)]
pub struct Driver {
    controller: Controller,
    doc: FakeDocument,
    sched: FakeScheduler,
    t0: Instant,
    now_ms: u64,
    /// Scheduled messages waiting for their due time: (due, seq, msg).
    pending: Vec<(u64, u64, ControlMsg)>,
    seq: u64,
    trace: Vec<TraceRecord>,
}

impl Driver {
    /// Start a playback at virtual time zero.
    #[must_use]
    pub fn new(controller: Controller, doc: FakeDocument) -> Self {
        Self {
            controller,
            doc,
            sched: FakeScheduler::new(),
            t0: Instant::now(),
            now_ms: 0,
            pending: Vec::new(),
            seq: 0,
            trace: Vec::new(),
        }
    }

    /// The document under test.
    #[must_use]
    pub fn doc(&self) -> &FakeDocument {
        &self.doc
    }

    /// The controller under test.
    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The trace so far.
    #[must_use]
    pub fn trace(&self) -> &[TraceRecord] {
        &self.trace
    }

    /// Current virtual time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Seed initial visual state and attempt a first activation.
    pub fn initialize(&mut self) {
        let now = self.now();
        self.controller.initialize(&mut self.doc, &mut self.sched, now);
        self.collect();
    }

    /// Advance to `at_ms` (delivering everything due on the way), then
    /// dispatch `msg` from the script.
    pub fn feed(&mut self, at_ms: u64, msg: ControlMsg) -> Dispatch {
        self.run_until(at_ms);
        self.dispatch(msg, Origin::Script)
    }

    /// Simulate a native scroll to `y` at `at_ms`, followed by the scroll
    /// tick the host would emit. Silently ignored while the body is frozen,
    /// as a real frozen body ignores scrolling.
    pub fn scroll_to(&mut self, at_ms: u64, y: f64) {
        self.run_until(at_ms);
        if !self.doc.scroll_locked {
            self.doc.scroll = y;
        }
        self.dispatch(ControlMsg::ActivationTick, Origin::Script);
    }

    /// Advance the virtual clock, delivering due scheduled messages in
    /// order.
    pub fn run_until(&mut self, at_ms: u64) {
        let target = self.now_ms.max(at_ms);
        loop {
            let next = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, (due, _, _))| *due <= target)
                .min_by_key(|(_, (due, seq, _))| (*due, *seq))
                .map(|(i, _)| i);
            let Some(i) = next else {
                break;
            };
            let (due, _, msg) = self.pending.remove(i);
            self.now_ms = self.now_ms.max(due);
            self.dispatch(msg, Origin::Scheduled);
        }
        self.now_ms = target;
    }

    /// Deliver every outstanding scheduled message, however far in the
    /// future, and return the final trace with the document.
    pub fn finish(mut self) -> (Vec<TraceRecord>, FakeDocument) {
        while let Some(due) = self.pending.iter().map(|(due, _, _)| *due).min() {
            self.run_until(due);
        }
        (self.trace, self.doc)
    }

    fn now(&self) -> Instant {
        self.t0 + Duration::from_millis(self.now_ms)
    }

    fn dispatch(&mut self, msg: ControlMsg, origin: Origin) -> Dispatch {
        let now = self.now();
        let dispatch = self
            .controller
            .dispatch(msg.clone(), &mut self.doc, &mut self.sched, now);
        self.collect();

        let record = TraceRecord {
            at_ms: self.now_ms,
            origin,
            msg,
            dispatch,
            active: matches!(self.controller.phase(), Phase::Active(_)),
            scroll: self.doc.scroll,
        };
        tracing::trace!(?record, "dispatched");
        self.trace.push(record);
        dispatch
    }

    fn collect(&mut self) {
        for msg in self.sched.take_frames() {
            self.pending.push((self.now_ms + FRAME_MS, self.seq, msg));
            self.seq += 1;
        }
        for (delay, msg) in self.sched.take_timers() {
            let due = self.now_ms + delay.as_millis() as u64;
            self.pending.push((due, self.seq, msg));
            self.seq += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stepgate_core::testkit::{FakeGroup, wheel_down};

    fn driver() -> Driver {
        let doc = FakeDocument::new(800.0).with_group(FakeGroup::uniform(200.0, 3, 200.0));
        Driver::new(Controller::locked_stage(), doc)
    }

    #[test]
    fn clock_only_moves_forward() {
        let mut d = driver();
        d.run_until(100);
        d.run_until(50);
        assert_eq!(d.now_ms(), 100);
    }

    #[test]
    fn scheduled_messages_deliver_in_due_order() {
        let mut d = driver();
        d.scroll_to(0, 200.0);
        assert!(d.controller().state().is_active());
        // The capture's settle timer is pending; it fires on the way to 1s.
        d.feed(1_000, wheel_down());
        let scheduled: Vec<_> = d
            .trace()
            .iter()
            .filter(|r| r.origin == Origin::Scheduled)
            .collect();
        assert!(!scheduled.is_empty());
        assert!(scheduled.iter().all(|r| r.at_ms <= 1_000));
    }

    #[test]
    fn frozen_body_ignores_native_scrolls() {
        let mut d = driver();
        d.scroll_to(0, 200.0);
        assert!(d.doc().scroll_locked);
        d.scroll_to(10, 900.0);
        assert_eq!(d.doc().scroll, 200.0);
    }

    #[test]
    fn finish_drains_everything() {
        let mut d = driver();
        d.scroll_to(0, 200.0);
        d.feed(1_000, wheel_down());
        let (trace, _doc) = d.finish();
        assert!(trace.iter().any(|r| r.origin == Origin::Scheduled));
    }

    #[test]
    fn trace_is_deterministic() {
        let run = || {
            let mut d = driver();
            d.scroll_to(0, 200.0);
            d.feed(1_000, wheel_down());
            d.feed(2_000, wheel_down());
            let (trace, _) = d.finish();
            trace
                .iter()
                .map(|r| (r.at_ms, r.active, r.scroll, r.dispatch))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
