#![forbid(unsafe_code)]

//! The controller: one state machine per group-managing context.
//!
//! [`Controller::dispatch`] is the single inlet. Scroll/resize ticks drive
//! activation, gestures are classified by the
//! [`GestureArbiter`](crate::arbiter::GestureArbiter) and executed here,
//! and every timer or animation-frame callback re-enters dispatch as a
//! typed [`ControlMsg`]. All work is synchronous; the injected
//! [`Scheduler`](crate::host::Scheduler) is the only source of deferral.
//!
//! # State Machine
//!
//! IDLE → (capture) → ACTIVE → (boundary exit, cancel) → IDLE. ACTIVE
//! carries a LOCKED sub-state for the settle window after each step.
//! Boundary exits run through one release funnel: compute the handoff
//! target from the frozen snapshot, release ownership synchronously, arm
//! the re-capture cooldown, restore native scrolling, and only then — one
//! animation frame later, once the host has applied the style changes —
//! issue the jump. Re-arming the document's snap behavior waits another
//! settle delay so the host's own snap machinery does not fight the
//! programmatic jump.
//!
//! # Invariants
//!
//! 1. The active section index never leaves `[0, len - 1]`.
//! 2. A boundary exit releases exactly once; repeats inside the cooldown
//!    window find the controller idle and pass through.
//! 3. Cancel returns to the exact scroll offset recorded at acquisition.
//! 4. Every path back to IDLE restores the scroll lock and snap behavior,
//!    through the same release funnel.
//! 5. Boundary math uses the acquisition snapshot, never live geometry —
//!    the scroll lock makes live layout reads unreliable.

use web_time::{Duration, Instant};

use crate::arbiter::{EngagementView, GestureArbiter};
use crate::command::{ControlMsg, Dispatch, StepRequest, Verdict};
use crate::config::{ConfigError, StepperConfig};
use crate::event::InputEvent;
use crate::geometry::{self, GroupSnapshot};
use crate::host::{HostDocument, PanelState, Scheduler, ScrollBehavior};
use crate::policy::{Activation, LockedStagePolicy, SnapAssistPolicy, StagePolicy};
use crate::state::{ActiveState, Cursor, Phase, PositionState};

/// Resolved engagement for one gesture: which group the controller is
/// acting for, and from which section.
#[derive(Debug, Clone, Copy)]
struct Engaged {
    group: usize,
    index: usize,
    len: usize,
}

/// Gesture-gated section stepper.
///
/// Construct one per document context with [`locked_stage`]
/// (Controller::locked_stage), [`snap_assist`](Controller::snap_assist), or
/// [`new`](Controller::new) for a custom policy/config pairing.
#[derive(Debug)]
pub struct Controller {
    config: StepperConfig,
    policy: Box<dyn StagePolicy>,
    state: PositionState,
    arbiter: GestureArbiter,
    /// Handoff target waiting for the post-release animation frame.
    pending_jump: Option<(f64, u64)>,
    /// Release epoch whose snap re-arm is still outstanding.
    pending_rearm: Option<u64>,
}

impl Controller {
    /// Create a controller with an explicit policy and configuration.
    pub fn new(policy: Box<dyn StagePolicy>, config: StepperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::unchecked(policy, config))
    }

    /// Locked-stage controller with its shipped tuning.
    #[must_use]
    pub fn locked_stage() -> Self {
        Self::unchecked(Box::new(LockedStagePolicy), StepperConfig::locked_stage())
    }

    /// Snap-assist controller with its shipped tuning.
    #[must_use]
    pub fn snap_assist() -> Self {
        Self::unchecked(Box::new(SnapAssistPolicy), StepperConfig::snap_assist())
    }

    fn unchecked(policy: Box<dyn StagePolicy>, config: StepperConfig) -> Self {
        Self {
            config,
            policy,
            state: PositionState::new(),
            arbiter: GestureArbiter::new(),
            pending_jump: None,
            pending_rearm: None,
        }
    }

    /// Position authority (read-only).
    #[must_use]
    pub fn state(&self) -> &PositionState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> &Phase {
        self.state.phase()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    /// Seed initial visual state and try a first activation.
    ///
    /// Locked-stage: every group's first panel becomes active so the stage
    /// renders before any capture. Snap-assist: the cursor starts at the
    /// globally nearest section.
    pub fn initialize(
        &mut self,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
        now: Instant,
    ) {
        match self.policy.activation() {
            Activation::CaptureOnApproach => {
                for group in 0..host.group_count() {
                    let len = host.section_count(group);
                    if len == 0 {
                        continue;
                    }
                    for section in 0..len {
                        host.set_panel_state(group, section, PanelState::Hidden);
                    }
                    host.set_panel_state(group, 0, PanelState::Active);
                }
            }
            Activation::CaptureOnSnap => {
                if let Some(cursor) = nearest_cursor(host) {
                    self.state.set_cursor(cursor);
                }
            }
        }
        self.dispatch(ControlMsg::ActivationTick, host, scheduler, now);
    }

    /// Process one control message.
    pub fn dispatch(
        &mut self,
        msg: ControlMsg,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
        now: Instant,
    ) -> Dispatch {
        match msg {
            ControlMsg::ActivationTick => {
                self.on_tick(host, scheduler, now);
                Dispatch::pass()
            }
            ControlMsg::CooldownElapsed => {
                // Merely clears the flag; re-capture still waits for a real
                // scroll or resize tick.
                self.state.clear_expired_cooldown(now);
                Dispatch::pass()
            }
            ControlMsg::Gesture(ev) => self.on_gesture(&ev, host, scheduler, now),
            ControlMsg::TransitionSettled { epoch } => {
                if self.state.settle(epoch) {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(epoch, "transition settled");
                }
                Dispatch::pass()
            }
            ControlMsg::FrameSettled { epoch } => {
                self.on_frame_settled(epoch, host, scheduler);
                Dispatch::pass()
            }
            ControlMsg::SnapRearm { epoch } => {
                if self.pending_rearm == Some(epoch) {
                    self.pending_rearm = None;
                    if !self.state.is_active() {
                        host.set_snap_enabled(true);
                    }
                }
                Dispatch::pass()
            }
        }
    }

    /// Programmatic navigation to a section (e.g. a location-hash target).
    ///
    /// Clamped to the group's range; dropped while a transition settles or
    /// when the controller has no business with `group`. Returns whether a
    /// step was presented.
    pub fn request_jump(
        &mut self,
        group: usize,
        index: usize,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
    ) -> bool {
        if self.state.locked() {
            return false;
        }
        let len = host.section_count(group);
        if len == 0 {
            return false;
        }
        let to = index.min(len - 1);

        match self.policy.activation() {
            Activation::CaptureOnApproach => {
                let Some(active) = self.state.active() else {
                    return false;
                };
                if active.group != group {
                    return false;
                }
                let engaged = Engaged {
                    group,
                    index: active.index,
                    len: active.len,
                };
                self.present(engaged, to, host, scheduler);
            }
            Activation::CaptureOnSnap => {
                let from = match self.state.cursor() {
                    Some(cursor) if cursor.group == group => cursor.index.min(len - 1),
                    _ => to,
                };
                self.present(Engaged { group, index: from, len }, to, host, scheduler);
            }
        }
        true
    }

    // -- activation ---------------------------------------------------------

    fn on_tick(&mut self, host: &mut dyn HostDocument, scheduler: &mut dyn Scheduler, now: Instant) {
        match self.policy.activation() {
            Activation::CaptureOnApproach => {
                if self.state.is_active() || self.state.cooldown_pending(now) {
                    return;
                }
                let scroll_y = host.scroll_y();
                let viewport_h = host.viewport_height();
                for group in 0..host.group_count() {
                    let len = host.section_count(group);
                    if len == 0 {
                        continue;
                    }
                    let span = host.group_span(group);
                    if geometry::capture_ready(
                        span,
                        scroll_y,
                        viewport_h,
                        self.config.min_visible_fraction,
                    ) {
                        self.acquire(group, len, GroupSnapshot::new(span, scroll_y), host, scheduler);
                        return;
                    }
                }
            }
            Activation::CaptureOnSnap => {
                if let Some((group, index)) = self.snapped(host) {
                    self.state.set_cursor(Cursor { group, index });
                }
            }
        }
    }

    fn acquire(
        &mut self,
        group: usize,
        len: usize,
        snapshot: GroupSnapshot,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
    ) {
        #[cfg(feature = "tracing")]
        tracing::debug!(group, len, entry = snapshot.entry_scroll, "group captured");

        self.pending_jump = None;
        self.pending_rearm = None;
        self.state.acquire(ActiveState {
            group,
            index: 0,
            len,
            snapshot,
        });
        // Seeding the first panel is a zero-step transition; it engages the
        // settle lock like any other so a gesture mid-capture is dropped.
        let settle = self.policy.apply_step(host, group, 0, 0, len, &self.config);
        self.engage_lock(settle, scheduler);
        self.policy.on_acquire(host);
    }

    // -- gestures -----------------------------------------------------------

    fn on_gesture(
        &mut self,
        ev: &InputEvent,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
        now: Instant,
    ) -> Dispatch {
        let (view, engaged) = self.engagement(host);
        match ev {
            InputEvent::Wheel(wheel) => {
                let dispatch = self.arbiter.wheel(wheel, &view, &self.config, now);
                self.act(dispatch, engaged, host, scheduler, now)
            }
            InputEvent::Key(key) => {
                let ruling = self.arbiter.key(key, &view);
                if ruling.cancel {
                    self.cancel(host, scheduler, now);
                    return ruling.dispatch;
                }
                self.act(ruling.dispatch, engaged, host, scheduler, now)
            }
            InputEvent::TouchStart(start) => self.arbiter.touch_start(start, &view),
            InputEvent::TouchEnd(end) => {
                let dispatch = self.arbiter.touch_end(end, &view, &self.config);
                self.act(dispatch, engaged, host, scheduler, now)
            }
        }
    }

    /// Resolve the current engagement and build the arbiter's view of it.
    fn engagement(&self, host: &dyn HostDocument) -> (EngagementView, Option<Engaged>) {
        let engaged = match self.policy.activation() {
            Activation::CaptureOnApproach => self.state.active().map(|active| Engaged {
                group: active.group,
                index: active.index,
                len: active.len,
            }),
            Activation::CaptureOnSnap => self.snapped(host).map(|(group, snapped)| {
                let len = host.section_count(group);
                // The tracked cursor is the position memory between
                // gestures; the snapped section only seeds it.
                let index = match self.state.cursor() {
                    Some(cursor) if cursor.group == group => cursor.index.min(len - 1),
                    _ => snapped,
                };
                Engaged { group, index, len }
            }),
        };

        let Some(pos) = engaged else {
            return (EngagementView::disengaged(), None);
        };

        let (next_blocked, prev_blocked) = if self.policy.boundary_handoff() {
            (false, false)
        } else {
            self.adjacency_blocks(pos, host)
        };

        let view = EngagementView {
            engaged: true,
            exclusive_wheel: self.policy.exclusive_wheel(),
            locked: self.state.locked(),
            defers_to_inner: self.policy.defers_to_inner_scroll(),
            boundary_handoff: self.policy.boundary_handoff(),
            cancelable: self.policy.cancelable(),
            consume_touch: self.policy.consumes_touch(),
            index: pos.index,
            len: pos.len,
            next_blocked,
            prev_blocked,
        };
        (view, Some(pos))
    }

    /// Section within snap tolerance of the current offset, if any.
    fn snapped(&self, host: &dyn HostDocument) -> Option<(usize, usize)> {
        let scroll_y = host.scroll_y();
        for group in 0..host.group_count() {
            let tops = section_tops(host, group);
            if let Some(section) =
                geometry::snapped_section_index(&tops, scroll_y, self.config.snap_tolerance)
            {
                return Some((group, section));
            }
        }
        None
    }

    /// Whether stepping from `pos` would cross more than the adjacency gap
    /// of non-section content, per direction.
    fn adjacency_blocks(&self, pos: Engaged, host: &dyn HostDocument) -> (bool, bool) {
        let gap_limit = self.config.adjacency_gap;
        let top = host.section_top(pos.group, pos.index);

        let next_blocked = if pos.index + 1 < pos.len {
            let bottom = top + host.section_height(pos.group, pos.index);
            let next_top = host.section_top(pos.group, pos.index + 1);
            next_top - bottom > gap_limit
        } else {
            false
        };

        let prev_blocked = if pos.index > 0 {
            let prev = pos.index - 1;
            let prev_bottom = host.section_top(pos.group, prev)
                + host.section_height(pos.group, prev);
            top - prev_bottom > gap_limit
        } else {
            false
        };

        (next_blocked, prev_blocked)
    }

    fn act(
        &mut self,
        dispatch: Dispatch,
        engaged: Option<Engaged>,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
        now: Instant,
    ) -> Dispatch {
        let Some(command) = dispatch.command else {
            return dispatch;
        };
        let Some(pos) = engaged else {
            return dispatch;
        };

        match command.verdict {
            Verdict::Accepted => {
                let max = pos.len as isize - 1;
                let to = command.request.target(pos.index, pos.len).clamp(0, max) as usize;
                self.present(pos, to, host, scheduler);
            }
            Verdict::BoundaryExit if self.policy.boundary_handoff() => {
                self.handoff(command.request, host, scheduler, now);
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(?command, "gesture dropped");
            }
        }
        dispatch
    }

    /// Present a step and engage the settle lock.
    fn present(
        &mut self,
        pos: Engaged,
        to: usize,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
    ) {
        #[cfg(feature = "tracing")]
        tracing::debug!(group = pos.group, from = pos.index, to, "step");

        let settle = self
            .policy
            .apply_step(host, pos.group, pos.index, to, pos.len, &self.config);

        if let Some(active) = self.state.active_mut() {
            active.step_to(to as isize);
        }
        self.state.set_cursor(Cursor {
            group: pos.group,
            index: to,
        });
        self.engage_lock(settle, scheduler);
    }

    fn engage_lock(&mut self, settle: Duration, scheduler: &mut dyn Scheduler) {
        // Reduced motion settles instantly: no lock window at all.
        if settle.is_zero() {
            return;
        }
        let epoch = self.state.engage_lock();
        scheduler.schedule(settle, ControlMsg::TransitionSettled { epoch });
    }

    // -- release ------------------------------------------------------------

    fn handoff(
        &mut self,
        request: StepRequest,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
        now: Instant,
    ) {
        let Some(active) = self.state.active() else {
            return;
        };
        let target = match request {
            StepRequest::Next => active.snapshot.exit_below(),
            StepRequest::Prev => active.snapshot.exit_above(),
            // Absolute requests are clamped in range and never exit.
            StepRequest::First | StepRequest::Last => return,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(?request, target, "boundary handoff");

        self.release(target, host, scheduler, now);
    }

    fn cancel(&mut self, host: &mut dyn HostDocument, scheduler: &mut dyn Scheduler, now: Instant) {
        let Some(active) = self.state.active() else {
            return;
        };
        let target = active.snapshot.entry_scroll;

        #[cfg(feature = "tracing")]
        tracing::debug!(target, "cancelled back to entry offset");

        self.release(target, host, scheduler, now);
    }

    /// The single release funnel: every path back to IDLE runs through
    /// here, so native scrolling is always restored.
    fn release(
        &mut self,
        target: f64,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
        now: Instant,
    ) {
        if self.state.release().is_none() {
            return;
        }
        let epoch = self.state.epoch();
        self.arbiter.reset();

        self.state.arm_cooldown(now + self.config.exit_cooldown);
        scheduler.schedule(self.config.exit_cooldown, ControlMsg::CooldownElapsed);

        // Restore native positioning first; the jump waits one frame so the
        // host has applied the style changes before the offset moves.
        self.policy.on_release(host);
        self.pending_jump = Some((target, epoch));
        scheduler.defer_frame(ControlMsg::FrameSettled { epoch });
    }

    fn on_frame_settled(
        &mut self,
        epoch: u64,
        host: &mut dyn HostDocument,
        scheduler: &mut dyn Scheduler,
    ) {
        let Some((target, pending_epoch)) = self.pending_jump else {
            return;
        };
        if pending_epoch != epoch {
            return;
        }
        self.pending_jump = None;

        host.scroll_to(target, ScrollBehavior::Instant);

        #[cfg(feature = "tracing")]
        tracing::trace!(target, "handoff jump issued");

        self.pending_rearm = Some(epoch);
        scheduler.schedule(self.config.snap_rearm_delay, ControlMsg::SnapRearm { epoch });
    }
}

/// Globally nearest section across all groups.
fn nearest_cursor(host: &dyn HostDocument) -> Option<Cursor> {
    let scroll_y = host.scroll_y();
    let mut best: Option<(f64, Cursor)> = None;
    for group in 0..host.group_count() {
        let tops = section_tops(host, group);
        if tops.is_empty() {
            continue;
        }
        let index = geometry::nearest_section_index(&tops, scroll_y);
        let dist = (tops[index] - scroll_y).abs();
        if best.is_none_or(|(d, _)| dist < d) {
            best = Some((dist, Cursor { group, index }));
        }
    }
    best.map(|(_, cursor)| cursor)
}

/// Fresh tops of every section in a group.
fn section_tops(host: &dyn HostDocument, group: usize) -> Vec<f64> {
    (0..host.section_count(group))
        .map(|section| host.section_top(group, section))
        .collect()
}
