#![forbid(unsafe_code)]

//! Gesture arbitration: raw input to step commands.
//!
//! [`GestureArbiter`] is a stateful classifier. For every wheel, key, or
//! touch event it decides three things: whether the controller owns the
//! gesture at all, whether the requested step is currently valid, and what
//! to do with the raw event. The answers come back as a
//! [`Dispatch`] — an optional [`StepCommand`](crate::command::StepCommand)
//! plus a suppression directive.
//!
//! The arbiter holds only channel state (last accepted wheel time, pending
//! touch origin). Everything positional arrives per call in an
//! [`EngagementView`] prepared by the controller, so the classification
//! itself stays a pure function of its inputs.
//!
//! # Invariants
//!
//! 1. At most one `Accepted` command per settle window, across all
//!    channels: the LOCKED flag in the view drops wheel, key, and touch
//!    steps alike.
//! 2. The wheel channel additionally enforces its own spacing window,
//!    measured from the last *accepted* wheel command.
//! 3. A gesture that a nested scrollable can still absorb is never claimed.
//! 4. Classification never mutates position; the controller applies
//!    accepted commands.
//!
//! # Failure Modes
//!
//! - A touch end without a tracked start (activation happened mid-touch,
//!   or a multi-touch collapsed to one finger) is passed through untouched.
//! - A wheel event with no vertical component has no direction to classify
//!   and is consumed or passed based on ownership alone.

use web_time::Instant;

use crate::command::{Dispatch, StepRequest, Suppression, Verdict};
use crate::config::StepperConfig;
use crate::event::{KeyPress, StepKey, TouchEnd, TouchStart, WheelEvent};

/// Positional context for one classification, prepared by the controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementView {
    /// The controller currently owns gestures for a group (persistent
    /// ownership, or a per-gesture snap test that passed).
    pub engaged: bool,
    /// Wheel input is owned outright while engaged: the raw event is
    /// consumed even when the command is dropped.
    pub exclusive_wheel: bool,
    /// A transition is settling; step commands are dropped.
    pub locked: bool,
    /// Nested scrollables get first claim on the gesture.
    pub defers_to_inner: bool,
    /// Steps past the edge hand off with a jump (vs declining so native
    /// scrolling takes over).
    pub boundary_handoff: bool,
    /// Escape cancels back to the entry offset.
    pub cancelable: bool,
    /// Accepted touch gestures consume the raw event.
    pub consume_touch: bool,
    /// Active section index.
    pub index: usize,
    /// Section count of the engaged group.
    pub len: usize,
    /// A forward step would cross non-adjacent content.
    pub next_blocked: bool,
    /// A backward step would cross non-adjacent content.
    pub prev_blocked: bool,
}

impl EngagementView {
    /// A view for a controller that is not engaged; every channel passes.
    #[must_use]
    pub fn disengaged() -> Self {
        Self::default()
    }

    fn blocked(&self, request: StepRequest) -> bool {
        match request {
            StepRequest::Next => self.next_blocked,
            StepRequest::Prev => self.prev_blocked,
            StepRequest::First | StepRequest::Last => false,
        }
    }

    fn out_of_range(&self, request: StepRequest) -> bool {
        let target = request.target(self.index, self.len);
        target < 0 || target >= self.len as isize
    }
}

/// A key classification: the dispatch plus whether Escape requested a
/// cancel exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRuling {
    pub dispatch: Dispatch,
    pub cancel: bool,
}

impl KeyRuling {
    const fn pass() -> Self {
        Self {
            dispatch: Dispatch::pass(),
            cancel: false,
        }
    }
}

/// Stateful per-channel gesture classifier.
#[derive(Debug, Default)]
pub struct GestureArbiter {
    /// Time of the last accepted wheel command.
    last_wheel: Option<Instant>,
    /// Y origin of a pending single-touch gesture.
    touch_origin: Option<f64>,
}

impl GestureArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget channel state (called when ownership is released).
    pub fn reset(&mut self) {
        self.last_wheel = None;
        self.touch_origin = None;
    }

    /// Classify a wheel event.
    pub fn wheel(
        &mut self,
        ev: &WheelEvent,
        view: &EngagementView,
        config: &StepperConfig,
        now: Instant,
    ) -> Dispatch {
        let owned_outright = view.engaged && view.exclusive_wheel;

        let request = if ev.delta_y > 0.0 {
            StepRequest::Next
        } else if ev.delta_y < 0.0 {
            StepRequest::Prev
        } else {
            // No vertical component: nothing to classify.
            return if owned_outright {
                Dispatch::consumed()
            } else {
                Dispatch::pass()
            };
        };

        // Zoom gestures are never steps; under exclusive ownership the raw
        // event is still consumed.
        if ev.ctrl() {
            return if owned_outright {
                Dispatch::command(request, Verdict::IgnoredOutOfScope, Suppression::Consume)
            } else {
                Dispatch::pass()
            };
        }

        if !view.engaged {
            return Dispatch::pass();
        }

        let delta = request.delta().unwrap_or(0);
        if view.defers_to_inner
            && let Some(inner) = &ev.inner
            && inner.can_scroll(delta)
        {
            // The nested pane still has range; its native scroll consumes
            // the gesture.
            let suppression = if view.exclusive_wheel {
                Suppression::Consume
            } else {
                Suppression::Allow
            };
            return Dispatch::command(request, Verdict::IgnoredOutOfScope, suppression);
        }

        if view.locked || self.within_wheel_window(config, now) {
            return Dispatch::command(request, Verdict::IgnoredRateLimited, Suppression::Consume);
        }

        if view.out_of_range(request) {
            return if view.boundary_handoff {
                self.last_wheel = Some(now);
                Dispatch::command(request, Verdict::BoundaryExit, Suppression::Consume)
            } else {
                Dispatch::command(request, Verdict::BoundaryExit, Suppression::Allow)
            };
        }

        if view.blocked(request) {
            let suppression = if view.exclusive_wheel {
                Suppression::Consume
            } else {
                Suppression::Allow
            };
            return Dispatch::command(request, Verdict::IgnoredOutOfScope, suppression);
        }

        self.last_wheel = Some(now);
        Dispatch::command(request, Verdict::Accepted, Suppression::Consume)
    }

    /// Classify a key press.
    pub fn key(&self, ev: &KeyPress, view: &EngagementView) -> KeyRuling {
        if !view.engaged || ev.in_editable {
            return KeyRuling::pass();
        }

        let request = match ev.key {
            StepKey::Down | StepKey::PageDown | StepKey::Space => StepRequest::Next,
            StepKey::Up | StepKey::PageUp => StepRequest::Prev,
            StepKey::Home => StepRequest::First,
            StepKey::End => StepRequest::Last,
            StepKey::Escape => {
                return if view.cancelable {
                    KeyRuling {
                        dispatch: Dispatch::consumed(),
                        cancel: true,
                    }
                } else {
                    KeyRuling::pass()
                };
            }
        };

        KeyRuling {
            dispatch: self.gate_step(request, view, Suppression::Consume),
            cancel: false,
        }
    }

    /// Record a touch start.
    ///
    /// Never suppresses: touch listeners register passively and the lock
    /// window is what actually prevents movement.
    pub fn touch_start(&mut self, ev: &TouchStart, view: &EngagementView) -> Dispatch {
        if !view.engaged || ev.touches != 1 {
            self.touch_origin = None;
        } else {
            self.touch_origin = Some(ev.y);
        }
        Dispatch::pass()
    }

    /// Classify a touch end against the tracked origin.
    pub fn touch_end(
        &mut self,
        ev: &TouchEnd,
        view: &EngagementView,
        config: &StepperConfig,
    ) -> Dispatch {
        let Some(origin) = self.touch_origin.take() else {
            return Dispatch::pass();
        };

        // Engagement can lapse between the two ends of the gesture.
        if !view.engaged {
            return Dispatch::pass();
        }

        let displacement = origin - ev.y;
        if displacement.abs() < config.touch_threshold {
            return Dispatch::pass();
        }

        // Swipe up advances.
        let request = if displacement > 0.0 {
            StepRequest::Next
        } else {
            StepRequest::Prev
        };

        let delta = request.delta().unwrap_or(0);
        if view.defers_to_inner
            && let Some(inner) = &ev.inner
            && inner.can_scroll(delta)
        {
            return Dispatch::command(request, Verdict::IgnoredOutOfScope, Suppression::Allow);
        }

        let accepted_suppression = if view.consume_touch {
            Suppression::Consume
        } else {
            Suppression::Allow
        };
        self.gate_step(request, view, accepted_suppression)
    }

    /// Shared gating for key and touch: LOCKED drop, boundary detection,
    /// adjacency.
    fn gate_step(
        &self,
        request: StepRequest,
        view: &EngagementView,
        accepted_suppression: Suppression,
    ) -> Dispatch {
        if view.locked {
            return Dispatch::command(request, Verdict::IgnoredRateLimited, accepted_suppression);
        }

        if view.out_of_range(request) {
            let suppression = if view.boundary_handoff {
                Suppression::Consume
            } else {
                Suppression::Allow
            };
            return Dispatch::command(request, Verdict::BoundaryExit, suppression);
        }

        if view.blocked(request) {
            return Dispatch::command(request, Verdict::IgnoredOutOfScope, Suppression::Allow);
        }

        Dispatch::command(request, Verdict::Accepted, accepted_suppression)
    }

    fn within_wheel_window(&self, config: &StepperConfig, now: Instant) -> bool {
        self.last_wheel
            .is_some_and(|last| now.duration_since(last) < config.wheel_lock)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
