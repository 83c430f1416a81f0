#![forbid(unsafe_code)]

//! Stage policies: the two activation/transition philosophies.
//!
//! [`LockedStagePolicy`] pins the page while a group is held and swaps
//! panel flags in place; ownership is persistent from capture to boundary
//! exit. [`SnapAssistPolicy`] leaves native scrolling alive and only claims
//! a gesture when the viewport is already snapped to a section, stepping by
//! animating the scroll offset. Neither is canonical — the host picks one
//! at construction.
//!
//! The controller owns the shared state machine; a policy contributes the
//! decision points that genuinely differ: how ownership is gained, which
//! raw events are owned outright, what a step does to the document, and
//! whether edge exits jump or defer to native scrolling.

use std::fmt;

use web_time::Duration;

use crate::config::StepperConfig;
use crate::host::{HostDocument, PanelState, ScrollBehavior};

/// How a policy gains the right to intercept gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Persistent ownership, taken when the group's top edge reaches the
    /// viewport top with enough of the group still visible.
    CaptureOnApproach,
    /// Per-gesture test: act only while the scroll offset sits within the
    /// snap tolerance of some section top.
    CaptureOnSnap,
}

/// Behavior contributed by a deployment's activation/transition philosophy.
pub trait StagePolicy: fmt::Debug {
    /// How ownership is gained.
    fn activation(&self) -> Activation;

    /// Wheel input is owned outright while engaged; raw events are
    /// consumed even when the command is dropped.
    fn exclusive_wheel(&self) -> bool;

    /// Nested scrollables must exhaust their range before the group steps.
    fn defers_to_inner_scroll(&self) -> bool;

    /// Edge exits hand off with a computed jump (vs declining so native
    /// scrolling takes over).
    fn boundary_handoff(&self) -> bool;

    /// Escape cancels back to the entry offset.
    fn cancelable(&self) -> bool;

    /// Accepted touch gestures consume the raw event.
    fn consumes_touch(&self) -> bool;

    /// Host effects when a group is acquired.
    fn on_acquire(&self, host: &mut dyn HostDocument);

    /// Host effects when ownership is released, before the deferred jump.
    /// Must leave the document ready for a programmatic scroll.
    fn on_release(&self, host: &mut dyn HostDocument);

    /// Present a step from `from` to `to` within `group` and return the
    /// settle budget for the LOCKED window (zero means no lock).
    fn apply_step(
        &self,
        host: &mut dyn HostDocument,
        group: usize,
        from: usize,
        to: usize,
        len: usize,
        config: &StepperConfig,
    ) -> Duration;
}

fn settle_budget(host: &dyn HostDocument, config: &StepperConfig) -> Duration {
    if host.prefers_reduced_motion() {
        Duration::ZERO
    } else {
        config.settle_budget
    }
}

/// Pinned stage: the page is frozen while the group is held and steps swap
/// panel visual flags in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct LockedStagePolicy;

impl StagePolicy for LockedStagePolicy {
    fn activation(&self) -> Activation {
        Activation::CaptureOnApproach
    }

    fn exclusive_wheel(&self) -> bool {
        true
    }

    fn defers_to_inner_scroll(&self) -> bool {
        false
    }

    fn boundary_handoff(&self) -> bool {
        true
    }

    fn cancelable(&self) -> bool {
        true
    }

    fn consumes_touch(&self) -> bool {
        true
    }

    fn on_acquire(&self, host: &mut dyn HostDocument) {
        // Snap must be off before the body is frozen, or the host's snap
        // machinery fights the fixed positioning.
        host.set_snap_enabled(false);
        host.lock_scroll();
    }

    fn on_release(&self, host: &mut dyn HostDocument) {
        // Same ordering on the way out: snap stays off until the jump has
        // settled; the controller re-arms it afterwards.
        host.set_snap_enabled(false);
        host.unlock_scroll();
    }

    fn apply_step(
        &self,
        host: &mut dyn HostDocument,
        group: usize,
        from: usize,
        to: usize,
        len: usize,
        config: &StepperConfig,
    ) -> Duration {
        for section in 0..len {
            host.set_panel_state(group, section, PanelState::Hidden);
        }
        if from != to {
            host.set_panel_state(group, from, PanelState::Previous);
        }
        host.set_panel_state(group, to, PanelState::Active);
        settle_budget(host, config)
    }
}

/// Snap assist: native scrolling stays alive; steps animate the scroll
/// offset to the target section's top.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapAssistPolicy;

impl StagePolicy for SnapAssistPolicy {
    fn activation(&self) -> Activation {
        Activation::CaptureOnSnap
    }

    fn exclusive_wheel(&self) -> bool {
        false
    }

    fn defers_to_inner_scroll(&self) -> bool {
        true
    }

    fn boundary_handoff(&self) -> bool {
        false
    }

    fn cancelable(&self) -> bool {
        false
    }

    fn consumes_touch(&self) -> bool {
        false
    }

    fn on_acquire(&self, _host: &mut dyn HostDocument) {}

    fn on_release(&self, _host: &mut dyn HostDocument) {}

    fn apply_step(
        &self,
        host: &mut dyn HostDocument,
        group: usize,
        _from: usize,
        to: usize,
        _len: usize,
        config: &StepperConfig,
    ) -> Duration {
        let top = host.section_top(group, to);
        let behavior = if host.prefers_reduced_motion() {
            ScrollBehavior::Instant
        } else {
            ScrollBehavior::Smooth
        };
        host.scroll_to(top, behavior);
        settle_budget(host, config)
    }
}
