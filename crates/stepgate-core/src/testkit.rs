#![forbid(unsafe_code)]

//! In-memory host fixtures for tests and the scenario harness.
//!
//! [`FakeDocument`] is a deterministic [`HostDocument`]: geometry comes from
//! declared group layouts, programmatic scrolls settle immediately, and
//! every effect is recorded so tests can assert on ordering and counts.
//! [`FakeScheduler`] collects deferred messages instead of timing them; the
//! caller decides when (and whether) to feed them back into dispatch.

use web_time::Duration;

use crate::command::ControlMsg;
use crate::event::{InputEvent, KeyPress, StepKey, TouchEnd, TouchStart, WheelEvent};
use crate::geometry::GroupSpan;
use crate::host::{HostDocument, PanelState, Scheduler, ScrollBehavior};

/// Declared layout of one section: absolute top and rendered height.
#[derive(Debug, Clone, Copy)]
pub struct FakeSection {
    pub top: f64,
    pub height: f64,
}

/// Declared layout of one group.
///
/// Sections carry absolute document offsets so layouts with non-section
/// content between sections can be declared directly.
#[derive(Debug, Clone, Default)]
pub struct FakeGroup {
    pub sections: Vec<FakeSection>,
}

impl FakeGroup {
    /// A group of `count` contiguous sections of equal `height` starting
    /// at `top`.
    #[must_use]
    pub fn uniform(top: f64, count: usize, height: f64) -> Self {
        let sections = (0..count)
            .map(|i| FakeSection {
                top: top + i as f64 * height,
                height,
            })
            .collect();
        Self { sections }
    }

    /// Append a section at an explicit offset.
    #[must_use]
    pub fn section_at(mut self, top: f64, height: f64) -> Self {
        self.sections.push(FakeSection { top, height });
        self
    }

    fn span(&self) -> GroupSpan {
        let Some(first) = self.sections.first() else {
            return GroupSpan::default();
        };
        let bottom = self
            .sections
            .iter()
            .map(|s| s.top + s.height)
            .fold(f64::MIN, f64::max);
        GroupSpan::new(first.top, bottom - first.top)
    }
}

/// Deterministic in-memory document.
#[derive(Debug)]
pub struct FakeDocument {
    pub scroll: f64,
    pub viewport: f64,
    pub reduced_motion: bool,
    pub groups: Vec<FakeGroup>,
    /// Panel flags per group/section.
    pub panels: Vec<Vec<PanelState>>,
    pub scroll_locked: bool,
    pub snap_enabled: bool,
    /// Every programmatic scroll, in order.
    pub jumps: Vec<(f64, ScrollBehavior)>,
    /// Every snap toggle, in order.
    pub snap_changes: Vec<bool>,
    pub lock_calls: usize,
    pub unlock_calls: usize,
}

impl FakeDocument {
    /// An empty document with the given viewport height.
    #[must_use]
    pub fn new(viewport: f64) -> Self {
        Self {
            scroll: 0.0,
            viewport,
            reduced_motion: false,
            groups: Vec::new(),
            panels: Vec::new(),
            scroll_locked: false,
            snap_enabled: true,
            jumps: Vec::new(),
            snap_changes: Vec::new(),
            lock_calls: 0,
            unlock_calls: 0,
        }
    }

    /// Append a group.
    #[must_use]
    pub fn with_group(mut self, group: FakeGroup) -> Self {
        self.panels
            .push(vec![PanelState::Hidden; group.sections.len()]);
        self.groups.push(group);
        self
    }

    /// Current flag of a panel.
    #[must_use]
    pub fn panel(&self, group: usize, section: usize) -> PanelState {
        self.panels[group][section]
    }

    /// The single section index currently flagged active in `group`, if
    /// exactly one is.
    #[must_use]
    pub fn active_panel(&self, group: usize) -> Option<usize> {
        let mut found = None;
        for (i, state) in self.panels[group].iter().enumerate() {
            if *state == PanelState::Active {
                if found.is_some() {
                    return None;
                }
                found = Some(i);
            }
        }
        found
    }
}

impl HostDocument for FakeDocument {
    fn scroll_y(&self) -> f64 {
        self.scroll
    }

    fn viewport_height(&self) -> f64 {
        self.viewport
    }

    fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn section_count(&self, group: usize) -> usize {
        self.groups[group].sections.len()
    }

    fn group_span(&self, group: usize) -> GroupSpan {
        self.groups[group].span()
    }

    fn section_top(&self, group: usize, section: usize) -> f64 {
        self.groups[group].sections[section].top
    }

    fn section_height(&self, group: usize, section: usize) -> f64 {
        self.groups[group].sections[section].height
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn set_panel_state(&mut self, group: usize, section: usize, state: PanelState) {
        self.panels[group][section] = state;
    }

    fn lock_scroll(&mut self) {
        self.scroll_locked = true;
        self.lock_calls += 1;
    }

    fn unlock_scroll(&mut self) {
        self.scroll_locked = false;
        self.unlock_calls += 1;
    }

    fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
        self.snap_changes.push(enabled);
    }

    fn scroll_to(&mut self, y: f64, behavior: ScrollBehavior) {
        // Both behaviors settle immediately in the fake.
        self.scroll = y;
        self.jumps.push((y, behavior));
    }
}

/// Scheduler that records deferred messages for manual replay.
#[derive(Debug, Default)]
pub struct FakeScheduler {
    pub timers: Vec<(Duration, ControlMsg)>,
    pub frames: Vec<ControlMsg>,
}

impl FakeScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain pending frame callbacks.
    pub fn take_frames(&mut self) -> Vec<ControlMsg> {
        std::mem::take(&mut self.frames)
    }

    /// Drain pending timers.
    pub fn take_timers(&mut self) -> Vec<(Duration, ControlMsg)> {
        std::mem::take(&mut self.timers)
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, delay: Duration, msg: ControlMsg) {
        self.timers.push((delay, msg));
    }

    fn defer_frame(&mut self, msg: ControlMsg) {
        self.frames.push(msg);
    }
}

// ---------------------------------------------------------------------------
// Event shorthand
// ---------------------------------------------------------------------------

/// A downward wheel tick.
#[must_use]
pub fn wheel_down() -> ControlMsg {
    ControlMsg::Gesture(InputEvent::Wheel(WheelEvent::new(53.0)))
}

/// An upward wheel tick.
#[must_use]
pub fn wheel_up() -> ControlMsg {
    ControlMsg::Gesture(InputEvent::Wheel(WheelEvent::new(-53.0)))
}

/// A key press outside any editable control.
#[must_use]
pub fn key(key: StepKey) -> ControlMsg {
    ControlMsg::Gesture(InputEvent::Key(KeyPress::new(key)))
}

/// A single-finger swipe, start to end.
#[must_use]
pub fn swipe(from_y: f64, to_y: f64) -> [ControlMsg; 2] {
    [
        ControlMsg::Gesture(InputEvent::TouchStart(TouchStart::new(from_y))),
        ControlMsg::Gesture(InputEvent::TouchEnd(TouchEnd::new(to_y))),
    ]
}
