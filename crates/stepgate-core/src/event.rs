#![forbid(unsafe_code)]

//! Normalized gesture input.
//!
//! This module defines the canonical view the controller takes of raw host
//! input. The host adapter translates its native event objects (DOM wheel,
//! keydown, touch) into these types before dispatch; the controller never
//! sees a concrete browser event. All types derive `Clone` and `PartialEq`
//! for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Pixel quantities are `f64` document pixels, matching host layout reads.
//! - Per-event context the controller cannot compute itself — whether the
//!   key target is an editable control, the metrics of the nearest marked
//!   nested-scrollable under the pointer — is resolved by the adapter and
//!   carried on the event.
//! - The controller answers with a [`Suppression`](crate::command::Suppression)
//!   directive rather than touching the raw event; the adapter maps
//!   `Consume` to preventDefault + stopImmediatePropagation.

use bitflags::bitflags;

/// Canonical gesture input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A wheel (scroll) gesture.
    Wheel(WheelEvent),

    /// A key press.
    Key(KeyPress),

    /// A touch sequence began.
    TouchStart(TouchStart),

    /// A touch sequence ended.
    TouchEnd(TouchEnd),
}

impl InputEvent {
    /// The input channel this event arrived on.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        match self {
            Self::Wheel(_) => Channel::Wheel,
            Self::Key(_) => Channel::Key,
            Self::TouchStart(_) | Self::TouchEnd(_) => Channel::Touch,
        }
    }
}

/// Input channels arbitrated by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Wheel,
    Key,
    Touch,
}

/// A wheel gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelEvent {
    /// Vertical scroll delta in pixels; positive scrolls down.
    pub delta_y: f64,

    /// Modifier keys held during the gesture.
    pub modifiers: Modifiers,

    /// Metrics of the nearest marked nested-scrollable under the pointer,
    /// if any.
    pub inner: Option<InnerScroll>,
}

impl WheelEvent {
    /// Create a wheel event with no modifiers and no inner scrollable.
    #[must_use]
    pub const fn new(delta_y: f64) -> Self {
        Self {
            delta_y,
            modifiers: Modifiers::NONE,
            inner: None,
        }
    }

    /// Attach modifier keys.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Attach inner-scrollable metrics.
    #[must_use]
    pub const fn with_inner(mut self, inner: InnerScroll) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Whether the Ctrl modifier is held (browser zoom gesture).
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The recognized key.
    pub key: StepKey,

    /// Modifier keys held during the press.
    pub modifiers: Modifiers,

    /// Whether focus is in an editable control (input, textarea, select,
    /// content-editable). Resolved by the host adapter.
    pub in_editable: bool,
}

impl KeyPress {
    /// Create a key press outside any editable control.
    #[must_use]
    pub const fn new(key: StepKey) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            in_editable: false,
        }
    }

    /// Mark the press as targeting an editable control.
    #[must_use]
    pub const fn editable(mut self) -> Self {
        self.in_editable = true;
        self
    }
}

/// Keys the arbiter recognizes.
///
/// The host adapter maps its native key identifiers to these; anything else
/// is simply not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKey {
    /// Down arrow.
    Down,
    /// Up arrow.
    Up,
    /// Page Down.
    PageDown,
    /// Page Up.
    PageUp,
    /// Space bar.
    Space,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Escape key.
    Escape,
}

/// A touch sequence began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchStart {
    /// Viewport Y coordinate of the touch point.
    pub y: f64,

    /// Number of simultaneous touch points.
    pub touches: u8,
}

impl TouchStart {
    /// Create a single-touch start.
    #[must_use]
    pub const fn new(y: f64) -> Self {
        Self { y, touches: 1 }
    }
}

/// A touch sequence ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEnd {
    /// Viewport Y coordinate where the touch lifted.
    pub y: f64,

    /// Metrics of the nearest marked nested-scrollable under the touch
    /// point, if any.
    pub inner: Option<InnerScroll>,
}

impl TouchEnd {
    /// Create a touch end with no inner scrollable.
    #[must_use]
    pub const fn new(y: f64) -> Self {
        Self { y, inner: None }
    }

    /// Attach inner-scrollable metrics.
    #[must_use]
    pub const fn with_inner(mut self, inner: InnerScroll) -> Self {
        self.inner = Some(inner);
        self
    }
}

/// Scroll metrics of a nested independently-scrollable region.
///
/// A nested scrollable must exhaust its own range before the group's step
/// logic engages; these three numbers are all that decision needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnerScroll {
    /// Current scroll offset from the top of the region.
    pub scroll_top: f64,

    /// Visible height of the region.
    pub client_height: f64,

    /// Total scrollable content height.
    pub scroll_height: f64,
}

impl InnerScroll {
    /// Create inner-scroll metrics.
    #[must_use]
    pub const fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    /// Whether the region can still scroll by `delta` (+1 down, −1 up).
    ///
    /// Mirrors native overflow behavior: one sub-pixel of slack is allowed
    /// at the bottom edge so rounding never traps the gesture.
    #[must_use]
    pub fn can_scroll(&self, delta: i32) -> bool {
        if delta > 0 {
            self.scroll_top + self.client_height < self.scroll_height - 1.0
        } else if delta < 0 {
            self.scroll_top > 0.0
        } else {
            false
        }
    }
}

bitflags! {
    /// Modifier keys that can be held during a gesture.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
