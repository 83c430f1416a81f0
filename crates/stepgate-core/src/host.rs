#![forbid(unsafe_code)]

//! Host-facing traits.
//!
//! The controller never touches a real document; it speaks to these two
//! traits. A browser adapter implements [`HostDocument`] over the DOM and
//! [`Scheduler`] over `setTimeout`/`requestAnimationFrame`; the testkit
//! implements both in memory. Groups and sections are addressed by index in
//! document order — element identity stays on the adapter's side of the
//! seam.
//!
//! # Contract
//!
//! - Geometry reads return the document's *current* layout; the controller
//!   decides when a value may be cached (it snapshots exactly once, before
//!   locking scroll).
//! - Effects are applied synchronously. Scheduled messages must come back
//!   through [`Controller::dispatch`](crate::controller::Controller::dispatch)
//!   and must not fire re-entrantly from inside an effect.

use web_time::Duration;

use crate::command::ControlMsg;
use crate::geometry::GroupSpan;

/// Visual flag of a panel within a locked stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    /// Not shown.
    #[default]
    Hidden,
    /// The section currently presented.
    Active,
    /// The section just stepped away from (keeps exit styling).
    Previous,
}

/// How a programmatic scroll should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Animated scroll.
    Smooth,
    /// Immediate jump.
    Instant,
}

/// The document surface the controller drives.
pub trait HostDocument {
    /// Current vertical scroll offset in document pixels.
    fn scroll_y(&self) -> f64;

    /// Viewport height in pixels.
    fn viewport_height(&self) -> f64;

    /// Number of stepping groups in the document.
    fn group_count(&self) -> usize;

    /// Number of sections inside `group`.
    fn section_count(&self, group: usize) -> usize;

    /// Document-relative extent of `group`, read fresh.
    fn group_span(&self, group: usize) -> GroupSpan;

    /// Document-relative top of a section, read fresh.
    fn section_top(&self, group: usize, section: usize) -> f64;

    /// Rendered height of a section, read fresh.
    fn section_height(&self, group: usize, section: usize) -> f64;

    /// Whether the user prefers reduced motion.
    fn prefers_reduced_motion(&self) -> bool;

    /// Set a panel's visual flag.
    fn set_panel_state(&mut self, group: usize, section: usize, state: PanelState);

    /// Freeze body positioning at the current offset.
    fn lock_scroll(&mut self);

    /// Restore normal body positioning.
    fn unlock_scroll(&mut self);

    /// Enable or disable the document's CSS snap behavior.
    fn set_snap_enabled(&mut self, enabled: bool);

    /// Move the scroll offset.
    fn scroll_to(&mut self, y: f64, behavior: ScrollBehavior);
}

/// Deferred delivery of control messages.
///
/// Both primitives feed the message back into the same synchronous
/// dispatch; they carry no payload beyond the message and never block.
pub trait Scheduler {
    /// Deliver `msg` after `delay`.
    fn schedule(&mut self, delay: Duration, msg: ControlMsg);

    /// Deliver `msg` on the next animation frame, after the host has
    /// applied preceding style changes.
    fn defer_frame(&mut self, msg: ControlMsg);
}
