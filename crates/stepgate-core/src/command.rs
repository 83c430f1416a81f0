#![forbid(unsafe_code)]

//! Step commands and control messages.
//!
//! A gesture that survives arbitration becomes a [`StepCommand`]: a requested
//! step plus a [`Verdict`] saying what the controller did with it. The
//! verdict is part of the public surface so hosts and tests can observe why
//! a gesture was dropped without instrumenting internals.
//!
//! [`ControlMsg`] is the single inlet of the controller: raw gestures,
//! scroll/resize ticks, and every timer or animation-frame callback re-enter
//! the same synchronous dispatch as typed messages.
//!
//! # Invariants
//!
//! 1. At most one `Accepted` command is produced per settle window,
//!    regardless of the input channel.
//! 2. Deferred messages carry the epoch of the engagement that scheduled
//!    them; a stale epoch is dropped without effect.

use crate::event::InputEvent;

/// A requested step within the owned group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepRequest {
    /// Advance to the next section.
    Next,
    /// Return to the previous section.
    Prev,
    /// Jump to the first section.
    First,
    /// Jump to the last section.
    Last,
}

impl StepRequest {
    /// Signed single-step delta, if this is a relative request.
    #[must_use]
    pub const fn delta(self) -> Option<i32> {
        match self {
            Self::Next => Some(1),
            Self::Prev => Some(-1),
            Self::First | Self::Last => None,
        }
    }

    /// Target index for this request given the current index and length.
    ///
    /// Relative requests saturate at the edges only in the sense that the
    /// caller detects out-of-range before clamping; absolute requests are
    /// always in range for a non-empty group.
    #[must_use]
    pub fn target(self, index: usize, len: usize) -> isize {
        match self {
            Self::Next => index as isize + 1,
            Self::Prev => index as isize - 1,
            Self::First => 0,
            Self::Last => len as isize - 1,
        }
    }
}

/// What the controller decided about a classified gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The step executes.
    Accepted,
    /// Dropped: inside the rate-limit window or a transition is settling.
    IgnoredRateLimited,
    /// Dropped: not the controller's to handle (zoom gesture, inner
    /// scrollable still has range, below touch threshold, non-adjacent
    /// target).
    IgnoredOutOfScope,
    /// The step points past the group's edge; ownership is handed back to
    /// native scrolling.
    BoundaryExit,
}

/// A classified gesture: the requested step and its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCommand {
    pub request: StepRequest,
    pub verdict: Verdict,
}

impl StepCommand {
    #[must_use]
    pub const fn new(request: StepRequest, verdict: Verdict) -> Self {
        Self { request, verdict }
    }

    /// Whether the command executed a step.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted)
    }
}

/// What the host adapter should do with the raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suppression {
    /// Let the event propagate; native behavior proceeds.
    #[default]
    Allow,
    /// Take exclusive ownership: preventDefault and stop further
    /// propagation.
    Consume,
}

impl Suppression {
    /// Whether the raw event must be consumed.
    #[must_use]
    pub const fn consumed(self) -> bool {
        matches!(self, Self::Consume)
    }
}

/// The outcome of one dispatch: an optional classified command plus the
/// suppression directive for the raw event.
///
/// Non-gesture messages always dispatch to `{ None, Allow }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// The classified command, when the event reached classification.
    pub command: Option<StepCommand>,
    /// What to do with the raw event.
    pub suppression: Suppression,
}

impl Dispatch {
    /// No command, event propagates.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            command: None,
            suppression: Suppression::Allow,
        }
    }

    /// No command, event consumed.
    #[must_use]
    pub const fn consumed() -> Self {
        Self {
            command: None,
            suppression: Suppression::Consume,
        }
    }

    /// A classified command with an explicit suppression directive.
    #[must_use]
    pub const fn command(request: StepRequest, verdict: Verdict, suppression: Suppression) -> Self {
        Self {
            command: Some(StepCommand::new(request, verdict)),
            suppression,
        }
    }

    /// Whether this dispatch executed a step.
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.command.is_some_and(|c| c.accepted())
    }
}

/// Typed messages processed synchronously by the controller.
///
/// Timers and animation-frame callbacks are the only asynchrony in the
/// system; both re-enter dispatch as one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    /// The host scrolled or resized (adapter may throttle by frame).
    ActivationTick,

    /// A normalized gesture arrived.
    Gesture(InputEvent),

    /// The settle window of the step engaged at `epoch` elapsed.
    TransitionSettled { epoch: u64 },

    /// One animation frame passed since the release at `epoch`; layout has
    /// settled and the handoff jump may be issued.
    FrameSettled { epoch: u64 },

    /// The post-jump settle delay for the release at `epoch` elapsed; the
    /// document's snap behavior may be re-armed.
    SnapRearm { epoch: u64 },

    /// The re-capture cooldown elapsed.
    CooldownElapsed,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_deltas() {
        assert_eq!(StepRequest::Next.delta(), Some(1));
        assert_eq!(StepRequest::Prev.delta(), Some(-1));
        assert_eq!(StepRequest::First.delta(), None);
        assert_eq!(StepRequest::Last.delta(), None);
    }

    #[test]
    fn targets() {
        assert_eq!(StepRequest::Next.target(2, 5), 3);
        assert_eq!(StepRequest::Prev.target(0, 5), -1);
        assert_eq!(StepRequest::First.target(4, 5), 0);
        assert_eq!(StepRequest::Last.target(0, 5), 4);
    }

    #[test]
    fn accepted_predicate() {
        assert!(StepCommand::new(StepRequest::Next, Verdict::Accepted).accepted());
        assert!(!StepCommand::new(StepRequest::Next, Verdict::IgnoredRateLimited).accepted());
        assert!(!StepCommand::new(StepRequest::Prev, Verdict::BoundaryExit).accepted());
    }

    #[test]
    fn dispatch_constructors() {
        assert_eq!(Dispatch::pass().suppression, Suppression::Allow);
        assert_eq!(Dispatch::consumed().suppression, Suppression::Consume);
        let d = Dispatch::command(StepRequest::Next, Verdict::Accepted, Suppression::Consume);
        assert!(d.accepted());
        assert!(d.suppression.consumed());
    }

    #[test]
    fn suppression_default_allows() {
        assert_eq!(Suppression::default(), Suppression::Allow);
        assert!(!Suppression::Allow.consumed());
    }
}
