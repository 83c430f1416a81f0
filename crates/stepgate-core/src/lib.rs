#![forbid(unsafe_code)]

//! Core: gesture normalization, arbitration, and the step state machine.
//!
//! # Role in Stepgate
//! `stepgate-core` is the whole decision layer of a gesture-gated section
//! stepper: it turns discrete scroll, key, and touch gestures into exactly
//! one step between full-viewport sections, suppressing native scrolling
//! while a group is held and handing control back cleanly at the edges.
//!
//! # Primary responsibilities
//! - **Events**: canonical gesture input ([`event`]) and the typed control
//!   messages every timer and frame callback re-enters through ([`command`]).
//! - **Arbitration**: per-channel classification with rate limiting, settle
//!   locking, and nested-scrollable deference ([`arbiter`]).
//! - **Position**: the single authority for ownership, index, lock, and
//!   cooldown ([`state`]), plus pure geometry ([`geometry`]).
//! - **Policies**: the two activation/transition philosophies, pinned stage
//!   and snap assist ([`policy`]).
//! - **Controller**: the synchronous dispatch loop tying it together
//!   ([`controller`]).
//!
//! # How it fits in the system
//! A host adapter owns the real document: it feeds normalized events and
//! scheduled messages into [`Controller::dispatch`](controller::Controller::dispatch)
//! and applies the returned suppression directive to the raw event. The
//! adapter implements the two traits in [`host`]; nothing in this crate
//! touches a concrete DOM.

pub mod arbiter;
pub mod command;
pub mod config;
pub mod controller;
pub mod event;
pub mod geometry;
pub mod host;
pub mod policy;
pub mod state;

#[cfg(feature = "test-helpers")]
pub mod testkit;

pub use command::{ControlMsg, Dispatch, StepCommand, StepRequest, Suppression, Verdict};
pub use config::{ConfigError, StepperConfig};
pub use controller::Controller;
pub use event::{InputEvent, InnerScroll, KeyPress, Modifiers, StepKey, TouchEnd, TouchStart, WheelEvent};
pub use host::{HostDocument, PanelState, Scheduler, ScrollBehavior};
pub use policy::{Activation, LockedStagePolicy, SnapAssistPolicy, StagePolicy};
pub use state::{ActiveState, Cursor, Phase, PositionState};
