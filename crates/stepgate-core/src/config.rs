#![forbid(unsafe_code)]

//! Thresholds and timing windows for gesture arbitration.

use thiserror::Error;
use web_time::Duration;

/// Thresholds and windows for a [`Controller`](crate::controller::Controller).
///
/// The two policy constructors carry the tunings their deployments shipped
/// with; individual fields can be adjusted afterwards. [`validate`]
/// (StepperConfig::validate) rejects configurations that would wedge the
/// state machine (a zero settle budget is fine; a negative threshold is
/// not).
#[derive(Debug, Clone)]
pub struct StepperConfig {
    /// Minimum spacing between accepted wheel commands.
    pub wheel_lock: Duration,

    /// Minimum touch displacement, in pixels, to count as a swipe.
    pub touch_threshold: f64,

    /// Distance, in pixels, within which the scroll offset counts as
    /// snapped to a section top (snap-assist engagement test).
    pub snap_tolerance: f64,

    /// Maximum gap, in pixels, of non-section content allowed between two
    /// sections for a step to treat them as adjacent (snap-assist).
    pub adjacency_gap: f64,

    /// Settle window engaged after each step; further gestures are dropped
    /// until it elapses. Zero under reduced motion.
    pub settle_budget: Duration,

    /// Re-capture suppression window armed when ownership is released.
    pub exit_cooldown: Duration,

    /// Delay after the handoff jump before the document's snap behavior is
    /// re-armed.
    pub snap_rearm_delay: Duration,

    /// Fraction of the viewport that must remain visible below the top
    /// edge for capture-on-approach to fire.
    pub min_visible_fraction: f64,
}

impl StepperConfig {
    /// Tuning for the locked-stage deployment (pinned panel stack).
    #[must_use]
    pub fn locked_stage() -> Self {
        Self {
            wheel_lock: Duration::from_millis(750),
            touch_threshold: 35.0,
            snap_tolerance: 10.0,
            adjacency_gap: 5.0,
            settle_budget: Duration::from_millis(500),
            exit_cooldown: Duration::from_millis(500),
            snap_rearm_delay: Duration::from_millis(150),
            min_visible_fraction: 0.6,
        }
    }

    /// Tuning for the snap-assist deployment (free scroll with snapping).
    #[must_use]
    pub fn snap_assist() -> Self {
        Self {
            wheel_lock: Duration::from_millis(900),
            settle_budget: Duration::from_millis(650),
            ..Self::locked_stage()
        }
    }

    /// Check the configuration for values that would wedge arbitration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.touch_threshold > 0.0) {
            return Err(ConfigError::NonPositiveThreshold("touch_threshold"));
        }
        if !(self.snap_tolerance > 0.0) {
            return Err(ConfigError::NonPositiveThreshold("snap_tolerance"));
        }
        if self.adjacency_gap < 0.0 || !self.adjacency_gap.is_finite() {
            return Err(ConfigError::NonPositiveThreshold("adjacency_gap"));
        }
        if !(self.min_visible_fraction > 0.0 && self.min_visible_fraction <= 1.0) {
            return Err(ConfigError::FractionOutOfRange(self.min_visible_fraction));
        }
        if self.wheel_lock.is_zero() {
            return Err(ConfigError::ZeroWindow("wheel_lock"));
        }
        if self.exit_cooldown.is_zero() {
            return Err(ConfigError::ZeroWindow("exit_cooldown"));
        }
        Ok(())
    }
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self::locked_stage()
    }
}

/// A configuration value that would wedge the state machine.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A pixel threshold that must be positive (or finite) is not.
    #[error("{0} must be a positive, finite pixel distance")]
    NonPositiveThreshold(&'static str),

    /// The visible-fraction capture parameter is outside (0, 1].
    #[error("min_visible_fraction must be within (0, 1], got {0}")]
    FractionOutOfRange(f64),

    /// A timing window that gates re-entry is zero.
    #[error("{0} must be non-zero")]
    ZeroWindow(&'static str),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
