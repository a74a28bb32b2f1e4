//! Repair state types and transitions.
//!
//! This module contains the core state machine types for a repair session:
//! - [`RepairState`] - Current state of the session
//! - [`FailureReason`] - Why a session was escalated to a human
//! - [`AttemptRecord`] - Audit record of a single repair attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Repair State
// ============================================================================

/// Current state of a repair session in the state machine.
///
/// # State Transitions
///
/// - classification -> `ChangeRequested`: an auto-fixable error was identified
/// - classification -> `NeedsHuman`: infrastructure or unclassifiable error
/// - `ChangeRequested` -> `Success`: an attempt's validation passed
/// - `ChangeRequested` -> `FailedLimit`: the attempt counter reached the limit
/// - `ChangeRequested` -> `ChangeRequested`: attempt failed, budget remains
/// - `ChangeRequested` -> `NeedsHuman`: collaborator outage or cancellation
///
/// `Success` and `FailedLimit` are terminal; nothing transitions out of them.
/// `NeedsHuman` has no outgoing transitions either - the session is handed to
/// a human and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairState {
    /// An auto-fixable error was identified; a repair attempt should be made
    ChangeRequested,
    /// Error requires manual intervention
    NeedsHuman,
    /// A repair attempt's validation step passed
    Success,
    /// The attempt counter reached the limit without success
    FailedLimit,
}

impl fmt::Display for RepairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairState::ChangeRequested => write!(f, "Change Requested"),
            RepairState::NeedsHuman => write!(f, "Needs Human"),
            RepairState::Success => write!(f, "Success"),
            RepairState::FailedLimit => write!(f, "Failed Limit"),
        }
    }
}

impl RepairState {
    /// Check if this state can transition to the target state.
    ///
    /// # Example
    ///
    /// ```
    /// use jarvis_repair::session::state::RepairState;
    ///
    /// assert!(RepairState::ChangeRequested.can_transition_to(RepairState::Success));
    /// assert!(!RepairState::Success.can_transition_to(RepairState::ChangeRequested));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: RepairState) -> bool {
        use RepairState::*;
        matches!(
            (self, target),
            (ChangeRequested, Success)
                | (ChangeRequested, FailedLimit)
                | (ChangeRequested, ChangeRequested)
                | (ChangeRequested, NeedsHuman)
        )
    }

    /// Check if this state represents a terminal outcome.
    ///
    /// `NeedsHuman` is not counted here: it closes the session for repair
    /// but represents a handoff, not a resolved outcome.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RepairState::Success | RepairState::FailedLimit)
    }

    /// Check if repair work can still happen in this state.
    #[must_use]
    pub fn is_repairable(&self) -> bool {
        matches!(self, RepairState::ChangeRequested)
    }
}

// ============================================================================
// Failure Reason
// ============================================================================

/// Reason a session entered [`RepairState::NeedsHuman`].
///
/// Attached when escalating so a reviewer knows whether to look at the
/// repository or at the infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Transient or environmental failure (timeouts, connection errors,
    /// rate limits, server errors)
    InfrastructureFailure,
    /// Error text did not match any known pattern
    UnidentifiedError,
    /// The loop was cancelled externally between attempts
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InfrastructureFailure => write!(f, "infrastructure failure"),
            FailureReason::UnidentifiedError => write!(f, "unidentified error"),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ============================================================================
// Attempt Record
// ============================================================================

/// Record of a single repair attempt.
///
/// Provides the per-attempt audit trail surfaced in the session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Attempt number (1-indexed)
    pub number: u32,
    /// Whether the attempt's validation step passed
    pub succeeded: bool,
    /// When the attempt result was recorded
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Create a new attempt record stamped with the current time.
    #[must_use]
    pub fn new(number: u32, succeeded: bool) -> Self {
        Self {
            number,
            succeeded,
            recorded_at: Utc::now(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
