//! Session outcome reporting.
//!
//! A [`SessionReport`] is the artifact handed to the reporting layer that
//! sits outside this crate - the layer that opens a pull request on
//! success or an escalation issue when a human is needed. The wire format
//! is plain JSON via serde; consumers only rely on the fields.

use serde::{Deserialize, Serialize};

use crate::classify::ErrorCategory;
use crate::session::state::{AttemptRecord, FailureReason, RepairState};

/// Outcome record for a closed repair session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier, for correlating logs.
    pub session_id: String,
    /// State the session closed in.
    pub final_state: RepairState,
    /// Number of repair attempts made.
    pub attempt_count: u32,
    /// Escalation reason, when the session needs a human.
    pub failure_reason: Option<FailureReason>,
    /// Category assigned at classification.
    pub category: ErrorCategory,
    /// Per-attempt audit trail.
    pub attempts: Vec<AttemptRecord>,
}

impl SessionReport {
    /// Whether the outcome calls for human escalation.
    #[must_use]
    pub fn needs_escalation(&self) -> bool {
        matches!(
            self.final_state,
            RepairState::NeedsHuman | RepairState::FailedLimit
        )
    }

    /// One-line summary suitable for logging.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "session {}: {} after {} attempt(s)",
            self.session_id, self.final_state, self.attempt_count
        )];
        if let Some(reason) = self.failure_reason {
            parts.push(format!("({})", reason));
        }
        parts.join(" ")
    }
}
