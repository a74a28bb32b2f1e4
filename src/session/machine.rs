//! The bounded repair session state machine.
//!
//! [`RepairSession`] is pure bookkeeping: it holds the current state, the
//! attempt counter, and the limit, and enforces the bounded-retry
//! invariant. It never calls out to fixers or validators - that is the
//! driver's job. Misuse of the API (recording an attempt when none was
//! permitted, classifying twice) fails loudly with a protocol-violation
//! error; reaching the limit or needing a human are ordinary states,
//! never errors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{Classification, ErrorCategory};
use crate::error::{RepairError, Result};
use crate::report::SessionReport;
use crate::session::state::{AttemptRecord, FailureReason, RepairState};

/// Maximum repair attempts per session.
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 3;

/// A single failure's repair session.
///
/// Created fresh per failure-handling invocation and discarded after it
/// closes; never reused across unrelated failures. An unclassified
/// session reads as `NeedsHuman`/`UnidentifiedError` until
/// [`apply_classification`](Self::apply_classification) seeds it.
///
/// # Example
///
/// ```
/// use jarvis_repair::classify::identify_error;
/// use jarvis_repair::session::machine::RepairSession;
/// use jarvis_repair::session::state::RepairState;
///
/// let mut session = RepairSession::new();
/// session.apply_classification(&identify_error("AssertionError: boom", None, None))?;
///
/// assert!(session.can_attempt_repair());
/// let state = session.record_attempt_result(true)?;
/// assert_eq!(state, RepairState::Success);
/// # Ok::<(), jarvis_repair::error::RepairError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairSession {
    /// Unique session identifier
    id: String,
    /// Current state; seeded by classification
    state: RepairState,
    /// Guard against double classification
    classified: bool,
    /// Repair attempts made so far; monotonically increasing
    counter: u32,
    /// Maximum attempts; immutable for the session's lifetime
    limit: u32,
    /// Escalation reason, set only when state is `NeedsHuman`
    failure_reason: Option<FailureReason>,
    /// Category assigned at classification
    category: Option<ErrorCategory>,
    /// Per-attempt audit trail
    attempts: Vec<AttemptRecord>,
}

impl RepairSession {
    /// Create a new session with the default attempt limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: RepairState::NeedsHuman,
            classified: false,
            counter: 0,
            limit: DEFAULT_ATTEMPT_LIMIT,
            failure_reason: Some(FailureReason::UnidentifiedError),
            category: None,
            attempts: Vec::new(),
        }
    }

    /// Set a custom attempt limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Unique session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RepairState {
        self.state
    }

    /// Repair attempts made so far.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Configured attempt limit.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Escalation reason, if the session needs a human.
    #[must_use]
    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }

    /// Category assigned at classification.
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        self.category
    }

    /// Per-attempt audit trail.
    #[must_use]
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// Check if the session is closed: a terminal outcome was reached or
    /// the session was classified/escalated for human handoff.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.is_terminal() || (self.classified && self.state == RepairState::NeedsHuman)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Seed the session from a classification result.
    ///
    /// Must be called exactly once, before the repair loop starts.
    ///
    /// # Errors
    ///
    /// Returns [`RepairError::AlreadyClassified`] on a second call; a
    /// session is classified exactly once at creation.
    pub fn apply_classification(&mut self, classification: &Classification) -> Result<RepairState> {
        if self.classified {
            return Err(RepairError::AlreadyClassified {
                session: self.id.clone(),
                state: self.state,
            });
        }

        self.classified = true;
        self.category = Some(classification.category);
        self.state = classification.state;
        self.failure_reason = classification.failure_reason;
        Ok(self.state)
    }

    /// Check whether a repair attempt may be made.
    ///
    /// Pure query, no mutation: true iff the state is `ChangeRequested`
    /// and the attempt budget is not exhausted.
    #[must_use]
    pub fn can_attempt_repair(&self) -> bool {
        self.state.is_repairable() && self.counter < self.limit
    }

    /// Record the outcome of an externally-made repair attempt.
    ///
    /// Increments the counter first, then resolves the new state:
    /// `Success` if validation passed, `FailedLimit` if the counter
    /// reached the limit, otherwise the session stays `ChangeRequested`
    /// and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns a protocol-violation error if called when
    /// [`can_attempt_repair`](Self::can_attempt_repair) is false - the
    /// attempt should never have been made.
    pub fn record_attempt_result(&mut self, success: bool) -> Result<RepairState> {
        if !self.can_attempt_repair() {
            if self.state.is_terminal() {
                return Err(RepairError::TerminalState {
                    session: self.id.clone(),
                    state: self.state,
                });
            }
            return Err(RepairError::NotAttemptable {
                session: self.id.clone(),
                state: self.state,
                counter: self.counter,
                limit: self.limit,
            });
        }

        self.counter += 1;
        self.attempts.push(AttemptRecord::new(self.counter, success));

        if success {
            self.state = RepairState::Success;
        } else if self.counter >= self.limit {
            self.state = RepairState::FailedLimit;
        }
        Ok(self.state)
    }

    /// Escalate the session for human handoff.
    ///
    /// Used by the driver when a collaborator itself fails to execute or
    /// the loop is cancelled - conditions that must not consume an
    /// attempt. Does not touch the counter.
    ///
    /// # Errors
    ///
    /// Returns [`RepairError::TerminalState`] if the session already
    /// reached a terminal outcome.
    pub fn escalate(&mut self, reason: FailureReason) -> Result<RepairState> {
        if self.state.is_terminal() {
            return Err(RepairError::TerminalState {
                session: self.id.clone(),
                state: self.state,
            });
        }

        self.state = RepairState::NeedsHuman;
        self.failure_reason = Some(reason);
        Ok(self.state)
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Produce the session outcome report for the reporting layer.
    #[must_use]
    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.id.clone(),
            final_state: self.state,
            attempt_count: self.counter,
            failure_reason: self.failure_reason,
            category: self.category.unwrap_or(ErrorCategory::Unknown),
            attempts: self.attempts.clone(),
        }
    }
}

impl Default for RepairSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
