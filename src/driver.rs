//! Repair attempt driver.
//!
//! The driver owns the orchestration the state machine deliberately does
//! not: it classifies the incoming failure signal, seeds a fresh
//! [`RepairSession`], and loops - propose a fix, run validation, record
//! the result - until the session closes.
//!
//! # Architecture
//!
//! ```text
//! ErrorSignal ──> ErrorClassifier ──> RepairSession
//!                                          │
//!                              ┌───────────┴───────────┐
//!                              v                       │
//!                        FixProvider ──> Validator ────┘
//!                       (propose_fix)    (validate)  record_attempt_result
//! ```
//!
//! Collaborator failures - the fixer or validator itself erroring, as
//! opposed to validation running and reporting failure - are recovered
//! locally: the session escalates with an infrastructure reason and no
//! attempt is consumed, so a tooling outage never eats a retry slot.
//! Cancellation is checked between attempts only; a fix or validation
//! call in flight is awaited to completion.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::classify::{ErrorCategory, ErrorClassifier, ErrorSignal};
use crate::error::Result;
use crate::report::SessionReport;
use crate::session::machine::{RepairSession, DEFAULT_ATTEMPT_LIMIT};
use crate::session::state::FailureReason;
use crate::store::AttemptStore;

// ============================================================================
// Capability Traits
// ============================================================================

/// Context handed to the fix provider for one attempt.
#[derive(Debug, Clone)]
pub struct FixContext {
    /// Original error text being repaired.
    pub error_text: String,
    /// Category assigned at classification.
    pub category: ErrorCategory,
    /// Attempt number this fix is for (1-indexed).
    pub attempt: u32,
    /// Failure detail from the previous attempt's validation, if any.
    pub previous_failure: Option<String>,
}

/// A proposed code fix.
#[derive(Debug, Clone)]
pub struct FixProposal {
    /// Short description of the change.
    pub summary: String,
    /// Files the fix touched.
    pub files_changed: Vec<String>,
}

impl FixProposal {
    /// Create a proposal with a summary and no file list.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            files_changed: Vec::new(),
        }
    }
}

/// Result of running validation after a fix attempt.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether validation passed.
    pub passed: bool,
    /// Failure messages, for logging.
    pub failures: Vec<String>,
    /// Raw output from the validation run.
    pub output: String,
}

impl ValidationReport {
    /// Create a passing report.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
            output: String::new(),
        }
    }

    /// Create a failing report with failure messages.
    #[must_use]
    pub fn fail_with_failures(failures: Vec<String>) -> Self {
        Self {
            passed: false,
            failures,
            output: String::new(),
        }
    }

    /// First failure message, falling back to raw output.
    #[must_use]
    pub fn failure_detail(&self) -> Option<String> {
        if self.passed {
            return None;
        }
        self.failures
            .first()
            .cloned()
            .or_else(|| (!self.output.is_empty()).then(|| self.output.clone()))
    }
}

/// Abstraction for the external code-fix capability.
///
/// How the fix is produced (LLM round trip, scripted rewrite) is outside
/// this crate; the driver only needs something that can turn an error
/// context into a modified code artifact. An error return means the
/// provider itself failed to execute and is treated as an infrastructure
/// failure, not a failed attempt.
#[async_trait]
pub trait FixProvider: Send + Sync {
    /// Propose a fix for the given error context.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce a fix at all
    /// (API unreachable, tooling broken).
    async fn propose_fix(&self, context: &FixContext) -> anyhow::Result<FixProposal>;
}

/// Abstraction for the external validation capability.
///
/// Typically runs a test suite against the repository state after a fix
/// attempt. A clean `passed: false` report is a failed attempt; an error
/// return means the validator itself could not run.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate the repository state after a fix attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if validation cannot be executed.
    async fn validate(&self) -> anyhow::Result<ValidationReport>;
}

#[async_trait]
impl<T: FixProvider + ?Sized> FixProvider for Arc<T> {
    async fn propose_fix(&self, context: &FixContext) -> anyhow::Result<FixProposal> {
        (**self).propose_fix(context).await
    }
}

#[async_trait]
impl<T: Validator + ?Sized> Validator for Arc<T> {
    async fn validate(&self) -> anyhow::Result<ValidationReport> {
        (**self).validate().await
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Configuration for the repair driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Maximum repair attempts per session.
    pub attempt_limit: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            attempt_limit: DEFAULT_ATTEMPT_LIMIT,
        }
    }
}

impl DriverConfig {
    /// Set a custom attempt limit.
    #[must_use]
    pub fn with_attempt_limit(mut self, limit: u32) -> Self {
        self.attempt_limit = limit;
        self
    }
}

/// Orchestrates one repair session per failure signal.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_repair::classify::ErrorSignal;
/// use jarvis_repair::driver::RepairDriver;
///
/// let driver = RepairDriver::new(fixer, validator);
/// let report = driver.run(&ErrorSignal::new(error_text)).await?;
/// ```
pub struct RepairDriver<F, V> {
    fixer: F,
    validator: V,
    classifier: ErrorClassifier,
    config: DriverConfig,
    attempt_store: Option<Arc<dyn AttemptStore>>,
}

impl<F: FixProvider, V: Validator> RepairDriver<F, V> {
    /// Create a driver with default configuration.
    #[must_use]
    pub fn new(fixer: F, validator: V) -> Self {
        Self {
            fixer,
            validator,
            classifier: ErrorClassifier::new(),
            config: DriverConfig::default(),
            attempt_store: None,
        }
    }

    /// Use a custom configuration.
    #[must_use]
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a durable attempt store.
    ///
    /// When the signal carries a failure id, the driver increments the
    /// durable count once per invocation so surrounding automation can
    /// spot repeat offenders across process restarts. This count is
    /// independent of the in-session limit.
    #[must_use]
    pub fn with_attempt_store(mut self, store: Arc<dyn AttemptStore>) -> Self {
        self.attempt_store = Some(store);
        self
    }

    /// Run a full repair session for a failure signal.
    pub async fn run(&self, signal: &ErrorSignal) -> Result<SessionReport> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_until_cancelled(signal, cancel_rx).await
    }

    /// Run a full repair session, checking the cancellation signal
    /// before each attempt.
    ///
    /// On cancellation the session escalates with
    /// [`FailureReason::Cancelled`] without consuming an attempt.
    pub async fn run_until_cancelled(
        &self,
        signal: &ErrorSignal,
        cancel: watch::Receiver<bool>,
    ) -> Result<SessionReport> {
        let mut session = RepairSession::new().with_limit(self.config.attempt_limit);
        let classification = self.classifier.classify(signal);
        session.apply_classification(&classification)?;
        info!(
            session = session.id(),
            category = %classification.category,
            state = %session.state(),
            "classified failure signal"
        );

        self.record_durable_attempt(signal, session.id());

        let mut previous_failure: Option<String> = None;
        while session.can_attempt_repair() {
            if *cancel.borrow() {
                warn!(session = session.id(), "cancelled between attempts");
                session.escalate(FailureReason::Cancelled)?;
                break;
            }

            let attempt = session.counter() + 1;
            let context = FixContext {
                error_text: signal.text.clone(),
                category: classification.category,
                attempt,
                previous_failure: previous_failure.take(),
            };

            let proposal = match self.fixer.propose_fix(&context).await {
                Ok(proposal) => proposal,
                Err(e) => {
                    warn!(
                        session = session.id(),
                        attempt,
                        error = %e,
                        "fix provider failed to execute"
                    );
                    session.escalate(FailureReason::InfrastructureFailure)?;
                    break;
                }
            };
            debug!(
                session = session.id(),
                attempt,
                summary = %proposal.summary,
                "fix proposed"
            );

            let validation = match self.validator.validate().await {
                Ok(validation) => validation,
                Err(e) => {
                    warn!(
                        session = session.id(),
                        attempt,
                        error = %e,
                        "validator failed to execute"
                    );
                    session.escalate(FailureReason::InfrastructureFailure)?;
                    break;
                }
            };

            let state = session.record_attempt_result(validation.passed)?;
            info!(
                session = session.id(),
                attempt,
                category = %classification.category,
                passed = validation.passed,
                state = %state,
                "repair attempt recorded"
            );

            if state.is_terminal() {
                break;
            }
            previous_failure = validation.failure_detail();
        }

        let report = session.report();
        info!(session = session.id(), outcome = %report.summary(), "session closed");
        Ok(report)
    }

    /// Bump the durable per-failure count, if a store and id are present.
    ///
    /// Store failures are logged and swallowed: the audit count must not
    /// block the repair itself.
    fn record_durable_attempt(&self, signal: &ErrorSignal, session_id: &str) {
        let (Some(store), Some(failure_id)) = (&self.attempt_store, &signal.failure_id) else {
            return;
        };

        match store.increment(failure_id) {
            Ok(total) => debug!(
                session = session_id,
                failure_id = failure_id.as_str(),
                total,
                "durable attempt count incremented"
            ),
            Err(e) => warn!(
                session = session_id,
                failure_id = failure_id.as_str(),
                error = %e,
                "failed to update durable attempt count"
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::RepairState;
    use crate::store::InMemoryAttemptStore;
    use crate::testing::{MockFixProvider, MockValidator};

    #[tokio::test]
    async fn test_run_succeeds_on_first_attempt() {
        let driver = RepairDriver::new(MockFixProvider::new(), MockValidator::passing());
        let report = driver
            .run(&ErrorSignal::new("AssertionError: expected 5 got 3"))
            .await
            .unwrap();

        assert_eq!(report.final_state, RepairState::Success);
        assert_eq!(report.attempt_count, 1);
    }

    #[tokio::test]
    async fn test_run_exhausts_limit() {
        let driver = RepairDriver::new(MockFixProvider::new(), MockValidator::failing());
        let report = driver
            .run(&ErrorSignal::new("AssertionError: expected 5 got 3"))
            .await
            .unwrap();

        assert_eq!(report.final_state, RepairState::FailedLimit);
        assert_eq!(report.attempt_count, 3);
    }

    #[tokio::test]
    async fn test_infrastructure_signal_makes_no_attempts() {
        let fixer = MockFixProvider::new();
        let driver = RepairDriver::new(fixer, MockValidator::passing());
        let report = driver
            .run(&ErrorSignal::new("ConnectionError: connection refused"))
            .await
            .unwrap();

        assert_eq!(report.final_state, RepairState::NeedsHuman);
        assert_eq!(
            report.failure_reason,
            Some(FailureReason::InfrastructureFailure)
        );
        assert_eq!(report.attempt_count, 0);
    }

    #[tokio::test]
    async fn test_fixer_error_escalates_without_consuming_attempt() {
        let driver = RepairDriver::new(
            MockFixProvider::new().with_error("API unreachable"),
            MockValidator::passing(),
        );
        let report = driver
            .run(&ErrorSignal::new("AssertionError: boom"))
            .await
            .unwrap();

        assert_eq!(report.final_state, RepairState::NeedsHuman);
        assert_eq!(
            report.failure_reason,
            Some(FailureReason::InfrastructureFailure)
        );
        assert_eq!(report.attempt_count, 0);
    }

    #[tokio::test]
    async fn test_cancellation_before_first_attempt() {
        let (cancel_tx, cancel_rx) = watch::channel(true);
        let driver = RepairDriver::new(MockFixProvider::new(), MockValidator::passing());
        let report = driver
            .run_until_cancelled(&ErrorSignal::new("AssertionError: boom"), cancel_rx)
            .await
            .unwrap();
        drop(cancel_tx);

        assert_eq!(report.final_state, RepairState::NeedsHuman);
        assert_eq!(report.failure_reason, Some(FailureReason::Cancelled));
        assert_eq!(report.attempt_count, 0);
    }

    #[tokio::test]
    async fn test_durable_count_incremented_once_per_run() {
        let store = Arc::new(InMemoryAttemptStore::new());
        let driver = RepairDriver::new(MockFixProvider::new(), MockValidator::failing())
            .with_attempt_store(Arc::clone(&store) as Arc<dyn AttemptStore>);

        let signal = ErrorSignal::new("AssertionError: boom").with_failure_id("issue-9");
        driver.run(&signal).await.unwrap();
        driver.run(&signal).await.unwrap();

        assert_eq!(store.get("issue-9").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_previous_failure_flows_into_next_context() {
        let fixer = Arc::new(MockFixProvider::new());
        let validator = MockValidator::with_outcomes(vec![false, true]);
        let driver = RepairDriver::new(Arc::clone(&fixer), validator);

        let report = driver
            .run(&ErrorSignal::new("AssertionError: boom"))
            .await
            .unwrap();
        assert_eq!(report.final_state, RepairState::Success);
        assert_eq!(report.attempt_count, 2);

        let contexts = fixer.contexts();
        assert_eq!(contexts.len(), 2);
        assert!(contexts[0].previous_failure.is_none());
        assert!(contexts[1]
            .previous_failure
            .as_deref()
            .is_some_and(|detail| detail.contains("scripted failure #1")));
    }
}
