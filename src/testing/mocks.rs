//! Mock implementations of the driver capability traits.
//!
//! These mocks provide controllable test doubles for the external fixer
//! and validator, enabling deterministic driver tests without an LLM or
//! a real test runner.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::driver::{FixContext, FixProposal, FixProvider, ValidationReport, Validator};

/// Mock fix provider.
///
/// Records every context it was called with and can be scripted to fail
/// outright, simulating a tooling outage.
///
/// # Example
///
/// ```rust,ignore
/// let fixer = MockFixProvider::new();
/// // ... drive the loop ...
/// assert_eq!(fixer.call_count(), 2);
/// assert!(fixer.contexts()[1].previous_failure.is_some());
/// ```
#[derive(Debug, Default)]
pub struct MockFixProvider {
    error: Option<String>,
    calls: AtomicU32,
    contexts: Mutex<Vec<FixContext>>,
}

impl MockFixProvider {
    /// Create a mock that always produces a fix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the provider to fail with an error.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Number of times `propose_fix` was called.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Contexts the provider was called with, in order.
    #[must_use]
    pub fn contexts(&self) -> Vec<FixContext> {
        self.contexts
            .lock()
            .map(|contexts| contexts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FixProvider for MockFixProvider {
    async fn propose_fix(&self, context: &FixContext) -> Result<FixProposal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut contexts) = self.contexts.lock() {
            contexts.push(context.clone());
        }

        if let Some(ref error) = self.error {
            bail!("{}", error);
        }
        Ok(FixProposal::new(format!(
            "mock fix for attempt {}",
            context.attempt
        )))
    }
}

/// Mock validator with scripted outcomes.
///
/// Outcomes are consumed in order; once the script runs out, the default
/// outcome applies. Can also be configured to fail outright.
///
/// # Example
///
/// ```rust,ignore
/// // fail, fail, then succeed
/// let validator = MockValidator::with_outcomes(vec![false, false, true]);
/// ```
#[derive(Debug)]
pub struct MockValidator {
    outcomes: Vec<bool>,
    default_outcome: bool,
    error: Option<String>,
    calls: AtomicU32,
}

impl MockValidator {
    /// Create a validator that always passes.
    #[must_use]
    pub fn passing() -> Self {
        Self {
            outcomes: Vec::new(),
            default_outcome: true,
            error: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Create a validator that always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            outcomes: Vec::new(),
            default_outcome: false,
            error: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Create a validator with a scripted outcome sequence.
    #[must_use]
    pub fn with_outcomes(outcomes: Vec<bool>) -> Self {
        Self {
            outcomes,
            default_outcome: false,
            error: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Configure the validator to fail to execute.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Number of times `validate` was called.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Validator for MockValidator {
    async fn validate(&self) -> Result<ValidationReport> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ref error) = self.error {
            bail!("{}", error);
        }

        let passed = self
            .outcomes
            .get(call as usize)
            .copied()
            .unwrap_or(self.default_outcome);
        if passed {
            Ok(ValidationReport::pass())
        } else {
            Ok(ValidationReport::fail_with_failures(vec![format!(
                "scripted failure #{}",
                call + 1
            )]))
        }
    }
}
