//! Failure classification for the repair loop.
//!
//! This module maps a raw error signal (message text, optional exception
//! kind, optional HTTP status) to an [`ErrorCategory`] and the state a
//! fresh repair session should start in.
//!
//! # Architecture
//!
//! ```text
//! ErrorSignal ──classify──> ErrorCategory ──disposition──> (RepairState, FailureReason?)
//! ```
//!
//! Classification is a prioritized rule list, scanned first-match-wins:
//! auto-fixable patterns come before infrastructure patterns, so an
//! `ImportError` raised while fetching a remote resource is treated as a
//! code fault rather than an infrastructure fault. Matching is lexical,
//! case-insensitive, and tolerant of surrounding traceback text.
//!
//! # Example
//!
//! ```
//! use jarvis_repair::classify::{ErrorClassifier, ErrorSignal, ErrorCategory};
//!
//! let classifier = ErrorClassifier::new();
//! let signal = ErrorSignal::new("AssertionError: expected 5 got 3");
//! let classification = classifier.classify(&signal);
//! assert_eq!(classification.category, ErrorCategory::Assertion);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::session::state::{FailureReason, RepairState};

/// HTTP status codes treated as infrastructure failures.
pub const INFRASTRUCTURE_HTTP_STATUSES: [u16; 3] = [429, 500, 503];

// ============================================================================
// Error Signal
// ============================================================================

/// Raw failure signal fed into classification.
///
/// Real error strings embed the interesting pattern inside surrounding
/// text (tracebacks, log prefixes), so all fields are matched loosely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSignal {
    /// Primary error message text.
    pub text: String,
    /// Exception kind if the producer reported one separately.
    pub kind: Option<String>,
    /// HTTP status code if the failure came from a remote call.
    pub http_status: Option<u16>,
    /// Stable identity of the underlying failure (issue id, run id),
    /// used to key the durable attempt store.
    pub failure_id: Option<String>,
}

impl ErrorSignal {
    /// Create a signal from error text alone.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            http_status: None,
            failure_id: None,
        }
    }

    /// Attach an exception kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Attach an HTTP status code.
    #[must_use]
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach a stable failure identity.
    #[must_use]
    pub fn with_failure_id(mut self, id: impl Into<String>) -> Self {
        self.failure_id = Some(id.into());
        self
    }

    /// Combined haystack for pattern matching (kind first, then text).
    fn haystack(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{} {}", kind, self.text),
            None => self.text.clone(),
        }
    }
}

// ============================================================================
// Error Category
// ============================================================================

/// Classification of a failure signal.
///
/// Auto-fixable categories seed a repair session in
/// [`RepairState::ChangeRequested`]; the rest escalate immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Assertion failure with a named exception
    Assertion,
    /// Import or module resolution failure
    Import,
    /// Unresolved name reference
    Name,
    /// Syntax or parse failure
    Syntax,
    /// Assertion-style wording without a named exception
    Logic,
    /// Operation timed out
    Timeout,
    /// Connection-level network failure
    Connection,
    /// Infrastructure-class HTTP status (429, 500, 503)
    Http,
    /// No known pattern matched
    Unknown,
}

impl ErrorCategory {
    /// Get a human-readable description of this category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Assertion => "Assertion failure",
            Self::Import => "Import error",
            Self::Name => "Name error",
            Self::Syntax => "Syntax error",
            Self::Logic => "Logic error",
            Self::Timeout => "Timeout",
            Self::Connection => "Connection failure",
            Self::Http => "Infrastructure HTTP status",
            Self::Unknown => "Unknown error",
        }
    }

    /// Check if an automated code-fix attempt is appropriate.
    #[must_use]
    pub fn is_auto_fixable(&self) -> bool {
        matches!(
            self,
            Self::Assertion | Self::Import | Self::Name | Self::Syntax | Self::Logic
        )
    }

    /// Check if this category is attributable to transient or
    /// environmental conditions rather than the code under repair.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection | Self::Http)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Result of classifying an error signal.
///
/// Carries the matched category plus the repair state and failure reason
/// a fresh session should be seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Matched category.
    pub category: ErrorCategory,
    /// State a fresh session starts in.
    pub state: RepairState,
    /// Escalation reason, set only when `state` is `NeedsHuman`.
    pub failure_reason: Option<FailureReason>,
}

impl Classification {
    /// Derive the classification outcome from a category.
    #[must_use]
    pub fn from_category(category: ErrorCategory) -> Self {
        let (state, failure_reason) = if category.is_auto_fixable() {
            (RepairState::ChangeRequested, None)
        } else if category.is_infrastructure() {
            (
                RepairState::NeedsHuman,
                Some(FailureReason::InfrastructureFailure),
            )
        } else {
            (
                RepairState::NeedsHuman,
                Some(FailureReason::UnidentifiedError),
            )
        };

        Self {
            category,
            state,
            failure_reason,
        }
    }
}

// ============================================================================
// Error Classifier
// ============================================================================

/// Classifies failure signals against a prioritized pattern list.
///
/// No side effects; classification is deterministic for the same inputs.
pub struct ErrorClassifier {
    /// Compiled rules in priority order. Auto-fixable rules come first.
    rules: Vec<(Regex, ErrorCategory)>,
}

impl ErrorClassifier {
    /// Create a new classifier with the default rule set.
    #[must_use]
    pub fn new() -> Self {
        // Ordered: auto-fixable patterns must come BEFORE infrastructure
        // patterns, and named exceptions BEFORE the logic-error heuristic.
        let rules = vec![
            // Auto-fixable named exceptions
            (r"(?i)assertion\s*error", ErrorCategory::Assertion),
            (r"(?i)import\s*error|module\s*not\s*found", ErrorCategory::Import),
            (r"(?i)name\s*error", ErrorCategory::Name),
            (r"(?i)syntax\s*error", ErrorCategory::Syntax),
            // Logic heuristic: assertion-style wording without a named exception
            (
                r"(?i)assert(ion)?\s+failed|(?i)expected\b.+\b(got|found|but was)\b",
                ErrorCategory::Logic,
            ),
            // Infrastructure
            (
                r"(?i)connect\s*timeout|read\s*timeout|timeout\s*error|timed\s*out|\btimeout\b",
                ErrorCategory::Timeout,
            ),
            (
                r"(?i)connection\s*(error|refused|reset|aborted)",
                ErrorCategory::Connection,
            ),
        ];

        let compiled: Vec<_> = rules
            .into_iter()
            .filter_map(|(pattern, category)| {
                Regex::new(pattern).ok().map(|re| (re, category))
            })
            .collect();

        Self { rules: compiled }
    }

    /// Classify an error signal.
    ///
    /// Scans the rule list in order and returns the first match. Signals
    /// matching no text rule but carrying an infrastructure HTTP status
    /// classify as [`ErrorCategory::Http`]; everything else is
    /// [`ErrorCategory::Unknown`]. Empty signals are unknown.
    #[must_use]
    pub fn classify(&self, signal: &ErrorSignal) -> Classification {
        let haystack = signal.haystack();

        for (regex, category) in &self.rules {
            if regex.is_match(&haystack) {
                return Classification::from_category(*category);
            }
        }

        if let Some(status) = signal.http_status {
            if INFRASTRUCTURE_HTTP_STATUSES.contains(&status) {
                return Classification::from_category(ErrorCategory::Http);
            }
        }

        Classification::from_category(ErrorCategory::Unknown)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a raw failure signal in one call.
///
/// Convenience wrapper matching the shape surrounding automation sees:
/// error text, optional exception kind, optional HTTP status.
///
/// # Example
///
/// ```
/// use jarvis_repair::classify::identify_error;
/// use jarvis_repair::session::state::{FailureReason, RepairState};
///
/// let c = identify_error("requests.exceptions.ConnectTimeout: pool timed out", None, None);
/// assert_eq!(c.state, RepairState::NeedsHuman);
/// assert_eq!(c.failure_reason, Some(FailureReason::InfrastructureFailure));
/// ```
#[must_use]
pub fn identify_error(
    text: &str,
    kind: Option<&str>,
    http_status: Option<u16>,
) -> Classification {
    let mut signal = ErrorSignal::new(text);
    if let Some(kind) = kind {
        signal = signal.with_kind(kind);
    }
    if let Some(status) = http_status {
        signal = signal.with_http_status(status);
    }
    ErrorClassifier::new().classify(&signal)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_text(text: &str) -> Classification {
        ErrorClassifier::new().classify(&ErrorSignal::new(text))
    }

    // ------------------------------------------------------------------------
    // ErrorCategory tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_category_is_auto_fixable() {
        assert!(ErrorCategory::Assertion.is_auto_fixable());
        assert!(ErrorCategory::Import.is_auto_fixable());
        assert!(ErrorCategory::Name.is_auto_fixable());
        assert!(ErrorCategory::Syntax.is_auto_fixable());
        assert!(ErrorCategory::Logic.is_auto_fixable());
        assert!(!ErrorCategory::Timeout.is_auto_fixable());
        assert!(!ErrorCategory::Unknown.is_auto_fixable());
    }

    #[test]
    fn test_category_is_infrastructure() {
        assert!(ErrorCategory::Timeout.is_infrastructure());
        assert!(ErrorCategory::Connection.is_infrastructure());
        assert!(ErrorCategory::Http.is_infrastructure());
        assert!(!ErrorCategory::Assertion.is_infrastructure());
        assert!(!ErrorCategory::Unknown.is_infrastructure());
    }

    #[test]
    fn test_category_description() {
        assert_eq!(ErrorCategory::Assertion.description(), "Assertion failure");
        assert_eq!(ErrorCategory::Unknown.description(), "Unknown error");
    }

    // ------------------------------------------------------------------------
    // Auto-fixable classification
    // ------------------------------------------------------------------------

    #[test]
    fn test_classify_assertion_error() {
        let c = classify_text("AssertionError: expected 5 got 3");
        assert_eq!(c.category, ErrorCategory::Assertion);
        assert_eq!(c.state, RepairState::ChangeRequested);
        assert_eq!(c.failure_reason, None);
    }

    #[test]
    fn test_classify_import_error() {
        let c = classify_text("ImportError: No module named 'widgets'");
        assert_eq!(c.category, ErrorCategory::Import);
        assert_eq!(c.state, RepairState::ChangeRequested);
    }

    #[test]
    fn test_classify_name_error() {
        let c = classify_text("NameError: name 'respnse' is not defined");
        assert_eq!(c.category, ErrorCategory::Name);
        assert_eq!(c.state, RepairState::ChangeRequested);
    }

    #[test]
    fn test_classify_syntax_error() {
        let c = classify_text("SyntaxError: invalid syntax (handler.py, line 42)");
        assert_eq!(c.category, ErrorCategory::Syntax);
        assert_eq!(c.state, RepairState::ChangeRequested);
    }

    #[test]
    fn test_classify_logic_heuristic_without_named_exception() {
        let c = classify_text("check failed: expected 200 got 404");
        assert_eq!(c.category, ErrorCategory::Logic);
        assert_eq!(c.state, RepairState::ChangeRequested);
    }

    #[test]
    fn test_named_assertion_wins_over_logic_heuristic() {
        // Both the named pattern and the heuristic match; order decides.
        let c = classify_text("AssertionError: expected true but was false");
        assert_eq!(c.category, ErrorCategory::Assertion);
    }

    #[test]
    fn test_classify_embedded_in_traceback() {
        let c = classify_text(
            "Traceback (most recent call last):\n  File \"app.py\", line 3\nImportError: cannot import name 'speak'",
        );
        assert_eq!(c.category, ErrorCategory::Import);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let c = classify_text("SYNTAXERROR: unexpected EOF");
        assert_eq!(c.category, ErrorCategory::Syntax);
    }

    #[test]
    fn test_classify_kind_field() {
        let signal = ErrorSignal::new("expected 5 got 3").with_kind("AssertionError");
        let c = ErrorClassifier::new().classify(&signal);
        assert_eq!(c.category, ErrorCategory::Assertion);
    }

    // ------------------------------------------------------------------------
    // Infrastructure classification
    // ------------------------------------------------------------------------

    #[test]
    fn test_classify_connect_timeout() {
        let c = classify_text("requests.exceptions.ConnectTimeout: HTTPSConnectionPool(host='api')");
        assert_eq!(c.category, ErrorCategory::Timeout);
        assert_eq!(c.state, RepairState::NeedsHuman);
        assert_eq!(c.failure_reason, Some(FailureReason::InfrastructureFailure));
    }

    #[test]
    fn test_classify_read_timeout() {
        let c = classify_text("ReadTimeout: server did not respond");
        assert_eq!(c.category, ErrorCategory::Timeout);
    }

    #[test]
    fn test_classify_connection_error() {
        let c = classify_text("ConnectionError: connection refused by host");
        assert_eq!(c.category, ErrorCategory::Connection);
        assert_eq!(c.failure_reason, Some(FailureReason::InfrastructureFailure));
    }

    #[test]
    fn test_classify_http_status() {
        for status in INFRASTRUCTURE_HTTP_STATUSES {
            let signal = ErrorSignal::new("server responded strangely").with_http_status(status);
            let c = ErrorClassifier::new().classify(&signal);
            assert_eq!(c.category, ErrorCategory::Http, "status {}", status);
            assert_eq!(c.failure_reason, Some(FailureReason::InfrastructureFailure));
        }
    }

    #[test]
    fn test_non_infrastructure_http_status_is_unknown() {
        let signal = ErrorSignal::new("resource gone").with_http_status(404);
        let c = ErrorClassifier::new().classify(&signal);
        assert_eq!(c.category, ErrorCategory::Unknown);
        assert_eq!(c.failure_reason, Some(FailureReason::UnidentifiedError));
    }

    #[test]
    fn test_auto_fixable_wins_over_infrastructure() {
        // An ImportError raised while fetching a remote resource is a code
        // fault; pattern order makes that call, not semantics.
        let c = classify_text("ImportError raised during fetch: connection timed out");
        assert_eq!(c.category, ErrorCategory::Import);
        assert_eq!(c.state, RepairState::ChangeRequested);
    }

    #[test]
    fn test_auto_fixable_wins_over_http_status() {
        let signal = ErrorSignal::new("SyntaxError: invalid syntax").with_http_status(500);
        let c = ErrorClassifier::new().classify(&signal);
        assert_eq!(c.category, ErrorCategory::Syntax);
    }

    // ------------------------------------------------------------------------
    // Unknown classification
    // ------------------------------------------------------------------------

    #[test]
    fn test_classify_unknown() {
        let c = classify_text("Weird proprietary crash code 0xDEADBEEF");
        assert_eq!(c.category, ErrorCategory::Unknown);
        assert_eq!(c.state, RepairState::NeedsHuman);
        assert_eq!(c.failure_reason, Some(FailureReason::UnidentifiedError));
    }

    #[test]
    fn test_classify_empty_text() {
        let c = classify_text("");
        assert_eq!(c.category, ErrorCategory::Unknown);
        assert_eq!(c.failure_reason, Some(FailureReason::UnidentifiedError));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let signal = ErrorSignal::new("NameError: name 'x' is not defined");
        let classifier = ErrorClassifier::new();
        let first = classifier.classify(&signal);
        let second = classifier.classify(&signal);
        assert_eq!(first, second);
    }

    // ------------------------------------------------------------------------
    // identify_error convenience
    // ------------------------------------------------------------------------

    #[test]
    fn test_identify_error_contract() {
        let c = identify_error("AssertionError: boom", None, None);
        assert_eq!(c.state, RepairState::ChangeRequested);
        assert_eq!(c.failure_reason, None);

        let c = identify_error("something odd", None, Some(503));
        assert_eq!(c.state, RepairState::NeedsHuman);
        assert_eq!(c.failure_reason, Some(FailureReason::InfrastructureFailure));
    }

    #[test]
    fn test_error_signal_builder() {
        let signal = ErrorSignal::new("boom")
            .with_kind("TypeError")
            .with_http_status(500)
            .with_failure_id("issue-42");
        assert_eq!(signal.kind.as_deref(), Some("TypeError"));
        assert_eq!(signal.http_status, Some(500));
        assert_eq!(signal.failure_id.as_deref(), Some("issue-42"));
    }
}
