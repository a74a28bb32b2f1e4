//! Jarvis Repair - bounded CI self-repair loop
//!
//! A small library that governs automated CI self-healing: classify a
//! failure, decide whether it is auto-fixable, attempt a bounded number
//! of repair cycles against external fixer and validator capabilities,
//! and escalate to a human when exhausted.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`classify`] - Failure classification against a prioritized pattern list
//! - [`session`] - The bounded repair state machine
//! - [`driver`] - Orchestration loop over fixer/validator capabilities
//! - [`report`] - Session outcome reports for the reporting layer
//! - [`store`] - Durable attempt counting keyed by failure identity
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mock capabilities)
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_repair::classify::ErrorSignal;
//! use jarvis_repair::driver::RepairDriver;
//! use jarvis_repair::session::state::RepairState;
//!
//! let driver = RepairDriver::new(fixer, validator);
//! let report = driver.run(&ErrorSignal::new(ci_log_excerpt)).await?;
//!
//! match report.final_state {
//!     RepairState::Success => open_pull_request(&report),
//!     _ => escalate_to_human(&report),
//! }
//! ```

pub mod classify;
pub mod driver;
pub mod error;
pub mod report;
pub mod session;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use error::{RepairError, Result};

// Re-export classification types
pub use classify::{
    identify_error, Classification, ErrorCategory, ErrorClassifier, ErrorSignal,
    INFRASTRUCTURE_HTTP_STATUSES,
};

// Re-export session types
pub use session::{
    AttemptRecord, FailureReason, RepairSession, RepairState, DEFAULT_ATTEMPT_LIMIT,
};

// Re-export driver types
pub use driver::{
    DriverConfig, FixContext, FixProposal, FixProvider, RepairDriver, ValidationReport, Validator,
};

// Re-export reporting types
pub use report::SessionReport;

// Re-export store types
pub use store::{AttemptStore, FileAttemptStore, InMemoryAttemptStore};

// Re-export mock capabilities for consumers' tests
pub use testing::{MockFixProvider, MockValidator};
