//! Repair session module.
//!
//! This module contains the bounded repair state machine:
//!
//! - [`state`] - State types, failure reasons, and attempt records
//! - [`machine`] - The [`RepairSession`] state machine itself
//!
//! # Architecture
//!
//! ```text
//!            classification
//!  [start] ────────┬──────────────> NeedsHuman (escalate)
//!                  │
//!                  v
//!          ChangeRequested
//!           /      |       \
//!   counter++,  counter++,  counter++,
//!   success     fail,       fail,
//!      |        counter<limit  counter>=limit
//!      v            |              v
//!   Success     (loop back)    FailedLimit
//!  (terminal)                   (terminal)
//! ```

pub mod machine;
pub mod state;

// Re-exports for convenience
pub use machine::{RepairSession, DEFAULT_ATTEMPT_LIMIT};
pub use state::{AttemptRecord, FailureReason, RepairState};
