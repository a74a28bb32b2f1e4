//! Custom error types for the repair loop.
//!
//! Domain outcomes (reaching the attempt limit, needing a human) are
//! first-class terminal states on the session, never errors. The error
//! type here covers the other two layers of the taxonomy: protocol
//! violations (driver bugs) and infrastructure plumbing failures
//! (store I/O, serialization).

use thiserror::Error;

use crate::session::state::RepairState;

/// Main error type for repair-loop operations
#[derive(Error, Debug)]
pub enum RepairError {
    // =========================================================================
    // Protocol Violations
    // =========================================================================
    /// A session was classified more than once
    #[error("Session {session} already classified (state: {state})")]
    AlreadyClassified { session: String, state: RepairState },

    /// An attempt result was recorded when no attempt was permitted
    #[error(
        "Attempt result recorded for session {session} in state {state} \
         (counter {counter}/{limit})"
    )]
    NotAttemptable {
        session: String,
        state: RepairState,
        counter: u32,
        limit: u32,
    },

    /// A transition was requested out of a terminal state
    #[error("Session {session} is closed in terminal state {state}")]
    TerminalState { session: String, state: RepairState },

    // =========================================================================
    // Attempt Store Errors
    // =========================================================================
    /// Durable attempt store operation failed
    #[error("Attempt store error: {message}")]
    Store { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepairError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error is a protocol violation.
    ///
    /// Protocol violations indicate a bug in the calling driver, not a
    /// runtime condition, and should fail loudly rather than be retried.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyClassified { .. }
                | Self::NotAttemptable { .. }
                | Self::TerminalState { .. }
        )
    }

    /// Check if this error came from the durable store layer
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Io(_) | Self::Json(_))
    }
}

/// Type alias for repair-loop results
pub type Result<T> = std::result::Result<T, RepairError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepairError::NotAttemptable {
            session: "s-1".into(),
            state: RepairState::Success,
            counter: 1,
            limit: 3,
        };
        assert!(err.to_string().contains("s-1"));
        assert!(err.to_string().contains("1/3"));
    }

    #[test]
    fn test_is_protocol_violation() {
        assert!(RepairError::AlreadyClassified {
            session: "s-1".into(),
            state: RepairState::ChangeRequested,
        }
        .is_protocol_violation());
        assert!(RepairError::TerminalState {
            session: "s-1".into(),
            state: RepairState::FailedLimit,
        }
        .is_protocol_violation());
        assert!(!RepairError::store("disk full").is_protocol_violation());
    }

    #[test]
    fn test_is_store_error() {
        assert!(RepairError::store("lock failed").is_store_error());
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(RepairError::from(io_err).is_store_error());
        assert!(!RepairError::TerminalState {
            session: "s-1".into(),
            state: RepairState::Success,
        }
        .is_store_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing map");
        let err: RepairError = io_err.into();
        assert!(matches!(err, RepairError::Io(_)));
        assert!(err.to_string().contains("missing map"));
    }
}
