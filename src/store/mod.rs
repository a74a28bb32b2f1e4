//! Durable attempt tracking keyed by failure identity.
//!
//! Separate CI job invocations for the same underlying failure each get a
//! fresh in-memory [`RepairSession`](crate::session::RepairSession); the
//! [`AttemptStore`] port is how the surrounding automation counts attempts
//! *across* those invocations so a failure cannot be retried forever
//! through process restarts. The in-memory session limit and this durable
//! count are deliberately independent mechanisms.
//!
//! Backends: [`InMemoryAttemptStore`] for tests and embedding,
//! [`FileAttemptStore`](file::FileAttemptStore) for production use.

pub mod file;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{RepairError, Result};

pub use file::FileAttemptStore;

/// Port for durable attempt counting keyed by failure identity.
///
/// Implementations must make `increment` a safe read-modify-write under
/// concurrent callers; two racing escalations must not both observe a
/// count below the caller's ceiling.
pub trait AttemptStore: Send + Sync {
    /// Get the recorded attempt count for a failure id (0 if unseen).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, id: &str) -> Result<u32>;

    /// Increment the attempt count for a failure id and return the new
    /// count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be updated.
    fn increment(&self, id: &str) -> Result<u32>;

    /// Forget a failure id (e.g., after a successful repair).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be updated.
    fn reset(&self, id: &str) -> Result<()>;
}

/// In-memory attempt store.
///
/// # Example
///
/// ```
/// use jarvis_repair::store::{AttemptStore, InMemoryAttemptStore};
///
/// let store = InMemoryAttemptStore::new();
/// assert_eq!(store.increment("issue-7")?, 1);
/// assert_eq!(store.increment("issue-7")?, 2);
/// assert_eq!(store.get("issue-7")?, 2);
/// # Ok::<(), jarvis_repair::error::RepairError>(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    counts: Mutex<HashMap<String, u32>>,
}

impl InMemoryAttemptStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counts(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, u32>>> {
        self.counts
            .lock()
            .map_err(|_| RepairError::store("attempt count map lock poisoned"))
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn get(&self, id: &str) -> Result<u32> {
        Ok(self.counts()?.get(id).copied().unwrap_or(0))
    }

    fn increment(&self, id: &str) -> Result<u32> {
        let mut counts = self.counts()?;
        let count = counts.entry(id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    fn reset(&self, id: &str) -> Result<()> {
        self.counts()?.remove(id);
        Ok(())
    }
}
