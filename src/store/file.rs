//! File-backed attempt store.
//!
//! Persists the failure-id -> attempt-count map as JSON in a `.jarvis`
//! directory. Every read-modify-write happens under an exclusive file
//! lock so concurrent CI jobs escalating the same failure cannot race
//! past each other, and writes go through a temp file + rename so a
//! crash never leaves a half-written map.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::warn;

use super::AttemptStore;
use crate::error::Result;

/// Default filename for the attempt count map.
pub const ATTEMPTS_FILENAME: &str = "attempt_counts.json";

/// Lock file guarding the attempt count map.
const LOCK_FILENAME: &str = "attempt_counts.lock";

/// Attempt store persisted to a JSON file under `<project>/.jarvis/`.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_repair::store::{AttemptStore, FileAttemptStore};
///
/// let store = FileAttemptStore::new(".");
/// let count = store.increment("issue-42")?;
/// ```
#[derive(Debug, Clone)]
pub struct FileAttemptStore {
    /// Path to the `.jarvis` directory.
    data_dir: PathBuf,
}

impl FileAttemptStore {
    /// Create a store rooted at the given project directory.
    #[must_use]
    pub fn new<P: AsRef<Path>>(project_dir: P) -> Self {
        Self {
            data_dir: project_dir.as_ref().join(".jarvis"),
        }
    }

    /// Returns the path to the attempt count file.
    #[must_use]
    pub fn counts_path(&self) -> PathBuf {
        self.data_dir.join(ATTEMPTS_FILENAME)
    }

    /// Checks if the count file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.counts_path().exists()
    }

    /// Acquire the exclusive lock guarding the count map.
    fn acquire_lock(&self) -> Result<std::fs::File> {
        std::fs::create_dir_all(&self.data_dir)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.data_dir.join(LOCK_FILENAME))?;
        lock_file.lock_exclusive()?;
        Ok(lock_file)
    }

    /// Read the map under the lock.
    fn read_counts<T>(&self, op: impl FnOnce(&HashMap<String, u32>) -> T) -> Result<T> {
        let _lock = self.acquire_lock()?;
        Ok(op(&self.load_counts()))
        // Lock releases when _lock drops.
    }

    /// Run a read-modify-write on the map, saving before the lock is
    /// released.
    fn update_counts<T>(&self, op: impl FnOnce(&mut HashMap<String, u32>) -> T) -> Result<T> {
        let _lock = self.acquire_lock()?;
        let mut counts = self.load_counts();
        let value = op(&mut counts);
        self.save_counts(&counts)?;
        Ok(value)
    }

    /// Load the count map, treating missing or corrupt files as empty.
    fn load_counts(&self) -> HashMap<String, u32> {
        let path = self.counts_path();
        if !path.exists() {
            return HashMap::new();
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read attempt count file: {}", e);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(counts) => counts,
            Err(e) => {
                warn!("Attempt count file is corrupted, starting fresh: {}", e);
                HashMap::new()
            }
        }
    }

    /// Write the count map atomically (temp file + rename).
    fn save_counts(&self, counts: &HashMap<String, u32>) -> Result<()> {
        let temp_path = self.data_dir.join(format!("{}.tmp", ATTEMPTS_FILENAME));
        let json = serde_json::to_string_pretty(counts)?;
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, self.counts_path())?;
        Ok(())
    }
}

impl AttemptStore for FileAttemptStore {
    fn get(&self, id: &str) -> Result<u32> {
        self.read_counts(|counts| counts.get(id).copied().unwrap_or(0))
    }

    fn increment(&self, id: &str) -> Result<u32> {
        self.update_counts(|counts| {
            let count = counts.entry(id.to_string()).or_insert(0);
            *count += 1;
            *count
        })
    }

    fn reset(&self, id: &str) -> Result<()> {
        self.update_counts(|counts| {
            counts.remove(id);
        })
    }
}
