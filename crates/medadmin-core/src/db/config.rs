//! Storage configuration.
//!
//! Resolved once at process startup and passed to [`Database::open_with_config`].
//!
//! [`Database::open_with_config`]: super::Database::open_with_config

use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a connection waits on another writer's lock before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    InMemory,
    File(PathBuf),
}

/// Database configuration.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    location: StorageLocation,
    busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Private in-memory database. Each handle gets its own empty store.
    pub fn in_memory() -> Self {
        Self {
            location: StorageLocation::InMemory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// File-backed database, shareable between handles.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            location: StorageLocation::File(path.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            StorageLocation::File(path) => Some(path),
            StorageLocation::InMemory => None,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
