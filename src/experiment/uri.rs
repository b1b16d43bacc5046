//! Tracking URI: where a run's records go

use std::fmt;
use std::path::PathBuf;

use super::{ExperimentStore, FileStore, TrackingStore};
use crate::Result;

/// Tracking location used when none is configured.
pub const DEFAULT_TRACKING_URI: &str = "./mlruns";

/// Parsed tracking location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingUri {
    /// Process-local store, discarded at exit (`memory:`).
    Memory,
    /// Directory-backed store (plain path or `file://` URI).
    Directory(PathBuf),
}

impl TrackingUri {
    /// Parse `memory:`, `file://<path>` or a plain path.
    #[must_use]
    pub fn parse(uri: &str) -> Self {
        let uri = uri.trim();
        if uri == "memory:" || uri == "memory" {
            Self::Memory
        } else if let Some(path) = uri.strip_prefix("file://") {
            Self::Directory(PathBuf::from(path))
        } else {
            Self::Directory(PathBuf::from(uri))
        }
    }

    /// Open the store this URI points at.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory store cannot be created.
    pub fn open(&self) -> Result<Box<dyn TrackingStore>> {
        Ok(match self {
            Self::Memory => Box::new(ExperimentStore::new()),
            Self::Directory(path) => Box::new(FileStore::open(path)?),
        })
    }
}

impl Default for TrackingUri {
    fn default() -> Self {
        Self::parse(DEFAULT_TRACKING_URI)
    }
}

impl fmt::Display for TrackingUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory:"),
            Self::Directory(path) => write!(f, "file://{}", path.display()),
        }
    }
}
