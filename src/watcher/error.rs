//! Error types for the live-refresh watcher system.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watch backend: {reason}")]
    BackendInit { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    WatchSetupFailed { path: PathBuf, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::BackendInit {
            reason: e.to_string(),
        }
    }
}
