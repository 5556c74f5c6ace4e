//! Error types for the plugin directory watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
///
/// None of these are fatal to the process: the rewatcher logs them and
/// retries on its next reconciliation pass.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Cannot unwatch path {path}: {reason}")]
    PathUnwatchFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    EventError { details: String },

    #[error("Failed to walk {path}: {reason}")]
    WalkFailed { path: PathBuf, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
