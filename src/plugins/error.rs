//! Error types for plugin discovery.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The only failure that escapes discovery.
///
/// A missing root is not an error (it yields no plugins), and problems
/// with individual entries are logged and skipped.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to read plugin directory {path}: {source}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DiscoveryError {
    /// The underlying I/O error kind.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            DiscoveryError::ReadRoot { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == io::ErrorKind::NotFound
    }
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
