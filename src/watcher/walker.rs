//! Directory walking for plugin roots.
//!
//! Two views of the same tree:
//! - [`walk_directories`] lists every directory under a root (root included),
//!   which is what the watcher needs to register.
//! - [`list_candidates`] lists the immediate children of a root, which is
//!   what plugin discovery validates.
//!
//! Both treat a missing root as empty rather than as an error.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::WatchError;

/// Required file that marks a folder as a loadable plugin.
pub const ENTRY_SCRIPT: &str = "main.js";

/// Optional packaging descriptor.
pub const METADATA_FILE: &str = "package.json";

/// Result of a recursive directory walk.
#[derive(Debug, Default)]
pub struct DirectoryWalk {
    /// Every directory found, in walk order (root first).
    pub directories: Vec<PathBuf>,
    /// Per-entry failures; the walk continued past each of them.
    pub errors: Vec<WatchError>,
}

/// Recursively enumerate every directory under `root`, including `root`.
///
/// Symlinks are not followed. An unreadable subdirectory is recorded in
/// [`DirectoryWalk::errors`] and skipped; the rest of the tree is still walked.
pub fn walk_directories(root: &Path) -> DirectoryWalk {
    let mut walk = DirectoryWalk::default();

    if !root.exists() {
        return walk;
    }

    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => {
                walk.directories.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                // Something vanished mid-walk; that is a normal race, not a failure.
                if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) {
                    continue;
                }
                walk.errors.push(WatchError::WalkFailed {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    walk
}

/// An immediate child of a plugin root, before validation.
///
/// Derived on every discovery pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCandidate {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub has_entry_script: bool,
    pub has_metadata: bool,
}

impl PluginCandidate {
    /// Inspect a single directory entry.
    pub fn inspect(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_dir = path.is_dir();
        let (has_entry_script, has_metadata) = if is_dir {
            (
                path.join(ENTRY_SCRIPT).exists(),
                path.join(METADATA_FILE).exists(),
            )
        } else {
            (false, false)
        };

        Self {
            name,
            path,
            is_dir,
            has_entry_script,
            has_metadata,
        }
    }

    pub fn entry_script_path(&self) -> PathBuf {
        self.path.join(ENTRY_SCRIPT)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(METADATA_FILE)
    }
}

/// List the immediate children of `root` as plugin candidates, sorted by name.
///
/// Returns an empty list when `root` does not exist. Any other failure to read
/// `root` itself is returned; failures on individual entries skip that entry.
pub fn list_candidates(root: &Path) -> io::Result<Vec<PluginCandidate>> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => candidates.push(PluginCandidate::inspect(entry.path())),
            Err(e) => {
                tracing::warn!("[walker] skipping unreadable entry in {}: {e}", root.display());
            }
        }
    }
    candidates.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(candidates)
}
