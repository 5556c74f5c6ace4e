//! Registry of directories registered with the native watcher.
//!
//! Owns the `notify` watcher and the set of paths it currently watches,
//! behind one mutex so the two never disagree. Every path is watched
//! non-recursively; recursion is the rewatcher's job.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::WatchError;

/// Raw output of the native watcher: an event or a primitive-level error.
pub type RawWatchResult = notify::Result<Event>;

/// Receiving half of the native watcher's output.
///
/// Unbounded and never restarted: exactly one task should own it for the
/// lifetime of the process.
pub struct WatchEvents {
    rx: mpsc::UnboundedReceiver<RawWatchResult>,
}

impl WatchEvents {
    /// Wait for the next event or error. `None` once the registry is dropped.
    pub async fn recv(&mut self) -> Option<RawWatchResult> {
        self.rx.recv().await
    }

}

/// What a [`WatchRegistry::sync`] call changed.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Newly watched directories.
    pub added: Vec<PathBuf>,
    /// Watched paths now holding a different directory (renamed away and
    /// recreated); the watch was moved to the new directory.
    pub replaced: Vec<PathBuf>,
    /// Directories no longer present and no longer watched.
    pub removed: Vec<PathBuf>,
    /// Registration failures; those paths are retried on the next sync.
    pub failed: Vec<WatchError>,
}

impl SyncReport {
    /// Whether the watched set changed.
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.replaced.is_empty() || !self.removed.is_empty()
    }
}

/// What [`WatchRegistry::add_path`] did with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Replaced,
    Unchanged,
}

/// Device and inode of a directory, where the platform exposes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirIdentity {
    dev: u64,
    ino: u64,
}

#[cfg(unix)]
fn dir_identity(path: &Path) -> Option<DirIdentity> {
    use std::os::unix::fs::MetadataExt;

    std::fs::metadata(path).ok().map(|meta| DirIdentity {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn dir_identity(_path: &Path) -> Option<DirIdentity> {
    None
}

struct RegistryInner {
    watcher: RecommendedWatcher,
    /// Watched paths and the directory each watch was placed on.
    watched: HashMap<PathBuf, Option<DirIdentity>>,
}

/// Set of watched directories plus the watcher that backs it.
pub struct WatchRegistry {
    inner: Mutex<RegistryInner>,
}

impl WatchRegistry {
    /// Create the native watcher and the stream its events arrive on.
    pub fn new() -> Result<(Self, WatchEvents), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: RawWatchResult| {
            // Receiver gone means the process is shutting down.
            let _ = tx.send(res);
        })?;

        Ok((
            Self {
                inner: Mutex::new(RegistryInner {
                    watcher,
                    watched: HashMap::new(),
                }),
            },
            WatchEvents { rx },
        ))
    }

    /// Watch `path`.
    ///
    /// A path that is already watched keeps its watch, unless the directory
    /// behind it was replaced since; then the watch moves to the new one.
    pub fn add_path(&self, path: &Path) -> Result<AddOutcome, WatchError> {
        let mut inner = self.inner.lock();
        Self::add_locked(&mut inner, path)
    }

    /// Bring the watched paths under `root` in line with `directories`.
    ///
    /// Every directory in `directories` gets watched; every watched path under
    /// `root` missing from `directories` gets unwatched. Paths outside `root`
    /// are left alone so one registry can serve several roots.
    pub fn sync(&self, root: &Path, directories: &[PathBuf]) -> SyncReport {
        let mut report = SyncReport::default();
        let mut inner = self.inner.lock();

        for dir in directories {
            match Self::add_locked(&mut inner, dir) {
                Ok(AddOutcome::Added) => report.added.push(dir.clone()),
                Ok(AddOutcome::Replaced) => report.replaced.push(dir.clone()),
                Ok(AddOutcome::Unchanged) => {}
                Err(e) => report.failed.push(e),
            }
        }

        let present: HashSet<&PathBuf> = directories.iter().collect();
        let stale: Vec<PathBuf> = inner
            .watched
            .keys()
            .filter(|path| path.starts_with(root) && !present.contains(path))
            .cloned()
            .collect();

        for path in stale {
            if let Err(e) = Self::remove_locked(&mut inner, &path) {
                crate::debug_event!("registry", "unwatch failed", "{e}");
            }
            report.removed.push(path);
        }

        report
    }

    /// Check if a path is watched.
    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().watched.contains_key(path)
    }

    /// Number of watched paths.
    pub fn len(&self) -> usize {
        self.inner.lock().watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the watched paths, sorted.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.inner.lock().watched.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn add_locked(inner: &mut RegistryInner, path: &Path) -> Result<AddOutcome, WatchError> {
        let identity = dir_identity(path);
        let outcome = match inner.watched.get(path) {
            None => AddOutcome::Added,
            Some(known) if identity.is_some() && *known == identity => {
                return Ok(AddOutcome::Unchanged);
            }
            Some(known) if identity.is_some() && known.is_some() => AddOutcome::Replaced,
            // Nothing to compare: re-issue the watch, which overwrites the old one.
            Some(_) => AddOutcome::Unchanged,
        };

        if outcome == AddOutcome::Replaced {
            // The old watch follows the old directory wherever it went.
            if let Err(e) = inner.watcher.unwatch(path) {
                crate::debug_event!("registry", "unwatch replaced", "{}: {e}", path.display());
            }
        }

        if let Err(e) = inner.watcher.watch(path, RecursiveMode::NonRecursive) {
            inner.watched.remove(path);
            return Err(WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
        inner.watched.insert(path.to_path_buf(), identity);

        Ok(outcome)
    }

    fn remove_locked(inner: &mut RegistryInner, path: &Path) -> Result<bool, WatchError> {
        if inner.watched.remove(path).is_none() {
            return Ok(false);
        }

        inner
            .watcher
            .unwatch(path)
            .map_err(|e| WatchError::PathUnwatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(true)
    }
}
