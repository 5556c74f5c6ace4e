//! Keeps native watches in step with a plugin tree whose shape changes.
//!
//! The native watcher only sees directories it was told about, and it does
//! not recurse into folders created later. The rewatcher closes that gap by
//! re-walking each root on a timer and right after any structural event,
//! registering new directories and dropping ones that disappeared.
//!
//! # Tasks
//!
//! ```text
//! notify thread --> WatchEvents --> event consumer --+--> ChangeSignal::raise
//!                                                    |
//!                                                    +--> walk request (single slot)
//!                                                                |
//! interval timer ------------------------------------------> walk loop --> WatchRegistry::sync
//! ```
//!
//! Walks run one at a time. A request that arrives while a walk is running is
//! held in a single [`Notify`] permit, so any burst of events costs at most one
//! extra walk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use tokio::sync::Notify;
use tokio::time::{MissedTickBehavior, interval};

use super::WatchError;
use super::registry::{RawWatchResult, WatchEvents, WatchRegistry};
use super::signal::ChangeSignal;
use super::walker::walk_directories;

/// Default time between reconciliation passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Outcome of one reconciliation pass over every root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    pub directories: usize,
    pub added: usize,
    pub replaced: usize,
    pub removed: usize,
    pub failed: usize,
}

impl ReconcileStats {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.replaced > 0 || self.removed > 0
    }
}

/// Periodic and event-triggered re-walk of plugin roots.
///
/// Cheap to clone; clones share the registry, signal and walk slot.
#[derive(Clone)]
pub struct SubtreeRewatcher {
    roots: Arc<[PathBuf]>,
    registry: Arc<WatchRegistry>,
    signal: Arc<ChangeSignal>,
    walk_requests: Arc<Notify>,
    interval: Duration,
}

impl SubtreeRewatcher {
    /// Create a rewatcher for `roots` that raises `signal` on changes.
    ///
    /// Returns the event stream of the underlying registry; hand it to
    /// [`run`](Self::run).
    pub fn new(
        roots: Vec<PathBuf>,
        signal: Arc<ChangeSignal>,
        interval: Duration,
    ) -> Result<(Self, WatchEvents), WatchError> {
        let (registry, events) = WatchRegistry::new()?;

        Ok((
            Self {
                roots: roots.into(),
                registry: Arc::new(registry),
                signal,
                walk_requests: Arc::new(Notify::new()),
                interval,
            },
            events,
        ))
    }

    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.registry
    }

    /// Ask for a walk as soon as the current one (if any) finishes.
    ///
    /// Requests made while one is already pending are merged into it.
    pub fn request_walk(&self) {
        self.walk_requests.notify_one();
    }

    /// Walk every root once and sync the registry. Blocking.
    ///
    /// Raises the change signal when the watched directory set changed,
    /// including a watched path whose directory was replaced.
    pub fn reconcile(&self) -> ReconcileStats {
        let mut stats = ReconcileStats::default();

        for root in self.roots.iter() {
            self.reconcile_root(root, &mut stats);
        }

        if stats.changed() {
            self.signal.raise();
            crate::log_event!(
                "rewatcher",
                "reconciled",
                "{} directories, +{} ~{} -{}",
                stats.directories,
                stats.added,
                stats.replaced,
                stats.removed
            );
        } else {
            crate::debug_event!(
                "rewatcher",
                "unchanged",
                "{} directories",
                stats.directories
            );
        }

        stats
    }

    fn reconcile_root(&self, root: &Path, stats: &mut ReconcileStats) {
        let walk = walk_directories(root);
        for e in &walk.errors {
            tracing::warn!("[rewatcher] {e}");
        }

        if walk.directories.is_empty() {
            crate::debug_event!("rewatcher", "root missing", "{}", root.display());
        }

        let report = self.registry.sync(root, &walk.directories);
        for e in &report.failed {
            tracing::warn!("[rewatcher] {e}");
        }
        for path in &report.added {
            crate::debug_event!("rewatcher", "watching", "{}", path.display());
        }
        for path in &report.replaced {
            crate::debug_event!("rewatcher", "rewatched", "{}", path.display());
        }
        for path in &report.removed {
            crate::debug_event!("rewatcher", "unwatched", "{}", path.display());
        }

        stats.directories += walk.directories.len();
        stats.added += report.added.len();
        stats.replaced += report.replaced.len();
        stats.removed += report.removed.len();
        stats.failed += walk.errors.len() + report.failed.len();
    }

    /// Run the event consumer and the walk loop until the future is dropped.
    ///
    /// The first walk happens immediately, so roots are covered from the start.
    pub async fn run(self, events: WatchEvents) {
        crate::log_event!(
            "rewatcher",
            "started",
            "{} root(s), every {:?}",
            self.roots.len(),
            self.interval
        );

        tokio::join!(self.consume_events(events), self.walk_loop());
    }

    async fn walk_loop(&self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.walk_requests.notified() => {
                    crate::debug_event!("rewatcher", "walk requested");
                }
            }

            let this = self.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || this.reconcile()).await {
                tracing::error!("[rewatcher] walk task failed: {e}");
            }
        }
    }

    async fn consume_events(&self, mut events: WatchEvents) {
        while let Some(res) = events.recv().await {
            self.handle_raw(res);
        }
        crate::debug_event!("rewatcher", "event stream closed");
    }

    fn handle_raw(&self, res: RawWatchResult) {
        match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    return;
                }

                crate::debug_event!("watcher", "event", "{:?} {:?}", event.kind, event.paths);
                self.signal.raise();

                if is_structural(&event.kind) {
                    self.request_walk();
                }
            }
            Err(e) => {
                let e = WatchError::EventError {
                    details: e.to_string(),
                };
                tracing::error!("[watcher] {e}");
            }
        }
    }
}

/// Events that can change the directory tree and so warrant a re-walk.
fn is_structural(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any | EventKind::Other => true,
        EventKind::Modify(ModifyKind::Name(_)) | EventKind::Modify(ModifyKind::Any) => true,
        EventKind::Modify(_) | EventKind::Access(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RenameMode};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_structural_events() {
        assert!(is_structural(&EventKind::Create(CreateKind::Folder)));
        assert!(is_structural(&EventKind::Modify(ModifyKind::Name(
            RenameMode::Both
        ))));
        assert!(!is_structural(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
    }

    #[test]
    fn test_reconcile_picks_up_nested_folders() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let signal = Arc::new(ChangeSignal::new());
        let (rewatcher, _events) =
            SubtreeRewatcher::new(vec![root.clone()], signal.clone(), DEFAULT_INTERVAL).unwrap();

        let stats = rewatcher.reconcile();
        assert_eq!(stats.added, 1);
        assert!(signal.take());

        fs::create_dir_all(root.join("foo/dist/assets")).unwrap();
        let stats = rewatcher.reconcile();
        assert_eq!(stats.added, 3);
        assert!(rewatcher.registry().contains(&root.join("foo/dist/assets")));
        assert!(signal.take());

        // Nothing changed, nothing raised
        let stats = rewatcher.reconcile();
        assert!(!stats.changed());
        assert!(!signal.take());
    }

    #[test]
    fn test_reconcile_tolerates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("plugins");
        let signal = Arc::new(ChangeSignal::new());
        let (rewatcher, _events) =
            SubtreeRewatcher::new(vec![root.clone()], signal.clone(), DEFAULT_INTERVAL).unwrap();

        let stats = rewatcher.reconcile();
        assert_eq!(stats, ReconcileStats::default());
        assert!(rewatcher.registry().is_empty());

        fs::create_dir_all(&root).unwrap();
        assert_eq!(rewatcher.reconcile().added, 1);

        fs::remove_dir(&root).unwrap();
        let stats = rewatcher.reconcile();
        assert_eq!(stats.removed, 1);
        assert!(rewatcher.registry().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_reconcile_recovers_replaced_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("plugins");
        fs::create_dir_all(root.join("foo")).unwrap();
        let signal = Arc::new(ChangeSignal::new());
        let (rewatcher, _events) =
            SubtreeRewatcher::new(vec![root.clone()], signal.clone(), DEFAULT_INTERVAL).unwrap();

        assert_eq!(rewatcher.reconcile().added, 2);
        assert!(signal.take());

        fs::rename(&root, temp_dir.path().join("plugins.old")).unwrap();
        fs::create_dir_all(root.join("foo")).unwrap();

        let stats = rewatcher.reconcile();
        assert_eq!(stats.replaced, 2);
        assert_eq!(stats.added, 0);
        assert!(signal.take());
    }

    #[tokio::test]
    async fn test_run_registers_new_folder_after_event() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let signal = Arc::new(ChangeSignal::new());
        // Long interval: only the first tick and event-triggered walks happen.
        let (rewatcher, events) =
            SubtreeRewatcher::new(vec![root.clone()], signal, Duration::from_secs(3600)).unwrap();
        let registry = rewatcher.registry().clone();

        let handle = tokio::spawn(rewatcher.run(events));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !registry.contains(&root) {
            assert!(tokio::time::Instant::now() < deadline, "root never watched");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        fs::create_dir_all(root.join("late")).unwrap();
        while !registry.contains(&root.join("late")) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "new folder never watched"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        handle.abort();
    }
}
