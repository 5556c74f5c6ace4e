//! Memoized plugin list, invalidated by the watcher's change signal.
//!
//! Two states: `Fresh` serves the cached list, `Stale` recomputes on the next
//! read. Reads take the change signal and recompute under one lock, so a
//! reader never sees a half-built list and no change goes unnoticed.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::watcher::ChangeSignal;

use super::discovery::DiscoveryConfig;

/// Cache state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// The list is authoritative.
    Fresh(Arc<[String]>),
    /// The next read recomputes.
    Stale,
}

/// The current plugin base paths, recomputed lazily in dynamic mode.
pub struct PluginListCache {
    config: DiscoveryConfig,
    signal: Arc<ChangeSignal>,
    state: Mutex<CacheState>,
}

impl PluginListCache {
    /// Compute the initial list and build the cache around it.
    ///
    /// A failed initial discovery is logged and cached as an empty list; in
    /// dynamic mode the next change signal triggers a retry.
    pub fn new(config: DiscoveryConfig, signal: Arc<ChangeSignal>) -> Self {
        let initial: Arc<[String]> = match config.discover() {
            Ok(urls) => {
                crate::log_event!("plugins", "discovered", "{} plugin(s)", urls.len());
                urls.into()
            }
            Err(e) => {
                if !e.is_not_found() {
                    tracing::error!("[plugins] initial discovery failed: {e}");
                }
                Arc::from(Vec::new())
            }
        };

        Self {
            config,
            signal,
            state: Mutex::new(CacheState::Fresh(initial)),
        }
    }

    /// The current list of plugin base paths.
    ///
    /// In dynamic mode, a raised change signal makes this call recompute.
    /// If that recompute fails the cache stays stale, the error is logged and
    /// an empty list is returned, so the next read tries again.
    /// In frozen mode this always returns the startup list.
    pub fn current(&self) -> Arc<[String]> {
        let mut state = self.state.lock();

        if self.config.mode.is_dynamic() && self.signal.take() {
            crate::debug_event!("plugins", "change observed, list is stale");
            *state = CacheState::Stale;
        }

        if let CacheState::Fresh(list) = &*state {
            return list.clone();
        }

        match self.config.discover() {
            Ok(urls) => {
                crate::log_event!("plugins", "reloaded", "{} plugin(s)", urls.len());
                let list: Arc<[String]> = urls.into();
                *state = CacheState::Fresh(list.clone());
                list
            }
            Err(e) => {
                tracing::error!("[plugins] failed to reload plugin list: {e}");
                Arc::from(Vec::new())
            }
        }
    }

    /// Force a recompute on the next read. No effect in frozen mode.
    pub fn invalidate(&self) {
        if self.config.mode.is_dynamic() {
            *self.state.lock() = CacheState::Stale;
        }
    }

    /// Snapshot of the state without triggering a recompute.
    pub fn state(&self) -> CacheState {
        self.state.lock().clone()
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }
}
