//! Latched "something changed" flag shared by the watcher and the plugin cache.

use std::sync::atomic::{AtomicBool, Ordering};

/// A dirty bit with no payload.
///
/// The watcher [`raise`](Self::raise)s it on any relevant change; the plugin
/// cache [`take`](Self::take)s it, which reads and clears in one atomic swap.
/// A raise that lands after a take is seen by the next take, never dropped.
#[derive(Debug, Default)]
pub struct ChangeSignal {
    changed: AtomicBool,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark that a change happened.
    pub fn raise(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// Return whether a change happened since the last take, and clear it.
    pub fn take(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    /// Look without clearing.
    pub fn is_raised(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }
}
