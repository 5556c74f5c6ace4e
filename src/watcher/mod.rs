//! Plugin directory watching.
//!
//! Keeps native filesystem watches on every directory under the plugin
//! roots and turns whatever happens there into a single [`ChangeSignal`].
//!
//! # Architecture
//!
//! ```text
//! SubtreeRewatcher
//!   - walks roots (walker) on a timer and after structural events
//!   - syncs WatchRegistry (notify::RecommendedWatcher + watched set)
//!   - raises ChangeSignal
//!         |
//!         v
//! plugins::PluginListCache (takes the signal on read)
//! ```

mod error;
mod registry;
mod rewatcher;
mod signal;
pub mod walker;

pub use error::WatchError;
pub use registry::{AddOutcome, RawWatchResult, SyncReport, WatchEvents, WatchRegistry};
pub use rewatcher::{DEFAULT_INTERVAL, ReconcileStats, SubtreeRewatcher};
pub use signal::ChangeSignal;
pub use walker::{DirectoryWalk, PluginCandidate, list_candidates, walk_directories};
