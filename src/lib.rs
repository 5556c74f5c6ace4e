//! Plugin discovery and hot reload for dashboard backends.
//!
//! Watches plugin directories, keeps a cached list of servable plugin base
//! paths in step with what is on disk, and serves that list and the plugin
//! files over HTTP.

pub mod cli;
pub mod config;
#[cfg(feature = "http-server")]
pub mod http;
pub mod logging;
pub mod plugins;
pub mod watcher;

pub use config::Settings;
pub use plugins::{DiscoveryConfig, PluginListCache, PluginRoot, ReloadMode};
pub use watcher::{ChangeSignal, SubtreeRewatcher, WatchRegistry};
