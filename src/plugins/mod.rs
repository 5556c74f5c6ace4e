//! Plugin discovery and the cached plugin list served over HTTP.

mod cache;
mod discovery;
mod error;

pub use cache::{CacheState, PluginListCache};
pub use discovery::{
    DiscoveryConfig, PluginRoot, ReloadMode, Validation, list_base_paths, validate,
};
pub use error::{DiscoveryError, DiscoveryResult};
