//! Configuration module for the plugin server.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the commands)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PLUGINWATCH_` and use double
//! underscores to separate nested levels:
//! - `PLUGINWATCH_PLUGINS__PLUGIN_DIR=/srv/plugins` sets `plugins.plugin_dir`
//! - `PLUGINWATCH_PLUGINS__IN_CLUSTER=true` sets `plugins.in_cluster`
//! - `PLUGINWATCH_SERVER__BIND=0.0.0.0:4466` sets `server.bind`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::plugins::{DiscoveryConfig, PluginRoot, ReloadMode};

/// Directory searched for in the current directory and its ancestors.
pub const CONFIG_DIR: &str = ".pluginwatch";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "PLUGINWATCH_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Plugin directories and reload behavior
    #[serde(default)]
    pub plugins: PluginSettings,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PluginSettings {
    /// Directory holding user plugins, one folder per plugin
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: PathBuf,

    /// Directory holding plugins shipped with the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_plugin_dir: Option<PathBuf>,

    /// URL prefix the whole server is mounted under
    #[serde(default)]
    pub base_url: String,

    /// Running inside a cluster: the plugin list is computed once and frozen
    #[serde(default = "default_false")]
    pub in_cluster: bool,

    /// Seconds between reconciliation passes of the directory watcher
    #[serde(default = "default_watch_interval")]
    pub watch_interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Logging configuration.
///
/// `default` applies to every target; `modules` overrides per target,
/// e.g. `pluginwatch::watcher = "debug"`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_plugin_dir() -> PathBuf {
    PathBuf::from("plugins")
}
fn default_false() -> bool {
    false
}
fn default_watch_interval() -> u64 {
    5
}
fn default_bind() -> String {
    "127.0.0.1:4466".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plugins: PluginSettings::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            plugin_dir: default_plugin_dir(),
            static_plugin_dir: None,
            base_url: String::new(),
            in_cluster: false,
            watch_interval_secs: default_watch_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// The settings file is looked up as `.pluginwatch/settings.toml` in the
    /// current directory or the nearest ancestor that has one. A missing file
    /// is fine; defaults and environment still apply.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path =
            Self::find_workspace_config().unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still layering env vars on top.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name.
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.pluginwatch/settings.toml` from the current directory upwards.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Reconciliation interval for the directory watcher.
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.plugins.watch_interval_secs.max(1))
    }

    /// Build the discovery configuration consumed by the plugin core.
    pub fn discovery_config(&self) -> DiscoveryConfig {
        let base = normalize_base_url(&self.plugins.base_url);

        DiscoveryConfig {
            static_root: self
                .plugins
                .static_plugin_dir
                .as_ref()
                .map(|dir| PluginRoot::new(dir.clone(), format!("{base}/static-plugins"))),
            user_root: PluginRoot::new(
                self.plugins.plugin_dir.clone(),
                format!("{base}/plugins"),
            ),
            mode: if self.plugins.in_cluster {
                ReloadMode::Frozen
            } else {
                ReloadMode::Dynamic
            },
        }
    }

    /// The URL prefix with a leading slash and no trailing slash, or empty.
    pub fn base_url(&self) -> String {
        normalize_base_url(&self.plugins.base_url)
    }
}

/// Normalize a URL base: `""` and `"/"` mean root, otherwise `/x/y`.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
