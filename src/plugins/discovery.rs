//! Plugin discovery: which folders under a root are servable plugins.
//!
//! A folder is a plugin when it contains the entry script. The metadata file
//! is advisory; plugins packaged before it existed are still served, with a
//! warning.

use std::path::{Path, PathBuf};

use crate::watcher::walker::{PluginCandidate, list_candidates};

use super::error::{DiscoveryError, DiscoveryResult};

/// A plugin directory and the URL prefix its plugins are served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRoot {
    pub dir: PathBuf,
    pub url_base: String,
}

impl PluginRoot {
    pub fn new(dir: impl Into<PathBuf>, url_base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_base: url_base.into(),
        }
    }

    /// Valid plugin URLs under this root.
    pub fn list_base_paths(&self) -> DiscoveryResult<Vec<String>> {
        list_base_paths(&self.dir, &self.url_base)
    }
}

/// Whether the plugin list may be recomputed while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    /// Local development: recompute after filesystem changes.
    Dynamic,
    /// In-cluster: compute once at startup, never again.
    Frozen,
}

impl ReloadMode {
    pub fn is_dynamic(self) -> bool {
        matches!(self, ReloadMode::Dynamic)
    }
}

/// Plugin roots and reload mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Plugins shipped with the server, listed first.
    pub static_root: Option<PluginRoot>,
    /// Plugins installed by the user.
    pub user_root: PluginRoot,
    pub mode: ReloadMode,
}

impl DiscoveryConfig {
    /// Dynamic-mode config with only a user root.
    pub fn new(user_root: PluginRoot) -> Self {
        Self {
            static_root: None,
            user_root,
            mode: ReloadMode::Dynamic,
        }
    }

    pub fn with_static_root(mut self, root: PluginRoot) -> Self {
        self.static_root = Some(root);
        self
    }

    pub fn with_mode(mut self, mode: ReloadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Static plugins first, then user plugins.
    ///
    /// A real read failure on either root fails the whole call.
    pub fn discover(&self) -> DiscoveryResult<Vec<String>> {
        let mut urls = match &self.static_root {
            Some(root) => root.list_base_paths()?,
            None => Vec::new(),
        };
        urls.extend(self.user_root.list_base_paths()?);

        Ok(urls)
    }
}

/// Verdict on a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Accepted,
    /// Served, but packaged without a metadata file.
    AcceptedWithoutMetadata,
    NotADirectory,
    MissingEntryScript,
}

impl Validation {
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            Validation::Accepted | Validation::AcceptedWithoutMetadata
        )
    }
}

/// Decide whether a candidate is a servable plugin.
pub fn validate(candidate: &PluginCandidate) -> Validation {
    if !candidate.is_dir {
        Validation::NotADirectory
    } else if !candidate.has_entry_script {
        Validation::MissingEntryScript
    } else if !candidate.has_metadata {
        Validation::AcceptedWithoutMetadata
    } else {
        Validation::Accepted
    }
}

/// List `url_base/<name>` for every valid plugin folder directly under `root_dir`.
///
/// Entries come out in name order. A missing `root_dir` yields an empty list;
/// any other failure to read it is an error.
pub fn list_base_paths(root_dir: &Path, url_base: &str) -> DiscoveryResult<Vec<String>> {
    let candidates = list_candidates(root_dir).map_err(|source| DiscoveryError::ReadRoot {
        path: root_dir.to_path_buf(),
        source,
    })?;

    let mut urls = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        match validate(candidate) {
            Validation::NotADirectory => {
                crate::log_event!(
                    "discovery",
                    "skipped",
                    "'{}' is not a folder",
                    candidate.path.display()
                );
                continue;
            }
            Validation::MissingEntryScript => {
                crate::log_event!(
                    "discovery",
                    "skipped",
                    "'{}' not found",
                    candidate.entry_script_path().display()
                );
                continue;
            }
            Validation::AcceptedWithoutMetadata => {
                tracing::warn!(
                    "[discovery] package.json not found at '{}'; re-extract the plugin with a newer plugin packaging tool",
                    candidate.metadata_path().display()
                );
            }
            Validation::Accepted => {}
        }

        urls.push(join_url(url_base, &candidate.name));
    }

    Ok(urls)
}

fn join_url(base: &str, name: &str) -> String {
    format!("{}/{name}", base.trim_end_matches('/'))
}
