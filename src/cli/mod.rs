//! CLI module for the plugin server.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, PluginDirArgs};
