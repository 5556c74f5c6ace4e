//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and the shared plugin directory flags.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::config::Settings;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Plugin discovery and hot-reload server
#[derive(Parser)]
#[command(
    name = "pluginwatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Plugin discovery and hot-reload server",
    long_about = "Watch plugin directories and serve the list of valid plugins and their files over HTTP.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the plugin list and plugin files, reloading on changes
    #[command(about = "Start the plugin HTTP server")]
    Serve {
        #[command(flatten)]
        dirs: PluginDirArgs,

        /// Address to bind (overrides config)
        #[arg(long, env = "PLUGINWATCH_BIND")]
        bind: Option<String>,

        /// Seconds between directory reconciliation passes (overrides config)
        #[arg(long)]
        watch_interval: Option<u64>,
    },

    /// Print the discovered plugin base paths as JSON
    #[command(about = "Run discovery once and print the plugin list")]
    List {
        #[command(flatten)]
        dirs: PluginDirArgs,
    },

    /// Show the effective configuration
    #[command(about = "Display active settings")]
    Config,
}

/// Plugin directory flags shared by `serve` and `list`.
#[derive(Args, Debug, Default, Clone)]
pub struct PluginDirArgs {
    /// Directory holding user plugins
    #[arg(long, value_name = "DIR")]
    pub plugins_dir: Option<PathBuf>,

    /// Directory holding plugins shipped with the server
    #[arg(long, value_name = "DIR")]
    pub static_plugins_dir: Option<PathBuf>,

    /// URL prefix the server is mounted under
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Compute the plugin list once and never reload it
    #[arg(long)]
    pub in_cluster: bool,
}

impl PluginDirArgs {
    /// Apply flags on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.plugins_dir {
            settings.plugins.plugin_dir = dir.clone();
        }
        if let Some(dir) = &self.static_plugins_dir {
            settings.plugins.static_plugin_dir = Some(dir.clone());
        }
        if let Some(base) = &self.base_url {
            settings.plugins.base_url = base.clone();
        }
        if self.in_cluster {
            settings.plugins.in_cluster = true;
        }
    }
}
