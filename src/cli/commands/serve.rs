//! Serve command - plugin list and plugin files over HTTP.

use crate::config::Settings;

use crate::cli::args::PluginDirArgs;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub dirs: PluginDirArgs,
    pub bind: Option<String>,
    pub watch_interval: Option<u64>,
}

impl ServeArgs {
    /// Apply CLI overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        self.dirs.apply(settings);
        if let Some(bind) = &self.bind {
            settings.server.bind = bind.clone();
        }
        if let Some(secs) = self.watch_interval {
            settings.plugins.watch_interval_secs = secs;
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, mut config: Settings) {
    args.apply(&mut config);

    tracing::debug!(
        target: "http",
        "plugin dir: {}, static: {:?}, base url: '{}', in cluster: {}",
        config.plugins.plugin_dir.display(),
        config.plugins.static_plugin_dir,
        config.base_url(),
        config.plugins.in_cluster
    );

    run_http_server(config).await;
}

#[cfg(feature = "http-server")]
async fn run_http_server(config: Settings) {
    use crate::http::serve_http;

    if let Err(e) = serve_http(config).await {
        eprintln!("HTTP server error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "http-server"))]
async fn run_http_server(_config: Settings) {
    eprintln!("HTTP server support is not compiled in.");
    eprintln!("Please rebuild with: cargo build --features http-server");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args_override() {
        let args = ServeArgs {
            dirs: PluginDirArgs {
                plugins_dir: Some("/tmp/p".into()),
                ..Default::default()
            },
            bind: Some("0.0.0.0:1234".to_string()),
            watch_interval: Some(9),
        };

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.server.bind, "0.0.0.0:1234");
        assert_eq!(settings.plugins.watch_interval_secs, 9);
        assert_eq!(settings.plugins.plugin_dir, std::path::PathBuf::from("/tmp/p"));
    }
}
