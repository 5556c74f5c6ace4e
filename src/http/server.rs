//! HTTP server for plugin discovery and plugin files.
//!
//! Wires the pieces together: change signal, plugin list cache, the
//! directory rewatcher (dynamic mode only) and the axum router.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::plugins::PluginListCache;
use crate::watcher::{ChangeSignal, SubtreeRewatcher};

use super::routes::plugin_router;

/// Build the cache and start the rewatcher when the mode allows reloading.
///
/// The rewatcher stops when `ct` is cancelled. Failing to start it is logged
/// and the server keeps running with a list that only changes on restart.
pub fn start_plugin_watch(settings: &Settings, ct: &CancellationToken) -> Arc<PluginListCache> {
    let signal = Arc::new(ChangeSignal::new());
    let config = settings.discovery_config();
    let dynamic = config.mode.is_dynamic();
    let user_dir = config.user_root.dir.clone();
    let cache = Arc::new(PluginListCache::new(config, signal.clone()));

    if !dynamic {
        crate::log_event!("plugins", "frozen", "plugin list will not reload");
        return cache;
    }

    let interval = settings.watch_interval();
    match SubtreeRewatcher::new(vec![user_dir.clone()], signal, interval) {
        Ok((rewatcher, events)) => {
            let watcher_ct = ct.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = rewatcher.run(events) => {
                        crate::log_event!("rewatcher", "ended");
                    }
                    _ = watcher_ct.cancelled() => {
                        crate::log_event!("rewatcher", "stopped");
                    }
                }
            });
            crate::log_event!(
                "rewatcher",
                "watching",
                "{} every {}s",
                user_dir.display(),
                interval.as_secs()
            );
        }
        Err(e) => {
            tracing::warn!("[rewatcher] failed to start: {e}");
            tracing::warn!("[rewatcher] continuing without plugin reloading");
        }
    }

    cache
}

/// Run the plugin server until Ctrl+C.
pub async fn serve_http(settings: Settings) -> anyhow::Result<()> {
    let bind = settings.server.bind.clone();
    crate::log_event!("http", "starting", "plugin server on {bind}");

    // Cancellation token for coordinated shutdown
    let ct = CancellationToken::new();

    let cache = start_plugin_watch(&settings, &ct);
    let router = plugin_router(cache.clone());

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let user_base = &cache.config().user_root.url_base;
    crate::log_event!("http", "listening", "http://{bind}");
    crate::log_event!("http", "plugin list", "http://{bind}{user_base}");

    let shutdown_ct = ct.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            crate::log_event!("http", "shutting down");
            shutdown_ct.cancel();
        })
        .await?;

    ct.cancel();
    crate::log_event!("http", "stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[http] failed to listen for ctrl+c: {e}");
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
}
