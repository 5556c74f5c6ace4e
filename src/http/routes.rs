//! Plugin routes.
//!
//! - `GET <user url base>` returns the JSON list of plugin base paths.
//! - `GET <user url base>/{*path}` serves files from the user plugin directory.
//! - `GET <static url base>/{*path}` serves files from the static plugin directory,
//!   mounted only when one is configured.
//!
//! The URL bases come from the cache's [`DiscoveryConfig`], so the list and
//! the files it points at can never disagree on where plugins live.
//!
//! [`DiscoveryConfig`]: crate::plugins::DiscoveryConfig

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::plugins::{PluginListCache, PluginRoot};

/// Files under one plugin root, served below `prefix`.
#[derive(Debug)]
struct PluginFiles {
    dir: PathBuf,
    prefix: String,
    no_cache: bool,
}

impl PluginFiles {
    fn new(root: &PluginRoot, no_cache: bool) -> Self {
        Self {
            dir: root.dir.clone(),
            prefix: route_prefix(&root.url_base),
            no_cache,
        }
    }
}

/// Build the router for the plugin list and plugin files.
pub fn plugin_router(cache: Arc<PluginListCache>) -> Router {
    let config = cache.config();
    let dynamic = config.mode.is_dynamic();

    let user_files = Arc::new(PluginFiles::new(&config.user_root, dynamic));
    let list_path = if user_files.prefix.is_empty() {
        "/".to_string()
    } else {
        user_files.prefix.clone()
    };
    let user_path = format!("{}/{{*path}}", user_files.prefix);

    let mut router = Router::new()
        .route(&list_path, get(list_plugins))
        .route(
            &user_path,
            get(move |req: Request| serve_files(user_files.clone(), req)),
        );

    if let Some(static_root) = &config.static_root {
        let static_files = Arc::new(PluginFiles::new(static_root, false));
        let static_path = format!("{}/{{*path}}", static_files.prefix);
        router = router.route(
            &static_path,
            get(move |req: Request| serve_files(static_files.clone(), req)),
        );
    }

    router.with_state(cache)
}

/// `GET /plugins`: the current plugin base paths, always a JSON array.
async fn list_plugins(State(cache): State<Arc<PluginListCache>>) -> Json<Vec<String>> {
    // A stale cache recomputes from disk; keep that off the async workers.
    match tokio::task::spawn_blocking(move || cache.current()).await {
        Ok(list) => Json(list.to_vec()),
        Err(e) => {
            tracing::error!("[http] plugin list task failed: {e}");
            Json(Vec::new())
        }
    }
}

/// Strip the route prefix and hand the rest to a directory file server.
async fn serve_files(files: Arc<PluginFiles>, mut req: Request) -> Response {
    let path = req.uri().path();
    let rest = path.strip_prefix(files.prefix.as_str()).unwrap_or(path);
    let rest = if rest.is_empty() { "/" } else { rest };

    let uri = match Uri::try_from(rest) {
        Ok(uri) => uri,
        Err(e) => {
            crate::debug_event!("http", "bad plugin path", "{rest}: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    *req.uri_mut() = uri;

    let result: Result<_, Infallible> = ServeDir::new(&files.dir).oneshot(req).await;
    let mut response = match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };

    if files.no_cache {
        let headers = response.headers_mut();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }

    response
}

/// Leading slash, no trailing slash; empty for the root.
fn route_prefix(url_base: &str) -> String {
    let trimmed = url_base.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
