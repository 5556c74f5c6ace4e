//! HTTP route tests
//!
//! Exercise the plugin router in-process: the list endpoint, plugin file
//! serving from both roots, and cache headers per reload mode.

#![cfg(feature = "http-server")]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use pluginwatch::http::plugin_router;
use pluginwatch::{ChangeSignal, DiscoveryConfig, PluginListCache, PluginRoot, ReloadMode};
use tempfile::TempDir;
use tower::ServiceExt;

fn write_plugin(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("main.js"), format!("// {name}")).unwrap();
    fs::write(dir.join("package.json"), "{}").unwrap();
}

struct Fixture {
    _temp: TempDir,
    user_dir: PathBuf,
    static_dir: PathBuf,
    signal: Arc<ChangeSignal>,
    router: Router,
}

fn fixture(mode: ReloadMode, with_static: bool) -> Fixture {
    let temp = TempDir::new().unwrap();
    let user_dir = temp.path().join("plugins");
    let static_dir = temp.path().join("static-plugins");
    write_plugin(&user_dir, "foo");
    write_plugin(&static_dir, "core");

    let mut config =
        DiscoveryConfig::new(PluginRoot::new(&user_dir, "/base/plugins")).with_mode(mode);
    if with_static {
        config = config.with_static_root(PluginRoot::new(&static_dir, "/base/static-plugins"));
    }

    let signal = Arc::new(ChangeSignal::new());
    let cache = Arc::new(PluginListCache::new(config, signal.clone()));

    Fixture {
        _temp: temp,
        user_dir,
        static_dir,
        signal,
        router: plugin_router(cache),
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_list(router: &Router) -> Vec<String> {
    let (status, headers, body) = get(router, "/base/plugins").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_list_static_before_user() {
    let fx = fixture(ReloadMode::Dynamic, true);

    assert_eq!(
        get_list(&fx.router).await,
        vec!["/base/static-plugins/core", "/base/plugins/foo"]
    );
}

#[tokio::test]
async fn test_empty_list_is_json_array() {
    let fx = fixture(ReloadMode::Dynamic, false);
    fs::remove_dir_all(&fx.user_dir).unwrap();
    fx.signal.raise();

    let (status, _, body) = get(&fx.router, "/base/plugins").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn test_dynamic_list_reloads_on_signal() {
    let fx = fixture(ReloadMode::Dynamic, false);
    assert_eq!(get_list(&fx.router).await, vec!["/base/plugins/foo"]);

    write_plugin(&fx.user_dir, "zed");
    fx.signal.raise();

    assert_eq!(
        get_list(&fx.router).await,
        vec!["/base/plugins/foo", "/base/plugins/zed"]
    );
}

#[tokio::test]
async fn test_frozen_list_never_changes() {
    let fx = fixture(ReloadMode::Frozen, false);

    write_plugin(&fx.user_dir, "zed");
    fs::remove_dir_all(fx.user_dir.join("foo")).unwrap();
    fx.signal.raise();

    assert_eq!(get_list(&fx.router).await, vec!["/base/plugins/foo"]);
    assert_eq!(get_list(&fx.router).await, vec!["/base/plugins/foo"]);
}

#[tokio::test]
async fn test_user_plugin_files_are_not_cached_in_dynamic_mode() {
    let fx = fixture(ReloadMode::Dynamic, false);

    let (status, headers, body) = get(&fx.router, "/base/plugins/foo/main.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"// foo");
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
    assert_eq!(headers.get(header::EXPIRES).unwrap(), "0");
}

#[tokio::test]
async fn test_user_plugin_files_cacheable_in_frozen_mode() {
    let fx = fixture(ReloadMode::Frozen, false);

    let (status, headers, body) = get(&fx.router, "/base/plugins/foo/main.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"// foo");
    assert!(headers.get(header::CACHE_CONTROL).is_none());
    assert!(headers.get(header::PRAGMA).is_none());
}

#[tokio::test]
async fn test_static_plugin_files() {
    let fx = fixture(ReloadMode::Dynamic, true);
    fs::write(fx.static_dir.join("core/extra.js"), "extra").unwrap();

    let (status, headers, body) = get(&fx.router, "/base/static-plugins/core/extra.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"extra");
    assert!(headers.get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn test_static_route_absent_without_static_dir() {
    let fx = fixture(ReloadMode::Dynamic, false);

    let (status, _, _) = get(&fx.router, "/base/static-plugins/core/main.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_plugin_file_is_404() {
    let fx = fixture(ReloadMode::Dynamic, false);

    let (status, _, _) = get(&fx.router, "/base/plugins/foo/nope.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_parent_segments_do_not_escape_root() {
    let fx = fixture(ReloadMode::Dynamic, true);

    let (status, _, body) = get(&fx.router, "/base/plugins/../static-plugins/core/main.js").await;
    assert_ne!(status, StatusCode::OK);
    assert_ne!(body, b"// core");
}
