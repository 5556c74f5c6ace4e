//! HTTP surface: the plugin list endpoint and plugin file serving.

mod routes;
mod server;

pub use routes::plugin_router;
pub use server::{serve_http, start_plugin_watch};
