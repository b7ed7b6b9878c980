// mcp-hub-proxy -- lib
// MCP hub proxy: aggregates many backend MCP servers behind one endpoint.
//
// Backends are discovered from a descriptor, handshaken concurrently,
// health-checked in the background, and every client call is routed, fanned
// out or broadcast according to its method.

pub mod backend;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod harvest;
pub mod health;
pub mod mcp;
pub mod models;
pub mod protocol;
pub mod proxy;
pub mod routing;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use http::{header, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use proxy::McpProxy;

/// Largest accepted request body (10 MiB).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the HTTP router around a proxy.
/// Kept out of `main()` so tests can drive it without binding a port.
pub fn create_router(proxy: Arc<McpProxy>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Protocol
        .route("/", post(handlers::mcp_endpoint))
        // Introspection
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/servers", get(handlers::servers))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(proxy)
}
