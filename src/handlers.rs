// mcp-hub-proxy -- handlers
// HTTP front end: protocol endpoint and introspection views.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::models::{HealthSummary, ProxyStatus, ServersResponse};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, PARSE_ERROR};
use crate::proxy::McpProxy;

/// POST /: one JSON-RPC message, routed through the proxy.
///
/// An undecodable envelope is answered 400 and a notification 202 with an
/// empty body; every routing outcome, including "no backend could serve
/// this", is a 200 with a JSON-RPC body.
pub async fn mcp_endpoint(State(proxy): State<Arc<McpProxy>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("http: unparsable request body: {}", e);
            return bad_request(JsonRpcResponse::error(Value::Null, PARSE_ERROR, "Parse error"));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return bad_request(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid Request: {e}"),
            ));
        }
    };

    if request.jsonrpc != "2.0" {
        return bad_request(JsonRpcResponse::error(
            id,
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ));
    }

    match proxy.handle_message(&request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

fn bad_request(response: JsonRpcResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(response)).into_response()
}

/// GET /health: counts plus the names of healthy backends.
pub async fn health(State(proxy): State<Arc<McpProxy>>) -> Json<HealthSummary> {
    Json(proxy.health().await)
}

/// GET /status: full per-backend status and routing table sizes.
pub async fn status(State(proxy): State<Arc<McpProxy>>) -> Json<ProxyStatus> {
    Json(proxy.status().await)
}

/// GET /servers: per-backend detail including capability sets.
pub async fn servers(State(proxy): State<Arc<McpProxy>>) -> Json<ServersResponse> {
    Json(ServersResponse {
        servers: proxy.servers().await,
    })
}
