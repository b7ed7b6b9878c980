// mcp-hub-proxy -- harvest
// Handshake and capability harvesting for a single backend.
//
// A full harvest is `initialize` followed by `tools/list` and
// `resources/list`; a probe is the bare `initialize`. Neither ever touches
// another backend's record.

use serde_json::{json, Value};

use crate::backend::{BackendEndpoint, BackendRecord};
use crate::error::{HarvestError, TransportError};
use crate::protocol::{handshake_request, JsonRpcRequest};
use crate::routing::RouteKind;
use crate::state::ProxyState;

/// Handshake, rebuild this backend's routes, then adopt capabilities and
/// come up. The record only turns healthy once both listings are done.
///
/// On handshake failure the record goes unhealthy and keeps whatever
/// capabilities and routes an earlier harvest left behind. An `initialize`
/// reply of `"result": null` is accepted with an empty capability set.
pub async fn harvest(state: &ProxyState, backend: &BackendEndpoint) -> Result<(), HarvestError> {
    let request = handshake_request(
        format!("init_{}", backend.name),
        json!({ "roots": { "listChanged": false }, "sampling": {} }),
    );

    let outcome = match state
        .client
        .call(&backend.endpoint, &request, state.config.handshake_timeout)
        .await
    {
        Ok(resp) => match (resp.error, resp.result) {
            (Some(err), _) => Err(HarvestError::Rejected {
                code: err.code,
                message: err.message,
            }),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(HarvestError::MissingResult),
        },
        Err(e) => Err(HarvestError::Transport(e)),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            state
                .update(&backend.name, |rec| {
                    rec.mark_down();
                    rec.touch();
                })
                .await;
            tracing::warn!("harvest: '{}' initialize failed: {}", backend.name, e);
            return Err(e);
        }
    };

    let capabilities = result
        .get("capabilities")
        .and_then(|c| c.as_object())
        .cloned()
        .unwrap_or_default();

    let tools = refresh_routes(state, backend, RouteKind::Tool).await;
    let resources = refresh_routes(state, backend, RouteKind::Resource).await;
    state
        .update(&backend.name, move |rec| rec.mark_up(capabilities))
        .await;
    tracing::info!(
        "harvest: '{}' initialized ({} tools, {} resources)",
        backend.name,
        tools.map_or_else(|| "?".to_string(), |n| n.to_string()),
        resources.map_or_else(|| "?".to_string(), |n| n.to_string()),
    );
    Ok(())
}

/// Lightweight liveness check: `initialize` with empty client capabilities
/// under the handshake timeout. Any parseable JSON-RPC reply counts as alive.
pub async fn probe(state: &ProxyState, backend: &BackendEndpoint) -> Result<(), TransportError> {
    let request = handshake_request(
        format!("health_{}_{}", backend.name, chrono::Utc::now().timestamp()),
        json!({}),
    );
    state
        .client
        .call(&backend.endpoint, &request, state.config.handshake_timeout)
        .await
        .map(|_| ())
}

/// List one kind of item from `backend` and make it the sole owner of
/// exactly those keys among its own entries. Returns the number of keys, or
/// `None` when the listing failed and the routes were left untouched.
async fn refresh_routes(
    state: &ProxyState,
    backend: &BackendEndpoint,
    kind: RouteKind,
) -> Option<usize> {
    let request = JsonRpcRequest::new(
        format!("{}_{}", kind.list_field(), backend.name),
        kind.list_method(),
        json!({}),
    );

    let response = match state
        .client
        .call(&backend.endpoint, &request, state.config.call_timeout)
        .await
    {
        Ok(resp) if !resp.is_error() => resp,
        Ok(resp) => {
            tracing::debug!(
                "harvest: '{}' rejected {}: {:?}",
                backend.name,
                kind.list_method(),
                resp.error.map(|e| e.message)
            );
            return None;
        }
        Err(e) => {
            tracing::debug!("harvest: '{}' {} failed: {}", backend.name, kind.list_method(), e);
            return None;
        }
    };

    let keys = item_keys(&response.result_items(kind.list_field()), kind);
    let count = keys.len();
    state
        .routes
        .write()
        .await
        .replace_backend(kind, &backend.name, keys);
    Some(count)
}

/// The routing key (`name` / `uri`) of every item that has one.
pub fn item_keys(items: &[Value], kind: RouteKind) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.get(kind.key_field()))
        .filter_map(|key| key.as_str())
        .filter(|key| !key.is_empty())
        .map(String::from)
        .collect()
}

/// Touch-and-count bookkeeping after a successful probe of a healthy backend.
pub(crate) fn record_probe_ok(rec: &mut BackendRecord) {
    rec.consecutive_errors = 0;
    rec.touch();
}
