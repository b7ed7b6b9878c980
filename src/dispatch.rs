// mcp-hub-proxy -- dispatch
// Per-method routing of inbound calls.
//
// - `initialize`: answered locally from the merged capabilities
// - `tools/list`, `resources/list`: fan out to every healthy backend, wait
//   for all, merge
// - `tools/call`, `resources/read`: routed to the known owner, falling back
//   to every healthy backend in turn
// - anything else: first healthy backend that answers without error
// - notifications (no `id`): delivered to every healthy backend, no reply

use std::collections::HashMap;

use futures_util::future::join_all;
use serde_json::{json, Map, Value};

use crate::backend::BackendEndpoint;
use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, ProxyCall, INVALID_PARAMS, METHOD_NOT_FOUND,
    PROTOCOL_VERSION, PROXY_NAME, PROXY_VERSION,
};
use crate::routing::RouteKind;
use crate::state::ProxyState;

pub async fn dispatch(state: &ProxyState, request: &JsonRpcRequest) -> JsonRpcResponse {
    tracing::debug!(method = %request.method, "dispatch: incoming call");

    match ProxyCall::classify(request) {
        ProxyCall::Initialize => aggregate_initialize(state, request).await,
        ProxyCall::ListTools => fan_out_collect(state, request, RouteKind::Tool).await,
        ProxyCall::ListResources => fan_out_collect(state, request, RouteKind::Resource).await,
        ProxyCall::CallTool(name) => direct_route(state, request, RouteKind::Tool, name).await,
        ProxyCall::ReadResource(uri) => {
            direct_route(state, request, RouteKind::Resource, uri).await
        }
        ProxyCall::Other(method) => match first_success(state, request).await {
            Some((_, response)) => response,
            None => JsonRpcResponse::error(
                request.response_id(),
                METHOD_NOT_FOUND,
                format!("Method '{method}' not found on any backend"),
            ),
        },
    }
}

// ── notifications ───────────────────────────────────────────────────────────

/// Deliver a notification to every healthy backend concurrently. Returns how
/// many accepted it.
pub async fn notify(state: &ProxyState, request: &JsonRpcRequest) -> usize {
    let backends = state.healthy_backends().await;
    let accepted = join_all(backends.iter().map(|b| state.deliver(b, request)))
        .await
        .into_iter()
        .filter(|ok| *ok)
        .count();
    tracing::debug!(
        "dispatch: notification {} delivered to {}/{} backends",
        request.method,
        accepted,
        backends.len()
    );
    accepted
}

// ── initialize ──────────────────────────────────────────────────────────────

async fn aggregate_initialize(state: &ProxyState, request: &JsonRpcRequest) -> JsonRpcResponse {
    let sets = state.healthy_capabilities().await;
    tracing::info!("dispatch: aggregating capabilities from {} healthy backends", sets.len());

    JsonRpcResponse::success(
        request.response_id(),
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": merge_capabilities(&sets),
            "serverInfo": { "name": PROXY_NAME, "version": PROXY_VERSION },
        }),
    )
}

/// Per-category union. Object-valued categories are shallow-merged (later
/// backends overwrite keys); a category not yet present is taken as-is.
pub fn merge_capabilities(sets: &[Map<String, Value>]) -> Map<String, Value> {
    let mut merged = match json!({
        "tools": {},
        "resources": {},
        "prompts": {},
        "roots": { "listChanged": false },
        "sampling": {},
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for caps in sets {
        for (category, value) in caps {
            if !merged.contains_key(category) {
                merged.insert(category.clone(), value.clone());
                continue;
            }
            if let (Some(Value::Object(into)), Value::Object(from)) =
                (merged.get_mut(category), value)
            {
                for (k, v) in from {
                    into.insert(k.clone(), v.clone());
                }
            }
        }
    }
    merged
}

// ── tools/list, resources/list ──────────────────────────────────────────────

async fn fan_out_collect(
    state: &ProxyState,
    request: &JsonRpcRequest,
    kind: RouteKind,
) -> JsonRpcResponse {
    let backends = state.healthy_backends().await;
    let responses = join_all(backends.iter().map(|b| state.forward(b, request))).await;

    let mut items: Vec<Value> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut owners: Vec<(String, String)> = Vec::new();

    for (backend, response) in backends.iter().zip(responses) {
        let Some(response) = response else { continue };
        if response.is_error() {
            tracing::debug!("dispatch: '{}' rejected {}", backend.name, request.method);
            continue;
        }

        for item in response.result_items(kind.list_field()) {
            let item = tag_item(item, backend);
            let key = item
                .get(kind.key_field())
                .and_then(|k| k.as_str())
                .filter(|k| !k.is_empty())
                .map(String::from);

            match key {
                Some(key) => {
                    owners.push((key.clone(), backend.name.clone()));
                    match position.get(&key) {
                        Some(&i) => items[i] = item,
                        None => {
                            position.insert(key, items.len());
                            items.push(item);
                        }
                    }
                }
                None => items.push(item),
            }
        }
    }

    if !owners.is_empty() {
        let mut routes = state.routes.write().await;
        for (key, owner) in &owners {
            routes.record(kind, key, owner);
        }
    }

    tracing::info!(
        "dispatch: aggregated {} {} from {} backends",
        items.len(),
        kind.list_field(),
        backends.len()
    );

    let mut result = Map::new();
    result.insert(kind.list_field().to_string(), Value::Array(items));
    JsonRpcResponse::success(request.response_id(), Value::Object(result))
}

/// Stamp an item with the backend that listed it.
fn tag_item(mut item: Value, backend: &BackendEndpoint) -> Value {
    if let Some(obj) = item.as_object_mut() {
        obj.insert("_server".to_string(), Value::String(backend.name.clone()));
        obj.insert("_server_url".to_string(), Value::String(backend.endpoint.clone()));
    }
    item
}

// ── tools/call, resources/read ──────────────────────────────────────────────

async fn direct_route(
    state: &ProxyState,
    request: &JsonRpcRequest,
    kind: RouteKind,
    target: Option<String>,
) -> JsonRpcResponse {
    let Some(target) = target else {
        return JsonRpcResponse::error(
            request.response_id(),
            INVALID_PARAMS,
            kind.missing_target_message(),
        );
    };

    if let Some(owner) = state.healthy_owner(kind, &target).await {
        // The authoritative backend's answer is final, protocol errors included.
        if let Some(response) = state.forward(&owner, request).await {
            return response;
        }
        tracing::warn!(
            "dispatch: owner '{}' of {} '{}' unreachable, falling back",
            owner.name,
            kind.label().to_lowercase(),
            target
        );
    }

    match first_success(state, request).await {
        Some((backend, response)) => {
            state.routes.write().await.record(kind, &target, &backend.name);
            response
        }
        None => JsonRpcResponse::error(
            request.response_id(),
            METHOD_NOT_FOUND,
            format!("{} '{}' not found on any backend", kind.label(), target),
        ),
    }
}

// ── fallback / broadcast ────────────────────────────────────────────────────

/// Try healthy backends one at a time, in discovery order, until one answers
/// without a protocol error.
async fn first_success(
    state: &ProxyState,
    request: &JsonRpcRequest,
) -> Option<(BackendEndpoint, JsonRpcResponse)> {
    for backend in state.healthy_backends().await {
        match state.forward(&backend, request).await {
            Some(response) if !response.is_error() => return Some((backend, response)),
            Some(_) => {
                tracing::debug!("dispatch: '{}' declined {}", backend.name, request.method);
            }
            None => {}
        }
    }
    None
}
