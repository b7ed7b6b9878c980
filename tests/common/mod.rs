// mcp-hub-proxy -- tests/common
// Shared test harness: in-process mock MCP backends served by axum on
// 127.0.0.1:0, plus a helper that yields an endpoint nobody listens on.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use mcp_hub_proxy::backend::BackendEndpoint;
use mcp_hub_proxy::discovery::StaticSource;
use mcp_hub_proxy::protocol::JsonRpcRequest;
use mcp_hub_proxy::{McpProxy, ProxyConfig};

#[derive(Default)]
pub struct Counters {
    pub initialize: AtomicUsize,
    pub tools_list: AtomicUsize,
    pub resources_list: AtomicUsize,
    pub tools_call: AtomicUsize,
    pub resources_read: AtomicUsize,
    pub other: AtomicUsize,
    pub notifications: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct MockState {
    name: String,
    tools: Vec<String>,
    resources: Vec<String>,
    prompts: bool,
    capabilities: Value,
    null_initialize: bool,
    down: Arc<AtomicBool>,
    hang: Arc<AtomicBool>,
    list_delay_ms: Arc<AtomicU64>,
    counters: Arc<Counters>,
}

/// Builder for one fake backend.
pub struct MockBackend {
    name: String,
    tools: Vec<String>,
    resources: Vec<String>,
    prompts: bool,
    capabilities: Value,
    null_initialize: bool,
    down: bool,
}

impl MockBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tools: Vec::new(),
            resources: Vec::new(),
            prompts: false,
            capabilities: json!({ "tools": { "listChanged": false } }),
            null_initialize: false,
            down: false,
        }
    }

    pub fn tools(mut self, tools: &[&str]) -> Self {
        self.tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn resources(mut self, uris: &[&str]) -> Self {
        self.resources = uris.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn with_prompts(mut self) -> Self {
        self.prompts = true;
        self
    }

    pub fn capabilities(mut self, caps: Value) -> Self {
        self.capabilities = caps;
        self
    }

    /// Answer `initialize` with `"result": null`.
    pub fn null_initialize(mut self) -> Self {
        self.null_initialize = true;
        self
    }

    /// Start answering HTTP 503 to everything.
    pub fn down(mut self) -> Self {
        self.down = true;
        self
    }

    pub async fn spawn(self) -> MockHandle {
        let down = Arc::new(AtomicBool::new(self.down));
        let hang = Arc::new(AtomicBool::new(false));
        let list_delay_ms = Arc::new(AtomicU64::new(0));
        let counters = Arc::new(Counters::default());
        let state = Arc::new(MockState {
            name: self.name.clone(),
            tools: self.tools,
            resources: self.resources,
            prompts: self.prompts,
            capabilities: self.capabilities,
            null_initialize: self.null_initialize,
            down: down.clone(),
            hang: hang.clone(),
            list_delay_ms: list_delay_ms.clone(),
            counters: counters.clone(),
        });

        let app = Router::new().route("/", post(handle)).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        MockHandle {
            name: self.name,
            url: format!("http://{addr}/"),
            down,
            hang,
            list_delay_ms,
            counters,
        }
    }
}

pub struct MockHandle {
    pub name: String,
    pub url: String,
    down: Arc<AtomicBool>,
    hang: Arc<AtomicBool>,
    list_delay_ms: Arc<AtomicU64>,
    pub counters: Arc<Counters>,
}

impl MockHandle {
    pub fn endpoint(&self) -> BackendEndpoint {
        BackendEndpoint::new(&self.name, &self.url)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Stop responding at all (requests sit until the client gives up).
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Delay every `tools/list` and `resources/list` answer.
    pub fn set_list_delay(&self, delay: Duration) {
        self.list_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

fn ok(id: Value, result: Value) -> Response {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
}

fn rpc_error(id: Value, code: i64, message: &str) -> Response {
    Json(json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } }))
        .into_response()
}

async fn handle(State(mock): State<Arc<MockState>>, Json(req): Json<Value>) -> Response {
    if mock.hang.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
    if mock.down.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let c = &mock.counters;
    // Notifications are acknowledged the way MCP servers do: 202, no body.
    let Some(id) = req.get("id").cloned() else {
        c.notifications.fetch_add(1, Ordering::SeqCst);
        return StatusCode::ACCEPTED.into_response();
    };
    if matches!(req["method"].as_str(), Some("tools/list" | "resources/list")) {
        let delay = mock.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    match req["method"].as_str().unwrap_or("") {
        "initialize" => {
            c.initialize.fetch_add(1, Ordering::SeqCst);
            if mock.null_initialize {
                return ok(id, Value::Null);
            }
            ok(
                id,
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": mock.capabilities,
                    "serverInfo": { "name": mock.name, "version": "0.0.1" },
                }),
            )
        }
        "tools/list" => {
            c.tools_list.fetch_add(1, Ordering::SeqCst);
            let tools: Vec<Value> = mock
                .tools
                .iter()
                .map(|t| json!({ "name": t, "description": format!("{t} on {}", mock.name) }))
                .collect();
            ok(id, json!({ "tools": tools }))
        }
        "resources/list" => {
            c.resources_list.fetch_add(1, Ordering::SeqCst);
            let resources: Vec<Value> = mock
                .resources
                .iter()
                .map(|u| json!({ "uri": u, "name": u }))
                .collect();
            ok(id, json!({ "resources": resources }))
        }
        "tools/call" => {
            c.tools_call.fetch_add(1, Ordering::SeqCst);
            let name = req["params"]["name"].as_str().unwrap_or("");
            let listed = mock.tools.iter().any(|t| t == name);
            if listed && name == "fail" {
                return rpc_error(id, -32000, "tool exploded");
            }
            if listed && name == "void" {
                // Null result plus a non-standard top-level member.
                let body = json!({ "jsonrpc": "2.0", "id": id, "result": null, "x-trace": "t-1" });
                return Json(body).into_response();
            }
            if listed {
                let text = format!("{}:{}", mock.name, name);
                ok(id, json!({ "content": [{ "type": "text", "text": text }] }))
            } else {
                rpc_error(id, -32601, "Unknown tool")
            }
        }
        "resources/read" => {
            c.resources_read.fetch_add(1, Ordering::SeqCst);
            let uri = req["params"]["uri"].as_str().unwrap_or("");
            if mock.resources.iter().any(|u| u == uri) {
                let text = format!("{} from {}", uri, mock.name);
                ok(id, json!({ "contents": [{ "uri": uri, "text": text }] }))
            } else {
                rpc_error(id, -32002, "Resource not found")
            }
        }
        "prompts/list" if mock.prompts => {
            c.other.fetch_add(1, Ordering::SeqCst);
            ok(id, json!({ "prompts": [{ "name": format!("{}-prompt", mock.name) }] }))
        }
        _ => {
            c.other.fetch_add(1, Ordering::SeqCst);
            rpc_error(id, -32601, "Method not found")
        }
    }
}

/// A loopback URL with nothing listening behind it.
pub fn unreachable_endpoint(name: &str) -> BackendEndpoint {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    BackendEndpoint::new(name, format!("http://{addr}/"))
}

/// Short timeouts and a monitor interval long enough that tests drive
/// health passes explicitly.
pub fn test_config() -> ProxyConfig {
    ProxyConfig::default()
        .with_handshake_timeout(Duration::from_millis(500))
        .with_call_timeout(Duration::from_millis(800))
        .with_health_interval(Duration::from_secs(3600))
}

pub fn proxy_for(endpoints: Vec<BackendEndpoint>, config: ProxyConfig) -> McpProxy {
    McpProxy::new(config, Box::new(StaticSource(endpoints))).unwrap()
}

pub async fn started_proxy(endpoints: Vec<BackendEndpoint>) -> McpProxy {
    let proxy = proxy_for(endpoints, test_config());
    proxy.start().await.unwrap();
    proxy
}

pub fn call(id: Value, method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(id, method, params)
}

pub fn notification(method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest::notification(method, params)
}
