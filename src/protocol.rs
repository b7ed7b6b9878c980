// mcp-hub-proxy -- protocol
// JSON-RPC 2.0 envelopes and the typed view of an inbound MCP call.
//
// Params and results stay as raw `serde_json::Value` so the proxy never has
// to know about backend-specific protocol extensions. A member that is
// present with a `null` value is kept distinct from an absent one.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// MCP protocol revision spoken to backends and advertised to clients.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name the proxy uses in `clientInfo` / `serverInfo`.
pub const PROXY_NAME: &str = "mcp-hub-proxy";

pub const PROXY_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Error codes ─────────────────────────────────────────────────────────────

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

fn default_version() -> String {
    "2.0".to_string()
}

/// `Some` whenever the member is present, `Some(Value::Null)` included.
/// Absent members fall back to `None` through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ── Request ─────────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request envelope. A missing `id` marks a notification; an
/// explicit `"id": null` is still a call and is forwarded as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id: Some(id.into()),
            method: method.to_string(),
            params: Some(params),
        }
    }

    /// Same as `new` without an `id`.
    pub fn notification(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id: None,
            method: method.to_string(),
            params: Some(params),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo back in a synthesized response (`null` for notifications).
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// String-valued param by key, ignoring empty strings.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

// ── Response ────────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 2.0 response envelope, used both for synthesized responses and
/// for bodies relayed from backends. Relayed bodies serialize back to the
/// same members: `"result": null` stays, unknown top-level members ride
/// along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
            extra: Map::new(),
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            extra: Map::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Array stored under `result.<field>`, empty when absent.
    pub fn result_items(&self, field: &str) -> Vec<Value> {
        self.result
            .as_ref()
            .and_then(|r| r.get(field))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
    }
}

// ── Typed call ──────────────────────────────────────────────────────────────

/// An inbound call classified by how the dispatcher routes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCall {
    Initialize,
    ListTools,
    ListResources,
    /// `tools/call`; `None` when `params.name` is missing.
    CallTool(Option<String>),
    /// `resources/read`; `None` when `params.uri` is missing.
    ReadResource(Option<String>),
    /// Anything else (prompts, ping, vendor extensions).
    Other(String),
}

impl ProxyCall {
    pub fn classify(request: &JsonRpcRequest) -> Self {
        match request.method.as_str() {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ListTools,
            "resources/list" => Self::ListResources,
            "tools/call" => Self::CallTool(request.param_str("name").map(String::from)),
            "resources/read" => Self::ReadResource(request.param_str("uri").map(String::from)),
            other => Self::Other(other.to_string()),
        }
    }
}

/// `initialize` request the proxy sends to a backend.
pub fn handshake_request(id: String, capabilities: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(
        id,
        "initialize",
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "clientInfo": { "name": PROXY_NAME, "version": PROXY_VERSION },
        }),
    )
}
