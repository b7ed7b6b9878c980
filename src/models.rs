// mcp-hub-proxy -- models
// Introspection views rendered by the HTTP front end.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub url: String,
    pub healthy: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub error_count: u32,
    /// Whether a handshake ever produced a non-empty capability set.
    pub capabilities: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub proxy_status: String,
    pub total_servers: usize,
    pub healthy_servers: usize,
    pub servers: BTreeMap<String, ServerStatus>,
    pub tool_mappings: usize,
    pub resource_mappings: usize,
}

// ---------------------------------------------------------------------------
// Servers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub url: String,
    pub healthy: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub error_count: u32,
    pub capabilities: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServersResponse {
    pub servers: Vec<ServerInfo>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub status: String,
    pub servers: usize,
    pub healthy_servers: usize,
    /// Names of the healthy backends, in discovery order.
    pub server_list: Vec<String>,
}
