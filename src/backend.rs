// mcp-hub-proxy -- backend
// In-memory record of one backend MCP server and its observed state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `(name, endpoint)` pair as produced by a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEndpoint {
    pub name: String,
    pub endpoint: String,
}

impl BackendEndpoint {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendRecord {
    pub name: String,
    pub endpoint: String,
    pub healthy: bool,
    /// Time of the most recent handshake or probe attempt.
    pub last_checked_at: Option<DateTime<Utc>>,
    /// `result.capabilities` from the last successful handshake.
    pub capabilities: Map<String, Value>,
    pub consecutive_errors: u32,
}

impl BackendRecord {
    /// Unstarted record: not healthy until a handshake succeeds.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            healthy: false,
            last_checked_at: None,
            capabilities: Map::new(),
            consecutive_errors: 0,
        }
    }

    pub fn target(&self) -> BackendEndpoint {
        BackendEndpoint::new(&self.name, &self.endpoint)
    }

    pub fn has_capabilities(&self) -> bool {
        !self.capabilities.is_empty()
    }

    /// Successful handshake: adopt capabilities and come up.
    pub fn mark_up(&mut self, capabilities: Map<String, Value>) {
        self.capabilities = capabilities;
        self.healthy = true;
        self.consecutive_errors = 0;
        self.last_checked_at = Some(Utc::now());
    }

    /// Failed interaction. Capabilities are kept.
    pub fn mark_down(&mut self) {
        self.healthy = false;
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }

    pub fn touch(&mut self) {
        self.last_checked_at = Some(Utc::now());
    }
}
