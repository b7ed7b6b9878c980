// mcp-hub-proxy -- state
// Shared proxy state.
//
// Backend records and the routing table, each behind one RwLock. Locks are
// never held across an outbound call: callers snapshot what they need, drop
// the guard, then talk to the backend.

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::backend::{BackendEndpoint, BackendRecord};
use crate::config::ProxyConfig;
use crate::error::TransportError;
use crate::mcp::BackendClient;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::routing::{RouteKind, RoutingTable};

pub struct ProxyState {
    /// Discovery order; fallback and broadcast enumerate in this order.
    pub backends: RwLock<Vec<BackendRecord>>,
    pub routes: RwLock<RoutingTable>,
    pub client: BackendClient,
    pub config: ProxyConfig,
}

impl ProxyState {
    pub fn new(config: ProxyConfig, client: BackendClient) -> Self {
        Self {
            backends: RwLock::new(Vec::new()),
            routes: RwLock::new(RoutingTable::new()),
            client,
            config,
        }
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    pub async fn all_backends(&self) -> Vec<BackendEndpoint> {
        self.backends.read().await.iter().map(BackendRecord::target).collect()
    }

    pub async fn healthy_backends(&self) -> Vec<BackendEndpoint> {
        self.backends
            .read()
            .await
            .iter()
            .filter(|b| b.healthy)
            .map(BackendRecord::target)
            .collect()
    }

    /// Capabilities of every healthy backend, in discovery order.
    pub async fn healthy_capabilities(&self) -> Vec<Map<String, Value>> {
        self.backends
            .read()
            .await
            .iter()
            .filter(|b| b.healthy)
            .map(|b| b.capabilities.clone())
            .collect()
    }

    pub async fn is_healthy(&self, name: &str) -> bool {
        self.backends
            .read()
            .await
            .iter()
            .any(|b| b.name == name && b.healthy)
    }

    /// Owner of `key` if it is known, still discovered and currently healthy.
    pub async fn healthy_owner(&self, kind: RouteKind, key: &str) -> Option<BackendEndpoint> {
        let owner = self.routes.read().await.owner(kind, key)?.to_string();
        self.backends
            .read()
            .await
            .iter()
            .find(|b| b.name == owner && b.healthy)
            .map(BackendRecord::target)
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Apply `f` to the named record under the write lock.
    pub async fn update<F>(&self, name: &str, f: F)
    where
        F: FnOnce(&mut BackendRecord),
    {
        if let Some(rec) = self.backends.write().await.iter_mut().find(|b| b.name == name) {
            f(rec);
        }
    }

    // ── Forwarding ──────────────────────────────────────────────────────

    /// Forward a call to one backend with the call timeout and book the
    /// outcome on its record. `None` means no usable response (transport
    /// failure); the backend has been marked unhealthy.
    pub async fn forward(
        &self,
        backend: &BackendEndpoint,
        request: &JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        let outcome = self
            .client
            .call(&backend.endpoint, request, self.config.call_timeout)
            .await;
        match outcome {
            Ok(response) => {
                self.book_success(backend).await;
                Some(response)
            }
            Err(e) => {
                self.book_failure(backend, request, &e).await;
                None
            }
        }
    }

    /// Deliver a notification to one backend, booked like `forward`.
    /// Returns whether the backend accepted it.
    pub async fn deliver(&self, backend: &BackendEndpoint, request: &JsonRpcRequest) -> bool {
        let outcome = self
            .client
            .notify(&backend.endpoint, request, self.config.call_timeout)
            .await;
        match outcome {
            Ok(()) => {
                self.book_success(backend).await;
                true
            }
            Err(e) => {
                self.book_failure(backend, request, &e).await;
                false
            }
        }
    }

    async fn book_success(&self, backend: &BackendEndpoint) {
        self.update(&backend.name, |rec| rec.consecutive_errors = 0)
            .await;
    }

    async fn book_failure(
        &self,
        backend: &BackendEndpoint,
        request: &JsonRpcRequest,
        error: &TransportError,
    ) {
        let was_healthy = self.is_healthy(&backend.name).await;
        self.update(&backend.name, BackendRecord::mark_down).await;
        if was_healthy {
            tracing::warn!(
                "dispatch: '{}' failed {} ({}), marked unhealthy",
                backend.name,
                request.method,
                error
            );
        } else {
            tracing::debug!(
                "dispatch: '{}' failed {}: {}",
                backend.name,
                request.method,
                error
            );
        }
    }
}
