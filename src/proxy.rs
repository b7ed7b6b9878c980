// mcp-hub-proxy -- proxy
// The aggregator façade: owns all proxy state and exposes the lifecycle
// (`start` / `stop`), the call entry point and the introspection views.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ProxyConfig;
use crate::discovery::{self, BackendSource};
use crate::error::ProxyError;
use crate::mcp::BackendClient;
use crate::models::{HealthSummary, ProxyStatus, ServerInfo, ServerStatus};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST};
use crate::routing::RouteKind;
use crate::state::ProxyState;
use crate::{dispatch, harvest, health};

pub struct McpProxy {
    state: Arc<ProxyState>,
    source: Box<dyn BackendSource>,
    started: AtomicBool,
    cancel: CancellationToken,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl McpProxy {
    pub fn new(config: ProxyConfig, source: Box<dyn BackendSource>) -> Result<Self, ProxyError> {
        let client = BackendClient::new()?;
        Ok(Self {
            state: Arc::new(ProxyState::new(config, client)),
            source,
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            monitor: Mutex::new(None),
        })
    }

    /// Proxy configured entirely from `config`, including its descriptor.
    pub fn from_config(config: ProxyConfig) -> Result<Self, ProxyError> {
        let source = config.backend_source();
        Self::new(config, source)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Discover, harvest every backend concurrently, then start the health
    /// monitor. Returns once every initial harvest attempt has finished;
    /// unreachable backends simply start out unhealthy.
    pub async fn start(&self) -> Result<(), ProxyError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ProxyError::AlreadyStarted);
        }

        let records = match self.source.endpoints() {
            Ok(endpoints) => discovery::discover(endpoints),
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(e);
            }
        };
        if records.is_empty() {
            self.started.store(false, Ordering::Release);
            return Err(ProxyError::NoBackends);
        }
        tracing::info!("proxy: discovered {} backend(s)", records.len());
        *self.state.backends.write().await = records;

        let backends = self.state.all_backends().await;
        join_all(backends.iter().map(|b| harvest::harvest(&self.state, b))).await;

        let healthy = self.state.healthy_backends().await.len();
        tracing::info!(
            "proxy: started, {}/{} backends healthy",
            healthy,
            backends.len()
        );

        let handle = health::spawn(self.state.clone(), self.cancel.clone());
        *self.monitor.lock().await = Some(handle);
        Ok(())
    }

    /// Cancel the health monitor and wait for it to exit. Safe to call more
    /// than once.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.monitor.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("proxy: health monitor ended abnormally: {}", e);
            }
            tracing::info!("proxy: stopped");
        }
    }

    // ── Calls ───────────────────────────────────────────────────────────

    /// Route one decoded call. Backend failures never escape as anything but
    /// a JSON-RPC error response.
    ///
    /// `request` must carry an `id`; a notification is answered `-32600`
    /// here without reaching any backend. Use `handle_message` when the
    /// input may be either.
    pub async fn handle_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        if request.is_notification() {
            return JsonRpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: notifications take no response",
            );
        }
        dispatch::dispatch(&self.state, request).await
    }

    /// Route a call or a notification. Notifications go to every healthy
    /// backend and produce no response.
    pub async fn handle_message(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            dispatch::notify(&self.state, request).await;
            return None;
        }
        Some(dispatch::dispatch(&self.state, request).await)
    }

    /// Run one health-monitor pass immediately.
    pub async fn check_health(&self) {
        health::check_all(&self.state).await;
    }

    // ── Introspection ───────────────────────────────────────────────────

    pub async fn status(&self) -> ProxyStatus {
        let backends = self.state.backends.read().await;
        let routes = self.state.routes.read().await;

        ProxyStatus {
            proxy_status: "running".to_string(),
            total_servers: backends.len(),
            healthy_servers: backends.iter().filter(|b| b.healthy).count(),
            servers: backends
                .iter()
                .map(|b| {
                    (
                        b.name.clone(),
                        ServerStatus {
                            url: b.endpoint.clone(),
                            healthy: b.healthy,
                            last_check: b.last_checked_at,
                            error_count: b.consecutive_errors,
                            capabilities: b.has_capabilities(),
                        },
                    )
                })
                .collect(),
            tool_mappings: routes.len(RouteKind::Tool),
            resource_mappings: routes.len(RouteKind::Resource),
        }
    }

    pub async fn servers(&self) -> Vec<ServerInfo> {
        self.state
            .backends
            .read()
            .await
            .iter()
            .map(|b| ServerInfo {
                name: b.name.clone(),
                url: b.endpoint.clone(),
                healthy: b.healthy,
                last_check: b.last_checked_at,
                error_count: b.consecutive_errors,
                capabilities: b.capabilities.clone(),
            })
            .collect()
    }

    pub async fn health(&self) -> HealthSummary {
        let backends = self.state.backends.read().await;
        let server_list: Vec<String> = backends
            .iter()
            .filter(|b| b.healthy)
            .map(|b| b.name.clone())
            .collect();
        HealthSummary {
            status: "healthy".to_string(),
            servers: backends.len(),
            healthy_servers: server_list.len(),
            server_list,
        }
    }

    /// Backend currently recorded as owning `key`.
    pub async fn owner(&self, kind: RouteKind, key: &str) -> Option<String> {
        self.state
            .routes
            .read()
            .await
            .owner(kind, key)
            .map(String::from)
    }

    /// Keys of `kind` currently routed to `backend`, sorted.
    pub async fn routes_of(&self, kind: RouteKind, backend: &str) -> Vec<String> {
        self.state.routes.read().await.owned_by(kind, backend)
    }
}

impl Drop for McpProxy {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
