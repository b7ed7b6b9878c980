// mcp-hub-proxy -- mcp/client
// JSON-RPC 2.0 over HTTP to backend MCP servers.
//
// Every call carries an absolute timeout. For a call, anything short of a
// 2xx response whose body parses as a JSON-RPC object is a `TransportError`;
// a well-formed `error` envelope is returned as `Ok` and left to the caller.
// A notification only needs the 2xx: backends usually answer 202 with an
// empty body.

use std::time::Duration;

use reqwest::Client;

use crate::error::TransportError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

/// Longest slice of an error body kept in logs.
const ERROR_BODY_PREVIEW: usize = 300;

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
}

impl BackendClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client })
    }

    /// POST `request` to `endpoint`, giving up after `timeout`.
    pub async fn call(
        &self,
        endpoint: &str,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, TransportError> {
        // reqwest's own timeout covers the body read; the outer bound also
        // catches a stalled connect when `timeout` < connect_timeout.
        match tokio::time::timeout(timeout, self.send(endpoint, request, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    /// POST a notification. Any 2xx status is a delivery, whatever the body.
    pub async fn notify(
        &self,
        endpoint: &str,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let delivery = async {
            let response = self.post(endpoint, request, timeout).await?;
            // Drain so the connection goes back to the pool.
            response.bytes().await?;
            Ok::<(), TransportError>(())
        };
        match tokio::time::timeout(timeout, delivery).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    /// Send and reject non-2xx statuses; the body is left unread.
    async fn post(
        &self,
        endpoint: &str,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::debug!(
                "MCP: {} answered HTTP {}: {}",
                endpoint,
                status,
                truncate_str(&body_text, ERROR_BODY_PREVIEW)
            );
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, TransportError> {
        let response = self.post(endpoint, request, timeout).await?;
        let body = response.bytes().await?;
        serde_json::from_slice::<JsonRpcResponse>(&body)
            .map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let boundary = s
            .char_indices()
            .take_while(|(i, _)| *i < max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(max_len);
        format!("{}...", &s[..boundary])
    }
}
