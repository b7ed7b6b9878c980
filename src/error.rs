// mcp-hub-proxy -- error
// Error types for backend calls and proxy lifecycle.

use std::time::Duration;

/// Failure to get a usable JSON-RPC body back from a backend.
///
/// Any of these marks the backend unhealthy; none of them is ever relayed to
/// the client verbatim.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no response within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("response is not a JSON-RPC object: {0}")]
    InvalidBody(String),
}

/// Why a handshake did not bring a backend up.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("initialize rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("initialize response carried no result")]
    MissingResult,
}

/// Errors surfaced by `McpProxy::start` and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("No backends discovered")]
    NoBackends,

    #[error("Proxy already started")]
    AlreadyStarted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
