// mcp-hub-proxy -- config
// Proxy configuration, loaded from the environment (`.env` honoured).

use std::path::PathBuf;
use std::time::Duration;

use crate::discovery::{BackendSource, ComposeFileSource, ListSource};
use crate::error::ProxyError;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;
const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub compose_file: PathBuf,
    /// Explicit `name=url,...` list; takes precedence over the compose file.
    pub backends: Option<String>,
    pub health_interval: Duration,
    /// Bound for `initialize` handshakes and health probes.
    pub handshake_timeout: Duration,
    /// Bound for every other forwarded call.
    pub call_timeout: Duration,
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            compose_file: PathBuf::from(DEFAULT_COMPOSE_FILE),
            backends: None,
            health_interval: Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl ProxyConfig {
    /// Load from process environment.
    ///
    /// - `MCP_PROXY_PORT` (or `PORT`), `MCP_PROXY_HOST`
    /// - `MCP_PROXY_COMPOSE_FILE`, `MCP_PROXY_BACKENDS`
    /// - `MCP_PROXY_HEALTH_INTERVAL_SECS`, `MCP_PROXY_HANDSHAKE_TIMEOUT_SECS`,
    ///   `MCP_PROXY_CALL_TIMEOUT_SECS`
    /// - `MCP_PROXY_LOG_LEVEL`
    pub fn from_env() -> Result<Self, ProxyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProxyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("MCP_PROXY_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ProxyError::Config(format!("port must be 0-65535, got '{raw}'")))?,
            None => defaults.port,
        };

        Ok(Self {
            host: get("MCP_PROXY_HOST").unwrap_or(defaults.host),
            port,
            compose_file: get("MCP_PROXY_COMPOSE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.compose_file),
            backends: get("MCP_PROXY_BACKENDS"),
            health_interval: secs(
                &get,
                "MCP_PROXY_HEALTH_INTERVAL_SECS",
                defaults.health_interval,
            )?,
            handshake_timeout: secs(
                &get,
                "MCP_PROXY_HANDSHAKE_TIMEOUT_SECS",
                defaults.handshake_timeout,
            )?,
            call_timeout: secs(&get, "MCP_PROXY_CALL_TIMEOUT_SECS", defaults.call_timeout)?,
            log_level: get("MCP_PROXY_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Descriptor the proxy discovers backends from.
    pub fn backend_source(&self) -> Box<dyn BackendSource> {
        match &self.backends {
            Some(list) => Box::new(ListSource(list.clone())),
            None => Box::new(ComposeFileSource::new(self.compose_file.clone())),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn secs<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ProxyError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(Duration::from_secs(n)),
            _ => Err(ProxyError::Config(format!(
                "{key} must be a positive integer, got '{raw}'"
            ))),
        },
    }
}
