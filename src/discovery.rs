// mcp-hub-proxy -- discovery
// Backend discovery: descriptor sources and the structural `discover` step.
//
// Nothing here talks to a backend. An unreachable endpoint is discovered
// like any other; reachability is the harvester's business.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::backend::{BackendEndpoint, BackendRecord};
use crate::error::ProxyError;

/// Compose service name of the proxy itself, never treated as a backend.
const PROXY_SERVICE: &str = "mcp-proxy";

/// Anything that can enumerate backend endpoints.
pub trait BackendSource: Send + Sync {
    fn endpoints(&self) -> Result<Vec<BackendEndpoint>, ProxyError>;
}

/// One unstarted record per endpoint. Duplicate names collapse: the record
/// keeps the position of the first occurrence and the endpoint of the last.
pub fn discover(endpoints: Vec<BackendEndpoint>) -> Vec<BackendRecord> {
    let mut records: Vec<BackendRecord> = Vec::with_capacity(endpoints.len());
    for ep in endpoints {
        match records.iter_mut().find(|r| r.name == ep.name) {
            Some(existing) => {
                tracing::debug!(
                    "discovery: '{}' listed again, endpoint {} replaces {}",
                    ep.name,
                    ep.endpoint,
                    existing.endpoint
                );
                existing.endpoint = ep.endpoint;
            }
            None => records.push(BackendRecord::new(ep.name, ep.endpoint)),
        }
    }
    records
}

// ── Static list ─────────────────────────────────────────────────────────────

/// Fixed in-memory list, for embedders that already know their backends.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<BackendEndpoint>);

impl BackendSource for StaticSource {
    fn endpoints(&self) -> Result<Vec<BackendEndpoint>, ProxyError> {
        Ok(self.0.clone())
    }
}

// ── name=url list ───────────────────────────────────────────────────────────

/// `name=url[,name=url...]`, as given in `MCP_PROXY_BACKENDS`.
#[derive(Debug, Clone)]
pub struct ListSource(pub String);

impl BackendSource for ListSource {
    fn endpoints(&self) -> Result<Vec<BackendEndpoint>, ProxyError> {
        parse_backend_list(&self.0)
    }
}

pub fn parse_backend_list(raw: &str) -> Result<Vec<BackendEndpoint>, ProxyError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, url) = entry.split_once('=').ok_or_else(|| {
                ProxyError::Discovery(format!("expected name=url, got '{entry}'"))
            })?;
            let (name, url) = (name.trim(), url.trim());
            if name.is_empty() || url.is_empty() {
                return Err(ProxyError::Discovery(format!(
                    "empty name or url in '{entry}'"
                )));
            }
            Ok(BackendEndpoint::new(name, url))
        })
        .collect()
}

// ── docker-compose file ─────────────────────────────────────────────────────

/// Reads backends from a docker-compose file: each service's first
/// `"host:container"` port mapping becomes `http://localhost:<host>`.
#[derive(Debug, Clone)]
pub struct ComposeFileSource {
    path: PathBuf,
}

impl ComposeFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: serde_yaml::Mapping,
}

impl BackendSource for ComposeFileSource {
    fn endpoints(&self) -> Result<Vec<BackendEndpoint>, ProxyError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            ProxyError::Discovery(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let endpoints = parse_compose(&raw)?;
        tracing::info!(
            "discovery: {} backend(s) found in {}",
            endpoints.len(),
            self.path.display()
        );
        Ok(endpoints)
    }
}

pub fn parse_compose(raw: &str) -> Result<Vec<BackendEndpoint>, ProxyError> {
    let compose: ComposeFile = serde_yaml::from_str(raw)
        .map_err(|e| ProxyError::Discovery(format!("invalid compose file: {e}")))?;

    let mut endpoints = Vec::new();
    for (key, service) in &compose.services {
        let Some(name) = key.as_str() else { continue };
        if name == PROXY_SERVICE {
            continue;
        }
        let host_port = service
            .get("ports")
            .and_then(|p| p.as_sequence())
            .and_then(|ports| ports.iter().filter_map(|p| p.as_str()).find_map(host_port));
        match host_port {
            Some(port) => {
                let url = format!("http://localhost:{port}");
                tracing::info!("discovery: found '{}' at {}", name, url);
                endpoints.push(BackendEndpoint::new(name, url));
            }
            None => tracing::debug!("discovery: '{}' publishes no host port, skipped", name),
        }
    }
    Ok(endpoints)
}

/// Host side of `"host:container"` or `"ip:host:container"`.
fn host_port(mapping: &str) -> Option<&str> {
    let parts: Vec<&str> = mapping.split(':').collect();
    let port = match parts.as_slice() {
        [host, _container] => *host,
        [_ip, host, _container] => *host,
        _ => return None,
    };
    let port = port.trim();
    (!port.is_empty()).then_some(port)
}
