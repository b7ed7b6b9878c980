// mcp-hub-proxy -- mcp
// MCP wire access to backend servers.
//
// Protocol: JSON-RPC 2.0 over HTTP POST, one request per call.
// Reference: <https://spec.modelcontextprotocol.io/2024-11-05/>

pub mod client;

pub use client::BackendClient;
