// mcp-hub-proxy -- routing
// Routing table: which backend currently owns a tool name or resource URI.
//
// Last writer wins. Entries may point at an unhealthy backend; the
// dispatcher corrects them lazily when a fallback succeeds elsewhere.

use std::collections::HashMap;

/// The two kinds of named capability the proxy routes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Tool,
    Resource,
}

impl RouteKind {
    /// Method that lists items of this kind.
    pub fn list_method(self) -> &'static str {
        match self {
            RouteKind::Tool => "tools/list",
            RouteKind::Resource => "resources/list",
        }
    }

    /// Field of the list result holding the items.
    pub fn list_field(self) -> &'static str {
        match self {
            RouteKind::Tool => "tools",
            RouteKind::Resource => "resources",
        }
    }

    /// Field of an item (and of call params) that names it.
    pub fn key_field(self) -> &'static str {
        match self {
            RouteKind::Tool => "name",
            RouteKind::Resource => "uri",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RouteKind::Tool => "Tool",
            RouteKind::Resource => "Resource",
        }
    }

    pub fn missing_target_message(self) -> &'static str {
        match self {
            RouteKind::Tool => "Invalid params: tool name required",
            RouteKind::Resource => "Invalid params: resource uri required",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    tool_owner: HashMap<String, String>,
    resource_owner: HashMap<String, String>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: RouteKind) -> &HashMap<String, String> {
        match kind {
            RouteKind::Tool => &self.tool_owner,
            RouteKind::Resource => &self.resource_owner,
        }
    }

    fn map_mut(&mut self, kind: RouteKind) -> &mut HashMap<String, String> {
        match kind {
            RouteKind::Tool => &mut self.tool_owner,
            RouteKind::Resource => &mut self.resource_owner,
        }
    }

    pub fn owner(&self, kind: RouteKind, key: &str) -> Option<&str> {
        self.map(kind).get(key).map(String::as_str)
    }

    /// Record `backend` as the owner of `key`, overwriting any prior owner.
    pub fn record(&mut self, kind: RouteKind, key: &str, backend: &str) {
        self.map_mut(kind).insert(key.to_string(), backend.to_string());
    }

    /// Replace every entry `backend` owns for `kind` with `keys`.
    ///
    /// Entries owned by other backends survive unless one of `keys` takes
    /// them over.
    pub fn replace_backend<I>(&mut self, kind: RouteKind, backend: &str, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        let map = self.map_mut(kind);
        map.retain(|_, owner| owner != backend);
        for key in keys {
            map.insert(key, backend.to_string());
        }
    }

    /// Keys currently owned by `backend`, sorted.
    pub fn owned_by(&self, kind: RouteKind, backend: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .map(kind)
            .iter()
            .filter(|(_, owner)| owner.as_str() == backend)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self, kind: RouteKind) -> usize {
        self.map(kind).len()
    }
}
