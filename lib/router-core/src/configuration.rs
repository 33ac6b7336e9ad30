//! Routing model published to the proxy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight assigned to every discovered server
pub const DEFAULT_WEIGHT: u32 = 1;

/// Backends and frontends discovered in one reconciliation cycle.
///
/// Both maps are keyed by route identity (`host + path`), so every frontend
/// has exactly one backend under the same key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub backends: BTreeMap<String, Backend>,
    pub frontends: BTreeMap<String, Frontend>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    /// Servers keyed by a stable identity (Service or Pod UID)
    pub servers: BTreeMap<String, Server>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    pub weight: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontend {
    /// Key of the backend this frontend dispatches to
    pub backend: String,
    /// Match rules keyed by the matched value
    pub routes: BTreeMap<String, Route>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub rule: String,
}

/// A configuration tagged with the provider that produced it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMessage {
    pub provider_name: String,
    pub configuration: Configuration,
}

/// Route identity for a host and path
pub fn route_key(host: &str, path: &str) -> String {
    format!("{}{}", host, path)
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a backend/frontend pair exists for `key` and return the frontend
    pub fn ensure_route(&mut self, key: &str) -> &mut Frontend {
        self.backends.entry(key.to_string()).or_default();
        self.frontends
            .entry(key.to_string())
            .or_insert_with(|| Frontend {
                backend: key.to_string(),
                routes: BTreeMap::new(),
            })
    }

    /// Add or replace the server `id` in the backend at `key`
    pub fn upsert_server(&mut self, key: &str, id: impl Into<String>, url: impl Into<String>) {
        self.backends
            .entry(key.to_string())
            .or_default()
            .servers
            .insert(id.into(), Server::new(url));
    }

    pub fn server_count(&self) -> usize {
        self.backends.values().map(|b| b.servers.len()).sum()
    }
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            weight: DEFAULT_WEIGHT,
        }
    }
}

impl Frontend {
    pub fn add_host_rule(&mut self, host: &str) {
        self.routes
            .entry(host.to_string())
            .or_insert_with(|| Route::host(host));
    }

    pub fn add_path_rule(&mut self, path: &str) {
        self.routes.insert(path.to_string(), Route::path(path));
    }
}

impl Route {
    pub fn host(host: &str) -> Self {
        Self {
            rule: format!("Host:{}", host),
        }
    }

    pub fn path(path: &str) -> Self {
        Self {
            rule: format!("Path:{}", path),
        }
    }
}

impl ConfigMessage {
    pub fn new(provider_name: impl Into<String>, configuration: Configuration) -> Self {
        Self {
            provider_name: provider_name.into(),
            configuration,
        }
    }
}
