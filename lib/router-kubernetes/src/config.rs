//! Provider configuration

use anyhow::Context;
use router_core::predicate::ResourceFilter;
use router_core::{CoreError, EndpointResolution, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Settings for the Kubernetes provider.
///
/// Loaded from YAML, then overridden by `ROUTER_*` environment variables.
/// Credentials come from the kubeconfig or in-cluster service account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubernetesConfig {
    /// Base URL of the API server (scheme://host[:port]); inferred when unset
    pub endpoint: Option<String>,

    pub request_timeout_secs: u64,

    /// Delay between reconciliation cycles
    pub poll_interval_secs: u64,

    /// Only watch Ingresses in these namespaces (empty = all)
    pub namespaces: Vec<String>,

    /// Only watch Ingresses carrying all of these labels
    pub label_selector: BTreeMap<String, String>,

    pub endpoint_resolution: EndpointResolution,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: 30,
            poll_interval_secs: 10,
            namespaces: Vec::new(),
            label_selector: BTreeMap::new(),
            endpoint_resolution: EndpointResolution::default(),
        }
    }
}

impl KubernetesConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse provider configuration")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("ROUTER_KUBE_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(secs) = parse_secs(&lookup, "ROUTER_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "ROUTER_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
        if let Some(namespaces) = lookup("ROUTER_KUBE_NAMESPACES") {
            self.namespaces = namespaces
                .split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(String::from)
                .collect();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(CoreError::InvalidConfiguration(
                "pollIntervalSecs must be greater than zero".to_string(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            let invalid = |reason: String| CoreError::InvalidEndpoint {
                url: endpoint.clone(),
                reason,
            };
            let uri: http::Uri = endpoint.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
            if uri.scheme().is_none() || uri.authority().is_none() {
                return Err(invalid("expected scheme://host[:port]".to_string()));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Predicate selecting the Ingresses this provider reconciles
    pub fn ingress_filter(&self) -> ResourceFilter {
        ResourceFilter::new()
            .in_namespaces(self.namespaces.iter().cloned())
            .with_labels(self.label_selector.clone())
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)?;
    match value.trim().parse() {
        Ok(secs) => Some(secs),
        Err(e) => {
            warn!(key, value = %value, error = %e, "Ignoring invalid environment override");
            None
        }
    }
}
