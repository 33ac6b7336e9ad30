//! Kubernetes API access through an authorized `kube::Client`

use crate::KubernetesConfig;
use async_trait::async_trait;
use k8s_openapi::ListableResource;
use kube::Client;
use router_api::{Ingress, List, Pod, Service};
use router_core::{CoreError, Predicate, ResourceClient, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Base path for core API resources
pub const API_ENDPOINT: &str = "/api/v1";
/// Base path for extensions API resources
pub const EXTENSIONS_ENDPOINT: &str = "/apis/extensions/v1beta1";

const INGRESSES: &str = "/ingresses";
const SERVICES: &str = "/services";
const PODS: &str = "/pods";

/// Read-only resource client over fixed collection paths.
///
/// The wrapped client carries the cluster URL and credentials; requests are
/// relative to it.
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    /// Wrap an already authorized client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the local kubeconfig or in-cluster service account
    pub async fn try_default() -> anyhow::Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Client inferred from the environment, with `config` overrides applied
    pub async fn from_config(config: &KubernetesConfig) -> anyhow::Result<Self> {
        let mut kube_config = kube::Config::infer().await?;
        if let Some(endpoint) = &config.endpoint {
            kube_config.cluster_url = endpoint.parse()?;
        }
        kube_config.read_timeout = Some(config.request_timeout());

        let client = Client::try_from(kube_config)?;
        Ok(Self { client })
    }

    /// Get the underlying Kubernetes client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    async fn list<T>(&self, path: String, predicate: &dyn Predicate<T>) -> Result<Vec<T>>
    where
        T: ListableResource + DeserializeOwned,
    {
        let request = http::Request::get(path.as_str())
            .body(Vec::new())
            .map_err(|e| CoreError::Transport {
                url: path.clone(),
                source: Box::new(e),
            })?;

        let body = self.client.request_text(request).await.map_err(|e| match e {
            kube::Error::Api(response) => CoreError::Api {
                status: response.code,
                url: path.clone(),
                body: response.message,
            },
            other => CoreError::Transport {
                url: path.clone(),
                source: Box::new(other),
            },
        })?;

        let list: List<T> = serde_json::from_str(&body).map_err(|source| CoreError::Decode {
            kind: <T as k8s_openapi::Resource>::KIND,
            source,
        })?;
        let total = list.items.len();
        let items: Vec<T> = list
            .items
            .into_iter()
            .filter(|item| predicate.matches(item))
            .collect();

        debug!(
            kind = <T as k8s_openapi::Resource>::KIND,
            total,
            matched = items.len(),
            "Listed resources from {}",
            path
        );
        Ok(items)
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn fetch_ingresses(&self, predicate: &dyn Predicate<Ingress>) -> Result<Vec<Ingress>> {
        self.list(format!("{}{}", EXTENSIONS_ENDPOINT, INGRESSES), predicate).await
    }

    async fn fetch_services(&self, predicate: &dyn Predicate<Service>) -> Result<Vec<Service>> {
        self.list(format!("{}{}", API_ENDPOINT, SERVICES), predicate).await
    }

    async fn fetch_pods(&self, predicate: &dyn Predicate<Pod>) -> Result<Vec<Pod>> {
        self.list(format!("{}{}", API_ENDPOINT, PODS), predicate).await
    }
}
