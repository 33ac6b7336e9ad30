//! Builds the routing model from Ingress rules and their backing Services

use crate::configuration::{route_key, Configuration};
use crate::predicate::{name_equals, ResourceFilter};
use crate::{CoreError, ResourceClient, Result};
use kube::ResourceExt;
use router_api::v1beta1::HTTPIngressPath;
use router_api::{Ingress, Pod, Service};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// How servers are discovered for a resolved Service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointResolution {
    /// One server per Service, addressed by its cluster IP
    #[default]
    ClusterIp,
    /// One server per Pod selected by the Service
    Pods,
}

/// Translates Ingresses into a [`Configuration`].
///
/// A failure to resolve the Service behind one path only drops that path's
/// servers; its frontend and (empty) backend are still emitted.
pub struct Translator<'a, C: ?Sized> {
    client: &'a C,
    resolution: EndpointResolution,
}

impl<'a, C: ResourceClient + ?Sized> Translator<'a, C> {
    pub fn new(client: &'a C, resolution: EndpointResolution) -> Self {
        Self { client, resolution }
    }

    pub async fn translate(&self, ingresses: &[Ingress]) -> Configuration {
        let mut configuration = Configuration::new();

        for ingress in ingresses {
            let namespace = ingress.namespace();
            for rule in &ingress.spec.rules {
                for path in rule.paths() {
                    let key = route_key(&rule.host, &path.path);

                    let frontend = configuration.ensure_route(&key);
                    frontend.add_host_rule(&rule.host);
                    if !path.path.is_empty() {
                        frontend.add_path_rule(&path.path);
                    }

                    if !path.backend.is_service() {
                        debug!(
                            ingress = %qualified_name(ingress),
                            route = %key,
                            "Path backend is not a service, no servers added"
                        );
                        continue;
                    }

                    if let Err(e) = self
                        .add_servers(&mut configuration, &key, namespace.as_deref(), path)
                        .await
                    {
                        warn!(
                            ingress = %qualified_name(ingress),
                            route = %key,
                            error = %e,
                            "Error retrieving service"
                        );
                    }
                }
            }
        }

        configuration
    }

    async fn add_servers(
        &self,
        configuration: &mut Configuration,
        key: &str,
        namespace: Option<&str>,
        path: &HTTPIngressPath,
    ) -> Result<()> {
        let service_name = &path.backend.service_name;
        let mut filter = name_equals(service_name.as_str());
        if let Some(namespace) = namespace {
            filter = filter.in_namespace(namespace);
        }

        let services = self
            .client
            .fetch_services(&filter)
            .await
            .map_err(|e| CoreError::resolution(service_name.as_str(), e))?;
        debug!(service = %service_name, count = services.len(), "Kubernetes services retrieved");

        let port = path.backend.port_string();
        for service in &services {
            match self.resolution {
                EndpointResolution::ClusterIp => {
                    let Some(cluster_ip) = cluster_ip(service) else {
                        debug!(service = %qualified_name(service), "Skipping service without cluster IP");
                        continue;
                    };
                    configuration.upsert_server(
                        key,
                        server_id(service),
                        format!("http://{}:{}", cluster_ip, port),
                    );
                }
                EndpointResolution::Pods => {
                    self.add_pod_servers(configuration, key, service, &port).await?;
                }
            }
        }

        Ok(())
    }

    async fn add_pod_servers(
        &self,
        configuration: &mut Configuration,
        key: &str,
        service: &Service,
        port: &str,
    ) -> Result<()> {
        // A Service without a selector does not select any Pods
        let Some(selector) = selector(service) else {
            debug!(service = %qualified_name(service), "Service has no selector");
            return Ok(());
        };

        let mut filter = ResourceFilter::new().with_labels(selector.clone());
        if let Some(namespace) = service.namespace() {
            filter = filter.in_namespace(namespace);
        }

        let pods = self
            .client
            .fetch_pods(&filter)
            .await
            .map_err(|e| CoreError::resolution(qualified_name(service), e))?;
        debug!(service = %qualified_name(service), count = pods.len(), "Kubernetes pods retrieved");

        for pod in &pods {
            if let Some(pod_ip) = pod_ip(pod) {
                configuration.upsert_server(
                    key,
                    server_id(pod),
                    format!("http://{}:{}", pod_ip, port),
                );
            }
        }

        Ok(())
    }
}

/// Routable cluster IP; headless Services (`None`) have none
fn cluster_ip(service: &Service) -> Option<&str> {
    service
        .spec
        .as_ref()?
        .cluster_ip
        .as_deref()
        .filter(|ip| !ip.is_empty() && *ip != "None")
}

fn selector(service: &Service) -> Option<&BTreeMap<String, String>> {
    service
        .spec
        .as_ref()?
        .selector
        .as_ref()
        .filter(|selector| !selector.is_empty())
}

/// Empty until the Pod has been scheduled and assigned an address
fn pod_ip(pod: &Pod) -> Option<&str> {
    pod.status
        .as_ref()?
        .pod_ip
        .as_deref()
        .filter(|ip| !ip.is_empty())
}

fn qualified_name<K: ResourceExt>(resource: &K) -> String {
    format!(
        "{}/{}",
        resource.namespace().unwrap_or_default(),
        resource.name_any()
    )
}

/// Stable server identity: the UID, or `namespace/name` when it is missing
fn server_id<K: ResourceExt>(resource: &K) -> String {
    resource
        .uid()
        .filter(|uid| !uid.is_empty())
        .unwrap_or_else(|| qualified_name(resource))
}
