//! Poll loop turning cluster state into routing configuration

use crate::KubernetesConfig;
use router_api::Ingress;
use router_core::{
    ChangeDetector, ConfigMessage, Configuration, EndpointResolution, Predicate, ResourceClient,
    Result, Translator,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Name attached to every configuration this provider publishes
pub const PROVIDER_NAME: &str = "kubernetes";

/// Periodically reconciles Ingresses into a [`Configuration`].
///
/// Cycles run strictly one after another on a single task, so the change
/// detector needs no synchronization.
pub struct KubernetesProvider<C> {
    client: C,
    ingress_filter: Box<dyn Predicate<Ingress>>,
    resolution: EndpointResolution,
    poll_interval: Duration,
    detector: ChangeDetector,
}

impl<C: ResourceClient + 'static> KubernetesProvider<C> {
    /// Create a provider; fails when `config` does not validate
    pub fn new(client: C, config: &KubernetesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            ingress_filter: Box::new(config.ingress_filter()),
            resolution: config.endpoint_resolution,
            poll_interval: config.poll_interval(),
            detector: ChangeDetector::new(),
        })
    }

    /// Replace the predicate selecting which Ingresses are reconciled
    pub fn with_ingress_filter(mut self, filter: impl Predicate<Ingress> + 'static) -> Self {
        self.ingress_filter = Box::new(filter);
        self
    }

    /// Start the poll loop on a background task.
    ///
    /// Configurations are sent on `configurations` in the order they are
    /// built; sending waits for the consumer. The loop ends when `shutdown`
    /// is cancelled or the receiver is dropped.
    pub fn provide(
        self,
        configurations: mpsc::Sender<ConfigMessage>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(configurations, shutdown))
    }

    async fn run(mut self, configurations: mpsc::Sender<ConfigMessage>, shutdown: CancellationToken) {
        info!(interval = ?self.poll_interval, "Starting Kubernetes provider");

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let configuration = match self.reconcile().await {
                Ok(Some(configuration)) => configuration,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "Error retrieving ingresses");
                    continue;
                }
            };

            info!(
                backends = configuration.backends.len(),
                frontends = configuration.frontends.len(),
                servers = configuration.server_count(),
                "Publishing configuration"
            );
            let message = ConfigMessage::new(PROVIDER_NAME, configuration);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                sent = configurations.send(message) => {
                    if sent.is_err() {
                        warn!("Configuration receiver dropped");
                        break;
                    }
                }
            }
        }

        info!("Kubernetes provider stopped");
    }

    /// Run one cycle: fetch, compare with the last observation and translate.
    ///
    /// Returns `Ok(None)` when the Ingress set is unchanged.
    pub async fn reconcile(&mut self) -> Result<Option<Configuration>> {
        let ingresses = self.client.fetch_ingresses(self.ingress_filter.as_ref()).await?;
        debug!(count = ingresses.len(), "Kubernetes ingresses retrieved");

        let Some(ingresses) = self.detector.observe(ingresses) else {
            debug!("Ingresses unchanged, skipping reconciliation");
            return Ok(None);
        };

        let configuration = Translator::new(&self.client, self.resolution)
            .translate(ingresses)
            .await;
        Ok(Some(configuration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::ServiceSpec;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use router_api::v1beta1::{HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule};
    use router_api::{Pod, Service};
    use router_core::predicate::from_fn;
    use router_core::CoreError;
    use std::sync::{Arc, Mutex};

    /// In-memory cluster whose contents tests can change between cycles
    #[derive(Clone, Default)]
    struct FakeCluster {
        ingresses: Arc<Mutex<Option<Vec<Ingress>>>>,
        services: Vec<Service>,
    }

    impl FakeCluster {
        fn set_ingresses(&self, ingresses: Option<Vec<Ingress>>) {
            *self.ingresses.lock().unwrap() = ingresses;
        }
    }

    #[async_trait]
    impl ResourceClient for FakeCluster {
        async fn fetch_ingresses(&self, predicate: &dyn Predicate<Ingress>) -> Result<Vec<Ingress>> {
            let ingresses = self.ingresses.lock().unwrap().clone();
            match ingresses {
                Some(ingresses) => Ok(ingresses.into_iter().filter(|i| predicate.matches(i)).collect()),
                None => Err(CoreError::Api {
                    status: 503,
                    url: "http://fake/apis/extensions/v1beta1/ingresses".to_string(),
                    body: "unavailable".to_string(),
                }),
            }
        }

        async fn fetch_services(&self, predicate: &dyn Predicate<Service>) -> Result<Vec<Service>> {
            Ok(self.services.iter().filter(|s| predicate.matches(s)).cloned().collect())
        }

        async fn fetch_pods(&self, _predicate: &dyn Predicate<Pod>) -> Result<Vec<Pod>> {
            Ok(vec![])
        }
    }

    fn ingress(host: &str, service: &str) -> Ingress {
        let mut ingress = Ingress::default();
        ingress.metadata.name = Some("web".to_string());
        ingress.spec.rules.push(IngressRule {
            host: host.to_string(),
            http: Some(HTTPIngressRuleValue {
                paths: vec![HTTPIngressPath {
                    path: String::new(),
                    backend: IngressBackend {
                        service_name: service.to_string(),
                        service_port: IntOrString::Int(80),
                    },
                }],
            }),
        });
        ingress
    }

    fn cluster() -> FakeCluster {
        let mut svc = Service::default();
        svc.metadata.name = Some("svc1".to_string());
        svc.metadata.uid = Some("u1".to_string());
        svc.spec = Some(ServiceSpec {
            cluster_ip: Some("10.0.0.5".to_string()),
            ..Default::default()
        });
        FakeCluster {
            services: vec![svc],
            ..Default::default()
        }
    }

    fn fast_config() -> KubernetesConfig {
        KubernetesConfig {
            poll_interval_secs: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reconcile_suppresses_unchanged() {
        let cluster = cluster();
        cluster.set_ingresses(Some(vec![ingress("foo.com", "svc1")]));
        let mut provider = KubernetesProvider::new(cluster.clone(), &fast_config()).unwrap();

        let first = provider.reconcile().await.unwrap().unwrap();
        assert_eq!(first.backends["foo.com"].servers["u1"].url, "http://10.0.0.5:80");

        assert!(provider.reconcile().await.unwrap().is_none());

        cluster.set_ingresses(Some(vec![ingress("bar.com", "svc1")]));
        let third = provider.reconcile().await.unwrap().unwrap();
        assert!(third.frontends.contains_key("bar.com"));
        assert!(!third.frontends.contains_key("foo.com"));
    }

    #[tokio::test]
    async fn test_reconcile_error_keeps_baseline() {
        let cluster = cluster();
        cluster.set_ingresses(Some(vec![ingress("foo.com", "svc1")]));
        let mut provider = KubernetesProvider::new(cluster.clone(), &fast_config()).unwrap();
        assert!(provider.reconcile().await.unwrap().is_some());

        cluster.set_ingresses(None);
        assert!(provider.reconcile().await.is_err());

        cluster.set_ingresses(Some(vec![ingress("foo.com", "svc1")]));
        assert!(provider.reconcile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingress_filter_applied() {
        let cluster = cluster();
        cluster.set_ingresses(Some(vec![ingress("foo.com", "svc1"), ingress("bar.com", "svc1")]));
        let mut provider = KubernetesProvider::new(cluster, &fast_config())
            .unwrap()
            .with_ingress_filter(from_fn(|i: &Ingress| i.spec.rules[0].host == "bar.com"));

        let config = provider.reconcile().await.unwrap().unwrap();
        assert_eq!(config.frontends.len(), 1);
        assert!(config.frontends.contains_key("bar.com"));
    }

    #[test]
    fn test_new_rejects_zero_poll_interval() {
        let config = KubernetesConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        let err = KubernetesProvider::new(cluster(), &config).err().unwrap();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provide_publishes_changes_only() {
        let cluster = cluster();
        cluster.set_ingresses(Some(vec![ingress("foo.com", "svc1")]));
        let provider = KubernetesProvider::new(cluster.clone(), &fast_config()).unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let handle = provider.provide(tx, shutdown.clone());

        let message = rx.recv().await.unwrap();
        assert_eq!(message.provider_name, PROVIDER_NAME);
        assert!(message.configuration.frontends.contains_key("foo.com"));

        // Several unchanged cycles publish nothing
        assert!(time::timeout(Duration::from_secs(5), rx.recv()).await.is_err());

        cluster.set_ingresses(Some(vec![ingress("bar.com", "svc1")]));
        let message = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(message.configuration.frontends.contains_key("bar.com"));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_provide_survives_fetch_errors() {
        let cluster = cluster();
        let provider = KubernetesProvider::new(cluster.clone(), &fast_config()).unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let handle = provider.provide(tx, shutdown.clone());

        assert!(time::timeout(Duration::from_secs(3), rx.recv()).await.is_err());

        cluster.set_ingresses(Some(vec![]));
        let message = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(message.configuration.backends.is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_provide_stops_when_receiver_dropped() {
        let cluster = cluster();
        cluster.set_ingresses(Some(vec![ingress("foo.com", "svc1")]));
        let provider = KubernetesProvider::new(cluster, &fast_config()).unwrap();

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = provider.provide(tx, CancellationToken::new());
        time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}
