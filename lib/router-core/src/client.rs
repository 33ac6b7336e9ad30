//! Read-only access to orchestrator resources

use crate::{Predicate, Result};
use async_trait::async_trait;
use router_api::{Ingress, Pod, Service};

/// Fetches resource collections, keeping only entries accepted by `predicate`.
///
/// Implementations do not retry; a failed fetch is reported to the caller,
/// which retries on its next poll.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn fetch_ingresses(&self, predicate: &dyn Predicate<Ingress>) -> Result<Vec<Ingress>>;

    async fn fetch_services(&self, predicate: &dyn Predicate<Service>) -> Result<Vec<Service>>;

    async fn fetch_pods(&self, predicate: &dyn Predicate<Pod>) -> Result<Vec<Pod>>;
}
