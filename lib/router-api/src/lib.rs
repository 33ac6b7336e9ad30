//! Orchestrator resource types consumed by the router
//!
//! Core resources come from `k8s-openapi`:
//! - Service (v1): cluster IP and Pod selector
//! - Pod (v1): Pod IP, for selector based endpoint resolution
//!
//! Ingress is served from extensions/v1beta1, which `k8s-openapi` no longer
//! generates, so its schema is defined here.

pub mod v1beta1;

pub use k8s_openapi::api::core::v1::{Pod, Service};
pub use k8s_openapi::List;
pub use v1beta1::Ingress;
