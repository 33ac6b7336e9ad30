//! Kubernetes provider
//!
//! Polls the Kubernetes API for Ingresses and Services and publishes the
//! resulting routing configuration on a channel.

pub mod client;
pub mod config;
pub mod provider;

pub use client::KubeResourceClient;
pub use config::KubernetesConfig;
pub use provider::{KubernetesProvider, PROVIDER_NAME};
