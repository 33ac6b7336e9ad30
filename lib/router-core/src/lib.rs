//! Core reconciliation logic for Kubernetes driven routing
//!
//! This library provides:
//! - The routing model (frontends and backends) handed to the proxy
//! - Predicates for filtering fetched resources
//! - Change detection between polls
//! - Translation of Ingress rules into the routing model

pub mod change;
pub mod client;
pub mod configuration;
pub mod error;
pub mod predicate;
pub mod translator;

pub use change::ChangeDetector;
pub use client::ResourceClient;
pub use configuration::{Backend, ConfigMessage, Configuration, Frontend, Route, Server};
pub use error::{BoxError, CoreError, Result};
pub use predicate::Predicate;
pub use translator::{EndpointResolution, Translator};
