/// extensions/v1beta1 resources

pub mod ingress;

pub use ingress::{HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressList, IngressRule, IngressSpec};
