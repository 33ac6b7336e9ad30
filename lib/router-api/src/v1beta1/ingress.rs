use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::{List, ListableResource, Metadata, NamespaceResourceScope, Resource};
use serde::{Deserialize, Serialize};

/// Ingress describes host and path based HTTP routing to cluster Services
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingress {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: IngressSpec,
}

pub type IngressList = List<Ingress>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    /// Default backend for requests matching no rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<IngressBackend>,

    #[serde(default)]
    pub rules: Vec<IngressRule>,
}

/// Routing rule for a single host. An empty host matches every host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default)]
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HTTPIngressRuleValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HTTPIngressRuleValue {
    #[serde(default)]
    pub paths: Vec<HTTPIngressPath>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HTTPIngressPath {
    /// Path to match; empty matches every path
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub backend: IngressBackend,
}

/// Reference to the Service (and port) that serves a path.
///
/// Backends pointing at something other than a Service (`resource`) decode
/// with an empty `service_name`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackend {
    #[serde(default)]
    pub service_name: String,

    #[serde(default = "default_service_port")]
    pub service_port: IntOrString,
}

fn default_service_port() -> IntOrString {
    IntOrString::Int(0)
}

impl Default for IngressBackend {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            service_port: default_service_port(),
        }
    }
}

impl IngressBackend {
    pub fn is_service(&self) -> bool {
        !self.service_name.is_empty()
    }

    /// Port rendered for URLs: numeric ports in decimal, named ports verbatim
    pub fn port_string(&self) -> String {
        match &self.service_port {
            IntOrString::Int(port) => port.to_string(),
            IntOrString::String(name) => name.clone(),
        }
    }
}

impl IngressRule {
    /// HTTP paths of this rule, empty when the rule carries no `http` block
    pub fn paths(&self) -> &[HTTPIngressPath] {
        self.http.as_ref().map(|http| http.paths.as_slice()).unwrap_or_default()
    }
}

impl Resource for Ingress {
    const API_VERSION: &'static str = "extensions/v1beta1";
    const GROUP: &'static str = "extensions";
    const KIND: &'static str = "Ingress";
    const VERSION: &'static str = "v1beta1";
    const URL_PATH_SEGMENT: &'static str = "ingresses";
    type Scope = NamespaceResourceScope;
}

impl ListableResource for Ingress {
    const LIST_KIND: &'static str = "IngressList";
}

impl Metadata for Ingress {
    type Ty = ObjectMeta;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
