//! Filters applied to resource lists as they are fetched

use kube::ResourceExt;
use std::collections::BTreeMap;

/// Decides whether a fetched resource is kept
pub trait Predicate<T>: Send + Sync {
    fn matches(&self, resource: &T) -> bool;
}

/// Keeps every resource
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<T> Predicate<T> for AcceptAll {
    fn matches(&self, _resource: &T) -> bool {
        true
    }
}

pub fn accept_all() -> AcceptAll {
    AcceptAll
}

/// Matches on name, namespace and labels. Unset criteria match anything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceFilter {
    name: Option<String>,
    namespaces: Vec<String>,
    labels: BTreeMap<String, String>,
}

/// Keeps only resources named `name`
pub fn name_equals(name: impl Into<String>) -> ResourceFilter {
    ResourceFilter::new().with_name(name)
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    pub fn in_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces.extend(namespaces.into_iter().map(Into::into));
        self
    }

    /// Require every pair of `labels` to be present on the resource
    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    fn labels_match(&self, labels: &BTreeMap<String, String>) -> bool {
        self.labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl<T: kube::Resource> Predicate<T> for ResourceFilter {
    fn matches(&self, resource: &T) -> bool {
        if let Some(name) = &self.name {
            if resource.meta().name.as_ref() != Some(name) {
                return false;
            }
        }

        if !self.namespaces.is_empty() {
            let namespace = resource.namespace().unwrap_or_default();
            if !self.namespaces.contains(&namespace) {
                return false;
            }
        }

        self.labels_match(resource.labels())
    }
}

/// Adapts a closure into a predicate
pub struct FnPredicate<F>(F);

pub fn from_fn<T, F>(f: F) -> FnPredicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnPredicate(f)
}

impl<T, F> Predicate<T> for FnPredicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, resource: &T) -> bool {
        (self.0)(resource)
    }
}
