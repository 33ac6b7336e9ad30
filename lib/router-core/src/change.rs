//! Suppresses reconciliation when the Ingress set is unchanged

use router_api::Ingress;

/// Remembers the last observed Ingress list.
///
/// Comparison is structural and order sensitive: the same Ingresses returned
/// in a different order count as a change.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    known: Option<Vec<Ingress>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `ingresses` and return them if they differ from the previous
    /// observation. The first observation is always a change.
    pub fn observe(&mut self, ingresses: Vec<Ingress>) -> Option<&[Ingress]> {
        if self.known.as_ref() == Some(&ingresses) {
            return None;
        }
        self.known = Some(ingresses);
        self.known.as_deref()
    }

    pub fn known(&self) -> Option<&[Ingress]> {
        self.known.as_deref()
    }
}
