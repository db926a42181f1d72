//! Addressing for orchestration API resources other than jobs
//!
//! Jobs are addressed by [`JobIdentity`](super::job::JobIdentity). Cluster
//! operations (scaling the Ray cluster, counting nodes and pods) need a more
//! general way to name a resource or a set of resources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single named resource, e.g. `raycluster/ray-cluster-kuberay` in `ray-system`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

impl ResourceRef {
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} in {}", self.kind, self.name, self.namespace)
    }
}

/// A set of resources of one kind, optionally narrowed by namespace and selectors
///
/// A query without a namespace targets cluster-scoped kinds such as nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceQuery {
    pub kind: String,
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
}

impl ResourceQuery {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            label_selector: None,
            field_selector: None,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_labels(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    pub fn with_fields(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }

    /// Pods in `namespace` whose phase is `Running`
    pub fn running_pods(namespace: impl Into<String>) -> Self {
        Self::new("pods")
            .in_namespace(namespace)
            .with_fields("status.phase=Running")
    }
}
