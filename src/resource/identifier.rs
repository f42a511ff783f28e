//! Resource identity.

use crate::value::Value;
use std::fmt;

/// ResourceIdentifier names one resource: its API group/version, kind,
/// namespace and name.
///
/// Two documents describe the same resource iff their identifiers are equal.
/// Cluster-scoped resources have an empty namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentifier {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceIdentifier {
    /// Creates a new identifier.
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ResourceIdentifier {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns true if the resource has no namespace.
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.api_version.is_empty() {
            write!(f, "{}, ", self.api_version)?;
        }
        write!(f, "Kind={} ", self.kind)?;
        if self.is_cluster_scoped() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Extracts the identity of a document.
///
/// Returns None when the document is not a map, or lacks a non-empty `kind`
/// or `metadata.name`. Such documents cannot take part in reconciliation.
/// Scalar fields that are not strings (`name: 3`) are taken in string form.
pub fn identify(doc: &Value) -> Option<ResourceIdentifier> {
    let field = |keys: &[&str]| scalar_string(doc.get_path(keys)?);
    let kind = field(&["kind"]).filter(|k| !k.is_empty())?;
    let name = field(&["metadata", "name"]).filter(|n| !n.is_empty())?;
    Some(ResourceIdentifier {
        api_version: field(&["apiVersion"]).unwrap_or_default(),
        kind,
        namespace: field(&["metadata", "namespace"]).unwrap_or_default(),
        name,
    })
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(format!("{:?}", f)),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
