//! Conflict types for merge operations.

use crate::fieldpath::Path;
use crate::resource::ResourceIdentifier;
use std::fmt;
use thiserror::Error;

/// SetConflictKind names the membership pattern that could not be reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetConflictKind {
    /// Present locally and previously generated, but no longer generated.
    RemovedUpstream,
    /// Added locally and newly generated, with no common ancestor.
    AddedOnBothSides,
    /// Previously and newly generated, but removed locally.
    RemovedLocally,
}

impl fmt::Display for SetConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SetConflictKind::RemovedUpstream => {
                "present in local files but removed from generated resources"
            }
            SetConflictKind::AddedOnBothSides => {
                "added locally and also added in generated resources"
            }
            SetConflictKind::RemovedLocally => {
                "still generated but removed from local files"
            }
        };
        f.write_str(msg)
    }
}

/// MergeError is the first conflict a merge ran into.
///
/// A merge never produces a partial result: any of these aborts it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("resource {id} {kind}")]
    SetConflict {
        id: ResourceIdentifier,
        kind: SetConflictKind,
    },

    #[error("resource {id} has conflicting changes at {path}")]
    DocumentConflict { id: ResourceIdentifier, path: Path },
}

impl MergeError {
    /// Creates a set-level conflict.
    pub fn set_conflict(id: ResourceIdentifier, kind: SetConflictKind) -> Self {
        MergeError::SetConflict { id, kind }
    }

    /// Creates a document-level conflict.
    pub fn document_conflict(id: ResourceIdentifier, path: Path) -> Self {
        MergeError::DocumentConflict { id, path }
    }

    /// Returns the resource the conflict is about.
    pub fn resource(&self) -> &ResourceIdentifier {
        match self {
            MergeError::SetConflict { id, .. } | MergeError::DocumentConflict { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_conflict_display() {
        let err = MergeError::set_conflict(
            ResourceIdentifier::new("v1", "Service", "", "foo"),
            SetConflictKind::AddedOnBothSides,
        );
        let msg = err.to_string();
        assert!(msg.contains("Kind=Service foo"), "{}", msg);
        assert!(msg.contains("added locally"), "{}", msg);
    }

    #[test]
    fn test_document_conflict_display() {
        let id = ResourceIdentifier::new("apps/v1", "Deployment", "app", "bar");
        let err = MergeError::document_conflict(id.clone(), Path::from_fields(["spec", "replicas"]));
        assert!(err.to_string().ends_with("at .spec.replicas"));
        assert_eq!(err.resource(), &id);
    }
}
