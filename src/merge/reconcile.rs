//! Reconciliation of three resource sets.

use super::{merge_documents, MergeError, SetConflictKind};
use crate::resource::{ResourceIdentifier, ResourceSet};
use crate::value::Value;
use std::fmt;
use tracing::{debug, warn};

/// ConflictPolicy decides how a resource present in exactly two of the three
/// inputs is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConflictPolicy {
    /// Every such resource is a conflict, whatever its content.
    #[default]
    Strict,
    /// Such resources are only a conflict when the two present versions
    /// differ. An unmodified resource removed on one side is dropped, and a
    /// resource added identically on both sides is kept.
    ContentAware,
}

/// MergeOptions configures a reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub policy: ConflictPolicy,
}

impl MergeOptions {
    /// Creates options with the given conflict policy.
    pub fn with_policy(policy: ConflictPolicy) -> Self {
        MergeOptions { policy }
    }
}

/// Input names one of the three sides of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Local,
    Base,
    Updated,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Input::Local => "local",
            Input::Base => "base",
            Input::Updated => "updated",
        })
    }
}

/// Diagnostic records something a merge did silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A document without identity was left out of the merge.
    Unidentified { input: Input, position: usize },
    /// A later document with the same identity replaced an earlier one.
    Duplicate { input: Input, id: ResourceIdentifier },
    /// A resource was dropped from the result without conflict.
    Dropped { id: ResourceIdentifier },
}

/// Merged is the outcome of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    pub documents: Vec<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Three-way merges sets of documents using the strict conflict policy.
///
/// See [`reconcile_with`].
pub fn reconcile(local: &[Value], base: &[Value], updated: &[Value]) -> Result<Vec<Value>, MergeError> {
    reconcile_with(local, base, updated, &MergeOptions::default()).map(|merged| merged.documents)
}

/// Three-way merges sets of documents.
///
/// Each document is matched with its counterparts by identity. The result
/// holds, in order: the outcome for every resource in `local` in local's
/// order, then nothing for resources only in `base` (they are dropped), then
/// the resources only in `updated` in updated's order. Resources in all three
/// inputs are merged field by field. Documents without identity are left out.
///
/// The first conflict aborts the merge.
pub fn reconcile_with(
    local: &[Value],
    base: &[Value],
    updated: &[Value],
    opts: &MergeOptions,
) -> Result<Merged, MergeError> {
    let local = ResourceSet::index(local);
    let base = ResourceSet::index(base);
    let updated = ResourceSet::index(updated);

    let mut diagnostics = index_diagnostics(Input::Local, &local);
    diagnostics.extend(index_diagnostics(Input::Base, &base));
    diagnostics.extend(index_diagnostics(Input::Updated, &updated));

    let mut documents = Vec::with_capacity(local.len() + updated.len());

    for (id, mine) in local.iter() {
        let resolved = match (base.get(id), updated.get(id)) {
            (Some(orig), Some(theirs)) => {
                let merged = merge_documents(id, mine, orig, theirs).map_err(|err| {
                    warn!(resource = %id, error = %err, "merge conflict");
                    err
                })?;
                Some(merged)
            }
            (Some(orig), None) => {
                unless_equal(opts, id, mine, orig, SetConflictKind::RemovedUpstream)?;
                None
            }
            (None, Some(theirs)) => {
                unless_equal(opts, id, mine, theirs, SetConflictKind::AddedOnBothSides)?;
                Some(mine.clone())
            }
            (None, None) => {
                debug!(resource = %id, "keeping local resource");
                Some(mine.clone())
            }
        };
        match resolved {
            Some(doc) => documents.push(doc),
            None => diagnostics.push(dropped(id)),
        }
    }

    for (id, orig) in base.iter().filter(|(id, _)| !local.contains(id)) {
        if let Some(theirs) = updated.get(id) {
            unless_equal(opts, id, orig, theirs, SetConflictKind::RemovedLocally)?;
        }
        diagnostics.push(dropped(id));
    }

    documents.extend(
        updated
            .iter()
            .filter(|(id, _)| !local.contains(id) && !base.contains(id))
            .map(|(id, theirs)| {
                debug!(resource = %id, "adding generated resource");
                theirs.clone()
            }),
    );

    Ok(Merged {
        documents,
        diagnostics,
    })
}

/// Fails with a set conflict, unless the policy allows equal versions
/// through and they are equal.
fn unless_equal(
    opts: &MergeOptions,
    id: &ResourceIdentifier,
    a: &Value,
    b: &Value,
    kind: SetConflictKind,
) -> Result<(), MergeError> {
    if opts.policy == ConflictPolicy::ContentAware && a == b {
        return Ok(());
    }
    warn!(resource = %id, %kind, "merge conflict");
    Err(MergeError::set_conflict(id.clone(), kind))
}

fn dropped(id: &ResourceIdentifier) -> Diagnostic {
    debug!(resource = %id, "dropping resource");
    Diagnostic::Dropped { id: id.clone() }
}

fn index_diagnostics(input: Input, set: &ResourceSet<'_>) -> Vec<Diagnostic> {
    let unidentified = set.unidentified().iter().map(|&position| {
        debug!(%input, position, "ignoring document without kind or name");
        Diagnostic::Unidentified { input, position }
    });
    let duplicates = set.duplicates().iter().map(|id| {
        debug!(%input, resource = %id, "duplicate resource, keeping the later document");
        Diagnostic::Duplicate {
            input,
            id: id.clone(),
        }
    });
    unidentified.chain(duplicates).collect()
}
