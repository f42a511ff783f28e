//! Indexed resource sets.

use super::identifier::{identify, ResourceIdentifier};
use crate::value::Value;
use std::collections::HashMap;

/// ResourceSet indexes an ordered sequence of documents by identity.
///
/// Iteration follows the order in which identities first appeared. When the
/// same identity occurs more than once, the later document replaces the
/// earlier one but keeps its position. Documents without an identity are
/// left out of the index; their positions in the input are kept in
/// [`ResourceSet::unidentified`].
#[derive(Debug, Clone, Default)]
pub struct ResourceSet<'a> {
    entries: Vec<(ResourceIdentifier, &'a Value)>,
    positions: HashMap<ResourceIdentifier, usize>,
    unidentified: Vec<usize>,
    duplicates: Vec<ResourceIdentifier>,
}

impl<'a> ResourceSet<'a> {
    /// Creates an empty set.
    pub fn new() -> Self {
        ResourceSet::default()
    }

    /// Indexes a sequence of documents.
    pub fn index(docs: &'a [Value]) -> Self {
        let mut set = ResourceSet::new();
        for (position, doc) in docs.iter().enumerate() {
            match identify(doc) {
                Some(id) => {
                    if set.insert(id.clone(), doc).is_some() {
                        set.duplicates.push(id);
                    }
                }
                None => set.unidentified.push(position),
            }
        }
        set
    }

    /// Inserts a document, returning the one it replaced.
    pub fn insert(&mut self, id: ResourceIdentifier, doc: &'a Value) -> Option<&'a Value> {
        match self.positions.get(&id) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, doc)),
            None => {
                self.positions.insert(id.clone(), self.entries.len());
                self.entries.push((id, doc));
                None
            }
        }
    }

    /// Returns the document for an identity.
    pub fn get(&self, id: &ResourceIdentifier) -> Option<&'a Value> {
        self.positions.get(id).map(|&i| self.entries[i].1)
    }

    /// Returns true if the identity is in the set.
    pub fn contains(&self, id: &ResourceIdentifier) -> bool {
        self.positions.contains_key(id)
    }

    /// Returns the number of distinct identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set holds no resources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over identities and documents in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceIdentifier, &'a Value)> + '_ {
        self.entries.iter().map(|(id, doc)| (id, *doc))
    }

    /// Input positions of documents that had no identity.
    pub fn unidentified(&self) -> &[usize] {
        &self.unidentified
    }

    /// Identities that occurred more than once in the input, once per
    /// replaced occurrence.
    pub fn duplicates(&self) -> &[ResourceIdentifier] {
        &self.duplicates
    }
}
