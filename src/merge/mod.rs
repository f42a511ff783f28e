//! Merge module - Three-way merge of generated configuration.
//!
//! [`reconcile`] matches the resources of three document sets by identity
//! and decides, per resource, whether to keep, drop, merge or report a
//! conflict. Resources present on all sides go through [`merge_documents`].

mod conflict;
mod document;
mod reconcile;


#[cfg(test)]
mod reconcile_test;

pub use conflict::*;
pub use document::*;
pub use reconcile::*;
