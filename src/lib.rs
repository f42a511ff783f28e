//! # spresm
//!
//! Locally-editable generated configuration.
//!
//! A package is a directory of Kubernetes manifests generated from a spec
//! file (a Helm chart, or a container image that prints configuration) and
//! then edited by hand. Updating the package regenerates it and three-way
//! merges the local edits with the upstream changes.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON documents and stream codecs
//! - [`fieldpath`] - Paths to fields within a document, used to report conflicts
//! - [`resource`] - Resource identity and indexed sets of documents
//! - [`merge`] - Three-way merge of single documents and of sets of resources
//! - [`spec`] - The `Spresmfile` describing how a package is generated
//! - [`eval`] - Generating documents from a spec with `helm` or `docker`
//! - [`package`] - Reading and writing package directories
//! - [`history`] - Recovering the spec a package was last generated from
//! - [`update`] - Import and update workflows

pub mod command;
pub mod error;
pub mod eval;
pub mod fieldpath;
pub mod history;
pub mod merge;
pub mod package;
pub mod resource;
pub mod spec;
pub mod update;
pub mod value;

pub use error::Error;
pub use eval::{Evaluator, Generator};
pub use fieldpath::Path;
pub use merge::{
    merge_documents, reconcile, reconcile_with, ConflictPolicy, MergeError, MergeOptions, Merged,
};
pub use resource::{identify, ResourceIdentifier, ResourceSet};
pub use spec::{Kind, Spec};
pub use update::{UpdateOptions, UpdateReport, Updater, UpdaterBuilder};
pub use value::Value;
