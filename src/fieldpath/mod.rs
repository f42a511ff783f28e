//! Field path module - Addresses a node inside a document tree.
//!
//! Paths are used to attribute merge conflicts to the field that caused them.

mod path;

pub use path::*;
