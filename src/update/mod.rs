//! Update module - Importing packages and bringing them up to date.
//!
//! An update regenerates a package from its spec and three-way merges the
//! result with the files in the package directory, using the spec as it was
//! committed at a base revision to generate the common ancestor.

mod updater;


pub use updater::*;
