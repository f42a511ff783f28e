//! Package module - Reading and writing the documents of a package directory.
//!
//! Every document read from disk carries the path annotation naming the file
//! it came from, so the merged result can be written back to the same files.

mod package;

pub use package::*;
