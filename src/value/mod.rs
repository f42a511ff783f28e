//! Value module - In-memory representation of YAML/JSON documents.
//!
//! This module provides the document tree shared by every other module,
//! along with codecs for single documents and multi-document YAML streams.

mod value;

pub use value::*;
