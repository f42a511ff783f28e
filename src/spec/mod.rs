//! Spec module - The `Spresmfile` describing how a package is generated.

mod spec;

pub use spec::*;
