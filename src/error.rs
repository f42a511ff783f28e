//! Top-level error type.

use crate::eval::EvalError;
use crate::history::HistoryError;
use crate::merge::MergeError;
use crate::package::PackageError;
use crate::spec::SpecError;
use thiserror::Error;

/// Error is returned by the package workflows, which touch every other module.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl Error {
    /// Returns true if the error is a merge conflict rather than a failure
    /// to read, generate or write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Merge(_))
    }
}
