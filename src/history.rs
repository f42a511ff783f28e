//! Reading the spec as it was at an earlier revision.

use crate::command::{CommandError, CommandRunner, SystemRunner};
use crate::spec::{Spec, SpecError, SPEC_FILE};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// HistoryError is returned when the base spec cannot be recovered.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("could not get spec from revision {rev:?}: {source}")]
    Lookup {
        rev: String,
        #[source]
        source: CommandError,
    },

    #[error("spec at revision {rev:?} is invalid: {source}")]
    Spec {
        rev: String,
        #[source]
        source: SpecError,
    },
}

/// History gives access to earlier revisions of a package's spec.
pub trait History {
    fn spec_at(&self, dir: &Path, rev: &str) -> Result<Spec, HistoryError>;
}

/// GitHistory reads committed specs with `git show`.
#[derive(Debug, Clone, Default)]
pub struct GitHistory<R = SystemRunner> {
    runner: R,
}

impl GitHistory<SystemRunner> {
    pub fn new() -> Self {
        GitHistory {
            runner: SystemRunner,
        }
    }
}

impl<R: CommandRunner> GitHistory<R> {
    pub fn with_runner(runner: R) -> Self {
        GitHistory { runner }
    }
}

impl<R: CommandRunner> History for GitHistory<R> {
    fn spec_at(&self, dir: &Path, rev: &str) -> Result<Spec, HistoryError> {
        let args = vec![
            "-C".to_string(),
            dir.display().to_string(),
            "show".to_string(),
            format!("{}:./{}", rev, SPEC_FILE),
        ];
        debug!(dir = %dir.display(), rev, "reading base spec");
        let out = self
            .runner
            .run("git", &args, &[])
            .map_err(|source| HistoryError::Lookup {
                rev: rev.to_string(),
                source,
            })?;
        Spec::from_yaml(&String::from_utf8_lossy(&out)).map_err(|source| HistoryError::Spec {
            rev: rev.to_string(),
            source,
        })
    }
}

/// Reads the spec file of the package in `dir` as committed at `rev`.
pub fn spec_at_revision(dir: &Path, rev: &str) -> Result<Spec, HistoryError> {
    GitHistory::new().spec_at(dir, rev)
}
