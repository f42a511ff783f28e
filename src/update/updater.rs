//! Updater for package workflows.

use crate::error::Error;
use crate::eval::{Evaluator, Generator};
use crate::history::{GitHistory, History};
use crate::merge::{reconcile_with, Diagnostic, MergeOptions};
use crate::package::{ensure_package_dir, read_package, write_package};
use crate::spec::{read_spec, write_spec, Spec};
use crate::value::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Revision the base spec is read from unless told otherwise.
pub const DEFAULT_BASE_REV: &str = "HEAD";

/// UpdateOptions configures an update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOptions {
    /// Replaces the version in the spec.
    pub version: Option<String>,
    /// Replaces the kind-specific configuration in the spec.
    pub config: Option<Value>,
    /// Write the generated documents over the package instead of merging.
    pub overwrite: bool,
    /// Revision holding the spec the package was last generated from.
    pub base_rev: String,
    pub merge: MergeOptions,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        UpdateOptions {
            version: None,
            config: None,
            overwrite: false,
            base_rev: DEFAULT_BASE_REV.to_string(),
            merge: MergeOptions::default(),
        }
    }
}

/// UpdateMode says how a package directory was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Import,
    Overwrite,
    Merge,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpdateMode::Import => "imported",
            UpdateMode::Overwrite => "overwritten",
            UpdateMode::Merge => "merged",
        })
    }
}

/// UpdateReport describes what an update or import wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub mode: UpdateMode,
    /// Number of documents written to the package.
    pub documents: usize,
    /// Path of the spec file, if it was written.
    pub spec_written: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// UpdaterBuilder is a builder for creating an Updater.
#[derive(Default)]
pub struct UpdaterBuilder {
    generator: Option<Box<dyn Generator>>,
    history: Option<Box<dyn History>>,
}

impl UpdaterBuilder {
    /// Creates a new UpdaterBuilder.
    pub fn new() -> Self {
        UpdaterBuilder::default()
    }

    /// Sets the generator. Defaults to an [`Evaluator`] running real tools.
    pub fn generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Sets where base specs are read from. Defaults to git.
    pub fn history(mut self, history: Box<dyn History>) -> Self {
        self.history = Some(history);
        self
    }

    /// Builds the Updater.
    pub fn build(self) -> Updater {
        Updater {
            generator: self
                .generator
                .unwrap_or_else(|| Box::new(Evaluator::new())),
            history: self
                .history
                .unwrap_or_else(|| Box::new(GitHistory::new())),
        }
    }
}

/// Updater imports, evaluates and updates package directories.
pub struct Updater {
    generator: Box<dyn Generator>,
    history: Box<dyn History>,
}

impl Default for Updater {
    fn default() -> Self {
        UpdaterBuilder::new().build()
    }
}

impl Updater {
    /// Creates a new UpdaterBuilder.
    pub fn builder() -> UpdaterBuilder {
        UpdaterBuilder::new()
    }

    /// Generates the documents described by the spec in `dir`.
    pub fn eval(&self, dir: &Path) -> Result<Vec<Value>, Error> {
        let spec = read_spec(dir)?;
        Ok(self.generator.generate(&spec)?)
    }

    /// Creates a new package in `dir` from a spec.
    ///
    /// The directory must not exist yet, or be empty. Nothing is written if
    /// the spec cannot be evaluated.
    pub fn import(&self, dir: &Path, spec: &Spec) -> Result<UpdateReport, Error> {
        ensure_package_dir(dir)?;
        let documents = self.generator.generate(spec)?;
        let spec_path = write_spec(dir, spec)?;
        write_package(dir, &documents)?;
        info!(dir = %dir.display(), documents = documents.len(), "imported package");
        Ok(UpdateReport {
            mode: UpdateMode::Import,
            documents: documents.len(),
            spec_written: Some(spec_path),
            diagnostics: Vec::new(),
        })
    }

    /// Brings the package in `dir` up to date with its spec.
    ///
    /// In merge mode, the documents generated from the spec at
    /// `opts.base_rev` are the common ancestor of the package files and the
    /// documents generated from the working spec. On a conflict nothing is
    /// written. The spec file is written back only when `opts` changed it.
    pub fn update(&self, dir: &Path, opts: &UpdateOptions) -> Result<UpdateReport, Error> {
        let mut spec = read_spec(dir)?;
        let mut spec_changed = false;
        if let Some(version) = &opts.version {
            spec.version = version.clone();
            spec_changed = true;
        }
        if let Some(config) = &opts.config {
            spec.set_config(config)?;
            spec_changed = true;
        }

        let (mode, documents, diagnostics) = if opts.overwrite {
            let updated = self.generator.generate(&spec)?;
            (UpdateMode::Overwrite, updated, Vec::new())
        } else {
            let local = read_package(dir)?;
            let base_spec = self.history.spec_at(dir, &opts.base_rev)?;
            let updated = self.generator.generate(&spec)?;
            let base = self.generator.generate(&base_spec)?;
            let merged = reconcile_with(&local, &base, &updated, &opts.merge)?;
            (UpdateMode::Merge, merged.documents, merged.diagnostics)
        };

        write_package(dir, &documents)?;
        let spec_written = if spec_changed {
            Some(write_spec(dir, &spec)?)
        } else {
            None
        };
        info!(dir = %dir.display(), %mode, documents = documents.len(), "updated package");

        Ok(UpdateReport {
            mode,
            documents: documents.len(),
            spec_written,
            diagnostics,
        })
    }
}
