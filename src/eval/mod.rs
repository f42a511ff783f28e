//! Eval module - Evaluating a spec to the documents it generates.
//!
//! Charts are rendered with `helm template` and generator images are run
//! with `docker run`; both are reached through a [`CommandRunner`].

mod chart;
mod image;


pub use chart::*;
pub use image::*;

use crate::command::{CommandError, CommandRunner, SystemRunner};
use crate::resource::{annotation, identify, set_annotation, PATH_ANNOTATION};
use crate::spec::{Kind, Spec};
use crate::value::{DecodeError, Value};
use thiserror::Error;
use tracing::info;

/// EvalError is returned when a spec cannot be evaluated.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("evaluating {0:?} specs is not implemented")]
    NotImplemented(Kind),

    #[error("invalid chart URL {url:?}: {reason}")]
    ChartUrl { url: String, reason: &'static str },

    #[error("could not encode generator input: {0}")]
    Input(#[source] serde_yaml::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("could not parse output of {origin}: {source}")]
    Output {
        origin: String,
        #[source]
        source: DecodeError,
    },
}

/// Generator produces the documents a spec describes.
pub trait Generator {
    fn generate(&self, spec: &Spec) -> Result<Vec<Value>, EvalError>;
}

/// Evaluator generates documents by running external tools.
#[derive(Debug, Clone, Default)]
pub struct Evaluator<R = SystemRunner> {
    runner: R,
}

impl Evaluator<SystemRunner> {
    /// Creates an evaluator that runs real processes.
    pub fn new() -> Self {
        Evaluator {
            runner: SystemRunner,
        }
    }
}

impl<R: CommandRunner> Evaluator<R> {
    /// Creates an evaluator using the given runner.
    pub fn with_runner(runner: R) -> Self {
        Evaluator { runner }
    }

    /// Returns the runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> Generator for Evaluator<R> {
    fn generate(&self, spec: &Spec) -> Result<Vec<Value>, EvalError> {
        let mut docs = match spec.kind {
            Kind::HelmChart => render_chart(&self.runner, spec)?,
            Kind::Image => run_image(&self.runner, spec)?,
            Kind::Git => return Err(EvalError::NotImplemented(spec.kind)),
        };
        for doc in &mut docs {
            if annotation(doc, PATH_ANNOTATION).is_none() {
                if let Some(path) = default_path(doc) {
                    set_annotation(doc, PATH_ANNOTATION, path);
                }
            }
        }
        info!(kind = ?spec.kind, source = %spec.source, version = %spec.version, documents = docs.len(), "evaluated spec");
        Ok(docs)
    }
}

/// File name given to a resource that does not say where it belongs:
/// `<kind>_<name>.yaml`, lower-cased.
pub fn default_path(doc: &Value) -> Option<String> {
    let id = identify(doc)?;
    Some(format!("{}_{}.yaml", id.kind, id.name).to_lowercase())
}
