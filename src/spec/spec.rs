//! Generation spec types and persistence.

use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// API version written into every spec file.
pub const API_VERSION: &str = "spresm.squaremo.dev/v1alpha1";

/// Name of the spec file at the root of a package directory.
pub const SPEC_FILE: &str = "Spresmfile";

/// Kind selects how a spec is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Render a Helm chart.
    HelmChart,
    /// Run a container image that prints the configuration.
    Image,
    /// Take configuration from a git repository.
    Git,
}

/// Spec describes how the configuration of a package is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub api_version: String,
    pub kind: Kind,
    /// The upstream source: a chart URL, an image repository or a git URL.
    #[serde(default)]
    pub source: String,
    /// The version of the source to evaluate.
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmArgs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageArgs>,
}

/// HelmArgs configures rendering of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelmArgs {
    #[serde(default)]
    pub release: Release,
    #[serde(default)]
    pub values: Map,
}

/// Release is the Helm release a chart is rendered as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// ImageArgs configures running a generator image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageArgs {
    /// Handed to the image as the `functionConfig` of its input.
    #[serde(default)]
    pub function_config: Value,
}

/// SpecError is returned when a spec cannot be read, written or converted.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("expected to find spec file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write spec file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to decode spec: {0}")]
    Decode(#[source] serde_yaml::Error),

    #[error("unable to encode spec: {0}")]
    Encode(#[source] serde_yaml::Error),

    #[error("invalid {kind:?} configuration: {source}")]
    Config {
        kind: Kind,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0:?} specs have no configuration")]
    NoConfig(Kind),
}

impl Spec {
    /// Creates a spec of the given kind with empty kind-specific arguments.
    pub fn new(kind: Kind, source: impl Into<String>, version: impl Into<String>) -> Self {
        let mut spec = Spec {
            api_version: API_VERSION.to_string(),
            kind,
            source: source.into(),
            version: version.into(),
            helm: None,
            image: None,
        };
        match kind {
            Kind::HelmChart => spec.helm = Some(HelmArgs::default()),
            Kind::Image => spec.image = Some(ImageArgs::default()),
            Kind::Git => {}
        }
        spec
    }

    /// Parses a spec from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Spec, SpecError> {
        serde_yaml::from_str(yaml).map_err(SpecError::Decode)
    }

    /// Serializes the spec to YAML.
    pub fn to_yaml(&self) -> Result<String, SpecError> {
        serde_yaml::to_string(self).map_err(SpecError::Encode)
    }

    /// Returns the kind-specific configuration as a document.
    ///
    /// Git specs have none, and yield Ok(None).
    pub fn config(&self) -> Result<Option<Value>, SpecError> {
        let encoded = match self.kind {
            Kind::HelmChart => serde_yaml::to_value(self.helm.clone().unwrap_or_default()),
            Kind::Image => serde_yaml::to_value(self.image.clone().unwrap_or_default()),
            Kind::Git => return Ok(None),
        };
        encoded
            .and_then(serde_yaml::from_value)
            .map(Some)
            .map_err(|source| SpecError::Config {
                kind: self.kind,
                source,
            })
    }

    /// Replaces the kind-specific configuration from a document.
    pub fn set_config(&mut self, config: &Value) -> Result<(), SpecError> {
        let kind = self.kind;
        let into_err = |source: serde_yaml::Error| SpecError::Config { kind, source };
        let encoded = serde_yaml::to_value(config).map_err(into_err)?;
        match kind {
            Kind::HelmChart => self.helm = Some(serde_yaml::from_value(encoded).map_err(into_err)?),
            Kind::Image => self.image = Some(serde_yaml::from_value(encoded).map_err(into_err)?),
            Kind::Git => return Err(SpecError::NoConfig(kind)),
        }
        Ok(())
    }
}

/// Reads the spec file from a package directory.
pub fn read_spec(dir: &Path) -> Result<Spec, SpecError> {
    let path = dir.join(SPEC_FILE);
    let content = fs::read_to_string(&path).map_err(|source| SpecError::Read {
        path: path.clone(),
        source,
    })?;
    Spec::from_yaml(&content)
}

/// Writes the spec file into a package directory, returning its path.
pub fn write_spec(dir: &Path, spec: &Spec) -> Result<PathBuf, SpecError> {
    let path = dir.join(SPEC_FILE);
    fs::write(&path, spec.to_yaml()?).map_err(|source| SpecError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
