//! Rendering Helm charts.

use super::EvalError;
use crate::command::CommandRunner;
use crate::resource::{annotation, set_annotation, PATH_ANNOTATION};
use crate::spec::Spec;
use crate::value::{from_yaml_stream, Value};

/// ChartRef locates a chart: the repository URL and the chart's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
    pub repository: String,
    pub name: String,
}

impl ChartRef {
    /// Splits a chart URL such as `https://charts.fluxcd.io/flux`.
    ///
    /// Everything up to the last path element is the repository; the last
    /// element names the chart.
    pub fn parse(url: &str) -> Result<ChartRef, EvalError> {
        let invalid = |reason: &'static str| EvalError::ChartUrl {
            url: url.to_string(),
            reason,
        };

        let (scheme, rest) = url.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        if !matches!(scheme, "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| invalid("path must include at least one element, naming the chart"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let (dir, name) = match path.trim_end_matches('/').rsplit_once('/') {
            Some((dir, name)) => (format!("/{}", dir), name),
            None => (String::new(), path.trim_end_matches('/')),
        };
        if name.is_empty() {
            return Err(invalid("path must include at least one element, naming the chart"));
        }

        Ok(ChartRef {
            repository: format!("{}://{}{}", scheme, host, dir),
            name: name.to_string(),
        })
    }
}

/// Arguments for `helm template` rendering a spec's chart.
pub fn helm_template_args(spec: &Spec, chart: &ChartRef) -> Vec<String> {
    let release = spec.helm.as_ref().map(|h| &h.release);
    let release_name = release
        .map(|r| r.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(&chart.name);

    let mut args: Vec<String> = vec![
        "template".into(),
        release_name.into(),
        chart.name.clone(),
        "--repo".into(),
        chart.repository.clone(),
    ];
    if !spec.version.is_empty() {
        args.push("--version".into());
        args.push(spec.version.clone());
    }
    if let Some(ns) = release.map(|r| r.namespace.as_str()).filter(|ns| !ns.is_empty()) {
        args.push("--namespace".into());
        args.push(ns.into());
    }
    args.push("--values".into());
    args.push("-".into());
    args
}

/// Renders the chart a spec names.
pub fn render_chart<R: CommandRunner>(runner: &R, spec: &Spec) -> Result<Vec<Value>, EvalError> {
    let chart = ChartRef::parse(&spec.source)?;
    let values = spec
        .helm
        .as_ref()
        .map(|h| serde_yaml::to_string(&h.values))
        .transpose()
        .map_err(EvalError::Input)?
        .unwrap_or_default();

    let out = runner.run("helm", &helm_template_args(spec, &chart), values.as_bytes())?;
    parse_rendered(&String::from_utf8_lossy(&out))
}

/// Parses `helm template` output.
///
/// Helm prefixes each manifest with a `# Source: <template>` comment; the
/// template is recorded in the path annotation. Manifests rendered from
/// templates that are not YAML files are skipped.
pub fn parse_rendered(rendered: &str) -> Result<Vec<Value>, EvalError> {
    let mut docs = Vec::new();
    for section in split_sections(rendered) {
        let source = section
            .lines()
            .find_map(|line| line.trim().strip_prefix("# Source:"))
            .map(str::trim);
        if let Some(source) = source {
            if !(source.ends_with(".yaml") || source.ends_with(".yml")) {
                continue;
            }
        }

        let origin = source.unwrap_or("helm template").to_string();
        let parsed = from_yaml_stream(section)
            .map_err(|err| EvalError::Output { origin, source: err })?;
        for mut doc in parsed {
            if let Some(source) = source {
                if annotation(&doc, PATH_ANNOTATION).is_none() {
                    set_annotation(&mut doc, PATH_ANNOTATION, source);
                }
            }
            docs.push(doc);
        }
    }
    Ok(docs)
}

fn split_sections(stream: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in stream.split_inclusive('\n') {
        if line.trim_end() == "---" {
            sections.push(&stream[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    sections.push(&stream[start..]);
    sections
}
