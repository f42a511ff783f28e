//! Running generator images.

use super::EvalError;
use crate::command::CommandRunner;
use crate::spec::Spec;
use crate::value::{from_yaml_stream, to_yaml, Map, Value};
use once_cell::sync::Lazy;

const RESOURCE_LIST_API_VERSION: &str = "config.kubernetes.io/v1";
const RESOURCE_LIST_KIND: &str = "ResourceList";

/// Function config given to an image when its spec does not set one.
pub static DEFAULT_FUNCTION_CONFIG: Lazy<Value> = Lazy::new(|| {
    let mut config = Map::new();
    config.set("apiVersion", "v1");
    config.set("kind", "ConfigMap");
    config.set("data", Map::new());
    Value::Map(config)
});

/// Image reference to run: `<source>:<version>`, or just the source when no
/// version is set.
pub fn image_ref(spec: &Spec) -> String {
    if spec.version.is_empty() {
        spec.source.clone()
    } else {
        format!("{}:{}", spec.source, spec.version)
    }
}

/// The ResourceList a generator image reads on stdin.
pub fn resource_list(spec: &Spec) -> Value {
    let function_config = spec
        .image
        .as_ref()
        .map(|i| i.function_config.clone())
        .filter(|c| !c.is_null())
        .unwrap_or_else(|| DEFAULT_FUNCTION_CONFIG.clone());

    let mut list = Map::new();
    list.set("apiVersion", RESOURCE_LIST_API_VERSION);
    list.set("kind", RESOURCE_LIST_KIND);
    list.set("items", Value::List(Vec::new()));
    list.set("functionConfig", function_config);
    Value::Map(list)
}

/// Runs the image a spec names and collects what it prints.
///
/// Output may be either a plain document stream or a single ResourceList,
/// whose items are returned.
pub fn run_image<R: CommandRunner>(runner: &R, spec: &Spec) -> Result<Vec<Value>, EvalError> {
    let imageref = image_ref(spec);
    let input = to_yaml(&resource_list(spec)).map_err(EvalError::Input)?;
    let args: Vec<String> = vec!["run".into(), "--rm".into(), "-i".into(), imageref.clone()];

    let out = runner.run("docker", &args, input.as_bytes())?;
    let docs = from_yaml_stream(&String::from_utf8_lossy(&out)).map_err(|source| {
        EvalError::Output {
            origin: imageref,
            source,
        }
    })?;
    Ok(unwrap_resource_list(docs))
}

fn unwrap_resource_list(mut docs: Vec<Value>) -> Vec<Value> {
    if docs.len() == 1 && docs[0].get_str(&["kind"]) == Some(RESOURCE_LIST_KIND) {
        if let Some(Value::List(items)) = docs[0].as_map_mut().and_then(|m| m.delete("items")) {
            return items;
        }
        return Vec::new();
    }
    docs
}
