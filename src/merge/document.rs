//! Structural three-way merge of a single document.

use super::MergeError;
use crate::fieldpath::Path;
use crate::resource::ResourceIdentifier;
use crate::value::{Map, Value};

/// Merges two divergent versions of a document against their common ancestor.
///
/// `mine` is the local version, `base` the previously generated one and
/// `theirs` the newly generated one. Map fields are resolved independently
/// and recursively; every other node, lists included, is compared as a whole.
/// A field changed on both sides to different values is a conflict, reported
/// with the path of the outermost field that cannot be resolved.
pub fn merge_documents(
    id: &ResourceIdentifier,
    mine: &Value,
    base: &Value,
    theirs: &Value,
) -> Result<Value, MergeError> {
    merge_field(&Path::new(), Some(mine), Some(base), Some(theirs))
        .map(Option::unwrap_or_default)
        .map_err(|path| MergeError::document_conflict(id.clone(), path))
}

/// Resolves one position in the three trees. `None` means the field is
/// absent; a resolved `None` means the field is dropped from the result.
fn merge_field(
    path: &Path,
    mine: Option<&Value>,
    base: Option<&Value>,
    theirs: Option<&Value>,
) -> Result<Option<Value>, Path> {
    let Some(base) = base else {
        return match (mine, theirs) {
            (Some(m), Some(t)) if m == t => Ok(Some(m.clone())),
            (Some(_), Some(_)) => Err(path.clone()),
            (Some(m), None) => Ok(Some(m.clone())),
            (None, t) => Ok(t.cloned()),
        };
    };

    if mine == Some(base) {
        return Ok(theirs.cloned());
    }
    if theirs == Some(base) || mine == theirs {
        return Ok(mine.cloned());
    }

    match (mine, base, theirs) {
        (Some(Value::Map(m)), Value::Map(b), Some(Value::Map(t))) => {
            merge_maps(path, m, b, t).map(|merged| Some(Value::Map(merged)))
        }
        _ => Err(path.clone()),
    }
}

fn merge_maps(path: &Path, mine: &Map, base: &Map, theirs: &Map) -> Result<Map, Path> {
    let keys: std::collections::BTreeSet<&String> =
        mine.keys().chain(base.keys()).chain(theirs.keys()).collect();

    let mut result = Map::new();
    for key in keys {
        let merged = merge_field(
            &path.with(key.as_str()),
            mine.get(key),
            base.get(key),
            theirs.get(key),
        )?;
        if let Some(value) = merged {
            result.set(key.clone(), value);
        }
    }
    Ok(result)
}
