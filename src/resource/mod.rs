//! Resource module - Identity of configuration resources and sets of them.
//!
//! Also holds the bookkeeping annotation used to remember which file a
//! resource was read from or should be written to.

mod identifier;
mod set;

pub use identifier::*;
pub use set::*;

use crate::value::{Map, Value};

/// Annotation recording the package-relative file a resource belongs to.
pub const PATH_ANNOTATION: &str = "config.kubernetes.io/path";

/// Returns the value of an annotation on a document.
pub fn annotation<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get_str(&["metadata", "annotations", key])
}

/// Sets an annotation, creating `metadata.annotations` as needed.
///
/// Documents that are not maps are left untouched.
pub fn set_annotation(doc: &mut Value, key: &str, value: impl Into<String>) {
    if let Some(root) = doc.as_map_mut() {
        root.entry_map("metadata")
            .entry_map("annotations")
            .set(key, value.into());
    }
}

/// Removes an annotation, returning its previous value.
///
/// An `annotations` map left empty by the removal is removed as well.
pub fn remove_annotation(doc: &mut Value, key: &str) -> Option<Value> {
    let metadata = doc.as_map_mut()?.get_mut("metadata")?.as_map_mut()?;
    let annotations: &mut Map = metadata.get_mut("annotations")?.as_map_mut()?;
    let removed = annotations.delete(key);
    if annotations.is_empty() {
        metadata.delete("annotations");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;

    #[test]
    fn test_annotation_roundtrip() {
        let mut doc = from_yaml("kind: Service\nmetadata:\n  name: foo\n").unwrap();
        let original = doc.clone();

        set_annotation(&mut doc, PATH_ANNOTATION, "svc.yaml");
        assert_eq!(annotation(&doc, PATH_ANNOTATION), Some("svc.yaml"));

        assert_eq!(
            remove_annotation(&mut doc, PATH_ANNOTATION),
            Some(Value::from("svc.yaml"))
        );
        assert_eq!(doc, original);
    }

    #[test]
    fn test_remove_annotation_keeps_others() {
        let mut doc = from_yaml(
            "kind: Service\nmetadata:\n  name: foo\n  annotations:\n    keep: me\n",
        )
        .unwrap();
        set_annotation(&mut doc, PATH_ANNOTATION, "svc.yaml");
        remove_annotation(&mut doc, PATH_ANNOTATION);
        assert_eq!(annotation(&doc, "keep"), Some("me"));
    }

    #[test]
    fn test_set_annotation_ignores_non_map() {
        let mut doc = Value::from("scalar");
        set_annotation(&mut doc, PATH_ANNOTATION, "x.yaml");
        assert_eq!(doc, Value::from("scalar"));
        assert_eq!(remove_annotation(&mut doc, PATH_ANNOTATION), None);
    }
}
