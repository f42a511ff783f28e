//! Package directory I/O.

use crate::eval::default_path;
use crate::resource::{annotation, remove_annotation, set_annotation, PATH_ANNOTATION};
use crate::spec::SPEC_FILE;
use crate::value::{from_yaml_stream, to_yaml_stream, DecodeError, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name used for a document that cannot be given any other.
const FALLBACK_FILE: &str = "resources.yaml";

/// PackageError is returned when a package directory cannot be read or written.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("could not encode documents for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("resource path {0:?} must be relative and stay inside the package")]
    InvalidPath(String),

    #[error("{0} exists and is not a directory")]
    NotADirectory(PathBuf),

    #[error("directory {0} is not empty; cannot import into a directory which already has files")]
    NotEmpty(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Lists the manifest files of a package, relative to `dir`, in sorted order.
///
/// Manifests are `.yaml` and `.yml` files; hidden entries are skipped.
pub fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
    let mut files = Vec::new();
    collect_manifests(dir, Path::new(""), &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_manifests(root: &Path, rel: &Path, files: &mut Vec<PathBuf>) -> Result<(), PackageError> {
    let dir = root.join(rel);
    for entry in fs::read_dir(&dir).map_err(io_err(&dir))? {
        let entry = entry.map_err(io_err(&dir))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == SPEC_FILE {
            continue;
        }
        let rel_path = rel.join(&*name);
        let file_type = entry.file_type().map_err(io_err(&entry.path()))?;
        if file_type.is_dir() {
            collect_manifests(root, &rel_path, files)?;
        } else if name.ends_with(".yaml") || name.ends_with(".yml") {
            files.push(rel_path);
        }
    }
    Ok(())
}

/// Reads every document in a package directory.
///
/// Files are read in sorted path order and documents in file order. Each
/// document is annotated with the package-relative path of its file.
pub fn read_package(dir: &Path) -> Result<Vec<Value>, PackageError> {
    let mut docs = Vec::new();
    for rel in manifest_files(dir)? {
        let path = dir.join(&rel);
        let content = fs::read_to_string(&path).map_err(io_err(&path))?;
        let parsed = from_yaml_stream(&content).map_err(|source| PackageError::Parse {
            path: path.clone(),
            source,
        })?;
        let rel = slash_path(&rel);
        debug!(file = %rel, documents = parsed.len(), "read manifests");
        for mut doc in parsed {
            set_annotation(&mut doc, PATH_ANNOTATION, rel.as_str());
            docs.push(doc);
        }
    }
    Ok(docs)
}

/// Writes documents into a package directory.
///
/// Documents are grouped into files by their path annotation, which is
/// removed from what is written. Documents without one go to
/// `<kind>_<name>.yaml`. Manifest files already in the directory that
/// receive no documents are deleted.
pub fn write_package(dir: &Path, docs: &[Value]) -> Result<(), PackageError> {
    let mut files: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for doc in docs {
        let mut doc = doc.clone();
        let rel = match remove_annotation(&mut doc, PATH_ANNOTATION) {
            Some(Value::String(path)) => path,
            _ => default_path(&doc).unwrap_or_else(|| FALLBACK_FILE.to_string()),
        };
        files.entry(normalize_relative(&rel)?).or_default().push(doc);
    }

    for stale in manifest_files(dir)? {
        if !files.contains_key(&slash_path(&stale)) {
            let path = dir.join(&stale);
            debug!(file = %path.display(), "removing manifest with no resources left");
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
    }

    for (rel, contents) in &files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let yaml = to_yaml_stream(contents).map_err(|source| PackageError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, yaml).map_err(io_err(&path))?;
    }
    info!(dir = %dir.display(), files = files.len(), documents = docs.len(), "wrote package");
    Ok(())
}

/// Makes sure `dir` can receive a new package: it is created if missing,
/// and must otherwise be an empty directory.
pub fn ensure_package_dir(dir: &Path) -> Result<(), PackageError> {
    match fs::metadata(dir) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(io_err(dir))
        }
        Err(err) => Err(io_err(dir)(err)),
        Ok(meta) if !meta.is_dir() => Err(PackageError::NotADirectory(dir.to_path_buf())),
        Ok(_) => {
            let mut entries = fs::read_dir(dir).map_err(io_err(dir))?;
            if entries.next().is_some() {
                return Err(PackageError::NotEmpty(dir.to_path_buf()));
            }
            Ok(())
        }
    }
}

/// Turns a resource path into the `/`-separated form used to group files.
/// Paths that are absolute, climb out of the package or name no file are
/// rejected.
fn normalize_relative(rel: &str) -> Result<String, PackageError> {
    let invalid = || PackageError::InvalidPath(rel.to_string());
    let mut parts = Vec::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            _ => return Err(invalid()),
        }
    }
    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(parts.join("/"))
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::identify;
    use crate::value::from_yaml_stream;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn names(docs: &[Value]) -> Vec<String> {
        docs.iter().map(|d| identify(d).unwrap().name).collect()
    }

    #[test]
    fn test_read_package_annotates_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.yaml", "kind: Service\nmetadata:\n  name: b\n");
        write(
            dir.path(),
            "a.yml",
            "kind: Service\nmetadata:\n  name: a1\n---\nkind: Service\nmetadata:\n  name: a2\n",
        );
        write(dir.path(), "templates/c.yaml", "kind: Service\nmetadata:\n  name: c\n");
        write(dir.path(), "README.md", "not a manifest");
        write(dir.path(), ".git/config.yaml", "kind: Hidden\nmetadata:\n  name: h\n");
        write(dir.path(), SPEC_FILE, "kind: HelmChart\n");

        let docs = read_package(dir.path()).unwrap();
        assert_eq!(names(&docs), vec!["a1", "a2", "b", "c"]);
        assert_eq!(annotation(&docs[0], PATH_ANNOTATION), Some("a.yml"));
        assert_eq!(annotation(&docs[3], PATH_ANNOTATION), Some("templates/c.yaml"));
    }

    #[test]
    fn test_read_package_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.yaml", "kind: [unclosed\n");
        let err = read_package(dir.path()).unwrap_err();
        assert!(matches!(err, PackageError::Parse { .. }));
    }

    #[test]
    fn test_write_package_groups_and_strips_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let docs = from_yaml_stream(
            r#"
kind: Service
metadata:
  name: a
  annotations:
    config.kubernetes.io/path: app/all.yaml
---
kind: Deployment
metadata:
  name: web
---
kind: ConfigMap
metadata:
  name: b
  annotations:
    config.kubernetes.io/path: app/all.yaml
    keep: me
"#,
        )
        .unwrap();

        write_package(dir.path(), &docs).unwrap();

        let all = fs::read_to_string(dir.path().join("app/all.yaml")).unwrap();
        let written = from_yaml_stream(&all).unwrap();
        assert_eq!(names(&written), vec!["a", "b"]);
        assert_eq!(annotation(&written[0], PATH_ANNOTATION), None);
        assert!(written[0].get_path(&["metadata", "annotations"]).is_none());
        assert_eq!(annotation(&written[1], "keep"), Some("me"));

        assert!(dir.path().join("deployment_web.yaml").exists());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "svc.yaml", "kind: Service\nmetadata:\n  name: a\n");
        let docs = read_package(dir.path()).unwrap();

        write_package(dir.path(), &docs).unwrap();
        assert_eq!(read_package(dir.path()).unwrap(), docs);
        assert_eq!(
            fs::read_to_string(dir.path().join("svc.yaml")).unwrap(),
            "kind: Service\nmetadata:\n  name: a\n"
        );
    }

    #[test]
    fn test_write_package_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "keep.yaml", "kind: Service\nmetadata:\n  name: keep\n");
        write(dir.path(), "old/gone.yaml", "kind: Service\nmetadata:\n  name: gone\n");
        write(dir.path(), "notes.txt", "left alone");
        write(dir.path(), SPEC_FILE, "kind: HelmChart\n");

        let docs: Vec<Value> = read_package(dir.path())
            .unwrap()
            .into_iter()
            .filter(|d| identify(d).unwrap().name == "keep")
            .collect();
        write_package(dir.path(), &docs).unwrap();

        assert!(dir.path().join("keep.yaml").exists());
        assert!(!dir.path().join("old/gone.yaml").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join(SPEC_FILE).exists());
    }

    #[test]
    fn test_write_package_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let docs = from_yaml_stream(
            "kind: Service\nmetadata:\n  name: a\n  annotations:\n    config.kubernetes.io/path: ../evil.yaml\n",
        )
        .unwrap();
        let err = write_package(dir.path(), &docs).unwrap_err();
        assert!(matches!(err, PackageError::InvalidPath(p) if p == "../evil.yaml"));
    }

    #[test]
    fn test_write_package_normalizes_paths() {
        let dir = tempfile::tempdir().unwrap();
        let docs = from_yaml_stream(
            r#"
kind: Service
metadata:
  name: a
  annotations:
    config.kubernetes.io/path: all.yaml
---
kind: Service
metadata:
  name: b
  annotations:
    config.kubernetes.io/path: ./all.yaml
---
kind: Service
metadata:
  name: c
  annotations:
    config.kubernetes.io/path: app/./c.yaml
"#,
        )
        .unwrap();

        write_package(dir.path(), &docs).unwrap();

        let read = read_package(dir.path()).unwrap();
        assert_eq!(names(&read), vec!["a", "b", "c"]);
        assert_eq!(annotation(&read[1], PATH_ANNOTATION), Some("all.yaml"));
        assert_eq!(annotation(&read[2], PATH_ANNOTATION), Some("app/c.yaml"));
    }

    #[test]
    fn test_write_package_rejects_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        let docs = from_yaml_stream(
            "kind: Service\nmetadata:\n  name: a\n  annotations:\n    config.kubernetes.io/path: ./\n",
        )
        .unwrap();
        let err = write_package(dir.path(), &docs).unwrap_err();
        assert!(matches!(err, PackageError::InvalidPath(_)));
    }

    #[test]
    fn test_ensure_package_dir() {
        let dir = tempfile::tempdir().unwrap();

        let fresh = dir.path().join("new/pkg");
        ensure_package_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
        ensure_package_dir(&fresh).unwrap();

        write(&fresh, "x.yaml", "kind: A\n");
        assert!(matches!(ensure_package_dir(&fresh), Err(PackageError::NotEmpty(_))));
        assert!(matches!(
            ensure_package_dir(&fresh.join("x.yaml")),
            Err(PackageError::NotADirectory(_))
        ));
    }
}
