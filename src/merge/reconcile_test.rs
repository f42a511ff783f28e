//! Tests for reconciling sets of resources.

#[cfg(test)]
mod tests {
    use crate::merge::{
        reconcile, reconcile_with, ConflictPolicy, Diagnostic, Input, MergeError, MergeOptions,
        SetConflictKind,
    };
    use crate::resource::{identify, ResourceIdentifier};
    use crate::value::{from_yaml_stream, Value};
    use pretty_assertions::assert_eq;

    const SERVICE_FOO: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: foo
"#;

    const DEPLOYMENT_BAR: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bar
  namespace: app
"#;

    fn docs(src: &str) -> Vec<Value> {
        from_yaml_stream(src).unwrap()
    }

    fn stream(parts: &[&str]) -> Vec<Value> {
        docs(&parts.join("---\n"))
    }

    fn names(result: &[Value]) -> Vec<String> {
        result
            .iter()
            .map(|doc| identify(doc).unwrap().name)
            .collect()
    }

    fn service(name: &str) -> String {
        format!("apiVersion: v1\nkind: Service\nmetadata:\n  name: {}\n", name)
    }

    fn set_kind(err: MergeError) -> (String, SetConflictKind) {
        match err {
            MergeError::SetConflict { id, kind } => (id.name, kind),
            other => panic!("expected a set conflict, got {:?}", other),
        }
    }

    fn strict() -> MergeOptions {
        MergeOptions::default()
    }

    fn content_aware() -> MergeOptions {
        MergeOptions::with_policy(ConflictPolicy::ContentAware)
    }

    #[test]
    fn test_merge_empty() {
        let merged = reconcile(&docs("# ours"), &docs("# base"), &docs("# theirs")).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_no_change() {
        let src = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let merged = reconcile(&src, &src, &src).unwrap();
        assert_eq!(merged, src);
    }

    #[test]
    fn test_merge_local_and_upstream_edits() {
        let base = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bar
  namespace: app
spec:
  replicas: 1
"#;
        let local = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bar
  namespace: app
spec:
  replicas: 4
"#;
        let updated = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bar
  namespace: app
spec:
  replicas: 1
  strategy: Replace
"#;
        let expected = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: bar
  namespace: app
spec:
  replicas: 4
  strategy: Replace
"#;
        let merged = reconcile(&docs(local), &docs(base), &docs(updated)).unwrap();
        assert_eq!(merged, docs(expected));
    }

    #[test]
    fn test_merge_new_upstream_resource_adopted() {
        let local = stream(&[SERVICE_FOO]);
        let updated = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let merged = reconcile(&local, &local, &updated).unwrap();
        assert_eq!(merged, updated);
    }

    #[test]
    fn test_merge_base_only_removed_silently() {
        let local = stream(&[SERVICE_FOO]);
        let base = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let updated = stream(&[SERVICE_FOO]);

        let merged = reconcile_with(&local, &base, &updated, &strict()).unwrap();
        assert_eq!(merged.documents, stream(&[SERVICE_FOO]));
        assert_eq!(
            merged.diagnostics,
            vec![Diagnostic::Dropped {
                id: ResourceIdentifier::new("apps/v1", "Deployment", "app", "bar"),
            }]
        );
    }

    #[test]
    fn test_merge_local_only_kept() {
        let local = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let generated = stream(&[SERVICE_FOO]);
        let merged = reconcile(&local, &generated, &generated).unwrap();
        assert_eq!(merged, local);
    }

    #[test]
    fn test_merge_removed_upstream_conflicts() {
        let local = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let base = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let updated = stream(&[SERVICE_FOO]);

        let err = reconcile(&local, &base, &updated).unwrap_err();
        assert_eq!(
            set_kind(err),
            ("bar".to_string(), SetConflictKind::RemovedUpstream)
        );
    }

    #[test]
    fn test_merge_added_on_both_sides_conflicts_even_when_identical() {
        let local = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let base = stream(&[SERVICE_FOO]);
        let updated = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);

        let err = reconcile(&local, &base, &updated).unwrap_err();
        assert_eq!(
            set_kind(err),
            ("bar".to_string(), SetConflictKind::AddedOnBothSides)
        );
    }

    #[test]
    fn test_merge_removed_locally_conflicts() {
        let local = stream(&[SERVICE_FOO]);
        let generated = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);

        let err = reconcile(&local, &generated, &generated).unwrap_err();
        assert_eq!(
            set_kind(err),
            ("bar".to_string(), SetConflictKind::RemovedLocally)
        );
    }

    #[test]
    fn test_merge_document_conflict_propagates() {
        let local = docs("kind: ConfigMap\nmetadata:\n  name: c\ndata:\n  k: local\n");
        let base = docs("kind: ConfigMap\nmetadata:\n  name: c\ndata:\n  k: base\n");
        let updated = docs("kind: ConfigMap\nmetadata:\n  name: c\ndata:\n  k: upstream\n");

        let err = reconcile(&local, &base, &updated).unwrap_err();
        match err {
            MergeError::DocumentConflict { id, path } => {
                assert_eq!(id.name, "c");
                assert_eq!(path.to_string(), ".data.k");
            }
            other => panic!("expected a document conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_stops_at_first_conflict_in_local_order() {
        let local = stream(&[service("a").as_str(), service("b").as_str()]);
        let base = stream(&[service("b").as_str(), service("a").as_str()]);
        let updated = docs("");

        let err = reconcile(&local, &base, &updated).unwrap_err();
        assert_eq!(set_kind(err).0, "a");
    }

    #[test]
    fn test_merge_output_ordering() {
        // local order first, then new upstream resources in updated's order.
        let local = stream(&[service("l2").as_str(), service("shared").as_str(), service("l1").as_str()]);
        let base = stream(&[service("shared").as_str(), service("gone").as_str()]);
        let updated = stream(&[service("u2").as_str(), service("shared").as_str(), service("u1").as_str()]);

        let merged = reconcile(&local, &base, &updated).unwrap();
        assert_eq!(names(&merged), vec!["l2", "shared", "l1", "u2", "u1"]);
    }

    #[test]
    fn test_merge_no_op_is_idempotent() {
        let src = stream(&[
            service("a").as_str(),
            DEPLOYMENT_BAR,
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: app\ndata:\n  x: '1'\n",
        ]);
        let merged = reconcile(&src, &src, &src).unwrap();

        let mut expected = src.clone();
        let mut got = merged;
        expected.sort();
        got.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_merge_no_op_with_nan_field() {
        let src = docs("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\nspec:\n  ratio: .nan\n");
        let merged = reconcile(&src, &src, &src).unwrap();
        assert_eq!(merged, src);
    }

    #[test]
    fn test_merge_inputs_untouched() {
        let local = stream(&[service("a").as_str()]);
        let base = stream(&[service("a").as_str()]);
        let updated = stream(&[
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: a\nspec:\n  type: ClusterIP\n",
        ]);
        let (l, b, u) = (local.clone(), base.clone(), updated.clone());

        let merged = reconcile(&local, &base, &updated).unwrap();
        assert_eq!(merged, updated);
        assert_eq!((local, base, updated), (l, b, u));
    }

    #[test]
    fn test_merge_drops_unidentified_documents() {
        let local = stream(&[SERVICE_FOO, "apiVersion: v1\ndata:\n  loose: true\n"]);
        let base = stream(&[SERVICE_FOO]);
        let updated = stream(&["kind: Note\n", SERVICE_FOO]);

        let merged = reconcile_with(&local, &base, &updated, &strict()).unwrap();
        assert_eq!(merged.documents, stream(&[SERVICE_FOO]));
        assert_eq!(
            merged.diagnostics,
            vec![
                Diagnostic::Unidentified {
                    input: Input::Local,
                    position: 1,
                },
                Diagnostic::Unidentified {
                    input: Input::Updated,
                    position: 0,
                },
            ]
        );
    }

    #[test]
    fn test_merge_duplicate_later_wins() {
        let local = stream(&[
            "kind: ConfigMap\nmetadata:\n  name: c\ndata:\n  v: '1'\n",
            "kind: ConfigMap\nmetadata:\n  name: c\ndata:\n  v: '2'\n",
        ]);

        let merged = reconcile_with(&local, &[], &[], &strict()).unwrap();
        assert_eq!(merged.documents.len(), 1);
        assert_eq!(merged.documents[0].get_str(&["data", "v"]), Some("2"));
        assert!(matches!(
            merged.diagnostics.as_slice(),
            [Diagnostic::Duplicate {
                input: Input::Local,
                ..
            }]
        ));
    }

    #[test]
    fn test_content_aware_drops_unmodified_upstream_removal() {
        let local = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let base = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let updated = stream(&[SERVICE_FOO]);

        let merged = reconcile_with(&local, &base, &updated, &content_aware()).unwrap();
        assert_eq!(merged.documents, stream(&[SERVICE_FOO]));
    }

    #[test]
    fn test_content_aware_keeps_modified_upstream_removal_conflict() {
        let local = stream(&[
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: foo\nspec:\n  type: NodePort\n",
        ]);
        let base = stream(&[SERVICE_FOO]);

        let err = reconcile_with(&local, &base, &[], &content_aware()).unwrap_err();
        assert_eq!(
            set_kind(err),
            ("foo".to_string(), SetConflictKind::RemovedUpstream)
        );
    }

    #[test]
    fn test_content_aware_adopts_identical_double_add() {
        let local = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let base = stream(&[SERVICE_FOO]);
        let updated = stream(&[DEPLOYMENT_BAR, SERVICE_FOO]);

        let merged = reconcile_with(&local, &base, &updated, &content_aware()).unwrap();
        assert_eq!(merged.documents, local);
    }

    #[test]
    fn test_content_aware_drops_unchanged_local_removal() {
        let local = stream(&[SERVICE_FOO]);
        let generated = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);

        let merged = reconcile_with(&local, &generated, &generated, &content_aware()).unwrap();
        assert_eq!(merged.documents, local);
    }

    #[test]
    fn test_content_aware_local_removal_with_upstream_change_conflicts() {
        let local = stream(&[SERVICE_FOO]);
        let base = stream(&[SERVICE_FOO, DEPLOYMENT_BAR]);
        let updated = stream(&[
            SERVICE_FOO,
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: bar\n  namespace: app\nspec:\n  replicas: 2\n",
        ]);

        let err = reconcile_with(&local, &base, &updated, &content_aware()).unwrap_err();
        assert_eq!(
            set_kind(err),
            ("bar".to_string(), SetConflictKind::RemovedLocally)
        );
    }
}
