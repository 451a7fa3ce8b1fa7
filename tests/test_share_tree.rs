//! Tests for share tree management: wholesale writes, existence probes
//! and node-level edits, driven through a fake qconf binary.

mod common;

use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use gridconf::{ObjectSpec, QconfApi, QconfError, Value};

const TREE_PRESENT: &str = r#"case "$1" in
  -sstree) printf 'id=0\nname=Root\ntype=0\nshares=0\nchildnodes=1\nid=1\nname=deadline\ntype=1\nshares=40\nchildnodes=NONE\n' ;;
  -Astree|-Mstree|-dstree|-astnode|-dstnode) ;;
  *) echo "unknown option \"$1\"" >&2; exit 2 ;;
esac"#;

const TREE_MISSING: &str = r#"case "$1" in
  -sstree) echo 'no sharetree element found' >&2; exit 1 ;;
  -Astree) ;;
  *) echo "unknown option \"$1\"" >&2; exit 2 ;;
esac"#;

fn api(dir: &TempDir, script: &str) -> QconfApi {
    common::stage_fake_qconf(dir, script);
    QconfApi::with_release(common::settings(), "8.6.4").unwrap()
}

fn root_spec<'a>() -> ObjectSpec<'a> {
    ObjectSpec::default().with_data(json!([
        {"id": 0, "name": "Root", "type": 0, "shares": 0}
    ]))
}

// ============== Fetching ==============

#[rstest]
fn test_get_parses_node_list() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_PRESENT);

    let tree = api.get_stree().unwrap();
    let nodes = tree.data_list().unwrap();
    assert_eq!(nodes.len(), 2);
    let deadline = match &nodes[1] {
        Value::Dict(map) => map,
        other => panic!("expected node dictionary, got {:?}", other),
    };
    assert_eq!(deadline.get("id"), Some(&Value::Int(1)));
    assert_eq!(deadline.get("shares"), Some(&Value::Int(40)));
    assert_eq!(
        tree.metadata.get("retrieved_by").map(String::as_str),
        Some("ops@master1")
    );
}

#[rstest]
fn test_missing_tree_probes() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_MISSING);

    assert!(!api.stree_exists().unwrap());
    let err = api.get_stree().unwrap_err();
    assert!(err.is_not_found());
    let empty = api.get_stree_if_exists().unwrap();
    assert!(empty.data_list().unwrap().is_empty());
}

// ============== Writing ==============

#[rstest]
fn test_add_rejects_existing_tree() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_PRESENT);

    let err = api.add_stree(root_spec()).unwrap_err();
    assert!(matches!(err, QconfError::ObjectAlreadyExists(_)));
}

#[rstest]
fn test_modify_or_add_creates_missing_tree() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_MISSING);

    let tree = api.modify_or_add_stree(root_spec()).unwrap();
    assert_eq!(
        tree.metadata.get("created_by").map(String::as_str),
        Some("ops@master1")
    );
    let root = match &tree.data_list().unwrap()[0] {
        Value::Dict(map) => map.clone(),
        other => panic!("expected node dictionary, got {:?}", other),
    };
    assert_eq!(root.get("name"), Some(&Value::str("Root")));
    // Defaults fill the node fields the caller left out.
    assert!(root.contains_key("childnodes"));
}

#[rstest]
fn test_modify_or_add_with_empty_list_removes_tree() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_MISSING);

    let tree = api
        .modify_or_add_stree(ObjectSpec::default().with_data(json!([])))
        .unwrap();
    assert!(tree.data_list().unwrap().is_empty());
    assert!(!tree.metadata.contains_key("created_by"));
}

#[rstest]
fn test_modify_replaces_tree_wholesale() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_PRESENT);

    let tree = api.modify_stree(root_spec()).unwrap();
    assert_eq!(tree.data_list().unwrap().len(), 1);
    assert!(tree.metadata.contains_key("modified_on"));
}

#[rstest]
fn test_node_without_name_is_rejected() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_MISSING);

    let spec = ObjectSpec::default().with_data(json!([{"id": 0, "shares": 0}]));
    let err = api.modify_or_add_stree(spec).unwrap_err();
    assert!(matches!(err, QconfError::InvalidRequest(_)));
}

// ============== Node edits ==============

#[rstest]
fn test_add_node_returns_updated_tree() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_PRESENT);

    let tree = api.add_stnode("/deadline", 40).unwrap();
    assert_eq!(tree.data_list().unwrap().len(), 2);
}

#[rstest]
fn test_node_edits_require_a_path() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir, TREE_PRESENT);

    assert!(matches!(
        api.add_stnode("", 10).unwrap_err(),
        QconfError::InvalidArgument(_)
    ));
    assert!(matches!(
        api.delete_stnode("").unwrap_err(),
        QconfError::InvalidArgument(_)
    ));
}
