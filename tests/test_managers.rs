//! Tests for the per-kind managers behind the facade, driven end to end
//! through a fake qconf binary that plays a small two-queue cluster.

mod common;

use indexmap::IndexMap;
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use gridconf::{ObjectSpec, QconfApi, QconfError, Value};

const FAKE_CLUSTER: &str = r#"case "$1" in
  -help) echo "Univa Grid Engine 8.6.4" ;;
  -sql) printf 'all.q\nbatch\n' ;;
  -sq)
    if [ "$2" = "batch" ] || [ "$2" = "all.q" ]; then
      printf 'qname %s\nhostlist @allhosts\nslots 24\npe_list make,mpi\nh_rt INFINITY\n' "$2"
    else
      echo "cluster queue entry \"$2\" does not exist" >&2
      exit 1
    fi
    ;;
  -sqld) printf 'qname all.q\nslots 10\n=========================================\nqname batch\nslots 24\n' ;;
  -Aq|-Mq|-dq) ;;
  -sel) printf 'exec1\nexec2\n' ;;
  -scall) echo 'no calendar definition' >&2; exit 1 ;;
  -so) printf 'alice\nbob\n' ;;
  -ao|-do) ;;
  -sconf) printf 'execd_spool_dir /opt/uge/default/spool\nmailer /bin/mail\n' ;;
  -ssconf) printf 'algorithm default\nmaxujobs 0\nschedd_job_info false\nweight_user 0.25\n' ;;
  -Msconf) ;;
  -sc)
    printf '#name shortcut type relop requestable consumable default urgency aapre affinity\n'
    printf '#----\n'
    printf 'arch a RESTRING == YES NO NONE 0 NO 0.0\n'
    printf 'slots s INT <= YES YES 1 1000 YES 0.0\n'
    ;;
  -Mc) ;;
  -su)
    if [ "$2" = "devs" ]; then
      printf 'name devs\ntype ACL\nfshare 0\noticket 0\nentries alice,bob\n'
    else
      echo "access list \"$2\" does not exist" >&2
      exit 1
    fi
    ;;
  -au|-du) ;;
  *) echo "unknown option \"$1\"" >&2; exit 2 ;;
esac"#;

fn api(dir: &TempDir) -> QconfApi {
    common::stage_fake_qconf(dir, FAKE_CLUSTER);
    QconfApi::with_release(common::settings(), "8.6.4").unwrap()
}

// ============== Cluster queues ==============

#[rstest]
fn test_get_queue_parses_and_stamps() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let queue = api.get_queue("batch").unwrap();
    assert_eq!(queue.name(), Some("batch"));
    let map = queue.data_dict().unwrap();
    assert_eq!(map.get("hostlist"), Some(&Value::str("@allhosts")));
    assert_eq!(map.get("h_rt"), Some(&Value::Float(f64::INFINITY)));
    assert_eq!(
        queue.metadata.get("retrieved_by").map(String::as_str),
        Some("ops@master1")
    );
}

#[rstest]
fn test_get_missing_queue_is_not_found() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let err = api.get_queue("ghost").unwrap_err();
    assert!(err.is_not_found());
    assert!(api.queue_exists("batch").unwrap());
    assert!(!api.queue_exists("ghost").unwrap());
}

#[rstest]
fn test_add_queue_checks_existence_first() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let queue = api
        .add_queue(ObjectSpec::named("newq").with_data(json!({"slots": 16})))
        .unwrap();
    assert_eq!(queue.name(), Some("newq"));
    assert_eq!(
        queue.metadata.get("created_by").map(String::as_str),
        Some("ops@master1")
    );

    let err = api.add_queue(ObjectSpec::named("batch")).unwrap_err();
    assert!(matches!(err, QconfError::ObjectAlreadyExists(_)));
}

#[rstest]
fn test_modify_queue_merges_over_current_record() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let queue = api
        .modify_queue(ObjectSpec::named("batch").with_data(json!({"slots": 48})))
        .unwrap();
    let map = queue.data_dict().unwrap();
    assert_eq!(map.get("slots"), Some(&Value::Int(48)));
    // Untouched fields keep the cluster's values.
    assert_eq!(map.get("hostlist"), Some(&Value::str("@allhosts")));
    assert!(queue.metadata.contains_key("modified_on"));
}

#[rstest]
fn test_delete_queue_requires_existing_record() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    api.delete_queue("batch").unwrap();
    let err = api.delete_queue("ghost").unwrap_err();
    assert!(err.is_not_found());
}

#[rstest]
fn test_get_queues_splits_bulk_dump() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let queues = api.get_queues().unwrap();
    assert_eq!(queues.len(), 2);
    assert_eq!(queues[0].name(), Some("all.q"));
    assert_eq!(queues[1].name(), Some("batch"));
    assert!(queues[1].metadata.contains_key("retrieved_on"));
}

// ============== Listings ==============

#[rstest]
fn test_execution_host_listing_appends_global() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let hosts = api.list_ehosts().unwrap();
    assert_eq!(hosts.names, vec!["exec1", "exec2", "global"]);
}

#[rstest]
fn test_empty_cluster_listing_yields_empty_list() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let calendars = api.list_cals().unwrap();
    assert!(calendars.is_empty());
}

// ============== Name rosters ==============

#[rstest]
fn test_operator_roster_add_returns_refreshed_list() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let operators = api.list_operators().unwrap();
    assert!(operators.contains("alice"));
    assert!(!operators.metadata.contains_key("modified_by"));

    let operators = api.add_operators("carol").unwrap();
    assert_eq!(
        operators.metadata.get("modified_by").map(String::as_str),
        Some("ops@master1")
    );
}

// ============== Cluster configuration ==============

#[rstest]
fn test_global_configuration_is_fetched_without_name_argument() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let conf = api.get_conf("global").unwrap();
    assert_eq!(conf.name(), Some("global"));
    assert_eq!(
        conf.data_dict().unwrap().get("execd_spool_dir"),
        Some(&Value::str("/opt/uge/default/spool"))
    );
}

#[rstest]
fn test_global_configuration_cannot_be_added_or_deleted() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let err = api.add_conf(ObjectSpec::named("global")).unwrap_err();
    assert!(matches!(err, QconfError::InvalidRequest(_)));
    let err = api.delete_conf("global").unwrap_err();
    assert!(matches!(err, QconfError::InvalidRequest(_)));
}

// ============== Scheduler configuration ==============

#[rstest]
fn test_scheduler_configuration_modify_merges() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let sconf = api.get_sconf().unwrap();
    assert_eq!(
        sconf.data_dict().unwrap().get("schedd_job_info"),
        Some(&Value::Bool(false))
    );

    let sconf = api
        .modify_sconf(ObjectSpec::default().with_data(json!({"maxujobs": 100})))
        .unwrap();
    let map = sconf.data_dict().unwrap();
    assert_eq!(map.get("maxujobs"), Some(&Value::Int(100)));
    assert_eq!(map.get("weight_user"), Some(&Value::Float(0.25)));
    assert!(sconf.metadata.contains_key("modified_on"));
}

// ============== Complex attribute table ==============

fn attribute_row() -> IndexMap<String, Value> {
    IndexMap::from([
        ("shortcut".to_string(), Value::str("gpu")),
        ("type".to_string(), Value::str("INT")),
        ("relop".to_string(), Value::str("<=")),
        ("requestable".to_string(), Value::Bool(true)),
        ("consumable".to_string(), Value::Bool(true)),
        ("default".to_string(), Value::Int(0)),
        ("urgency".to_string(), Value::Int(0)),
        ("aapre".to_string(), Value::Bool(true)),
        ("affinity".to_string(), Value::Float(0.0)),
    ])
}

#[rstest]
fn test_add_attribute_rejects_existing_row() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let complex = api.add_cattr("gpu", attribute_row()).unwrap();
    assert!(complex.data_dict().unwrap().contains_key("gpu"));

    let err = api.add_cattr("slots", attribute_row()).unwrap_err();
    assert!(matches!(err, QconfError::ObjectAlreadyExists(_)));
}

#[rstest]
fn test_add_attribute_requires_every_column() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let mut row = attribute_row();
    row.shift_remove("urgency");
    let err = api.add_cattr("gpu", row).unwrap_err();
    assert!(matches!(err, QconfError::InvalidArgument(_)));
}

#[rstest]
fn test_modify_attribute_updates_columns_in_place() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let data = IndexMap::from([("consumable".to_string(), Value::Bool(true))]);
    let complex = api.modify_cattr("arch", data).unwrap();
    let arch = match complex.data_dict().unwrap().get("arch") {
        Some(Value::Dict(row)) => row.clone(),
        other => panic!("expected attribute row, got {:?}", other),
    };
    assert_eq!(arch.get("consumable"), Some(&Value::Bool(true)));
    assert_eq!(arch.get("type"), Some(&Value::str("RESTRING")));
}

#[rstest]
fn test_delete_attribute_rejects_unknown_row() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let err = api.delete_cattr("bogus").unwrap_err();
    assert!(err.is_not_found());
}

// ============== Access list membership ==============

#[rstest]
fn test_add_users_to_acls_returns_refreshed_lists() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let lists = api.add_users_to_acls("alice bob", "devs").unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name(), Some("devs"));
    assert_eq!(
        lists[0].data_dict().unwrap().get("entries"),
        Some(&Value::list_of(&["alice", "bob"]))
    );
}

#[rstest]
fn test_acl_membership_rejects_empty_name_input() {
    let _guard = common::lock_env();
    let dir = TempDir::new().unwrap();
    let api = api(&dir);

    let err = api.add_users_to_acls("  ", "devs").unwrap_err();
    assert!(matches!(err, QconfError::InvalidArgument(_)));
}
