//! Static schema catalog: every supported (kind, version) pair, with its
//! name key, required-field defaults and coercion tables.
//!
//! Versions that only differ in which release ships them share their
//! tables; a version that changes field semantics gets its own entry.

use once_cell::sync::Lazy;

use indexmap::IndexMap;

use crate::errors::{QconfError, Result};
use crate::objects::schema::{Layout, ObjectKind, Schema};
use crate::objects::value::{KeywordTable, Value};

static CATALOG: Lazy<Vec<Schema>> = Lazy::new(|| {
    vec![
        cluster_queue("1.0"),
        cluster_queue("2.0"),
        execution_host(),
        host_group(),
        user(),
        project(),
        calendar(),
        checkpointing_environment(),
        access_list(),
        parallel_environment("1.0"),
        parallel_environment("2.0"),
        job_class("1.0"),
        job_class("2.0"),
        job_class("3.0"),
        job_class("4.0"),
        resource_quota_set(),
        cluster_configuration("1.0"),
        cluster_configuration("2.0"),
        scheduler_configuration("1.0"),
        scheduler_configuration("2.0"),
        scheduler_configuration("3.0"),
        complex_configuration("1.0"),
        complex_configuration("2.0"),
        complex_configuration("3.0"),
        complex_configuration("4.0"),
        share_tree(),
    ]
});

/// Look up the schema for one (kind, version) pair.
pub fn schema(kind: ObjectKind, version: &str) -> Result<&'static Schema> {
    CATALOG
        .iter()
        .find(|s| s.kind == kind && s.version == version)
        .ok_or_else(|| {
            QconfError::ObjectNotFound(format!(
                "invalid object version: {} {}",
                kind.class_name(),
                version
            ))
        })
}

/// All versions known for a kind, in catalog (chronological) order.
pub fn versions(kind: ObjectKind) -> Vec<&'static str> {
    CATALOG
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| s.version)
        .collect()
}

fn s(value: &str) -> Value {
    Value::str(value)
}

fn list(items: &[&str]) -> Value {
    Value::list_of(items)
}

const INF: Value = Value::Float(f64::INFINITY);

fn cluster_queue(version: &'static str) -> Schema {
    let mut defaults = vec![
        ("hostlist", Value::Null),
        ("seq_no", Value::Int(0)),
        ("load_thresholds", s("np_load_avg=1.75")),
        ("suspend_thresholds", Value::Null),
        ("nsuspend", Value::Int(1)),
        ("suspend_interval", s("00:05:00")),
        ("priority", Value::Int(0)),
        ("min_cpu_interval", s("00:05:00")),
        ("qtype", s("BATCH INTERACTIVE")),
        ("ckpt_list", Value::Null),
        ("pe_list", s("make")),
        ("jc_list", list(&["NO_JC", "ANY_JC"])),
        ("rerun", Value::Bool(false)),
        ("slots", Value::Int(1)),
        ("tmpdir", s("/tmp")),
        ("shell", s("/bin/sh")),
        ("prolog", Value::Null),
        ("epilog", Value::Null),
        ("shell_start_mode", s("unix_behavior")),
        ("starter_method", Value::Null),
        ("suspend_method", Value::Null),
        ("resume_method", Value::Null),
        ("terminate_method", Value::Null),
        ("notify", s("00:00:60")),
        ("owner_list", Value::Null),
        ("user_lists", Value::Null),
        ("xuser_lists", Value::Null),
        ("subordinate_list", Value::Null),
        ("complex_values", Value::Null),
        ("projects", Value::Null),
        ("xprojects", Value::Null),
        ("calendar", Value::Null),
        ("initial_state", s("default")),
        ("s_rt", INF),
        ("h_rt", INF),
        ("d_rt", INF),
        ("s_cpu", INF),
        ("h_cpu", INF),
        ("s_fsize", INF),
        ("h_fsize", INF),
        ("s_data", INF),
        ("h_data", INF),
        ("s_stack", INF),
        ("h_stack", INF),
        ("s_core", INF),
        ("h_core", INF),
        ("s_rss", INF),
        ("h_rss", INF),
        ("s_vmem", INF),
        ("h_vmem", INF),
    ];
    // Affinity scheduling weights shipped with the 2.0 queue.
    if version != "1.0" {
        defaults.extend([
            ("weight_host_affinity", Value::Float(100.0)),
            ("weight_queue_affinity", Value::Float(100.0)),
        ]);
    }
    Schema::builder(ObjectKind::ClusterQueue, version)
        .name_key("qname")
        .user_provided(&["qname"])
        .defaults(defaults)
        .list_keys(&[
            ("slots", ","),
            ("load_thresholds", ","),
            ("suspend_thresholds", ","),
            ("ckpt_list", ","),
            ("pe_list", ","),
            ("jc_list", ","),
            ("owner_list", ","),
            ("user_lists", ","),
            ("xuser_lists", ","),
            ("subordinate_list", ","),
            ("complex_values", ","),
            ("projects", ","),
            ("xprojects", ","),
        ])
        .build()
}

fn execution_host() -> Schema {
    Schema::builder(ObjectKind::ExecutionHost, "1.0")
        .name_key("hostname")
        .user_provided(&["hostname"])
        .defaults(vec![
            ("load_scaling", Value::Null),
            ("complex_values", Value::Null),
            ("user_lists", Value::Null),
            ("xuser_lists", Value::Null),
            ("projects", Value::Null),
            ("xprojects", Value::Null),
            ("usage_scaling", Value::Null),
            ("report_variables", Value::Null),
            ("license_constraints", Value::Null),
            ("license_oversubscription", Value::Null),
        ])
        .list_keys(&[
            ("complex_values", ","),
            ("user_lists", ","),
            ("xuser_lists", ","),
            ("projects", ","),
            ("xprojects", ","),
            ("report_variables", ","),
        ])
        .build()
}

fn host_group() -> Schema {
    Schema::builder(ObjectKind::HostGroup, "1.0")
        .name_key("group_name")
        .user_provided(&["group_name"])
        .defaults(vec![("hostlist", Value::Null)])
        .list_delimiter(" ")
        .list_keys(&[("hostlist", " ")])
        .build()
}

fn user() -> Schema {
    Schema::builder(ObjectKind::User, "1.0")
        .name_key("name")
        .user_provided(&["name"])
        .defaults(vec![
            ("oticket", Value::Int(0)),
            ("fshare", Value::Int(0)),
            ("delete_time", Value::Int(0)),
            ("default_project", Value::Null),
        ])
        .build()
}

fn project() -> Schema {
    Schema::builder(ObjectKind::Project, "1.0")
        .name_key("name")
        .user_provided(&["name"])
        .defaults(vec![
            ("oticket", Value::Int(0)),
            ("fshare", Value::Int(0)),
            ("acl", Value::Null),
            ("xacl", Value::Null),
        ])
        .list_delimiter(" ")
        .list_keys(&[("acl", " "), ("xacl", " ")])
        .build()
}

fn calendar() -> Schema {
    Schema::builder(ObjectKind::Calendar, "1.0")
        .name_key("calendar_name")
        .user_provided(&["calendar_name"])
        .defaults(vec![("year", Value::Null), ("week", Value::Null)])
        .build()
}

fn checkpointing_environment() -> Schema {
    Schema::builder(ObjectKind::CheckpointingEnvironment, "1.0")
        .name_key("ckpt_name")
        .user_provided(&["ckpt_name"])
        .defaults(vec![
            ("interface", s("userdefined")),
            ("ckpt_command", Value::Null),
            ("migr_command", Value::Null),
            ("restart_command", Value::Null),
            ("clean_command", Value::Null),
            ("ckpt_dir", s("/tmp")),
            ("signal", Value::Null),
            ("when", s("sx")),
        ])
        .list_delimiter(" ")
        .build()
}

fn access_list() -> Schema {
    Schema::builder(ObjectKind::AccessList, "1.0")
        .name_key("name")
        .user_provided(&["name"])
        .defaults(vec![
            ("type", s("ACL")),
            ("fshare", Value::Int(0)),
            ("oticket", Value::Int(0)),
            ("entries", Value::Null),
        ])
        .list_keys(&[("entries", ",")])
        .build()
}

fn parallel_environment(version: &'static str) -> Schema {
    let mut defaults = vec![
        ("slots", Value::Int(0)),
        ("user_lists", Value::Null),
        ("xuser_lists", Value::Null),
        ("start_proc_args", Value::Null),
        ("stop_proc_args", Value::Null),
        ("allocation_rule", s("$pe_slots")),
        ("control_slaves", Value::Bool(false)),
        ("job_is_first_task", Value::Bool(true)),
        ("urgency_slots", s("min")),
        ("accounting_summary", Value::Bool(false)),
        ("daemon_forks_slaves", Value::Bool(false)),
        ("master_forks_slaves", Value::Bool(false)),
    ];
    if version != "1.0" {
        defaults.push(("ign_sreq_on_mhost", Value::Bool(false)));
    }
    Schema::builder(ObjectKind::ParallelEnvironment, version)
        .name_key("pe_name")
        .user_provided(&["pe_name"])
        .defaults(defaults)
        .list_delimiter(" ")
        .list_keys(&[("user_lists", " "), ("xuser_lists", " ")])
        .build()
}

fn job_class(version: &'static str) -> Schema {
    let unspecified = "{+}UNSPECIFIED";
    let mut defaults = vec![
        ("variant_list", Value::Null),
        ("owner", Value::Null),
        ("user_lists", Value::Null),
        ("xuser_lists", Value::Null),
    ];
    let mut option_keys = vec![
        "A",
        "a",
        "ar",
        "b",
        "binding",
        "c_interval",
        "c_occasion",
        "CMDNAME",
        "CMDARG",
        "ckpt",
        "ac",
        "cwd",
        "dl",
        "e",
        "h",
        "hold_jid",
        "hold_jid_ad",
        "i",
        "j",
        "js",
        "l_hard",
        "l_soft",
    ];
    // Memory binding and master-task limits came with the 2.0 class.
    if version != "1.0" {
        option_keys.push("masterl");
    }
    option_keys.push("m");
    if version != "1.0" {
        option_keys.push("mbind");
    }
    option_keys.extend([
        "M",
        "masterq",
        "N",
        "notify",
        "now",
        "o",
        "P",
        "p",
        "pe_name",
        "pe_range",
        "q_hard",
        "q_soft",
        "R",
        "r",
    ]);
    // Resource-usage reporting arrived in 3.0, session and docker
    // device options in 4.0.
    if version != "1.0" && version != "2.0" {
        option_keys.push("rou");
    }
    option_keys.extend(["S", "shell"]);
    if version == "4.0" {
        option_keys.push("si");
    }
    option_keys.extend(["t", "tc"]);
    if version == "4.0" {
        option_keys.push("xd");
    }
    option_keys.extend(["V", "v"]);
    for key in option_keys {
        defaults.push((key, s(unspecified)));
    }
    Schema::builder(ObjectKind::JobClass, version)
        .name_key("jcname")
        .user_provided(&["jcname"])
        .defaults(defaults)
        .list_keys(&[
            ("variant_list", ","),
            ("user_lists", ","),
            ("xuser_lists", ","),
        ])
        .build()
}

fn resource_quota_set() -> Schema {
    Schema::builder(ObjectKind::ResourceQuotaSet, "1.0")
        .name_key("name")
        .user_provided(&["name"])
        .defaults(vec![
            ("description", Value::Null),
            ("enabled", Value::Bool(false)),
            ("limit", list(&["to slots=0"])),
        ])
        .list_keys(&[("limit", ",")])
        .layout(Layout::ResourceQuota)
        .build()
}

fn cluster_configuration(version: &'static str) -> Schema {
    let reporting_params = Value::Dict(IndexMap::from([
        ("accounting".to_string(), Value::Bool(true)),
        ("reporting".to_string(), Value::Bool(false)),
        ("flush_time".to_string(), s("00:00:13")),
        ("joblog".to_string(), Value::Bool(false)),
        ("sharelog".to_string(), s("00:00:00")),
    ]));
    let cgroups_params = Value::Dict(IndexMap::from([
        ("cgroup_path".to_string(), Value::Null),
        ("cpuset".to_string(), Value::Bool(false)),
        ("mount".to_string(), Value::Bool(false)),
        ("freezer".to_string(), Value::Bool(false)),
        ("freeze_pe_tasks".to_string(), Value::Bool(false)),
        ("killing".to_string(), Value::Bool(false)),
        ("forced_numa".to_string(), Value::Bool(false)),
        ("h_vmem_limit".to_string(), Value::Bool(false)),
        ("m_mem_free_hard".to_string(), Value::Bool(false)),
        ("m_mem_free_soft".to_string(), Value::Bool(false)),
        ("min_memory_limit".to_string(), Value::Int(0)),
    ]));
    let mut defaults = vec![
        ("execd_spool_dir", s("SGE_ROOT/SGE_CELL/spool")),
        ("mailer", s("/bin/mail")),
        ("xterm", s("/usr/bin/xterm")),
        ("load_sensor", Value::Null),
        ("prolog", Value::Null),
        ("epilog", Value::Null),
        ("shell_start_mode", s("unix_behavior")),
        ("login_shells", list(&["sh", "bash", "ksh", "csh", "tcsh"])),
        ("min_uid", Value::Int(0)),
        ("min_gid", Value::Int(0)),
        ("user_lists", Value::Null),
        ("xuser_lists", Value::Null),
        ("projects", Value::Null),
        ("xprojects", Value::Null),
        ("default_jc", Value::Null),
        ("enforce_jc", Value::Bool(false)),
        ("enforce_project", Value::Bool(false)),
        ("enforce_user", s("auto")),
        ("load_report_time", s("00:00:40")),
        ("max_unheard", s("00:04:00")),
        ("reschedule_unknown", s("00:00:00")),
        ("loglevel", s("log_warning")),
        ("administrator_mail", Value::Null),
        ("set_token_cmd", Value::Null),
        ("pag_cmd", Value::Null),
        ("token_extend_time", Value::Null),
        ("shepherd_cmd", Value::Null),
        ("qmaster_params", Value::Null),
        ("execd_params", list(&["KEEP_ACTIVE=ERROR"])),
        ("reporting_params", reporting_params),
        ("finished_jobs", Value::Int(0)),
        ("gid_range", s("20000-20100")),
        ("qlogin_command", s("builtin")),
        ("qlogin_daemon", s("builtin")),
        ("rlogin_command", s("builtin")),
        ("rlogin_daemon", s("builtin")),
        ("rsh_command", s("builtin")),
        ("rsh_daemon", s("builtin")),
        ("max_aj_instances", Value::Int(2000)),
        ("max_aj_tasks", Value::Int(75000)),
        ("max_u_jobs", Value::Int(0)),
        ("max_jobs", Value::Int(0)),
        ("max_advance_reservations", Value::Int(0)),
        ("auto_user_oticket", Value::Int(0)),
        ("auto_user_fshare", Value::Int(0)),
        ("auto_user_default_project", Value::Null),
        ("auto_user_delete_time", Value::Int(86400)),
        ("delegated_file_staging", Value::Bool(false)),
        ("reprioritize", Value::Int(0)),
        ("jsv_url", Value::Null),
        (
            "jsv_allowed_mod",
            list(&["ac", "h", "i", "e", "o", "j", "M", "N", "p", "w"]),
        ),
        ("cgroups_params", cgroups_params),
    ];
    // Lost-job handling keys joined the global record in 2.0.
    if version != "1.0" {
        defaults.extend([
            ("lost_job_timeout", s("00:00:00")),
            ("enable_lost_job_reschedule", Value::Bool(false)),
        ]);
    }
    Schema::builder(ObjectKind::ClusterConfiguration, version)
        .defaults(defaults)
        .host_defaults(vec![
            ("mailer", s("/bin/mail")),
            ("xterm", s("/usr/bin/xterm")),
        ])
        .list_keys(&[
            ("login_shells", ","),
            ("user_lists", ","),
            ("xuser_lists", ","),
            ("projects", ","),
            ("xprojects", ","),
            ("qmaster_params", ","),
            ("execd_params", ","),
            ("jsv_allowed_mod", ","),
        ])
        .dict_delimiter(" ")
        .dict_keys(&[("reporting_params", " "), ("cgroups_params", " ")])
        .build()
}

fn scheduler_configuration(version: &'static str) -> Schema {
    let mut defaults = vec![
        ("algorithm", s("default")),
        ("schedule_interval", s("0:0:15")),
        ("maxujobs", Value::Int(0)),
        ("job_load_adjustments", s("np_load_avg=0.50")),
        ("load_adjustment_decay_time", s("0:7:30")),
        ("host_sort_formula", s("np_load_avg")),
        ("schedd_job_info", Value::Bool(false)),
        ("flush_submit_sec", Value::Int(1)),
        ("flush_finish_sec", Value::Int(1)),
        ("params", Value::Null),
        ("reprioritize_interval", s("0:0:0")),
        ("halftime", Value::Int(168)),
        (
            "usage_weight_list",
            list(&[
                "wallclock=0.000000",
                "cpu=1.000000",
                "mem=0.000000",
                "io=0.000000",
            ]),
        ),
        ("compensation_factor", Value::Float(5.0)),
        ("weight_user", Value::Float(0.25)),
        ("weight_project", Value::Float(0.25)),
        ("weight_department", Value::Float(0.25)),
        ("weight_job", Value::Float(0.25)),
        ("weight_tickets_functional", Value::Int(0)),
        ("weight_tickets_share", Value::Int(0)),
        ("share_override_tickets", Value::Bool(true)),
        ("share_functional_shares", Value::Bool(true)),
        ("max_functional_jobs_to_schedule", Value::Int(200)),
        ("report_pjob_tickets", Value::Bool(true)),
        ("max_pending_tasks_per_job", Value::Int(50)),
        ("halflife_decay_list", Value::Null),
        ("policy_hierarchy", s("OFS")),
        ("weight_ticket", Value::Float(0.01)),
        ("weight_waiting_time", Value::Float(0.0)),
        ("weight_deadline", Value::Float(3600000.0)),
        ("weight_urgency", Value::Float(0.1)),
        ("weight_priority", Value::Float(1.0)),
        ("fair_urgency_list", Value::Null),
        ("max_reservation", Value::Int(0)),
        ("default_duration", INF),
        ("backfilling", s("ON")),
        ("prioritize_preemptees", Value::Bool(false)),
        ("preemptees_keep_resources", Value::Bool(false)),
        ("max_preemptees", Value::Int(0)),
        ("preemption_distance", s("00:15:00")),
        ("preemption_priority_adjustments", Value::Null),
    ];
    // The host/queue affinity weights arrived with the 2.0 scheduler.
    if version != "1.0" {
        defaults.extend([
            ("weight_host_affinity", Value::Float(100.0)),
            ("weight_host_sort", Value::Float(1.0)),
            ("weight_queue_affinity", Value::Float(100.0)),
            ("weight_queue_host_sort", Value::Float(10.0)),
            ("weight_queue_seqno", Value::Float(1.0)),
        ]);
    }
    // NUMA affinity weighting came with the 3.0 scheduler.
    if version == "3.0" {
        defaults.push(("weight_numa_affinity", Value::Float(100.0)));
    }
    Schema::builder(ObjectKind::SchedulerConfiguration, version)
        .defaults(defaults)
        .lowercase_keywords(&["schedd_job_info"])
        .list_keys(&[("job_load_adjustments", ","), ("fair_urgency_list", ",")])
        .dict_keys(&[("usage_weight_list", ","), ("halflife_decay_list", ":")])
        .build()
}

// (name, shortcut, type, relop, requestable, consumable, default, urgency, aapre)
type ComplexRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    bool,
    bool,
    Value,
    i64,
    bool,
);

fn complex_rows(version: &str) -> Vec<ComplexRow> {
    let zero = || s("0");
    let time = || s("0:0:0");
    let mut rows: Vec<ComplexRow> = vec![
        ("arch", "a", "RESTRING", "==", true, false, Value::Null, 0, false),
        ("calendar", "c", "RESTRING", "==", true, false, Value::Null, 0, false),
        ("cpu", "cpu", "DOUBLE", ">=", true, false, Value::Int(0), 0, false),
        ("d_rt", "d_rt", "TIME", "<=", true, false, time(), 0, false),
        ("display_win_gui", "dwg", "BOOL", "==", true, false, Value::Int(0), 0, false),
        ("h_core", "h_core", "MEMORY", "<=", true, false, zero(), 0, false),
        ("h_cpu", "h_cpu", "TIME", "<=", true, false, time(), 0, false),
        ("h_data", "h_data", "MEMORY", "<=", true, false, zero(), 0, false),
        ("h_fsize", "h_fsize", "MEMORY", "<=", true, false, zero(), 0, false),
        ("h_rss", "h_rss", "MEMORY", "<=", true, false, zero(), 0, false),
        ("h_rt", "h_rt", "TIME", "<=", true, false, time(), 0, false),
        ("h_stack", "h_stack", "MEMORY", "<=", true, false, zero(), 0, false),
        ("h_vmem", "h_vmem", "MEMORY", "<=", true, false, zero(), 0, false),
        ("hostname", "h", "HOST", "==", true, false, Value::Null, 0, false),
        ("load_avg", "la", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("load_long", "ll", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("load_medium", "lm", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("load_short", "ls", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("m_cache_l1", "mcache1", "MEMORY", "<=", true, false, zero(), 0, false),
        ("m_cache_l2", "mcache2", "MEMORY", "<=", true, false, zero(), 0, false),
        ("m_cache_l3", "mcache3", "MEMORY", "<=", true, false, zero(), 0, false),
        ("m_core", "core", "INT", "<=", true, false, Value::Int(0), 0, false),
        ("m_mem_free", "mfree", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_free_n0", "mfree0", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_free_n1", "mfree1", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_free_n2", "mfree2", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_free_n3", "mfree3", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_total", "mtotal", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_total_n0", "mmem0", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_total_n1", "mmem1", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_total_n2", "mmem2", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_total_n3", "mmem3", "MEMORY", "<=", true, true, zero(), 0, true),
        ("m_mem_used", "mused", "MEMORY", ">=", true, false, zero(), 0, false),
        ("m_mem_used_n0", "mused0", "MEMORY", ">=", true, false, zero(), 0, false),
        ("m_mem_used_n1", "mused1", "MEMORY", ">=", true, false, zero(), 0, false),
        ("m_mem_used_n2", "mused2", "MEMORY", ">=", true, false, zero(), 0, false),
        ("m_mem_used_n3", "mused3", "MEMORY", ">=", true, false, zero(), 0, false),
        ("m_numa_nodes", "nodes", "INT", "<=", true, false, Value::Int(0), 0, false),
        ("m_socket", "socket", "INT", "<=", true, false, Value::Int(0), 0, false),
        ("m_thread", "thread", "INT", "<=", true, false, Value::Int(0), 0, false),
        ("m_topology", "topo", "RESTRING", "==", true, false, Value::Null, 0, false),
        ("m_topology_inuse", "utopo", "RESTRING", "==", true, false, Value::Null, 0, false),
        ("m_topology_numa", "unuma", "RESTRING", "==", true, false, Value::Null, 0, false),
        ("mem_free", "mf", "MEMORY", "<=", true, false, zero(), 0, false),
        ("mem_total", "mt", "MEMORY", "<=", true, false, zero(), 0, false),
        ("mem_used", "mu", "MEMORY", ">=", true, false, zero(), 0, false),
        ("min_cpu_interval", "mci", "TIME", "<=", false, false, time(), 0, false),
        ("np_load_avg", "nla", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("np_load_long", "nll", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("np_load_medium", "nlm", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("np_load_short", "nls", "DOUBLE", ">=", false, false, Value::Int(0), 0, false),
        ("num_proc", "p", "INT", "==", true, false, Value::Int(0), 0, false),
        ("qname", "q", "RESTRING", "==", true, false, Value::Null, 0, false),
        ("rerun", "re", "BOOL", "==", false, false, Value::Int(0), 0, false),
        ("s_core", "s_core", "MEMORY", "<=", true, false, zero(), 0, false),
        ("s_cpu", "s_cpu", "TIME", "<=", true, false, time(), 0, false),
        ("s_data", "s_data", "MEMORY", "<=", true, false, zero(), 0, false),
        ("s_fsize", "s_fsize", "MEMORY", "<=", true, false, zero(), 0, false),
        ("s_rss", "s_rss", "MEMORY", "<=", true, false, zero(), 0, false),
        ("s_rt", "s_rt", "TIME", "<=", true, false, time(), 0, false),
        ("s_stack", "s_stack", "MEMORY", "<=", true, false, zero(), 0, false),
        ("s_vmem", "s_vmem", "MEMORY", "<=", true, false, zero(), 0, false),
        ("seq_no", "seq", "INT", "==", false, false, Value::Int(0), 0, false),
        ("slots", "s", "INT", "<=", true, true, Value::Int(1), 1000, true),
        ("swap_free", "sf", "MEMORY", "<=", true, false, zero(), 0, false),
        ("swap_rate", "sr", "MEMORY", ">=", true, false, zero(), 0, false),
        ("swap_rsvd", "srsv", "MEMORY", ">=", true, false, zero(), 0, false),
        ("swap_total", "st", "MEMORY", "<=", true, false, zero(), 0, false),
        ("swap_used", "su", "MEMORY", ">=", true, false, zero(), 0, false),
        ("tmpdir", "tmp", "RESTRING", "==", false, false, Value::Null, 0, false),
        ("virtual_free", "vf", "MEMORY", "<=", true, false, zero(), 0, false),
        ("virtual_total", "vt", "MEMORY", "<=", true, false, zero(), 0, false),
        ("virtual_used", "vu", "MEMORY", ">=", true, false, zero(), 0, false),
    ];
    if version != "1.0" {
        rows.push((
            "docker",
            "dock",
            "BOOL",
            "==",
            true,
            false,
            Value::Int(0),
            0,
            false,
        ));
        rows.push((
            "docker_images",
            "dockimg",
            "RESTRING",
            "==",
            true,
            false,
            Value::Null,
            0,
            false,
        ));
    }
    if version == "3.0" {
        rows.push((
            "docker_api_version",
            "dockapi",
            "DOUBLE",
            "<=",
            true,
            false,
            Value::Float(0.0),
            0,
            false,
        ));
        rows.push((
            "docker_version",
            "dockver",
            "DOUBLE",
            "<=",
            true,
            false,
            Value::Float(0.0),
            0,
            false,
        ));
    }
    if version == "4.0" {
        rows.push((
            "m_gpu",
            "mgpu",
            "INT",
            "<=",
            true,
            false,
            Value::Int(0),
            0,
            false,
        ));
    }
    rows.sort_by(|a, b| a.0.cmp(b.0));
    rows
}

// do_report/is_static column values for the 4.0 table.
fn reporting_flags(name: &str) -> (bool, bool) {
    let static_host_attribute = matches!(
        name,
        "arch"
            | "m_cache_l1"
            | "m_cache_l2"
            | "m_cache_l3"
            | "m_core"
            | "m_gpu"
            | "m_mem_total"
            | "m_mem_total_n0"
            | "m_mem_total_n1"
            | "m_mem_total_n2"
            | "m_mem_total_n3"
            | "m_numa_nodes"
            | "m_socket"
            | "m_thread"
            | "m_topology"
            | "m_topology_inuse"
            | "m_topology_numa"
            | "mem_total"
            | "num_proc"
            | "swap_total"
            | "virtual_total"
    );
    if static_host_attribute {
        return (true, true);
    }
    let unreported = matches!(
        name,
        "calendar"
            | "d_rt"
            | "display_win_gui"
            | "hostname"
            | "min_cpu_interval"
            | "qname"
            | "rerun"
            | "seq_no"
            | "slots"
            | "tmpdir"
    ) || name.starts_with("h_")
        || name.starts_with("s_");
    if unreported {
        (false, false)
    } else {
        (true, false)
    }
}

fn complex_configuration(version: &'static str) -> Schema {
    let with_affinity = version == "3.0" || version == "4.0";
    let with_reporting = version == "4.0";
    let defaults = complex_rows(version)
        .into_iter()
        .map(
            |(name, shortcut, type_, relop, requestable, consumable, default, urgency, aapre)| {
                let mut attribute = IndexMap::from([
                    ("shortcut".to_string(), s(shortcut)),
                    ("type".to_string(), s(type_)),
                    ("relop".to_string(), s(relop)),
                    ("requestable".to_string(), Value::Bool(requestable)),
                    ("consumable".to_string(), Value::Bool(consumable)),
                    ("default".to_string(), default),
                    ("urgency".to_string(), Value::Int(urgency)),
                    ("aapre".to_string(), Value::Bool(aapre)),
                ]);
                if with_affinity {
                    attribute.insert("affinity".to_string(), Value::Float(0.0));
                }
                if with_reporting {
                    let (do_report, is_static) = reporting_flags(name);
                    attribute.insert("do_report".to_string(), Value::Bool(do_report));
                    attribute.insert("is_static".to_string(), Value::Bool(is_static));
                }
                (name, Value::Dict(attribute))
            },
        )
        .collect();
    Schema::builder(ObjectKind::ComplexConfiguration, version)
        .defaults(defaults)
        .keyword_table(KeywordTable::Complex)
        .optional_keys_allowed()
        .dict_delimiter(" ")
        .layout(Layout::ComplexTable {
            with_affinity,
            with_reporting,
        })
        .build()
}

fn share_tree() -> Schema {
    Schema::builder(ObjectKind::ShareTree, "1.0")
        .user_provided(&["name"])
        .defaults(vec![
            ("id", Value::Int(0)),
            ("name", Value::Null),
            ("type", Value::Int(1)),
            ("shares", Value::Int(0)),
            ("childnodes", Value::Null),
        ])
        .layout(Layout::DictList {
            first_key: "id",
            node_keys: &["id", "name", "type", "shares", "childnodes"],
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_schema() {
        for kind in ObjectKind::ALL {
            assert!(
                !versions(kind).is_empty(),
                "no schema registered for {}",
                kind
            );
        }
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let err = schema(ObjectKind::ClusterQueue, "9.9").unwrap_err();
        assert!(matches!(err, QconfError::ObjectNotFound(_)));
    }

    #[test]
    fn test_queue_defaults_cover_limits() {
        let queue = schema(ObjectKind::ClusterQueue, "1.0").unwrap();
        let defaults = queue.required_defaults_for(None);
        assert_eq!(defaults.first().map(|(k, _)| *k), Some("hostlist"));
        assert!(defaults
            .iter()
            .any(|(k, v)| *k == "h_vmem" && *v == Value::Float(f64::INFINITY)));
    }

    #[test]
    fn test_complex_versions_differ_in_columns() {
        let v2 = schema(ObjectKind::ComplexConfiguration, "2.0").unwrap();
        let v3 = schema(ObjectKind::ComplexConfiguration, "3.0").unwrap();
        let v4 = schema(ObjectKind::ComplexConfiguration, "4.0").unwrap();
        assert_eq!(
            v2.layout,
            Layout::ComplexTable {
                with_affinity: false,
                with_reporting: false,
            }
        );
        assert_eq!(
            v3.layout,
            Layout::ComplexTable {
                with_affinity: true,
                with_reporting: false,
            }
        );
        assert_eq!(
            v4.layout,
            Layout::ComplexTable {
                with_affinity: true,
                with_reporting: true,
            }
        );
        let has_attr = |schema: &Schema, name: &str| {
            schema
                .required_defaults_for(None)
                .iter()
                .any(|(k, _)| *k == name)
        };
        assert!(has_attr(&v3, "docker_api_version"));
        assert!(!has_attr(&v2, "docker_api_version"));
        // 4.0 drops the docker version attributes and adds the GPU count.
        assert!(!has_attr(&v4, "docker_api_version"));
        assert!(has_attr(&v4, "m_gpu"));
        assert!(!has_attr(&v3, "m_gpu"));
    }

    #[test]
    fn test_complex_4_0_rows_carry_reporting_columns() {
        let v4 = schema(ObjectKind::ComplexConfiguration, "4.0").unwrap();
        let defaults = v4.required_defaults_for(None);
        let row = |name: &str| match defaults.iter().find(|(k, _)| *k == name) {
            Some((_, Value::Dict(row))) => row.clone(),
            other => panic!("unexpected row for {}: {:?}", name, other),
        };
        let arch = row("arch");
        assert_eq!(arch.get("do_report"), Some(&Value::Bool(true)));
        assert_eq!(arch.get("is_static"), Some(&Value::Bool(true)));
        let slots = row("slots");
        assert_eq!(slots.get("do_report"), Some(&Value::Bool(false)));
        assert_eq!(slots.get("is_static"), Some(&Value::Bool(false)));
        let h_rt = row("h_rt");
        assert_eq!(h_rt.get("do_report"), Some(&Value::Bool(false)));
        let mem_free = row("mem_free");
        assert_eq!(mem_free.get("do_report"), Some(&Value::Bool(true)));
        assert_eq!(mem_free.get("is_static"), Some(&Value::Bool(false)));
        // 3.0 rows stay without the reporting columns.
        let v3 = schema(ObjectKind::ComplexConfiguration, "3.0").unwrap();
        let v3_defaults = v3.required_defaults_for(None);
        if let Some((_, Value::Dict(row))) = v3_defaults.iter().find(|(k, _)| *k == "arch") {
            assert!(row.get("do_report").is_none());
        }
    }

    #[test]
    fn test_cluster_queue_versions_differ_in_keys() {
        let v1 = schema(ObjectKind::ClusterQueue, "1.0").unwrap();
        let v2 = schema(ObjectKind::ClusterQueue, "2.0").unwrap();
        let keys = |schema: &Schema| {
            schema
                .required_defaults_for(None)
                .iter()
                .map(|(k, _)| *k)
                .collect::<Vec<_>>()
        };
        assert!(!keys(&v1).contains(&"weight_host_affinity"));
        assert!(keys(&v2).contains(&"weight_host_affinity"));
        assert!(keys(&v2).contains(&"weight_queue_affinity"));
    }

    #[test]
    fn test_parallel_environment_versions_differ_in_keys() {
        let v1 = schema(ObjectKind::ParallelEnvironment, "1.0").unwrap();
        let v2 = schema(ObjectKind::ParallelEnvironment, "2.0").unwrap();
        let has = |schema: &Schema, name: &str| {
            schema
                .required_defaults_for(None)
                .iter()
                .any(|(k, _)| *k == name)
        };
        assert!(!has(&v1, "ign_sreq_on_mhost"));
        assert!(has(&v2, "ign_sreq_on_mhost"));
    }

    #[test]
    fn test_job_class_option_keys_grow_by_version() {
        let has = |version: &str, key: &str| {
            schema(ObjectKind::JobClass, version)
                .unwrap()
                .required_defaults_for(None)
                .iter()
                .any(|(k, _)| *k == key)
        };
        assert!(!has("1.0", "mbind"));
        assert!(!has("1.0", "masterl"));
        assert!(has("2.0", "mbind"));
        assert!(has("2.0", "masterl"));
        assert!(!has("2.0", "rou"));
        assert!(has("3.0", "rou"));
        assert!(!has("3.0", "si"));
        assert!(has("4.0", "si"));
        assert!(has("4.0", "xd"));
    }

    #[test]
    fn test_cluster_configuration_host_defaults() {
        let conf = schema(ObjectKind::ClusterConfiguration, "1.0").unwrap();
        assert_eq!(conf.required_defaults_for(Some("global")).len(), 52);
        assert_eq!(conf.required_defaults_for(Some("exec1")).len(), 2);
        // Lost-job keys extend the 2.0 global record.
        let v2 = schema(ObjectKind::ClusterConfiguration, "2.0").unwrap();
        let v2_defaults = v2.required_defaults_for(Some("global"));
        assert_eq!(v2_defaults.len(), 54);
        assert!(v2_defaults.iter().any(|(k, _)| *k == "lost_job_timeout"));
    }

    #[test]
    fn test_scheduler_configuration_3_0_adds_numa_weight() {
        let v2 = schema(ObjectKind::SchedulerConfiguration, "2.0").unwrap();
        let v3 = schema(ObjectKind::SchedulerConfiguration, "3.0").unwrap();
        let has = |schema: &Schema, name: &str| {
            schema
                .required_defaults_for(None)
                .iter()
                .any(|(k, _)| *k == name)
        };
        assert!(!has(&v2, "weight_numa_affinity"));
        assert!(has(&v3, "weight_numa_affinity"));
    }
}
