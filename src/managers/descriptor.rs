//! Per-kind manager descriptors.
//!
//! Dispatch lives in data: one generic manager per shape, parameterized
//! by a descriptor carrying the qconf verb fragment, the classification
//! rules and the kind's behavioral quirks. Rule lists are built once at
//! descriptor construction and never mutated.

use crate::errors::ErrorKind;
use crate::executor::ErrorRule;
use crate::objects::ObjectKind;

/// Default record separator in bulk detail dumps.
const BULK_SEPARATOR: &str = "^=================+";

/// Descriptor for kinds managed as named dictionary records.
pub struct ObjectDescriptor {
    pub kind: ObjectKind,
    /// Verb fragment: `-A<uge_name>`, `-M<uge_name>`, `-s<uge_name>` etc.
    pub uge_name: &'static str,
    /// Human-readable noun used in list metadata.
    pub display_name: &'static str,
    /// Suffix turning the show verb into a bulk detail dump, when the
    /// backend supports one (`-sqld` style).
    pub list_details_suffix: Option<&'static str>,
    pub bulk_separator: &'static str,
    /// Prefix for scratch directories used by bulk add/modify.
    pub dump_dir_prefix: &'static str,
    /// Delete verb when it differs from `-d<uge_name>`.
    pub delete_verb: Option<&'static str>,
    /// Keys omitted from directory dumps unless the caller sets
    /// `SGE_ALLOW_CHANGE_LOAD_VALUES`.
    pub dump_ignored_keys: &'static [&'static str],
    pub error_rules: Vec<ErrorRule>,
    pub failure_rules: Vec<ErrorRule>,
    /// The global record cannot be added or deleted and is fetched with
    /// an empty name argument.
    pub global_protected: bool,
    /// `global` is appended to name listings.
    pub appends_global_to_list: bool,
}

fn rules(specs: &[(&str, ErrorKind)]) -> Vec<ErrorRule> {
    specs
        .iter()
        .map(|(pattern, kind)| ErrorRule::new(pattern, *kind))
        .collect()
}

impl ObjectDescriptor {
    fn new(
        kind: ObjectKind,
        uge_name: &'static str,
        display_name: &'static str,
    ) -> ObjectDescriptor {
        ObjectDescriptor {
            kind,
            uge_name,
            display_name,
            list_details_suffix: None,
            bulk_separator: BULK_SEPARATOR,
            dump_dir_prefix: "conf_api_dump_",
            delete_verb: None,
            dump_ignored_keys: &[],
            error_rules: Vec::new(),
            failure_rules: Vec::new(),
            global_protected: false,
            appends_global_to_list: false,
        }
    }

    pub fn cluster_queue() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ClusterQueue, "q", "queue");
        d.list_details_suffix = Some("ld");
        d.error_rules = rules(&[
            (
                ".*No cluster queue or queue instance matches.*",
                ErrorKind::ObjectNotFound,
            ),
            (".*no cqueue list defined.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn execution_host() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ExecutionHost, "e", "execution host");
        d.list_details_suffix = Some("ld");
        d.bulk_separator = "^===========+";
        d.dump_ignored_keys = &["load_values", "processors"];
        d.appends_global_to_list = true;
        d.error_rules = rules(&[
            (".*resolving host.*", ErrorKind::ObjectNotFound),
            (".*not an execution host.*", ErrorKind::ObjectNotFound),
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (".*no execution host defined.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn host_group() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::HostGroup, "hgrp", "host group");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (".*does not exist.*", ErrorKind::ObjectNotFound),
            (".*no host group list defined.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn user() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::User, "user", "user");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (".*does not exist.*", ErrorKind::ObjectNotFound),
            (".*no user list defined.*", ErrorKind::ObjectNotFound),
            (".*is not known as user.*", ErrorKind::ObjectNotFound),
        ]);
        // The backend reports unknown users on stderr with a zero exit.
        d.failure_rules = rules(&[(".*is not known as user.*", ErrorKind::ObjectNotFound)]);
        d
    }

    pub fn project() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::Project, "prj", "project");
        d.list_details_suffix = Some("ld");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (
                ".*multiple occurances of userset.*",
                ErrorKind::InvalidRequest,
            ),
            (".*does not exist.*", ErrorKind::ObjectNotFound),
            (".*no project list defined.*", ErrorKind::ObjectNotFound),
            (".*is not known as project.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn calendar() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::Calendar, "cal", "calendar");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (".*is not a calendar.*", ErrorKind::ObjectNotFound),
            (".*no calendar definition.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn checkpointing_environment() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::CheckpointingEnvironment, "ckpt", "checkpointing environment");
        d.list_details_suffix = Some("ld");
        d.error_rules = rules(&[
            (".*is not a checkpointing.*", ErrorKind::ObjectNotFound),
            (".*no ckpt interface definition.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn access_list() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::AccessList, "u", "access list");
        d.delete_verb = Some("-dul");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (".*not allowed to set.*", ErrorKind::InvalidRequest),
            (".*unknown specifier.*", ErrorKind::InvalidRequest),
            (".*does not exist.*", ErrorKind::ObjectNotFound),
            (".*doesn't exist.*", ErrorKind::ObjectNotFound),
            (".* no list_name.*", ErrorKind::ObjectNotFound),
            (
                ".*is already in access list.*",
                ErrorKind::ObjectAlreadyExists,
            ),
            (".*is not in access list.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn parallel_environment() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ParallelEnvironment, "p", "parallel environment");
        d.list_details_suffix = Some("ld");
        d.error_rules = rules(&[
            (".*is not a parallel environment.*", ErrorKind::ObjectNotFound),
            (
                ".*no parallel environment defined.*",
                ErrorKind::ObjectNotFound,
            ),
        ]);
        d
    }

    pub fn job_class() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::JobClass, "jc", "job class");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (".*Job class name contains.*", ErrorKind::InvalidRequest),
            (
                ".*Error during parsing of attribute value.*",
                ErrorKind::InvalidRequest,
            ),
            (
                ".*No job class or job class variant.*",
                ErrorKind::ObjectNotFound,
            ),
            (".*no jclass list defined.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn resource_quota_set() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ResourceQuotaSet, "rqs", "resource quota set");
        d.error_rules = rules(&[
            (".*is still referenced in.*", ErrorKind::InvalidRequest),
            (
                ".*no resource quota set.*defined.*",
                ErrorKind::ObjectNotFound,
            ),
            (".*No resource quota set found.*", ErrorKind::ObjectNotFound),
        ]);
        d
    }

    pub fn cluster_configuration() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ClusterConfiguration, "conf", "configuration");
        d.global_protected = true;
        d.error_rules = rules(&[
            (".*resolving host.*", ErrorKind::ObjectNotFound),
            (".*no config defined.*", ErrorKind::ObjectNotFound),
            (".*configuration.*not defined.*", ErrorKind::InvalidRequest),
        ]);
        d
    }

    pub fn scheduler_configuration() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::SchedulerConfiguration, "sconf", "scheduler configuration");
        d.error_rules = rules(&[
            (".*is not a valid.*", ErrorKind::InvalidRequest),
            (
                ".*required attribute.*is missing.*",
                ErrorKind::InvalidRequest,
            ),
        ]);
        d
    }

    pub fn complex_configuration() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ComplexConfiguration, "c", "complex attribute");
        d.error_rules = rules(&[
            (".*is not a valid.*", ErrorKind::InvalidRequest),
            (".*cannot be deleted.*", ErrorKind::InvalidRequest),
            (".*error parsing value.*", ErrorKind::InvalidArgument),
            (".*should end.*", ErrorKind::InvalidArgument),
        ]);
        d
    }

    pub fn share_tree() -> ObjectDescriptor {
        let mut d = ObjectDescriptor::new(ObjectKind::ShareTree, "stree", "share tree");
        d.error_rules = rules(&[
            (".*no sharetree element.*", ErrorKind::ObjectNotFound),
            (
                ".*denied: share tree contains reference to unknown user/project.*",
                ErrorKind::InvalidRequest,
            ),
            (".*Unable to locate.*", ErrorKind::ObjectNotFound),
            (".share value must be positive.*", ErrorKind::InvalidArgument),
        ]);
        d
    }
}

/// Descriptor for kinds managed as flat name lists.
pub struct NameListDescriptor {
    /// Human-readable noun used in list metadata.
    pub display_name: &'static str,
    pub uge_name: &'static str,
    pub error_rules: Vec<ErrorRule>,
}

fn name_list_base_rules() -> Vec<ErrorRule> {
    rules(&[
        (".*already exists.*", ErrorKind::ObjectAlreadyExists),
        (".*does not exist.*", ErrorKind::ObjectNotFound),
        (".*may not remove.*", ErrorKind::InvalidRequest),
    ])
}

impl NameListDescriptor {
    pub fn operators() -> NameListDescriptor {
        NameListDescriptor {
            display_name: "operator",
            uge_name: "o",
            error_rules: name_list_base_rules(),
        }
    }

    pub fn managers() -> NameListDescriptor {
        NameListDescriptor {
            display_name: "manager",
            uge_name: "m",
            error_rules: name_list_base_rules(),
        }
    }

    pub fn submit_hosts() -> NameListDescriptor {
        let mut rules = name_list_base_rules();
        rules.extend([
            ErrorRule::new(".*resolving host.*", ErrorKind::ObjectNotFound),
            ErrorRule::new(".*no submit host defined.*", ErrorKind::ObjectNotFound),
        ]);
        NameListDescriptor {
            display_name: "submit host",
            uge_name: "s",
            error_rules: rules,
        }
    }

    pub fn admin_hosts() -> NameListDescriptor {
        let mut rules = name_list_base_rules();
        rules.extend([
            ErrorRule::new(".*resolving host.*", ErrorKind::ObjectNotFound),
            ErrorRule::new(".*no admin host defined.*", ErrorKind::ObjectNotFound),
        ]);
        NameListDescriptor {
            display_name: "admin host",
            uge_name: "h",
            error_rules: rules,
        }
    }
}
