//! Thin facade over the per-kind managers: one method per operation per
//! kind, the shape callers script against. All methods forward; behavior
//! lives in the managers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::info;

use crate::config::QconfSettings;
use crate::errors::Result;
use crate::executor::QconfExecutor;
use crate::managers::descriptor::{NameListDescriptor, ObjectDescriptor};
use crate::managers::{
    DictObjectManager, NameList, NameListManager, ShareTreeManager, SingletonObjectManager,
};
use crate::objects::{ObjectFactory, ObjectSpec, QconfObject, Value};

pub struct QconfApi {
    executor: Arc<QconfExecutor>,
    factory: ObjectFactory,
    queue: DictObjectManager,
    ehost: DictObjectManager,
    hgrp: DictObjectManager,
    user: DictObjectManager,
    prj: DictObjectManager,
    cal: DictObjectManager,
    ckpt: DictObjectManager,
    acl: DictObjectManager,
    pe: DictObjectManager,
    jc: DictObjectManager,
    rqs: DictObjectManager,
    conf: DictObjectManager,
    sconf: SingletonObjectManager,
    cconf: SingletonObjectManager,
    stree: ShareTreeManager,
    operator_roster: NameListManager,
    manager_roster: NameListManager,
    submit_host_roster: NameListManager,
    admin_host_roster: NameListManager,
}

macro_rules! dict_object_api {
    ($manager:ident:
     $generate:ident, $add:ident, $add_many:ident, $add_from_dir:ident,
     $modify:ident, $modify_many:ident, $modify_from_dir:ident,
     $get:ident, $get_all:ident, $delete:ident, $delete_many:ident,
     $list:ident, $write:ident) => {
        pub fn $generate(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
            self.$manager.generate(spec)
        }
        pub fn $add(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
            self.$manager.add(spec)
        }
        pub fn $add_many(&self, objects: Vec<QconfObject>) -> Result<Vec<QconfObject>> {
            self.$manager.add_many(objects)
        }
        pub fn $add_from_dir(&self, dir: &Path) -> Result<()> {
            self.$manager.add_from_dir(dir)
        }
        pub fn $modify(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
            self.$manager.modify(spec)
        }
        pub fn $modify_many(&self, objects: Vec<QconfObject>) -> Result<Vec<QconfObject>> {
            self.$manager.modify_many(objects)
        }
        pub fn $modify_from_dir(&self, dir: &Path) -> Result<()> {
            self.$manager.modify_from_dir(dir)
        }
        pub fn $get(&self, name: &str) -> Result<QconfObject> {
            self.$manager.get(name)
        }
        pub fn $get_all(&self) -> Result<Vec<QconfObject>> {
            self.$manager.get_all()
        }
        pub fn $delete(&self, name: &str) -> Result<()> {
            self.$manager.delete(name)
        }
        pub fn $delete_many(&self, names: &[&str]) -> Result<()> {
            self.$manager.delete_many(names)
        }
        pub fn $list(&self) -> Result<NameList> {
            self.$manager.list()
        }
        pub fn $write(&self, objects: &[QconfObject], dir: &Path) -> Result<Vec<PathBuf>> {
            self.$manager.write_to_dir(objects, dir)
        }
    };
}

macro_rules! name_list_api {
    ($manager:ident: $add:ident, $delete:ident, $list:ident) => {
        pub fn $add(&self, names: &str) -> Result<NameList> {
            self.$manager.add_names(names)
        }
        pub fn $delete(&self, names: &str) -> Result<NameList> {
            self.$manager.delete_names(names)
        }
        pub fn $list(&self) -> Result<NameList> {
            self.$manager.list_names()
        }
    };
}

impl QconfApi {
    /// Connect to the cluster the settings describe, detecting its
    /// scheduler release.
    pub fn new(settings: QconfSettings) -> Result<QconfApi> {
        let executor = Arc::new(QconfExecutor::new(settings.clone()));
        let release = executor.scheduler_version()?.to_string();
        info!("connected to scheduler release {}", release);
        Self::assemble(settings, executor, &release)
    }

    /// Build against a known release without probing the cluster.
    pub fn with_release(settings: QconfSettings, release: &str) -> Result<QconfApi> {
        let executor = Arc::new(QconfExecutor::new(settings.clone()));
        Self::assemble(settings, executor, release)
    }

    fn assemble(
        settings: QconfSettings,
        executor: Arc<QconfExecutor>,
        release: &str,
    ) -> Result<QconfApi> {
        let factory = ObjectFactory::new(release, settings)?;
        let dict = |descriptor: ObjectDescriptor| {
            DictObjectManager::new(Arc::clone(&executor), factory.clone(), descriptor)
        };
        let roster = |descriptor: NameListDescriptor| {
            NameListManager::new(Arc::clone(&executor), descriptor)
        };
        Ok(QconfApi {
            queue: dict(ObjectDescriptor::cluster_queue()),
            ehost: dict(ObjectDescriptor::execution_host()),
            hgrp: dict(ObjectDescriptor::host_group()),
            user: dict(ObjectDescriptor::user()),
            prj: dict(ObjectDescriptor::project()),
            cal: dict(ObjectDescriptor::calendar()),
            ckpt: dict(ObjectDescriptor::checkpointing_environment()),
            acl: dict(ObjectDescriptor::access_list()),
            pe: dict(ObjectDescriptor::parallel_environment()),
            jc: dict(ObjectDescriptor::job_class()),
            rqs: dict(ObjectDescriptor::resource_quota_set()),
            conf: dict(ObjectDescriptor::cluster_configuration()),
            sconf: SingletonObjectManager::new(
                Arc::clone(&executor),
                factory.clone(),
                ObjectDescriptor::scheduler_configuration(),
            ),
            cconf: SingletonObjectManager::new(
                Arc::clone(&executor),
                factory.clone(),
                ObjectDescriptor::complex_configuration(),
            ),
            stree: ShareTreeManager::new(
                Arc::clone(&executor),
                factory.clone(),
                ObjectDescriptor::share_tree(),
            ),
            operator_roster: roster(NameListDescriptor::operators()),
            manager_roster: roster(NameListDescriptor::managers()),
            submit_host_roster: roster(NameListDescriptor::submit_hosts()),
            admin_host_roster: roster(NameListDescriptor::admin_hosts()),
            factory,
            executor,
        })
    }

    pub fn settings(&self) -> &QconfSettings {
        self.executor.settings()
    }

    pub fn factory(&self) -> &ObjectFactory {
        &self.factory
    }

    /// Scheduler release the connected cluster runs.
    pub fn get_version(&self) -> Result<&str> {
        self.executor.scheduler_version()
    }

    /// Rebuild an object from serialized JSON, optionally translating it
    /// to the schema of `target_release`.
    pub fn generate_object(&self, json: &str, target_release: Option<&str>) -> Result<QconfObject> {
        self.factory.generate_from_json(json, target_release)
    }

    // ===== Cluster queues =====
    dict_object_api!(queue:
        generate_queue, add_queue, add_queues, add_queues_from_dir,
        modify_queue, modify_queues, modify_queues_from_dir,
        get_queue, get_queues, delete_queue, delete_queues,
        list_queues, write_queues);

    pub fn queue_exists(&self, name: &str) -> Result<bool> {
        Ok(self.queue.try_get(name)?.is_found())
    }

    // ===== Execution hosts =====
    dict_object_api!(ehost:
        generate_ehost, add_ehost, add_ehosts, add_ehosts_from_dir,
        modify_ehost, modify_ehosts, modify_ehosts_from_dir,
        get_ehost, get_ehosts, delete_ehost, delete_ehosts,
        list_ehosts, write_ehosts);

    // ===== Host groups =====
    dict_object_api!(hgrp:
        generate_hgrp, add_hgrp, add_hgrps, add_hgrps_from_dir,
        modify_hgrp, modify_hgrps, modify_hgrps_from_dir,
        get_hgrp, get_hgrps, delete_hgrp, delete_hgrps,
        list_hgrps, write_hgrps);

    // ===== Users =====
    dict_object_api!(user:
        generate_user, add_user, add_users, add_users_from_dir,
        modify_user, modify_users, modify_users_from_dir,
        get_user, get_users, delete_user, delete_users,
        list_users, write_users);

    // ===== Projects =====
    dict_object_api!(prj:
        generate_prj, add_prj, add_prjs, add_prjs_from_dir,
        modify_prj, modify_prjs, modify_prjs_from_dir,
        get_prj, get_prjs, delete_prj, delete_prjs,
        list_prjs, write_prjs);

    // ===== Calendars =====
    dict_object_api!(cal:
        generate_cal, add_cal, add_cals, add_cals_from_dir,
        modify_cal, modify_cals, modify_cals_from_dir,
        get_cal, get_cals, delete_cal, delete_cals,
        list_cals, write_cals);

    // ===== Checkpointing environments =====
    dict_object_api!(ckpt:
        generate_ckpt, add_ckpt, add_ckpts, add_ckpts_from_dir,
        modify_ckpt, modify_ckpts, modify_ckpts_from_dir,
        get_ckpt, get_ckpts, delete_ckpt, delete_ckpts,
        list_ckpts, write_ckpts);

    // ===== Access lists =====
    dict_object_api!(acl:
        generate_acl, add_acl, add_acls, add_acls_from_dir,
        modify_acl, modify_acls, modify_acls_from_dir,
        get_acl, get_acls, delete_acl, delete_acls,
        list_acls, write_acls);

    /// Add users to access lists; both arguments accept comma- or
    /// whitespace-separated names.
    pub fn add_users_to_acls(&self, users: &str, acls: &str) -> Result<Vec<QconfObject>> {
        self.acl.add_users_to_lists(users, acls)
    }

    pub fn delete_users_from_acls(&self, users: &str, acls: &str) -> Result<Vec<QconfObject>> {
        self.acl.delete_users_from_lists(users, acls)
    }

    // ===== Parallel environments =====
    dict_object_api!(pe:
        generate_pe, add_pe, add_pes, add_pes_from_dir,
        modify_pe, modify_pes, modify_pes_from_dir,
        get_pe, get_pes, delete_pe, delete_pes,
        list_pes, write_pes);

    // ===== Job classes =====
    dict_object_api!(jc:
        generate_jc, add_jc, add_jcs, add_jcs_from_dir,
        modify_jc, modify_jcs, modify_jcs_from_dir,
        get_jc, get_jcs, delete_jc, delete_jcs,
        list_jcs, write_jcs);

    // ===== Resource quota sets =====
    dict_object_api!(rqs:
        generate_rqs, add_rqs, add_rqss, add_rqss_from_dir,
        modify_rqs, modify_rqss, modify_rqss_from_dir,
        get_rqs, get_rqss, delete_rqs, delete_rqss,
        list_rqss, write_rqss);

    // ===== Cluster configurations (global + per host) =====
    dict_object_api!(conf:
        generate_conf, add_conf, add_confs, add_confs_from_dir,
        modify_conf, modify_confs, modify_confs_from_dir,
        get_conf, get_confs, delete_conf, delete_confs,
        list_confs, write_confs);

    // ===== Scheduler configuration =====

    pub fn generate_sconf(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.sconf.generate(spec)
    }

    pub fn get_sconf(&self) -> Result<QconfObject> {
        self.sconf.get()
    }

    pub fn modify_sconf(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.sconf.modify(spec)
    }

    pub fn replace_sconf(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.sconf.replace(spec)
    }

    // ===== Complex configuration =====

    pub fn generate_cconf(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.cconf.generate(spec)
    }

    pub fn get_cconf(&self) -> Result<QconfObject> {
        self.cconf.get()
    }

    pub fn modify_cconf(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.cconf.modify(spec)
    }

    pub fn replace_cconf(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.cconf.replace(spec)
    }

    pub fn add_cattr(&self, name: &str, data: IndexMap<String, Value>) -> Result<QconfObject> {
        self.cconf.add_attribute(name, data)
    }

    pub fn modify_cattr(&self, name: &str, data: IndexMap<String, Value>) -> Result<QconfObject> {
        self.cconf.modify_attribute(name, data)
    }

    pub fn delete_cattr(&self, name: &str) -> Result<QconfObject> {
        self.cconf.delete_attribute(name)
    }

    // ===== Share tree =====

    pub fn generate_stree(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.stree.generate(spec)
    }

    pub fn get_stree(&self) -> Result<QconfObject> {
        self.stree.get()
    }

    pub fn get_stree_if_exists(&self) -> Result<QconfObject> {
        self.stree.get_if_exists()
    }

    pub fn stree_exists(&self) -> Result<bool> {
        self.stree.exists()
    }

    pub fn add_stree(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.stree.add(spec)
    }

    pub fn modify_stree(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.stree.modify(spec)
    }

    pub fn modify_or_add_stree(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.stree.modify_or_add(spec)
    }

    pub fn delete_stree(&self) -> Result<()> {
        self.stree.delete()
    }

    pub fn delete_stree_if_exists(&self) -> Result<()> {
        self.stree.delete_if_exists()
    }

    pub fn add_stnode(&self, path: &str, shares: i64) -> Result<QconfObject> {
        self.stree.add_node(path, shares)
    }

    pub fn delete_stnode(&self, path: &str) -> Result<QconfObject> {
        self.stree.delete_node(path)
    }

    // ===== Name lists =====
    name_list_api!(operator_roster: add_operators, delete_operators, list_operators);
    name_list_api!(manager_roster: add_managers, delete_managers, list_managers);
    name_list_api!(submit_host_roster: add_submit_hosts, delete_submit_hosts, list_submit_hosts);
    name_list_api!(admin_host_roster: add_admin_hosts, delete_admin_hosts, list_admin_hosts);
}
