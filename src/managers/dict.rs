//! Generic manager for kinds stored as named dictionary records. One
//! instance per kind, parameterized by an [`ObjectDescriptor`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use regex::Regex;

use crate::config::Actor;
use crate::errors::{QconfError, Result};
use crate::executor::{QconfExecutor, RunOptions};
use crate::managers::descriptor::ObjectDescriptor;
use crate::managers::name_list::{normalize_names, parse_names, NameList};
use crate::managers::Probe;
use crate::objects::{ObjectData, ObjectFactory, ObjectKind, ObjectSpec, QconfObject};

/// Load-report keys are only accepted by the backend when this is set.
const ALLOW_CHANGE_LOAD_VALUES_ENV: &str = "SGE_ALLOW_CHANGE_LOAD_VALUES";

pub struct DictObjectManager {
    executor: Arc<QconfExecutor>,
    factory: ObjectFactory,
    descriptor: ObjectDescriptor,
}

impl DictObjectManager {
    pub fn new(
        executor: Arc<QconfExecutor>,
        factory: ObjectFactory,
        descriptor: ObjectDescriptor,
    ) -> DictObjectManager {
        DictObjectManager {
            executor,
            factory,
            descriptor,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.descriptor.kind
    }

    fn actor(&self) -> &Actor {
        &self.executor.settings().actor
    }

    fn class_name(&self) -> &'static str {
        self.descriptor.kind.class_name()
    }

    fn run_options(&self) -> RunOptions<'_> {
        RunOptions {
            error_rules: &self.descriptor.error_rules,
            failure_rules: &self.descriptor.failure_rules,
            combine_error_lines: true,
            ..RunOptions::default()
        }
    }

    fn required_name(object: &QconfObject) -> Result<String> {
        object
            .name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                QconfError::InvalidArgument("object name must be provided".to_string())
            })
    }

    /// Build a record from caller input without touching the cluster.
    pub fn generate(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.factory.generate(self.kind(), spec)
    }

    /// Add a new record. Fails with `ObjectAlreadyExists` when a record of
    /// the same name is present.
    pub fn add(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let mut object = self.generate(spec)?;
        object.check_user_provided_keys()?;
        let name = Self::required_name(&object)?;
        if self.descriptor.global_protected && name == "global" {
            return Err(QconfError::InvalidRequest(
                "global configuration cannot be added".to_string(),
            ));
        }
        if let Probe::Found(_) = self.try_get(&name)? {
            return Err(QconfError::ObjectAlreadyExists(format!(
                "{} object {} already exists",
                self.class_name(),
                name
            )));
        }
        object.strip_optional_keys()?;
        let verb = format!("-A{}", self.descriptor.uge_name);
        self.executor
            .run_with_object(&[&verb], &object, &self.descriptor.error_rules)?;
        object.stamp_created(self.actor());
        Ok(object)
    }

    /// Modify an existing record: caller fields are merged over the
    /// cluster's current record, untouched fields keep their values.
    pub fn modify(&self, mut spec: ObjectSpec<'_>) -> Result<QconfObject> {
        spec.skip_required_defaults = true;
        let generated = self.generate(spec)?;
        generated.check_user_provided_keys()?;
        let name = Self::required_name(&generated)?;

        let mut current = self.get(&name)?;
        merge_object_data(&mut current, &generated)?;
        current.strip_optional_keys()?;
        let verb = format!("-M{}", self.descriptor.uge_name);
        self.executor
            .run_with_object(&[&verb], &current, &self.descriptor.error_rules)?;
        current.stamp_modified(self.actor());
        Ok(current)
    }

    /// Replace a record wholesale: missing fields fall back to schema
    /// defaults instead of the cluster's current values.
    pub fn replace(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let mut object = self.generate(spec)?;
        object.check_user_provided_keys()?;
        Self::required_name(&object)?;
        object.strip_optional_keys()?;
        let verb = format!("-M{}", self.descriptor.uge_name);
        self.executor
            .run_with_object(&[&verb], &object, &self.descriptor.error_rules)?;
        object.stamp_modified(self.actor());
        Ok(object)
    }

    /// Fetch one record by name.
    pub fn get(&self, name: &str) -> Result<QconfObject> {
        if name.is_empty() {
            return Err(QconfError::InvalidArgument(
                "object name must be provided".to_string(),
            ));
        }
        let verb = format!("-s{}", self.descriptor.uge_name);
        let mut args: Vec<&str> = vec![&verb];
        // The global configuration is shown without a name argument.
        if !(self.descriptor.global_protected && name == "global") {
            args.push(name);
        }
        let result = self.executor.run(&args, &self.run_options())?;
        let mut object = self
            .factory
            .generate(self.kind(), ObjectSpec::default().without_required_defaults())?;
        object.parse_text(&result.stdout)?;
        object.set_name(name)?;
        object.stamp_retrieved(self.actor());
        Ok(object)
    }

    /// Existence probe that keeps other failures typed.
    pub fn try_get(&self, name: &str) -> Result<Probe> {
        match self.get(name) {
            Ok(object) => Ok(Probe::Found(object)),
            Err(err) if err.is_not_found() => Ok(Probe::NotFound),
            Err(err) => Err(err),
        }
    }

    /// Delete one record by name.
    pub fn delete(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(QconfError::InvalidArgument(
                "object name must be provided".to_string(),
            ));
        }
        if self.descriptor.global_protected && name == "global" {
            return Err(QconfError::InvalidRequest(
                "global configuration cannot be deleted".to_string(),
            ));
        }
        // Fetch first so a missing record surfaces as ObjectNotFound even
        // for verbs with unhelpful messages.
        self.get(name)?;
        let default_verb;
        let verb = match self.descriptor.delete_verb {
            Some(verb) => verb,
            None => {
                default_verb = format!("-d{}", self.descriptor.uge_name);
                &default_verb
            }
        };
        self.executor.run(&[verb, name], &self.run_options())?;
        debug!("deleted {} object {}", self.class_name(), name);
        Ok(())
    }

    pub fn delete_many(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.delete(name)?;
        }
        Ok(())
    }

    /// Names of all records; an empty cluster yields an empty list.
    pub fn list(&self) -> Result<NameList> {
        let description = format!("List of {} names", self.descriptor.display_name);
        let verb = format!("-s{}l", self.descriptor.uge_name);
        let mut names = match self.executor.run(&[&verb], &self.run_options()) {
            Ok(result) => parse_names(&result.stdout),
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err),
        };
        if self.descriptor.appends_global_to_list && !names.iter().any(|n| n == "global") {
            names.push("global".to_string());
        }
        Ok(NameList::new(names, description))
    }

    /// Fetch every record, using the bulk detail dump when the kind has
    /// one and falling back to per-name fetches otherwise.
    pub fn get_all(&self) -> Result<Vec<QconfObject>> {
        let suffix = match self.descriptor.list_details_suffix {
            Some(suffix) => suffix,
            None => {
                let mut objects = Vec::new();
                for name in self.list()?.names {
                    objects.push(self.get(&name)?);
                }
                return Ok(objects);
            }
        };
        let verb = format!("-s{}{}", self.descriptor.uge_name, suffix);
        let result = match self.executor.run(&[&verb], &self.run_options()) {
            Ok(result) => result,
            Err(err) if err.is_not_found() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        self.parse_bulk_output(&result.stdout)
    }

    fn parse_bulk_output(&self, output: &str) -> Result<Vec<QconfObject>> {
        // Separator patterns are fixed per descriptor.
        let separator =
            Regex::new(self.descriptor.bulk_separator).expect("hardcoded separator pattern");
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        for line in output.lines() {
            if separator.is_match(line) {
                if !current.trim().is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current.clear();
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        if !current.trim().is_empty() {
            chunks.push(current);
        }

        let mut objects = Vec::new();
        for chunk in chunks {
            let mut object = self
                .factory
                .generate(self.kind(), ObjectSpec::default().without_required_defaults())?;
            object.parse_text(&chunk)?;
            object.stamp_retrieved(self.actor());
            objects.push(object);
        }
        Ok(objects)
    }

    /// Write each record's native text into `dir`, one file per record
    /// named after the record.
    pub fn write_to_dir(&self, objects: &[QconfObject], dir: &Path) -> Result<Vec<PathBuf>> {
        let allow_load_values = env::var(ALLOW_CHANGE_LOAD_VALUES_ENV).is_ok();
        let mut paths = Vec::new();
        for object in objects {
            let name = Self::required_name(object)?;
            let mut object = object.clone();
            if !allow_load_values && !self.descriptor.dump_ignored_keys.is_empty() {
                let map = object.data_dict_mut()?;
                for key in self.descriptor.dump_ignored_keys {
                    map.shift_remove(*key);
                }
            }
            let path = dir.join(&name);
            fs::write(&path, object.to_text()?)?;
            paths.push(path);
        }
        Ok(paths)
    }

    /// Add every record configuration file in `dir`.
    pub fn add_from_dir(&self, dir: &Path) -> Result<()> {
        let verb = format!("-A{}", self.descriptor.uge_name);
        self.executor
            .run_with_dir(&[&verb], dir, &self.descriptor.error_rules)?;
        Ok(())
    }

    /// Modify from every record configuration file in `dir`.
    pub fn modify_from_dir(&self, dir: &Path) -> Result<()> {
        let verb = format!("-M{}", self.descriptor.uge_name);
        self.executor
            .run_with_dir(&[&verb], dir, &self.descriptor.error_rules)?;
        Ok(())
    }

    /// Add several records in one backend call through a scratch
    /// directory.
    pub fn add_many(&self, objects: Vec<QconfObject>) -> Result<Vec<QconfObject>> {
        self.apply_many(objects, |dir| self.add_from_dir(dir), |o, a| {
            o.stamp_created(a)
        })
    }

    /// Modify several records in one backend call. Records are applied
    /// wholesale, as in [`replace`](Self::replace).
    pub fn modify_many(&self, objects: Vec<QconfObject>) -> Result<Vec<QconfObject>> {
        self.apply_many(objects, |dir| self.modify_from_dir(dir), |o, a| {
            o.stamp_modified(a)
        })
    }

    fn apply_many(
        &self,
        objects: Vec<QconfObject>,
        run: impl Fn(&Path) -> Result<()>,
        stamp: impl Fn(&mut QconfObject, &Actor),
    ) -> Result<Vec<QconfObject>> {
        if objects.is_empty() {
            return Ok(Vec::new());
        }
        let mut prepared = Vec::with_capacity(objects.len());
        for mut object in objects {
            object.check_user_provided_keys()?;
            Self::required_name(&object)?;
            object.strip_optional_keys()?;
            prepared.push(object);
        }
        let dir = tempfile::Builder::new()
            .prefix(self.descriptor.dump_dir_prefix)
            .tempdir()?;
        self.write_to_dir(&prepared, dir.path())?;
        run(dir.path())?;
        for object in &mut prepared {
            stamp(object, self.actor());
        }
        Ok(prepared)
    }

    // ===== Access list membership =====

    /// Add users to one or more access lists and return the refreshed
    /// lists. Both arguments accept comma- or whitespace-separated names.
    pub fn add_users_to_lists(&self, users: &str, lists: &str) -> Result<Vec<QconfObject>> {
        self.change_list_members("-au", users, lists)
    }

    /// Remove users from one or more access lists and return the
    /// refreshed lists.
    pub fn delete_users_from_lists(&self, users: &str, lists: &str) -> Result<Vec<QconfObject>> {
        self.change_list_members("-du", users, lists)
    }

    fn change_list_members(
        &self,
        verb: &str,
        users: &str,
        lists: &str,
    ) -> Result<Vec<QconfObject>> {
        let users = normalize_names(users)?;
        let lists = normalize_names(lists)?;
        self.executor
            .run(&[verb, &users, &lists], &self.run_options())?;
        lists.split(',').map(|name| self.get(name)).collect()
    }
}

// Caller fields win key by key; list payloads are replaced wholesale.
fn merge_object_data(current: &mut QconfObject, incoming: &QconfObject) -> Result<()> {
    match &incoming.data {
        ObjectData::Dict(map) => {
            let target = current.data_dict_mut()?;
            for (key, value) in map {
                target.insert(key.clone(), value.clone());
            }
        }
        ObjectData::List(list) => {
            current.data = ObjectData::List(list.clone());
        }
    }
    Ok(())
}
