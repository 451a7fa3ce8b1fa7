//! Cluster-wide singleton records: the scheduler configuration and the
//! complex attribute table. Neither can be added, deleted or listed; the
//! complex table additionally supports per-attribute edits applied
//! through a full table rewrite.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::Actor;
use crate::errors::{QconfError, Result};
use crate::executor::{QconfExecutor, RunOptions};
use crate::managers::descriptor::ObjectDescriptor;
use crate::objects::{Layout, ObjectData, ObjectFactory, ObjectKind, ObjectSpec, QconfObject, Value};

pub struct SingletonObjectManager {
    executor: Arc<QconfExecutor>,
    factory: ObjectFactory,
    descriptor: ObjectDescriptor,
}

impl SingletonObjectManager {
    pub fn new(
        executor: Arc<QconfExecutor>,
        factory: ObjectFactory,
        descriptor: ObjectDescriptor,
    ) -> SingletonObjectManager {
        SingletonObjectManager {
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

    fn run_options(&self) -> RunOptions<'_> {
        RunOptions {
            error_rules: &self.descriptor.error_rules,
            failure_rules: &self.descriptor.failure_rules,
            combine_error_lines: true,
            ..RunOptions::default()
        }
    }

    pub fn generate(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.factory.generate(self.kind(), spec)
    }

    /// Fetch the record.
    pub fn get(&self) -> Result<QconfObject> {
        let verb = format!("-s{}", self.descriptor.uge_name);
        let result = self.executor.run(&[&verb], &self.run_options())?;
        let mut object = self
            .factory
            .generate(self.kind(), ObjectSpec::default().without_required_defaults())?;
        object.parse_text(&result.stdout)?;
        object.stamp_retrieved(self.actor());
        Ok(object)
    }

    /// Merge caller fields over the current record and write it back.
    pub fn modify(&self, mut spec: ObjectSpec<'_>) -> Result<QconfObject> {
        spec.skip_required_defaults = true;
        let generated = self.generate(spec)?;
        generated.check_user_provided_keys()?;
        let mut current = self.get()?;
        if let ObjectData::Dict(incoming) = &generated.data {
            let target = current.data_dict_mut()?;
            for (key, value) in incoming {
                target.insert(key.clone(), value.clone());
            }
        }
        self.apply(current)
    }

    /// Write a fully generated record, defaults filling missing fields.
    pub fn replace(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let object = self.generate(spec)?;
        object.check_user_provided_keys()?;
        self.apply(object)
    }

    fn apply(&self, mut object: QconfObject) -> Result<QconfObject> {
        object.strip_optional_keys()?;
        let verb = format!("-M{}", self.descriptor.uge_name);
        self.executor
            .run_with_object(&[&verb], &object, &self.descriptor.error_rules)?;
        object.stamp_modified(self.actor());
        Ok(object)
    }

    // ===== Complex attribute edits =====

    /// Add one attribute row to the complex table.
    pub fn add_attribute(
        &self,
        name: &str,
        data: IndexMap<String, Value>,
    ) -> Result<QconfObject> {
        self.check_attribute_data(name, &data)?;
        let mut current = self.get()?;
        if current.data_dict()?.contains_key(name) {
            return Err(QconfError::ObjectAlreadyExists(format!(
                "complex attribute {} already exists",
                name
            )));
        }
        current
            .data_dict_mut()?
            .insert(name.to_string(), Value::Dict(data));
        self.apply(current)
    }

    /// Update columns of an existing attribute row.
    pub fn modify_attribute(
        &self,
        name: &str,
        data: IndexMap<String, Value>,
    ) -> Result<QconfObject> {
        if name.is_empty() {
            return Err(QconfError::InvalidArgument(
                "attribute name must be provided".to_string(),
            ));
        }
        let mut current = self.get()?;
        let row = match current.data_dict_mut()?.get_mut(name) {
            Some(Value::Dict(row)) => row,
            _ => {
                return Err(QconfError::ObjectNotFound(format!(
                    "complex attribute {} does not exist",
                    name
                )))
            }
        };
        for (key, value) in data {
            row.insert(key, value);
        }
        self.apply(current)
    }

    /// Remove an attribute row.
    pub fn delete_attribute(&self, name: &str) -> Result<QconfObject> {
        let mut current = self.get()?;
        if current.data_dict_mut()?.shift_remove(name).is_none() {
            return Err(QconfError::ObjectNotFound(format!(
                "complex attribute {} does not exist",
                name
            )));
        }
        self.apply(current)
    }

    fn check_attribute_data(&self, name: &str, data: &IndexMap<String, Value>) -> Result<()> {
        if name.is_empty() {
            return Err(QconfError::InvalidArgument(
                "attribute name must be provided".to_string(),
            ));
        }
        let schema = self.factory.schema_for(self.kind())?;
        let (with_affinity, with_reporting) = match schema.layout {
            Layout::ComplexTable {
                with_affinity,
                with_reporting,
            } => (with_affinity, with_reporting),
            _ => (false, false),
        };
        let mut required = vec![
            "shortcut",
            "type",
            "relop",
            "requestable",
            "consumable",
            "default",
            "urgency",
            "aapre",
        ];
        if with_affinity {
            required.push("affinity");
        }
        if with_reporting {
            required.extend(["do_report", "is_static"]);
        }
        for column in required {
            if !data.contains_key(column) {
                return Err(QconfError::InvalidArgument(format!(
                    "attribute {} data is missing required field {}",
                    name, column
                )));
            }
        }
        Ok(())
    }
}
