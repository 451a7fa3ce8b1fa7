//! Share tree management. The tree is a single unnamed record holding an
//! ordered list of node dictionaries, written back wholesale on every
//! change; node-level edits go through the dedicated node verbs.

use std::sync::Arc;

use log::debug;

use crate::config::Actor;
use crate::errors::{ErrorKind, QconfError, Result};
use crate::executor::{ErrorRule, QconfExecutor, RunOptions};
use crate::managers::descriptor::ObjectDescriptor;
use crate::objects::{ObjectData, ObjectFactory, ObjectKind, ObjectSpec, QconfObject};

pub struct ShareTreeManager {
    executor: Arc<QconfExecutor>,
    factory: ObjectFactory,
    descriptor: ObjectDescriptor,
    // Existence probes must only treat a missing tree as not-found;
    // anything else stays a hard failure.
    probe_rules: Vec<ErrorRule>,
}

impl ShareTreeManager {
    pub fn new(
        executor: Arc<QconfExecutor>,
        factory: ObjectFactory,
        descriptor: ObjectDescriptor,
    ) -> ShareTreeManager {
        let probe_rules = vec![ErrorRule::new(
            ".*no sharetree element.*",
            ErrorKind::ObjectNotFound,
        )];
        ShareTreeManager {
            executor,
            factory,
            descriptor,
            probe_rules,
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
            combine_error_lines: true,
            ..RunOptions::default()
        }
    }

    pub fn generate(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        self.factory.generate(self.kind(), spec)
    }

    fn empty_tree(&self) -> Result<QconfObject> {
        self.factory
            .generate(self.kind(), ObjectSpec::default().without_required_defaults())
    }

    /// Fetch the tree.
    pub fn get(&self) -> Result<QconfObject> {
        let result = self.executor.run(&["-sstree"], &self.run_options())?;
        let mut object = self.empty_tree()?;
        object.parse_text(&result.stdout)?;
        object.stamp_retrieved(self.actor());
        Ok(object)
    }

    /// True when the cluster has a share tree configured.
    pub fn exists(&self) -> Result<bool> {
        match self.executor.run(
            &["-sstree"],
            &RunOptions {
                error_rules: &self.probe_rules,
                combine_error_lines: true,
                ..RunOptions::default()
            },
        ) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Create the tree. Fails when one is already configured.
    pub fn add(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let object = self.generate(spec)?;
        self.write_add(object)
    }

    /// Replace the tree wholesale with the caller's node list.
    pub fn modify(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let object = self.generate(spec)?;
        self.write_modify(object)
    }

    /// Write the tree whether or not one exists. An empty node list means
    /// the caller wants no tree at all, so the existing one is removed.
    pub fn modify_or_add(&self, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let object = self.generate(spec)?;
        if matches!(&object.data, ObjectData::List(nodes) if nodes.is_empty()) {
            self.delete_if_exists()?;
            return self.empty_tree();
        }
        if self.exists()? {
            self.write_modify(object)
        } else {
            self.write_add(object)
        }
    }

    fn write_add(&self, mut object: QconfObject) -> Result<QconfObject> {
        object.check_user_provided_keys()?;
        if self.exists()? {
            return Err(QconfError::ObjectAlreadyExists(
                "ShareTree object already exists".to_string(),
            ));
        }
        self.executor
            .run_with_object(&["-Astree"], &object, &self.descriptor.error_rules)?;
        object.stamp_created(self.actor());
        Ok(object)
    }

    fn write_modify(&self, mut object: QconfObject) -> Result<QconfObject> {
        object.check_user_provided_keys()?;
        self.executor
            .run_with_object(&["-Mstree"], &object, &self.descriptor.error_rules)?;
        object.stamp_modified(self.actor());
        Ok(object)
    }

    /// Remove the tree.
    pub fn delete(&self) -> Result<()> {
        self.executor.run(&["-dstree"], &self.run_options())?;
        debug!("deleted share tree");
        Ok(())
    }

    pub fn delete_if_exists(&self) -> Result<()> {
        if self.exists()? {
            self.delete()?;
        }
        Ok(())
    }

    /// The tree when one exists, an empty record otherwise.
    pub fn get_if_exists(&self) -> Result<QconfObject> {
        if self.exists()? {
            self.get()
        } else {
            self.empty_tree()
        }
    }

    /// Add a leaf node at `path` (slash-separated) with the given share
    /// count, returning the updated tree.
    pub fn add_node(&self, path: &str, shares: i64) -> Result<QconfObject> {
        if path.is_empty() {
            return Err(QconfError::InvalidArgument(
                "node path must be provided".to_string(),
            ));
        }
        let node = format!("{}={}", path, shares);
        self.executor.run(&["-astnode", &node], &self.run_options())?;
        self.get()
    }

    /// Remove the node at `path`, returning the updated tree.
    pub fn delete_node(&self, path: &str) -> Result<QconfObject> {
        if path.is_empty() {
            return Err(QconfError::InvalidArgument(
                "node path must be provided".to_string(),
            ));
        }
        self.executor
            .run(&["-dstnode", path], &self.run_options())?;
        self.get()
    }
}
