//! Flat name lists: operators, managers, submit hosts and admin hosts
//! are plain rosters without per-object configuration records.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::config::Actor;
use crate::errors::{QconfError, Result};
use crate::executor::{QconfExecutor, RunOptions};
use crate::managers::descriptor::NameListDescriptor;

/// Ordered list of names with provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameList {
    pub names: Vec<String>,
    pub metadata: IndexMap<String, String>,
}

impl NameList {
    pub fn new(names: Vec<String>, description: impl Into<String>) -> NameList {
        let mut metadata = IndexMap::new();
        metadata.insert("description".to_string(), description.into());
        NameList { names, metadata }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn stamp_modified(&mut self, actor: &Actor) {
        self.metadata
            .insert("modified_by".to_string(), actor.tag());
        self.metadata.insert(
            "modified_on".to_string(),
            chrono::Local::now().to_rfc3339(),
        );
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        let mut document = serde_json::Map::new();
        document.insert(
            "object_class".to_string(),
            serde_json::Value::String("QconfNameList".to_string()),
        );
        for (key, value) in &self.metadata {
            document.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
        document.insert(
            "data".to_string(),
            serde_json::Value::Array(
                self.names
                    .iter()
                    .map(|n| serde_json::Value::String(n.clone()))
                    .collect(),
            ),
        );
        serde_json::Value::Object(document)
    }
}

/// Names from one-per-line qconf list output.
pub fn parse_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes caller name input to the comma-joined form qconf takes.
/// Accepts comma- or whitespace-separated names.
pub fn normalize_names(input: &str) -> Result<String> {
    let names: Vec<&str> = if input.contains(',') {
        input.split(',').map(str::trim).collect()
    } else {
        input.split_whitespace().collect()
    };
    let names: Vec<&str> = names.into_iter().filter(|n| !n.is_empty()).collect();
    if names.is_empty() {
        return Err(QconfError::InvalidArgument(
            "name list must not be empty".to_string(),
        ));
    }
    for name in &names {
        if name.contains(char::is_whitespace) {
            return Err(QconfError::InvalidArgument(format!(
                "invalid name: {}",
                name
            )));
        }
    }
    Ok(names.join(","))
}

/// Manages one roster kind through its add/delete/show verbs.
pub struct NameListManager {
    executor: Arc<QconfExecutor>,
    descriptor: NameListDescriptor,
}

impl NameListManager {
    pub fn new(executor: Arc<QconfExecutor>, descriptor: NameListDescriptor) -> NameListManager {
        NameListManager {
            executor,
            descriptor,
        }
    }

    fn actor(&self) -> &Actor {
        &self.executor.settings().actor
    }

    fn description(&self) -> String {
        format!("List of {} names", self.descriptor.display_name)
    }

    /// Add names to the roster and return the refreshed list.
    pub fn add_names(&self, names: &str) -> Result<NameList> {
        let names = normalize_names(names)?;
        let verb = format!("-a{}", self.descriptor.uge_name);
        debug!("adding {} entries: {}", self.descriptor.display_name, names);
        self.executor.run(
            &[&verb, &names],
            &RunOptions {
                error_rules: &self.descriptor.error_rules,
                combine_error_lines: true,
                ..RunOptions::default()
            },
        )?;
        let mut list = self.list_names()?;
        list.stamp_modified(self.actor());
        Ok(list)
    }

    /// Delete names from the roster and return the refreshed list.
    pub fn delete_names(&self, names: &str) -> Result<NameList> {
        let names = normalize_names(names)?;
        let verb = format!("-d{}", self.descriptor.uge_name);
        debug!(
            "deleting {} entries: {}",
            self.descriptor.display_name, names
        );
        self.executor.run(
            &[&verb, &names],
            &RunOptions {
                error_rules: &self.descriptor.error_rules,
                combine_error_lines: true,
                ..RunOptions::default()
            },
        )?;
        let mut list = self.list_names()?;
        list.stamp_modified(self.actor());
        Ok(list)
    }

    /// Current roster; an empty cluster yields an empty list.
    pub fn list_names(&self) -> Result<NameList> {
        let verb = format!("-s{}", self.descriptor.uge_name);
        match self.executor.run(
            &[&verb],
            &RunOptions {
                error_rules: &self.descriptor.error_rules,
                combine_error_lines: true,
                ..RunOptions::default()
            },
        ) {
            Ok(result) => Ok(NameList::new(
                parse_names(&result.stdout),
                self.description(),
            )),
            Err(err) if err.is_not_found() => Ok(NameList::new(Vec::new(), self.description())),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_skips_blank_lines() {
        let output = "master\n\n  exec1  \nexec2\n";
        assert_eq!(parse_names(output), vec!["master", "exec1", "exec2"]);
    }

    #[test]
    fn test_normalize_names_accepts_both_separators() {
        assert_eq!(normalize_names("a, b, c").unwrap(), "a,b,c");
        assert_eq!(normalize_names("a b  c").unwrap(), "a,b,c");
        assert_eq!(normalize_names("single").unwrap(), "single");
    }

    #[test]
    fn test_normalize_names_rejects_empty_input() {
        assert!(normalize_names("  ").is_err());
        assert!(normalize_names(",,").is_err());
    }

    #[test]
    fn test_name_list_json_shape() {
        let list = NameList::new(
            vec!["alice".to_string(), "bob".to_string()],
            "List of operator names",
        );
        let json = list.to_json_value();
        assert_eq!(json["object_class"], "QconfNameList");
        assert_eq!(json["description"], "List of operator names");
        assert_eq!(json["data"][1], "bob");
    }
}
