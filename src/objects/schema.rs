//! Per-(kind, version) schema descriptors and the field coercion engine.
//!
//! Each concrete schema version owns its complete coercion table; a release
//! that changes field semantics gets a new table rather than a patch to a
//! shared one, so every version stays independently testable.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::config::QconfSettings;
use crate::errors::{QconfError, Result};
use crate::objects::value::{KeywordTable, Value};

/// The configuration entity kinds the client manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ClusterQueue,
    ExecutionHost,
    HostGroup,
    User,
    Project,
    Calendar,
    CheckpointingEnvironment,
    AccessList,
    ParallelEnvironment,
    JobClass,
    ResourceQuotaSet,
    ClusterConfiguration,
    SchedulerConfiguration,
    ComplexConfiguration,
    ShareTree,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 15] = [
        ObjectKind::ClusterQueue,
        ObjectKind::ExecutionHost,
        ObjectKind::HostGroup,
        ObjectKind::User,
        ObjectKind::Project,
        ObjectKind::Calendar,
        ObjectKind::CheckpointingEnvironment,
        ObjectKind::AccessList,
        ObjectKind::ParallelEnvironment,
        ObjectKind::JobClass,
        ObjectKind::ResourceQuotaSet,
        ObjectKind::ClusterConfiguration,
        ObjectKind::SchedulerConfiguration,
        ObjectKind::ComplexConfiguration,
        ObjectKind::ShareTree,
    ];

    /// Class name recorded in `object_class` metadata.
    pub fn class_name(&self) -> &'static str {
        match self {
            ObjectKind::ClusterQueue => "ClusterQueue",
            ObjectKind::ExecutionHost => "ExecutionHost",
            ObjectKind::HostGroup => "HostGroup",
            ObjectKind::User => "User",
            ObjectKind::Project => "Project",
            ObjectKind::Calendar => "Calendar",
            ObjectKind::CheckpointingEnvironment => "CheckpointingEnvironment",
            ObjectKind::AccessList => "AccessList",
            ObjectKind::ParallelEnvironment => "ParallelEnvironment",
            ObjectKind::JobClass => "JobClass",
            ObjectKind::ResourceQuotaSet => "ResourceQuotaSet",
            ObjectKind::ClusterConfiguration => "ClusterConfiguration",
            ObjectKind::SchedulerConfiguration => "SchedulerConfiguration",
            ObjectKind::ComplexConfiguration => "ComplexConfiguration",
            ObjectKind::ShareTree => "ShareTree",
        }
    }

    pub fn from_class_name(name: &str) -> Option<ObjectKind> {
        ObjectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.class_name() == name)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Emission/parsing strategy for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// One `key<space>value` line per field.
    KeyValueLines,
    /// Ordered list of node dictionaries emitted as `key=value` lines, a
    /// new node starting at every reappearance of `first_key`.
    DictList {
        first_key: &'static str,
        node_keys: &'static [&'static str],
    },
    /// Brace-delimited block with repeated `limit` lines.
    ResourceQuota,
    /// Fixed-column attribute table with a two-line `#` comment header.
    /// Later versions append the affinity and reporting columns.
    ComplexTable {
        with_affinity: bool,
        with_reporting: bool,
    },
}

/// Compile-time description of one entity kind at one schema version.
#[derive(Debug)]
pub struct Schema {
    pub kind: ObjectKind,
    pub version: &'static str,
    pub name_key: Option<&'static str>,
    pub user_provided_keys: &'static [&'static str],
    /// Ordered defaults for required fields. String defaults may embed
    /// `SGE_ROOT`/`SGE_CELL` placeholders expanded at defaulting time.
    pub required_defaults: Vec<(&'static str, Value)>,
    /// Alternate defaults for non-global cluster configurations.
    pub host_required_defaults: Option<Vec<(&'static str, Value)>>,
    pub keyword_table: KeywordTable,
    /// Keys whose keyword tokens are emitted lowercased.
    pub lowercase_keyword_keys: &'static [&'static str],
    pub optional_keys_allowed: bool,
    pub default_list_delimiter: &'static str,
    pub default_dict_delimiter: &'static str,
    pub list_delimiters: HashMap<&'static str, &'static str>,
    pub dict_delimiters: HashMap<&'static str, &'static str>,
    pub layout: Layout,
    // Derived from the default tables at construction; sub-dictionary
    // defaults contribute their keys too.
    bool_keys: HashSet<String>,
    int_keys: HashSet<String>,
    float_keys: HashSet<String>,
}

/// Builder keeping the per-kind catalog tables short and declarative.
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(kind: ObjectKind, version: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                kind,
                version,
                name_key: None,
                user_provided_keys: &[],
                required_defaults: Vec::new(),
                host_required_defaults: None,
                keyword_table: KeywordTable::Standard,
                lowercase_keyword_keys: &[],
                optional_keys_allowed: false,
                default_list_delimiter: ",",
                default_dict_delimiter: ",",
                list_delimiters: HashMap::new(),
                dict_delimiters: HashMap::new(),
                layout: Layout::KeyValueLines,
                bool_keys: HashSet::new(),
                int_keys: HashSet::new(),
                float_keys: HashSet::new(),
            },
        }
    }

    pub fn name_key(mut self, key: &'static str) -> Self {
        self.schema.name_key = Some(key);
        self
    }

    pub fn user_provided(mut self, keys: &'static [&'static str]) -> Self {
        self.schema.user_provided_keys = keys;
        self
    }

    pub fn defaults(mut self, defaults: Vec<(&'static str, Value)>) -> Self {
        self.schema.required_defaults = defaults;
        self
    }

    pub fn host_defaults(mut self, defaults: Vec<(&'static str, Value)>) -> Self {
        self.schema.host_required_defaults = Some(defaults);
        self
    }

    pub fn keyword_table(mut self, table: KeywordTable) -> Self {
        self.schema.keyword_table = table;
        self
    }

    pub fn lowercase_keywords(mut self, keys: &'static [&'static str]) -> Self {
        self.schema.lowercase_keyword_keys = keys;
        self
    }

    pub fn optional_keys_allowed(mut self) -> Self {
        self.schema.optional_keys_allowed = true;
        self
    }

    pub fn list_delimiter(mut self, delimiter: &'static str) -> Self {
        self.schema.default_list_delimiter = delimiter;
        self
    }

    pub fn dict_delimiter(mut self, delimiter: &'static str) -> Self {
        self.schema.default_dict_delimiter = delimiter;
        self
    }

    pub fn list_keys(mut self, keys: &'static [(&'static str, &'static str)]) -> Self {
        self.schema.list_delimiters = keys.iter().copied().collect();
        self
    }

    pub fn dict_keys(mut self, keys: &'static [(&'static str, &'static str)]) -> Self {
        self.schema.dict_delimiters = keys.iter().copied().collect();
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.schema.layout = layout;
        self
    }

    /// Derive the bool/int/float key sets from the default tables, the
    /// sub-dictionary defaults included.
    pub fn build(mut self) -> Schema {
        let mut tables: Vec<&[(&'static str, Value)]> =
            vec![&self.schema.required_defaults];
        if let Some(host) = &self.schema.host_required_defaults {
            tables.push(host);
        }
        let mut bool_keys = HashSet::new();
        let mut int_keys = HashSet::new();
        let mut float_keys = HashSet::new();
        for table in tables {
            for (key, default) in table {
                match default {
                    Value::Bool(_) => {
                        bool_keys.insert(key.to_string());
                    }
                    Value::Int(_) => {
                        int_keys.insert(key.to_string());
                    }
                    Value::Float(_) => {
                        float_keys.insert(key.to_string());
                    }
                    Value::Dict(sub) => {
                        for (sub_key, sub_default) in sub {
                            match sub_default {
                                Value::Bool(_) => {
                                    bool_keys.insert(sub_key.clone());
                                }
                                Value::Int(_) => {
                                    int_keys.insert(sub_key.clone());
                                }
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        self.schema.bool_keys = bool_keys;
        self.schema.int_keys = int_keys;
        self.schema.float_keys = float_keys;
        self.schema
    }
}

impl Schema {
    pub fn builder(kind: ObjectKind, version: &'static str) -> SchemaBuilder {
        SchemaBuilder::new(kind, version)
    }

    pub fn is_list_key(&self, key: &str) -> bool {
        self.list_delimiters.contains_key(key)
    }

    pub fn is_dict_key(&self, key: &str) -> bool {
        self.dict_delimiters.contains_key(key)
    }

    pub fn is_int_key(&self, key: &str) -> bool {
        self.int_keys.contains(key)
    }

    pub fn is_float_key(&self, key: &str) -> bool {
        self.float_keys.contains(key)
    }

    pub fn is_bool_key(&self, key: &str) -> bool {
        self.bool_keys.contains(key)
    }

    pub fn list_delimiter_for(&self, key: &str) -> &str {
        self.list_delimiters
            .get(key)
            .copied()
            .unwrap_or(self.default_list_delimiter)
    }

    pub fn dict_delimiter_for(&self, key: &str) -> &str {
        self.dict_delimiters
            .get(key)
            .copied()
            .unwrap_or(self.default_dict_delimiter)
    }

    /// Defaults table to use for a record of the given name. Only the
    /// cluster configuration distinguishes global from per-host records.
    pub fn required_defaults_for(&self, name: Option<&str>) -> &[(&'static str, Value)] {
        match (&self.host_required_defaults, name) {
            (Some(host_defaults), Some(name)) if name != "global" => host_defaults,
            _ => &self.required_defaults,
        }
    }

    pub fn is_required_key(&self, key: &str, name: Option<&str>) -> bool {
        self.required_defaults_for(name)
            .iter()
            .any(|(k, _)| *k == key)
            || self.user_provided_keys.contains(&key)
    }

    /// Decode one field's raw text into a typed value.
    ///
    /// Sentinel keywords are tested first (case-insensitively), then the
    /// field's coercion class decides how to split or parse the remainder;
    /// untyped values containing the default list delimiter decode as a
    /// list. Designated list keys always decode to a list, so a single
    /// value becomes a one-element list.
    pub fn decode_field(&self, key: &str, raw: &str) -> Value {
        if let Some(value) = self.keyword_table.decode(raw) {
            return value;
        }
        if self.is_list_key(key) {
            let delimiter = self.list_delimiter_for(key);
            if splits_on(raw, delimiter) {
                return Value::List(raw.split(delimiter).map(Value::from).collect());
            }
            return Value::List(vec![Value::from(raw)]);
        }
        if self.is_dict_key(key) {
            if let Ok(dict) = self.parse_value_as_dict(key, raw) {
                return dict;
            }
            return Value::Str(raw.to_string());
        }
        if self.is_int_key(key) {
            if let Ok(i) = raw.parse::<i64>() {
                return Value::Int(i);
            }
        } else if self.is_float_key(key) {
            if let Ok(f) = raw.parse::<f64>() {
                return Value::Float(f);
            }
        } else if splits_on(raw, self.default_list_delimiter) {
            return Value::List(
                raw.split(self.default_list_delimiter)
                    .map(Value::from)
                    .collect(),
            );
        }
        Value::Str(raw.to_string())
    }

    /// Parse a `k=v<delim>k=v` string into an ordered sub-dictionary.
    pub fn parse_value_as_dict(&self, key: &str, raw: &str) -> Result<Value> {
        let delimiter = self.dict_delimiter_for(key);
        let mut dict = IndexMap::new();
        for item in raw.split(delimiter) {
            let (item_key, item_value) = item.split_once('=').ok_or_else(|| {
                QconfError::InvalidArgument(format!(
                    "cannot parse dictionary value: unexpected format of item {} for key {}",
                    item, key
                ))
            })?;
            dict.insert(
                item_key.to_string(),
                self.decode_field(item_key, item_value),
            );
        }
        Ok(Value::Dict(dict))
    }

    /// Encode one field's typed value into the external text form.
    pub fn encode_field(&self, key: &str, value: &Value) -> String {
        if let Some(keyword) = self.keyword_table.encode(value) {
            return if self.lowercase_keyword_keys.contains(&key) {
                keyword.to_lowercase()
            } else {
                keyword.to_string()
            };
        }
        match value {
            Value::List(items) => {
                let delimiter = self.list_delimiter_for(key);
                items
                    .iter()
                    .map(|item| self.encode_field(key, item))
                    .collect::<Vec<_>>()
                    .join(delimiter)
            }
            Value::Dict(map) => {
                let delimiter = self.dict_delimiter_for(key);
                map.iter()
                    .map(|(item_key, item_value)| {
                        format!("{}={}", item_key, self.encode_field(item_key, item_value))
                    })
                    .collect::<Vec<_>>()
                    .join(delimiter)
            }
            other => other.to_plain_text(),
        }
    }

    /// Expand placeholder references in a default value.
    pub fn expand_default(&self, value: &Value, settings: &QconfSettings) -> Value {
        match value {
            Value::Str(s) if s.contains("SGE_ROOT") || s.contains("SGE_CELL") => {
                Value::Str(settings.expand_placeholders(s))
            }
            other => other.clone(),
        }
    }
}

// Splitting mirrors qconf's own behavior: a delimiter at position zero does
// not start a list.
fn splits_on(raw: &str, delimiter: &str) -> bool {
    !delimiter.is_empty() && raw.find(delimiter).map_or(false, |idx| idx > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> Schema {
        Schema::builder(ObjectKind::ClusterQueue, "1.0")
            .name_key("qname")
            .user_provided(&["qname"])
            .defaults(vec![
                ("slots", Value::Int(1)),
                ("priority", Value::Int(0)),
                ("s_rt", Value::Float(f64::INFINITY)),
                ("pe_list", Value::str("make")),
            ])
            .list_keys(&[("pe_list", ","), ("slots", ",")])
            .build()
    }

    #[test]
    fn test_key_classes_derived_from_defaults() {
        let schema = test_schema();
        assert!(schema.is_int_key("priority"));
        assert!(schema.is_float_key("s_rt"));
        assert!(!schema.is_int_key("pe_list"));
    }

    #[test]
    fn test_decode_list_field() {
        let schema = test_schema();
        assert_eq!(
            schema.decode_field("pe_list", "a,b,c"),
            Value::list_of(&["a", "b", "c"])
        );
        // A single value still lands in a one-element list.
        assert_eq!(
            schema.decode_field("pe_list", "make"),
            Value::list_of(&["make"])
        );
        assert_eq!(schema.decode_field("slots", "24"), Value::list_of(&["24"]));
    }

    #[test]
    fn test_decode_keyword_before_coercion_class() {
        let schema = test_schema();
        assert_eq!(schema.decode_field("pe_list", "NONE"), Value::Null);
        assert_eq!(
            schema.decode_field("s_rt", "infinity"),
            Value::Float(f64::INFINITY)
        );
    }

    #[test]
    fn test_untyped_value_with_default_delimiter_decodes_as_list() {
        let schema = test_schema();
        assert_eq!(
            schema.decode_field("jc_list", "NO_JC,ANY_JC"),
            Value::list_of(&["NO_JC", "ANY_JC"])
        );
        // Leading delimiter does not start a list.
        assert_eq!(schema.decode_field("jc_list", ",x"), Value::str(",x"));
    }

    #[test]
    fn test_encode_round_trip() {
        let schema = test_schema();
        let value = Value::list_of(&["a", "b"]);
        let text = schema.encode_field("pe_list", &value);
        assert_eq!(text, "a,b");
        assert_eq!(schema.decode_field("pe_list", &text), value);
        assert_eq!(schema.encode_field("hostlist", &Value::Null), "NONE");
    }
}
