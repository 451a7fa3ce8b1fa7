//! The generic configuration record: typed data plus provenance metadata,
//! convertible between the external line text and JSON.

use chrono::Local;
use indexmap::IndexMap;

use crate::config::{Actor, QconfSettings};
use crate::errors::{QconfError, Result};
use crate::objects::schema::{Layout, ObjectKind, Schema};
use crate::objects::value::{decode_bool_keyword, encode_bool_keyword, KeywordTable, Value};

/// Record payload. Most kinds hold a single keyed dictionary; the share
/// tree holds an ordered list of node dictionaries.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Dict(IndexMap<String, Value>),
    List(Vec<Value>),
}

/// One configuration entity: schema reference, field data and metadata.
///
/// `explicit_name` covers kinds whose name lives outside the data, the
/// per-host cluster configuration above all.
#[derive(Debug, Clone)]
pub struct QconfObject {
    pub schema: &'static Schema,
    pub data: ObjectData,
    pub metadata: IndexMap<String, String>,
    pub explicit_name: Option<String>,
}

impl QconfObject {
    pub fn new(schema: &'static Schema) -> QconfObject {
        let data = match schema.layout {
            Layout::DictList { .. } => ObjectData::List(Vec::new()),
            _ => ObjectData::Dict(IndexMap::new()),
        };
        QconfObject {
            schema,
            data,
            metadata: IndexMap::new(),
            explicit_name: None,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.schema.kind
    }

    /// Entity name: read from the schema's name key when there is one,
    /// from the explicit name otherwise. `None` for unnamed singletons and
    /// records the caller has not yet named.
    pub fn name(&self) -> Option<&str> {
        match self.schema.name_key {
            Some(key) => match &self.data {
                ObjectData::Dict(map) => map.get(key).and_then(Value::as_str),
                ObjectData::List(_) => None,
            },
            None => self.explicit_name.as_deref(),
        }
    }

    /// Set the entity name, overwriting any name already present.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        match self.schema.name_key {
            Some(key) => {
                self.data_dict_mut()?
                    .insert(key.to_string(), Value::str(name));
            }
            None => self.explicit_name = Some(name.to_string()),
        }
        Ok(())
    }

    /// Recover a record name embedded as a `#name:` comment key, the form
    /// the backend uses for per-host configuration dumps.
    pub fn name_from_comment_key(&self) -> Option<String> {
        if let ObjectData::Dict(map) = &self.data {
            for key in map.keys() {
                if let Some(stripped) = key.strip_prefix('#') {
                    return Some(stripped.trim_end_matches(':').to_string());
                }
            }
        }
        None
    }

    pub fn data_dict(&self) -> Result<&IndexMap<String, Value>> {
        match &self.data {
            ObjectData::Dict(map) => Ok(map),
            ObjectData::List(_) => Err(QconfError::InvalidArgument(format!(
                "{} data is a list, not a dictionary",
                self.schema.kind
            ))),
        }
    }

    pub fn data_dict_mut(&mut self) -> Result<&mut IndexMap<String, Value>> {
        match &mut self.data {
            ObjectData::Dict(map) => Ok(map),
            ObjectData::List(_) => Err(QconfError::InvalidArgument(format!(
                "{} data is a list, not a dictionary",
                self.schema.kind
            ))),
        }
    }

    pub fn data_list(&self) -> Result<&Vec<Value>> {
        match &self.data {
            ObjectData::List(list) => Ok(list),
            ObjectData::Dict(_) => Err(QconfError::InvalidArgument(format!(
                "{} data is a dictionary, not a list",
                self.schema.kind
            ))),
        }
    }

    pub fn data_list_mut(&mut self) -> Result<&mut Vec<Value>> {
        match &mut self.data {
            ObjectData::List(list) => Ok(list),
            ObjectData::Dict(_) => Err(QconfError::InvalidArgument(format!(
                "{} data is a dictionary, not a list",
                self.schema.kind
            ))),
        }
    }

    /// Replace the payload from an untyped JSON value, checking its shape
    /// against the schema's layout.
    pub fn set_data_from_json(&mut self, json: &serde_json::Value) -> Result<()> {
        let value = Value::from_json(json)?;
        match (&self.schema.layout, value) {
            (Layout::DictList { .. }, Value::List(list)) => {
                self.data = ObjectData::List(list);
                Ok(())
            }
            (Layout::DictList { .. }, other) => Err(QconfError::InvalidArgument(format!(
                "{} data must be a list, got: {}",
                self.schema.kind,
                other.to_plain_text()
            ))),
            (_, Value::Dict(map)) => {
                self.data = ObjectData::Dict(map);
                Ok(())
            }
            (_, other) => Err(QconfError::InvalidArgument(format!(
                "{} data must be a dictionary, got: {}",
                self.schema.kind,
                other.to_plain_text()
            ))),
        }
    }

    // ===== Required defaults, key checks =====

    /// Insert defaults for required fields the caller did not provide.
    /// Placeholders in string defaults are expanded against the settings.
    pub fn apply_required_defaults(&mut self, settings: &QconfSettings) -> Result<()> {
        match self.schema.layout {
            Layout::DictList { .. } => {
                let defaults: Vec<(&'static str, Value)> = self
                    .schema
                    .required_defaults_for(None)
                    .iter()
                    .map(|(k, v)| (*k, self.schema.expand_default(v, settings)))
                    .collect();
                for node in self.data_list_mut()? {
                    if let Value::Dict(map) = node {
                        for (key, default) in &defaults {
                            if !map.contains_key(*key) {
                                map.insert(key.to_string(), default.clone());
                            }
                        }
                    }
                }
            }
            _ => {
                let name = self.name().map(str::to_string);
                let defaults: Vec<(&'static str, Value)> = self
                    .schema
                    .required_defaults_for(name.as_deref())
                    .iter()
                    .map(|(k, v)| (*k, self.schema.expand_default(v, settings)))
                    .collect();
                let map = self.data_dict_mut()?;
                for (key, default) in defaults {
                    if !map.contains_key(key) {
                        map.insert(key.to_string(), default);
                    }
                }
            }
        }
        Ok(())
    }

    /// Verify every caller-supplied key is present and non-empty.
    pub fn check_user_provided_keys(&self) -> Result<()> {
        match &self.data {
            ObjectData::Dict(map) => {
                for key in self.schema.user_provided_keys {
                    let missing = map.get(*key).map_or(true, Value::is_empty);
                    if missing {
                        return Err(QconfError::InvalidRequest(format!(
                            "input data is missing required object key: {}",
                            key
                        )));
                    }
                }
            }
            ObjectData::List(nodes) => {
                for node in nodes {
                    if let Value::Dict(map) = node {
                        for key in self.schema.user_provided_keys {
                            let missing = map.get(*key).map_or(true, Value::is_empty);
                            if missing {
                                return Err(QconfError::InvalidRequest(format!(
                                    "node is missing required object key: {}",
                                    key
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Drop keys outside the schema unless the schema allows extras.
    /// `#`-prefixed keys survive so embedded comments round-trip.
    pub fn strip_optional_keys(&mut self) -> Result<()> {
        if self.schema.optional_keys_allowed {
            return Ok(());
        }
        if let Layout::ComplexTable { .. } = self.schema.layout {
            return Ok(());
        }
        if let ObjectData::Dict(_) = self.data {
            let name = self.name().map(str::to_string);
            let schema = self.schema;
            self.data_dict_mut()?.retain(|key, _| {
                key.starts_with('#') || schema.is_required_key(key, name.as_deref())
            });
        }
        Ok(())
    }

    // ===== Provenance metadata =====

    pub fn stamp_created(&mut self, actor: &Actor) {
        self.stamp("created", actor);
    }

    pub fn stamp_modified(&mut self, actor: &Actor) {
        self.stamp("modified", actor);
    }

    pub fn stamp_retrieved(&mut self, actor: &Actor) {
        self.stamp("retrieved", actor);
    }

    fn stamp(&mut self, event: &str, actor: &Actor) {
        self.metadata
            .insert(format!("{}_by", event), actor.tag());
        self.metadata
            .insert(format!("{}_on", event), Local::now().to_rfc3339());
    }

    // ===== External text form =====

    /// Render the record in the external tool's text form.
    pub fn to_text(&self) -> Result<String> {
        match &self.schema.layout {
            Layout::KeyValueLines => self.key_value_lines_to_text(),
            Layout::DictList { node_keys, .. } => self.dict_list_to_text(node_keys),
            Layout::ResourceQuota => self.resource_quota_to_text(),
            Layout::ComplexTable {
                with_affinity,
                with_reporting,
            } => self.complex_table_to_text(*with_affinity, *with_reporting),
        }
    }

    /// Parse the external tool's text form, replacing the payload.
    pub fn parse_text(&mut self, text: &str) -> Result<()> {
        match &self.schema.layout {
            Layout::KeyValueLines => self.parse_key_value_lines(text),
            Layout::DictList { first_key, .. } => self.parse_dict_list(text, first_key),
            Layout::ResourceQuota => self.parse_resource_quota(text),
            Layout::ComplexTable {
                with_affinity,
                with_reporting,
            } => {
                let (with_affinity, with_reporting) = (*with_affinity, *with_reporting);
                self.parse_complex_table(text, with_affinity, with_reporting)
            }
        }
    }

    fn key_value_lines_to_text(&self) -> Result<String> {
        let mut out = String::new();
        for (key, value) in self.data_dict()? {
            out.push_str(key);
            out.push(' ');
            out.push_str(&self.schema.encode_field(key, value));
            out.push('\n');
        }
        Ok(out)
    }

    fn parse_key_value_lines(&mut self, text: &str) -> Result<()> {
        let mut map = IndexMap::new();
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let (key, raw) = match line.split_once(char::is_whitespace) {
                Some((key, raw)) => (key, raw.trim()),
                None => (line, ""),
            };
            map.insert(key.to_string(), self.schema.decode_field(key, raw));
        }
        self.data = ObjectData::Dict(map);
        Ok(())
    }

    fn dict_list_to_text(&self, node_keys: &[&'static str]) -> Result<String> {
        let mut out = String::new();
        for node in self.data_list()? {
            let map = match node {
                Value::Dict(map) => map,
                other => {
                    return Err(QconfError::InvalidArgument(format!(
                        "node must be a dictionary, got: {}",
                        other.to_plain_text()
                    )))
                }
            };
            for key in node_keys {
                if let Some(value) = map.get(*key) {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&self.schema.encode_field(key, value));
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    fn parse_dict_list(&mut self, text: &str, first_key: &str) -> Result<()> {
        let mut nodes: Vec<Value> = Vec::new();
        let mut current: Option<IndexMap<String, Value>> = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, raw) = line.split_once('=').ok_or_else(|| {
                QconfError::InvalidArgument(format!(
                    "cannot parse node line, expected key=value: {}",
                    line
                ))
            })?;
            if key == first_key {
                if let Some(done) = current.take() {
                    nodes.push(Value::Dict(done));
                }
                current = Some(IndexMap::new());
            }
            if let Some(map) = &mut current {
                map.insert(key.to_string(), self.schema.decode_field(key, raw));
            } else {
                return Err(QconfError::InvalidArgument(format!(
                    "node line before first {} line: {}",
                    first_key, line
                )));
            }
        }
        if let Some(done) = current.take() {
            nodes.push(Value::Dict(done));
        }
        self.data = ObjectData::List(nodes);
        Ok(())
    }

    fn resource_quota_to_text(&self) -> Result<String> {
        let mut out = String::from("{\n");
        let map = self.data_dict()?;
        for (key, value) in map {
            if key == "limit" {
                continue;
            }
            out.push_str(&format!(
                "   {} {}\n",
                key,
                self.schema.encode_field(key, value)
            ));
        }
        if let Some(Value::List(limits)) = map.get("limit") {
            for limit in limits {
                out.push_str(&format!("   limit {}\n", limit.to_plain_text()));
            }
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn parse_resource_quota(&mut self, text: &str) -> Result<()> {
        let mut map = IndexMap::new();
        let mut limits: Vec<Value> = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line == "{" || line == "}" {
                continue;
            }
            let (key, raw) = match line.split_once(char::is_whitespace) {
                Some((key, raw)) => (key, raw.trim()),
                None => (line, ""),
            };
            if key == "limit" {
                // Limit rules keep their raw text; their internal grammar
                // belongs to the backend.
                limits.push(Value::str(raw));
            } else {
                map.insert(key.to_string(), self.schema.decode_field(key, raw));
            }
        }
        if !limits.is_empty() {
            map.insert("limit".to_string(), Value::List(limits));
        }
        self.data = ObjectData::Dict(map);
        Ok(())
    }

    // ===== Complex attribute table =====

    fn complex_columns(with_affinity: bool, with_reporting: bool) -> &'static [&'static str] {
        const BASE: &[&str] = &[
            "name",
            "shortcut",
            "type",
            "relop",
            "requestable",
            "consumable",
            "default",
            "urgency",
            "aapre",
        ];
        const WITH_AFFINITY: &[&str] = &[
            "name",
            "shortcut",
            "type",
            "relop",
            "requestable",
            "consumable",
            "default",
            "urgency",
            "aapre",
            "affinity",
        ];
        const WITH_REPORTING: &[&str] = &[
            "name",
            "shortcut",
            "type",
            "relop",
            "requestable",
            "consumable",
            "default",
            "urgency",
            "aapre",
            "affinity",
            "do_report",
            "is_static",
        ];
        if with_reporting {
            WITH_REPORTING
        } else if with_affinity {
            WITH_AFFINITY
        } else {
            BASE
        }
    }

    fn decode_complex_cell(column: &str, raw: &str) -> Value {
        match column {
            "requestable" | "consumable" | "aapre" | "do_report" | "is_static" => {
                KeywordTable::Complex
                    .decode(raw)
                    .unwrap_or_else(|| Value::str(raw))
            }
            "default" => {
                if let Some(b) = decode_bool_keyword(raw) {
                    Value::Bool(b)
                } else if let Some(value) = KeywordTable::Complex.decode(raw) {
                    value
                } else if let Ok(i) = raw.parse::<i64>() {
                    Value::Int(i)
                } else if let Ok(f) = raw.parse::<f64>() {
                    Value::Float(f)
                } else {
                    Value::str(raw)
                }
            }
            "urgency" | "affinity" => {
                if let Ok(i) = raw.parse::<i64>() {
                    Value::Int(i)
                } else if let Ok(f) = raw.parse::<f64>() {
                    Value::Float(f)
                } else {
                    Value::str(raw)
                }
            }
            _ => Value::str(raw),
        }
    }

    fn encode_complex_cell(column: &str, value: &Value) -> String {
        match (column, value) {
            ("default", Value::Bool(b)) => encode_bool_keyword(*b).to_string(),
            (_, value) => KeywordTable::Complex
                .encode(value)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_plain_text()),
        }
    }

    fn parse_complex_table(
        &mut self,
        text: &str,
        with_affinity: bool,
        with_reporting: bool,
    ) -> Result<()> {
        let columns = Self::complex_columns(with_affinity, with_reporting);
        let mut map = IndexMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cells: Vec<&str> = line.split_whitespace().collect();
            if cells.len() != columns.len() {
                return Err(QconfError::InvalidArgument(format!(
                    "cannot parse attribute line, expected {} columns, got {}: {}",
                    columns.len(),
                    cells.len(),
                    line
                )));
            }
            let mut attribute = IndexMap::new();
            for (column, cell) in columns.iter().zip(&cells) {
                attribute.insert(
                    column.to_string(),
                    Self::decode_complex_cell(column, cell),
                );
            }
            map.insert(cells[0].to_string(), Value::Dict(attribute));
        }
        self.data = ObjectData::Dict(map);
        Ok(())
    }

    fn complex_table_to_text(&self, with_affinity: bool, with_reporting: bool) -> Result<String> {
        let columns = Self::complex_columns(with_affinity, with_reporting);
        let mut rows: Vec<Vec<String>> = Vec::new();
        for (name, attribute) in self.data_dict()? {
            let map = match attribute {
                Value::Dict(map) => map,
                other => {
                    return Err(QconfError::InvalidArgument(format!(
                        "attribute {} must be a dictionary, got: {}",
                        name,
                        other.to_plain_text()
                    )))
                }
            };
            let mut row = Vec::with_capacity(columns.len());
            for column in columns {
                let cell = match map.get(*column) {
                    Some(value) => Self::encode_complex_cell(column, value),
                    None => {
                        return Err(QconfError::InvalidArgument(format!(
                            "attribute {} is missing column: {}",
                            name, column
                        )))
                    }
                };
                row.push(cell);
            }
            rows.push(row);
        }
        let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }
        let mut out = String::from("#");
        for (i, column) in columns.iter().enumerate() {
            out.push_str(&format!("{:width$}", column, width = widths[i] + 3));
        }
        let header_len = out.trim_end().len();
        out = out.trim_end().to_string();
        out.push('\n');
        out.push('#');
        out.push_str(&"-".repeat(header_len.saturating_sub(1)));
        out.push('\n');
        for row in &rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                line.push_str(&format!("{:width$}", cell, width = widths[i] + 4));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        Ok(out)
    }

    // ===== JSON wire form =====

    /// Full JSON representation: class and version, metadata, then data.
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            "object_class".to_string(),
            serde_json::Value::from(self.schema.kind.class_name()),
        );
        map.insert(
            "object_version".to_string(),
            serde_json::Value::from(self.schema.version),
        );
        for (key, value) in &self.metadata {
            map.insert(key.clone(), serde_json::Value::from(value.as_str()));
        }
        let data = match &self.data {
            ObjectData::Dict(dict) => Value::Dict(dict.clone()).to_json(),
            ObjectData::List(list) => Value::List(list.clone()).to_json(),
        };
        map.insert("data".to_string(), data);
        serde_json::Value::Object(map)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }
}

/// Split a serialized object JSON document into (class, version, metadata,
/// data). The factory uses class and version to resolve the schema.
pub fn split_json_document(
    json: &serde_json::Value,
) -> Result<(String, String, IndexMap<String, String>, serde_json::Value)> {
    let map = json.as_object().ok_or_else(|| {
        QconfError::InvalidArgument("object json must be a dictionary".to_string())
    })?;
    let class = map
        .get("object_class")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let version = map
        .get("object_version")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    let mut metadata = IndexMap::new();
    for (key, value) in map {
        if key == "object_class" || key == "object_version" || key == "data" {
            continue;
        }
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        metadata.insert(key.clone(), text);
    }
    let data = map.get("data").cloned().unwrap_or(serde_json::Value::Null);
    Ok((class, version, metadata, data))
}
