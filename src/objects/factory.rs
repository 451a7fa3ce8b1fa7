//! Object factory: builds typed records for a given scheduler release,
//! merging caller input with serialized JSON and required defaults, and
//! translating records between schema versions.

use indexmap::IndexMap;
use log::debug;

use crate::config::QconfSettings;
use crate::errors::{QconfError, Result};
use crate::objects::catalog;
use crate::objects::object::{split_json_document, ObjectData, QconfObject};
use crate::objects::release_map;
use crate::objects::schema::{ObjectKind, Schema};
use crate::objects::value::Value;

/// Caller input for one generated object. Precedence from lowest to
/// highest: JSON document, then explicit metadata/data, then the name.
#[derive(Debug, Default)]
pub struct ObjectSpec<'a> {
    pub name: Option<&'a str>,
    pub data: Option<serde_json::Value>,
    pub metadata: Option<IndexMap<String, String>>,
    pub json: Option<&'a str>,
    pub skip_required_defaults: bool,
}

impl<'a> ObjectSpec<'a> {
    pub fn named(name: &'a str) -> ObjectSpec<'a> {
        ObjectSpec {
            name: Some(name),
            ..ObjectSpec::default()
        }
    }

    pub fn from_json(json: &'a str) -> ObjectSpec<'a> {
        ObjectSpec {
            json: Some(json),
            ..ObjectSpec::default()
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> ObjectSpec<'a> {
        self.data = Some(data);
        self
    }

    pub fn without_required_defaults(mut self) -> ObjectSpec<'a> {
        self.skip_required_defaults = true;
        self
    }
}

/// Factory bound to one scheduler release and one set of client settings.
#[derive(Debug, Clone)]
pub struct ObjectFactory {
    release: String,
    settings: QconfSettings,
}

impl ObjectFactory {
    pub fn new(release: impl Into<String>, settings: QconfSettings) -> Result<ObjectFactory> {
        let release = release.into();
        if !release_map::is_supported(&release) {
            return Err(QconfError::Qconf(format!(
                "unsupported scheduler version: {}",
                release
            )));
        }
        Ok(ObjectFactory { release, settings })
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn settings(&self) -> &QconfSettings {
        &self.settings
    }

    /// Schema this factory's release uses for `kind`.
    pub fn schema_for(&self, kind: ObjectKind) -> Result<&'static Schema> {
        let version = release_map::object_version(&self.release, kind)?;
        catalog::schema(kind, version)
    }

    /// Build a record of `kind` from the given spec.
    pub fn generate(&self, kind: ObjectKind, spec: ObjectSpec<'_>) -> Result<QconfObject> {
        let schema = self.schema_for(kind)?;
        self.generate_with_schema(schema, spec)
    }

    fn generate_with_schema(
        &self,
        schema: &'static Schema,
        spec: ObjectSpec<'_>,
    ) -> Result<QconfObject> {
        let mut object = QconfObject::new(schema);

        if let Some(json) = spec.json {
            let document: serde_json::Value = serde_json::from_str(json).map_err(|err| {
                QconfError::InvalidArgument(format!("cannot parse object json: {}", err))
            })?;
            let (class, _version, metadata, data) = split_json_document(&document)?;
            if !class.is_empty() && class != schema.kind.class_name() {
                return Err(QconfError::InvalidArgument(format!(
                    "json document describes {} object, expected {}",
                    class,
                    schema.kind.class_name()
                )));
            }
            object.metadata = metadata;
            if !data.is_null() {
                object.set_data_from_json(&data)?;
            }
        }

        if let Some(metadata) = spec.metadata {
            object.metadata.extend(metadata);
        }

        if let Some(data) = spec.data {
            self.merge_data(&mut object, &data)?;
        }

        if let Some(name) = spec.name {
            object.set_name(name)?;
        }
        if schema.kind == ObjectKind::ClusterConfiguration && object.name().is_none() {
            let derived = object
                .name_from_comment_key()
                .unwrap_or_else(|| "global".to_string());
            object.set_name(&derived)?;
        }

        if !spec.skip_required_defaults {
            object.apply_required_defaults(&self.settings)?;
        }
        debug!(
            "generated {} object version {} (name: {:?})",
            schema.kind,
            schema.version,
            object.name()
        );
        Ok(object)
    }

    // Explicit data merges over JSON data key by key; list payloads are
    // replaced wholesale.
    fn merge_data(&self, object: &mut QconfObject, data: &serde_json::Value) -> Result<()> {
        let value = Value::from_json(data)?;
        match (&mut object.data, value) {
            (ObjectData::Dict(existing), Value::Dict(incoming)) => {
                for (key, item) in incoming {
                    existing.insert(key, item);
                }
                Ok(())
            }
            (ObjectData::List(_), Value::List(incoming)) => {
                object.data = ObjectData::List(incoming);
                Ok(())
            }
            (ObjectData::Dict(_), other) => Err(QconfError::InvalidArgument(format!(
                "{} data must be a dictionary, got: {}",
                object.schema.kind,
                other.to_plain_text()
            ))),
            (ObjectData::List(_), other) => Err(QconfError::InvalidArgument(format!(
                "{} data must be a list, got: {}",
                object.schema.kind,
                other.to_plain_text()
            ))),
        }
    }

    /// Rebuild an object from its serialized JSON form, resolving the
    /// schema from the embedded class and version, then optionally
    /// translate it to the schema used by `target_release`.
    pub fn generate_from_json(
        &self,
        json: &str,
        target_release: Option<&str>,
    ) -> Result<QconfObject> {
        let document: serde_json::Value = serde_json::from_str(json).map_err(|err| {
            QconfError::InvalidArgument(format!("cannot parse object json: {}", err))
        })?;
        let (class, version, _metadata, _data) = split_json_document(&document)?;
        let kind = ObjectKind::from_class_name(&class).ok_or_else(|| {
            QconfError::InvalidArgument(format!("unknown object class: {}", class))
        })?;
        if version.is_empty() {
            return Err(QconfError::InvalidRequest(format!(
                "object version not supplied for class {}",
                class
            )));
        }
        let schema = catalog::schema(kind, &version)?;
        let object = self.generate_with_schema(schema, ObjectSpec::from_json(json))?;

        match target_release {
            None => Ok(object),
            Some(release) => self.translate(object, release),
        }
    }

    /// Translate an object to the schema version `target_release` uses,
    /// carrying data and metadata through the JSON form and filling
    /// fields the target version adds.
    pub fn translate(&self, object: QconfObject, target_release: &str) -> Result<QconfObject> {
        let kind = object.kind();
        let target_version = release_map::object_version(target_release, kind)?;
        if target_version == object.schema.version {
            return Ok(object);
        }
        debug!(
            "translating {} object from version {} to {} (release {})",
            kind, object.schema.version, target_version, target_release
        );
        let target_schema = catalog::schema(kind, target_version)?;
        let json = object.to_json_string();
        let mut translated = QconfObject::new(target_schema);
        let document: serde_json::Value =
            serde_json::from_str(&json).map_err(|err| {
                QconfError::InvalidArgument(format!("cannot parse object json: {}", err))
            })?;
        let (_class, _version, metadata, data) = split_json_document(&document)?;
        translated.metadata = metadata;
        translated.explicit_name = object.explicit_name.clone();
        if !data.is_null() {
            translated.set_data_from_json(&data)?;
        }
        translated.apply_required_defaults(&self.settings)?;
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Actor;

    fn factory(release: &str) -> ObjectFactory {
        let mut settings = QconfSettings::new("/opt/uge", "default", 6444, 6445);
        settings.actor = Actor {
            user: "admin".to_string(),
            host: "master".to_string(),
        };
        ObjectFactory::new(release, settings).unwrap()
    }

    #[test]
    fn test_generate_fills_defaults() {
        let object = factory("8.6.0")
            .generate(ObjectKind::ClusterQueue, ObjectSpec::named("batch"))
            .unwrap();
        assert_eq!(object.name(), Some("batch"));
        let map = object.data_dict().unwrap();
        assert_eq!(map.get("slots"), Some(&Value::Int(1)));
        assert_eq!(map.get("h_rt"), Some(&Value::Float(f64::INFINITY)));
    }

    #[test]
    fn test_explicit_data_overrides_json() {
        let json = r#"{"object_class": "ClusterQueue", "object_version": "1.0",
                       "data": {"qname": "old", "slots": 4}}"#;
        let spec = ObjectSpec::from_json(json)
            .with_data(serde_json::json!({"slots": 16}));
        let object = factory("8.3.1p9")
            .generate(ObjectKind::ClusterQueue, spec)
            .unwrap();
        assert_eq!(object.name(), Some("old"));
        assert_eq!(
            object.data_dict().unwrap().get("slots"),
            Some(&Value::Int(16))
        );
    }

    #[test]
    fn test_class_mismatch_is_rejected() {
        let json = r#"{"object_class": "Project", "object_version": "1.0", "data": {}}"#;
        let err = factory("8.6.0")
            .generate(ObjectKind::ClusterQueue, ObjectSpec::from_json(json))
            .unwrap_err();
        assert!(matches!(err, QconfError::InvalidArgument(_)));
    }

    #[test]
    fn test_translate_across_releases() {
        let f = factory("8.3.1p9");
        let object = f
            .generate(ObjectKind::SchedulerConfiguration, ObjectSpec::default())
            .unwrap();
        assert_eq!(object.schema.version, "1.0");
        assert!(!object.data_dict().unwrap().contains_key("weight_host_affinity"));

        let translated = f.translate(object, "8.6.0").unwrap();
        assert_eq!(translated.schema.version, "2.0");
        assert_eq!(
            translated.data_dict().unwrap().get("weight_host_affinity"),
            Some(&Value::Float(100.0))
        );
    }

    #[test]
    fn test_cluster_configuration_name_defaults_to_global() {
        let object = factory("8.6.0")
            .generate(ObjectKind::ClusterConfiguration, ObjectSpec::default())
            .unwrap();
        assert_eq!(object.name(), Some("global"));
        assert!(object.data_dict().unwrap().contains_key("execd_spool_dir"));
    }
}
