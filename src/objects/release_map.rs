//! Scheduler release to schema-version map.
//!
//! Each release entry is a full kind-to-version table, built by copying
//! the previous release and overriding the kinds that changed. Every
//! version named here must exist in the catalog; the map is the single
//! place release knowledge lives.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::errors::{QconfError, Result};
use crate::objects::schema::ObjectKind;

type VersionTable = IndexMap<ObjectKind, &'static str>;

static RELEASE_MAP: Lazy<IndexMap<&'static str, VersionTable>> = Lazy::new(build_release_map);

/// Schema version used by `kind` in the given scheduler release.
pub fn object_version(release: &str, kind: ObjectKind) -> Result<&'static str> {
    let table = RELEASE_MAP.get(release).ok_or_else(|| {
        QconfError::Qconf(format!("unsupported scheduler version: {}", release))
    })?;
    table.get(&kind).copied().ok_or_else(|| {
        QconfError::InvalidRequest(format!(
            "object version not available for class {} in release {}",
            kind.class_name(),
            release
        ))
    })
}

pub fn is_supported(release: &str) -> bool {
    RELEASE_MAP.contains_key(release)
}

/// Supported releases, oldest first.
pub fn supported_releases() -> Vec<&'static str> {
    RELEASE_MAP.keys().copied().collect()
}

fn baseline() -> VersionTable {
    ObjectKind::ALL.iter().map(|kind| (*kind, "1.0")).collect()
}

fn derive(base: &VersionTable, overrides: &[(ObjectKind, &'static str)]) -> VersionTable {
    let mut table = base.clone();
    for (kind, version) in overrides {
        table.insert(*kind, version);
    }
    table
}

fn build_release_map() -> IndexMap<&'static str, VersionTable> {
    let mut map: IndexMap<&'static str, VersionTable> = IndexMap::new();

    let v8_3 = baseline();
    map.insert("8.3.1p9", v8_3.clone());
    map.insert("8.3.1p12", v8_3.clone());

    let v8_4 = derive(&v8_3, &[(ObjectKind::ComplexConfiguration, "2.0")]);
    for release in ["8.4.0", "8.4.3", "8.4.4", "8.4.5"] {
        map.insert(release, v8_4.clone());
    }

    let v8_5 = derive(
        &v8_4,
        &[
            (ObjectKind::ClusterConfiguration, "2.0"),
            (ObjectKind::JobClass, "2.0"),
        ],
    );
    for release in ["8.5.0", "8.5.1", "8.5.2", "8.5.3", "8.5.4", "8.5.5", "8.5.6"] {
        map.insert(release, v8_5.clone());
    }

    // Site patch stream with the 2.0 parallel environment backported.
    let v8_5_c104 = derive(&v8_5, &[(ObjectKind::ParallelEnvironment, "2.0")]);
    for release in [
        "8.5.3_C104_1",
        "8.5.4_C104_1",
        "8.5.4_C104_2",
        "8.5.4_C104_3",
        "8.5.4_C104_4",
        "8.5.4_C104_5",
        "8.5.4_C104_6",
    ] {
        map.insert(release, v8_5_c104.clone());
    }

    let v8_6 = derive(
        &v8_5,
        &[
            (ObjectKind::ClusterQueue, "2.0"),
            (ObjectKind::ComplexConfiguration, "3.0"),
            (ObjectKind::SchedulerConfiguration, "2.0"),
            (ObjectKind::ParallelEnvironment, "2.0"),
            (ObjectKind::JobClass, "3.0"),
        ],
    );
    for release in [
        "8.6.0",
        "8.6.1",
        "8.6.2",
        "8.6.3",
        "8.6.4",
        "8.6.5",
        "8.6.6",
        "8.6.7prealpha",
        "8.6.7alpha1",
        "8.6.7",
        "8.6.8prealpha",
        "8.6.8",
        "8.6.9prealpha",
        "8.6.9",
        "8.6.10prealpha",
        "8.6.10",
        "8.6.11",
        "8.6.12",
        "8.6.13",
        "8.6.14",
        "8.6.15",
        "8.6.16",
        "8.6.17",
        "8.6.18",
    ] {
        map.insert(release, v8_6.clone());
    }

    let v8_7 = derive(
        &v8_6,
        &[
            (ObjectKind::SchedulerConfiguration, "3.0"),
            (ObjectKind::ComplexConfiguration, "4.0"),
            (ObjectKind::JobClass, "4.0"),
        ],
    );
    for release in [
        "8.7.0alpha",
        "8.7.0alpha2",
        "8.7.0beta",
        "8.7.0beta2",
        "8.7.0beta3",
        "8.7.0beta4",
        "8.7.0beta5",
        "8.7.0beta6",
        "8.7.0beta7",
        "8.7.0beta8",
        "8.7.0beta9",
        "8.7.0",
        "8.7.1prealpha",
        "8.7.1",
        "8.7.2prealpha",
        "8.7.2prealpha2",
        "8.7.2prealpha3",
        "8.7.2beta",
        "8.7.2",
        "8.7.3prealpha",
        "8.8.0prealpha",
        "8.8.0prealpha2",
        "8.8.0",
    ] {
        map.insert(release, v8_7.clone());
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::catalog;

    #[test]
    fn test_unsupported_release() {
        let err = object_version("7.0.0", ObjectKind::ClusterQueue).unwrap_err();
        assert!(matches!(err, QconfError::Qconf(_)));
    }

    #[test]
    fn test_version_changes_across_releases() {
        assert_eq!(
            object_version("8.3.1p9", ObjectKind::ComplexConfiguration).unwrap(),
            "1.0"
        );
        assert_eq!(
            object_version("8.4.0", ObjectKind::ComplexConfiguration).unwrap(),
            "2.0"
        );
        assert_eq!(
            object_version("8.6.2", ObjectKind::ClusterQueue).unwrap(),
            "2.0"
        );
        assert_eq!(
            object_version("8.5.3_C104_1", ObjectKind::ParallelEnvironment).unwrap(),
            "2.0"
        );
        assert_eq!(object_version("8.6.0", ObjectKind::User).unwrap(), "1.0");
        assert_eq!(
            object_version("8.7.0", ObjectKind::SchedulerConfiguration).unwrap(),
            "3.0"
        );
        assert_eq!(
            object_version("8.7.0alpha", ObjectKind::ComplexConfiguration).unwrap(),
            "4.0"
        );
        assert_eq!(object_version("8.8.0", ObjectKind::JobClass).unwrap(), "4.0");
        assert_eq!(
            object_version("8.8.0", ObjectKind::ClusterQueue).unwrap(),
            "2.0"
        );
    }

    #[test]
    fn test_every_mapped_version_is_in_catalog() {
        for release in supported_releases() {
            for kind in ObjectKind::ALL {
                let version = object_version(release, kind).unwrap();
                catalog::schema(kind, version).unwrap();
            }
        }
    }
}
