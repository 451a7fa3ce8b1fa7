//! Client settings: cluster cell coordinates plus the local actor identity.
//!
//! A single `QconfSettings` value is built once at process start (usually
//! from the environment) and passed explicitly into the executor, factory
//! and managers. Nothing in the crate reaches into process-global state
//! after construction.

use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::{QconfError, Result};

/// Environment variable overriding the qconf command prefix. When set, the
/// executor runs `<override> <args>` instead of sourcing the cell settings
/// script, which lets tests point at a fake binary.
pub const QCONF_COMMAND_ENV: &str = "GRIDCONF_QCONF_COMMAND";

/// Local identity used for provenance stamping (`created_by` etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: String,
    pub host: String,
}

impl Actor {
    /// `user@host` string recorded in object metadata.
    pub fn tag(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Resolve the actor from the environment, falling back to
    /// `unknown`/`localhost` when the variables are absent.
    pub fn from_env() -> Actor {
        let user = env::var("USER")
            .or_else(|_| env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        let host = env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        Actor { user, host }
    }
}

/// Connection settings for one Grid Engine cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QconfSettings {
    pub sge_root: String,
    pub sge_cell: String,
    pub sge_qmaster_port: u16,
    pub sge_execd_port: u16,
    pub actor: Actor,
}

impl QconfSettings {
    pub fn new(
        sge_root: impl Into<String>,
        sge_cell: impl Into<String>,
        sge_qmaster_port: u16,
        sge_execd_port: u16,
    ) -> QconfSettings {
        QconfSettings {
            sge_root: sge_root.into(),
            sge_cell: sge_cell.into(),
            sge_qmaster_port,
            sge_execd_port,
            actor: Actor::from_env(),
        }
    }

    /// Load settings from `SGE_ROOT`, `SGE_CELL`, `SGE_QMASTER_PORT` and
    /// `SGE_EXECD_PORT`. `SGE_CELL` defaults to `default`; the others are
    /// required.
    pub fn from_env() -> Result<QconfSettings> {
        let sge_root = require_env("SGE_ROOT")?;
        let sge_cell = env::var("SGE_CELL").unwrap_or_else(|_| "default".to_string());
        let sge_qmaster_port = parse_port(&require_env("SGE_QMASTER_PORT")?, "SGE_QMASTER_PORT")?;
        let sge_execd_port = parse_port(&require_env("SGE_EXECD_PORT")?, "SGE_EXECD_PORT")?;
        Ok(QconfSettings {
            sge_root,
            sge_cell,
            sge_qmaster_port,
            sge_execd_port,
            actor: Actor::from_env(),
        })
    }

    /// Environment passed to every child process invocation.
    pub fn child_env(&self) -> Vec<(String, String)> {
        vec![
            ("SGE_ROOT".to_string(), self.sge_root.clone()),
            ("SGE_CELL".to_string(), self.sge_cell.clone()),
            (
                "SGE_QMASTER_PORT".to_string(),
                self.sge_qmaster_port.to_string(),
            ),
            (
                "SGE_EXECD_PORT".to_string(),
                self.sge_execd_port.to_string(),
            ),
            // Forces single-line attribute output so records parse line-wise.
            ("SGE_SINGLE_LINE".to_string(), "1".to_string()),
        ]
    }

    /// Expand `SGE_ROOT`/`SGE_CELL` placeholders embedded in default values
    /// such as `SGE_ROOT/SGE_CELL/spool`.
    pub fn expand_placeholders(&self, value: &str) -> String {
        value
            .replace("SGE_ROOT", &self.sge_root)
            .replace("SGE_CELL", &self.sge_cell)
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(QconfError::Configuration(format!(
            "{} is not defined",
            name
        ))),
    }
}

fn parse_port(value: &str, name: &str) -> Result<u16> {
    value.parse().map_err(|_| {
        QconfError::Configuration(format!("{} is not a valid port: {}", name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_tag() {
        let actor = Actor {
            user: "crick".to_string(),
            host: "master1".to_string(),
        };
        assert_eq!(actor.tag(), "crick@master1");
    }

    #[test]
    fn test_expand_placeholders() {
        let mut settings = QconfSettings::new("/opt/uge", "default", 6444, 6445);
        settings.actor = Actor {
            user: "u".into(),
            host: "h".into(),
        };
        assert_eq!(
            settings.expand_placeholders("SGE_ROOT/SGE_CELL/spool"),
            "/opt/uge/default/spool"
        );
    }

    #[test]
    fn test_child_env_forces_single_line() {
        let settings = QconfSettings::new("/opt/uge", "default", 6444, 6445);
        let env = settings.child_env();
        assert!(env.contains(&("SGE_SINGLE_LINE".to_string(), "1".to_string())));
    }
}
