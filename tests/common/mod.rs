//! Shared helpers for tests that drive a fake qconf binary staged in a
//! temp directory and selected through the command override env var.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tempfile::TempDir;

use gridconf::config::QCONF_COMMAND_ENV;
use gridconf::{Actor, QconfSettings};

/// Serializes tests that mutate the process environment.
pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

pub fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn settings() -> QconfSettings {
    let mut settings = QconfSettings::new("/opt/uge", "default", 6444, 6445);
    settings.actor = Actor {
        user: "ops".to_string(),
        host: "master1".to_string(),
    };
    settings
}

/// Write an executable fake qconf script into `dir` and point the
/// executor override at it.
pub fn stage_fake_qconf(dir: &TempDir, body: &str) {
    let path = dir.path().join("qconf");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    std::env::set_var(QCONF_COMMAND_ENV, &path);
}
