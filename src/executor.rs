//! Runs the qconf binary and classifies its outcomes.
//!
//! Classification is ordered: caller-supplied rules are consulted before
//! the generic fallback list, and the first matching rule wins. Success
//! overrides come first because some qconf verbs report a successful
//! outcome through a non-zero exit.

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, trace};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use crate::config::{QconfSettings, QCONF_COMMAND_ENV};
use crate::errors::{ErrorKind, QconfError, Result};
use crate::objects::QconfObject;

/// Classification rule: error text matching `pattern` maps to `kind`.
/// Patterns are matched from the start of the text.
#[derive(Debug, Clone)]
pub struct ErrorRule {
    pattern: Regex,
    kind: ErrorKind,
}

impl ErrorRule {
    /// Patterns are hardcoded per manager; a malformed one is a
    /// programming error, not a runtime condition.
    pub fn new(pattern: &str, kind: ErrorKind) -> ErrorRule {
        ErrorRule {
            pattern: anchored(pattern),
            kind,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Success override: a non-zero exit whose error text matches `pattern`
/// is treated as success, with `stdout` substituted as the result.
#[derive(Debug, Clone)]
pub struct SuccessRule {
    pattern: Regex,
    stdout: String,
}

impl SuccessRule {
    pub fn new(pattern: &str, stdout: &str) -> SuccessRule {
        SuccessRule {
            pattern: anchored(pattern),
            stdout: stdout.to_string(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{})", pattern)).expect("hardcoded classification pattern")
}

// Generic fallback rules, consulted after any caller-supplied list. The
// trailing catch-all keeps every qconf failure typed.
static GENERIC_ERROR_RULES: Lazy<Vec<ErrorRule>> = Lazy::new(|| {
    vec![
        ErrorRule::new(
            ".*unable to send message to qmaster.*",
            ErrorKind::QmasterUnreachable,
        ),
        ErrorRule::new(".*must be manager.*", ErrorKind::Authorization),
        ErrorRule::new("denied.*", ErrorKind::Authorization),
        ErrorRule::new(".*does not exist.*", ErrorKind::ObjectNotFound),
        ErrorRule::new(".*no.*defined.*", ErrorKind::ObjectNotFound),
        ErrorRule::new(".*", ErrorKind::Qconf),
    ]
});

/// Captured outcome of one qconf invocation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
    pub command: String,
}

/// Per-call classification options.
#[derive(Default)]
pub struct RunOptions<'a> {
    pub error_rules: &'a [ErrorRule],
    pub success_rules: &'a [SuccessRule],
    pub failure_rules: &'a [ErrorRule],
    pub error_details: Option<&'a str>,
    pub combine_error_lines: bool,
}

/// Shells out to qconf for one cluster cell.
pub struct QconfExecutor {
    settings: QconfSettings,
    version: OnceCell<String>,
}

impl QconfExecutor {
    pub fn new(settings: QconfSettings) -> QconfExecutor {
        QconfExecutor {
            settings,
            version: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &QconfSettings {
        &self.settings
    }

    /// Scheduler release the cell runs, memoized from the first line of
    /// `qconf -help` (last token, truncated at the first underscore).
    pub fn scheduler_version(&self) -> Result<&str> {
        self.version
            .get_or_try_init(|| {
                let result = self.run(&["-help"], &RunOptions::default())?;
                let version = result
                    .stdout
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().last())
                    .and_then(|token| token.split('_').next())
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        QconfError::Qconf(format!(
                            "cannot determine scheduler version from output: {}",
                            result.stdout
                        ))
                    })?;
                debug!("scheduler version: {}", version);
                Ok(version.to_string())
            })
            .map(String::as_str)
    }

    /// Run `qconf <args>` and classify the outcome.
    pub fn run(&self, args: &[&str], options: &RunOptions<'_>) -> Result<ExecutionResult> {
        let (mut command, display) = self.build_command(args);
        trace!("running: {}", display);
        let output = command.output()?;
        let result = ExecutionResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_status: output.status.code().unwrap_or(-1),
            command: display,
        };

        if result.exit_status != 0 {
            return self.classify_failure(result, options);
        }

        if !result.stderr.is_empty() {
            // Some verbs report failure on stdout's twin channel while
            // still exiting zero.
            for rule in options.failure_rules {
                if rule.matches(&result.stderr) {
                    return Err(rule.kind().to_error(&result.stderr, options.error_details));
                }
            }
        }
        Ok(result)
    }

    fn classify_failure(
        &self,
        result: ExecutionResult,
        options: &RunOptions<'_>,
    ) -> Result<ExecutionResult> {
        let mut error = result.stderr.clone();
        if error.is_empty() {
            error = result.stdout.clone();
        }
        if options.combine_error_lines {
            error = error.trim_end().replace('\n', "; ");
        }

        for rule in options.success_rules {
            if rule.matches(&error) {
                debug!("treating failure as success, replacing stdout: {:?}", error);
                let mut result = result;
                result.stdout = rule.stdout.clone();
                return Ok(result);
            }
        }

        for rule in options.error_rules.iter().chain(GENERIC_ERROR_RULES.iter()) {
            if rule.matches(&error) {
                return Err(rule.kind().to_error(&error, options.error_details));
            }
        }

        Err(QconfError::CommandFailed {
            stdout: result.stdout,
            stderr: result.stderr,
            exit_status: result.exit_status,
        })
    }

    /// Run a verb that takes an object configuration file: the object is
    /// rendered to a temp file whose path is appended to the arguments.
    /// Rejected content is attached to the classified error.
    pub fn run_with_object(
        &self,
        args: &[&str],
        object: &QconfObject,
        error_rules: &[ErrorRule],
    ) -> Result<ExecutionResult> {
        let content = object.to_text()?;
        // Some verbs derive the target name from the file name, so the
        // file is named after the object inside a private directory.
        let dir = tempfile::tempdir()?;
        let file_name = object.name().unwrap_or("object").to_string();
        let path = dir.path().join(file_name);
        fs::write(&path, &content)?;

        let path_text = path.to_string_lossy().to_string();
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push(&path_text);
        let details = format!("object configuration file content:\n{}", content);
        self.run(
            &full_args,
            &RunOptions {
                error_rules,
                error_details: Some(&details),
                ..RunOptions::default()
            },
        )
    }

    /// Run a verb that takes a directory argument.
    pub fn run_with_dir(
        &self,
        args: &[&str],
        dir: &Path,
        error_rules: &[ErrorRule],
    ) -> Result<ExecutionResult> {
        if !dir.is_dir() {
            return Err(QconfError::Qconf(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        let dir_text = dir.to_string_lossy().to_string();
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push(&dir_text);
        self.run(
            &full_args,
            &RunOptions {
                error_rules,
                ..RunOptions::default()
            },
        )
    }

    // The production path sources the cell settings script so qconf picks
    // up the full cell environment; tests override the whole prefix with
    // a fake binary.
    fn build_command(&self, args: &[&str]) -> (Command, String) {
        let mut command = match env::var(QCONF_COMMAND_ENV) {
            Ok(fake) => {
                let mut command = Command::new(fake.clone());
                command.args(args);
                command
            }
            Err(_) => {
                let shell_line = format!(
                    ". {}/{}/common/settings.sh; qconf {}",
                    self.settings.sge_root,
                    self.settings.sge_cell,
                    args.join(" ")
                );
                let mut command = Command::new("sh");
                command.arg("-c").arg(shell_line);
                command
            }
        };
        command.envs(self.settings.child_env());
        let display = format!("qconf {}", args.join(" "));
        (command, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_rules_order() {
        let rules = &*GENERIC_ERROR_RULES;
        let first_match = |text: &str| {
            rules
                .iter()
                .find(|rule| rule.matches(text))
                .map(ErrorRule::kind)
        };
        assert_eq!(
            first_match("error: unable to send message to qmaster using port 6444"),
            Some(ErrorKind::QmasterUnreachable)
        );
        assert_eq!(
            first_match("user \"intruder\" must be manager for this operation"),
            Some(ErrorKind::Authorization)
        );
        assert_eq!(
            first_match("denied: host \"exec1\" is not an admin host"),
            Some(ErrorKind::Authorization)
        );
        assert_eq!(
            first_match("cluster queue entry \"batch\" does not exist"),
            Some(ErrorKind::ObjectNotFound)
        );
        assert_eq!(
            first_match("no cluster queue defined"),
            Some(ErrorKind::ObjectNotFound)
        );
        assert_eq!(first_match("something odd happened"), Some(ErrorKind::Qconf));
    }

    #[test]
    fn test_rules_match_from_start() {
        let rule = ErrorRule::new("denied.*", ErrorKind::Authorization);
        assert!(rule.matches("denied: not an admin host"));
        assert!(!rule.matches("operation was denied"));
    }

    #[test]
    fn test_caller_rules_take_precedence() {
        let caller = vec![ErrorRule::new(
            ".*does not exist.*",
            ErrorKind::InvalidRequest,
        )];
        let text = "object does not exist";
        let hit = caller
            .iter()
            .chain(GENERIC_ERROR_RULES.iter())
            .find(|rule| rule.matches(text))
            .unwrap();
        assert_eq!(hit.kind(), ErrorKind::InvalidRequest);
    }
}
