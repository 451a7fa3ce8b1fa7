//! Error taxonomy for the qconf client.
//!
//! Classification happens once, at the executor boundary (see
//! [`crate::executor`]); everything above it either propagates the typed
//! error unchanged or raises one of these variants directly for checks
//! performed locally, without an external call.

use thiserror::Error;

/// Process exit codes for the CLI surface.
pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_CONFIGURATION_ERROR: i32 = 2;
pub const EXIT_AUTHORIZATION_ERROR: i32 = 3;
pub const EXIT_COMMAND_FAILED: i32 = 4;
pub const EXIT_INVALID_REQUEST: i32 = 5;
pub const EXIT_INVALID_ARGUMENT: i32 = 6;
pub const EXIT_QMASTER_UNREACHABLE: i32 = 7;
pub const EXIT_OBJECT_NOT_FOUND: i32 = 8;
pub const EXIT_OBJECT_ALREADY_EXISTS: i32 = 9;

/// Typed errors raised by the qconf client.
#[derive(Debug, Error)]
pub enum QconfError {
    /// Required environment or setup is missing before any call can be made.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The qmaster backend process is unreachable.
    #[error("qmaster unreachable: {0}")]
    QmasterUnreachable(String),

    /// The caller lacks the privilege required for the operation.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// A named entity was not found on the backend.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// A named entity already exists where creation was attempted.
    #[error("object already exists: {0}")]
    ObjectAlreadyExists(String),

    /// A semantically invalid operation, e.g. deleting a protected
    /// singleton or an entity still referenced elsewhere.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed caller input: wrong value shape, bad delimiter usage,
    /// non-dictionary attribute data.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The external process returned a failure not otherwise classified.
    #[error("command failed with exit status {exit_status}: {stderr}")]
    CommandFailed {
        stdout: String,
        stderr: String,
        exit_status: i32,
    },

    /// Catch-all for unclassified qconf failures.
    #[error("{0}")]
    Qconf(String),
}

impl QconfError {
    /// Numeric exit code for the CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            QconfError::Configuration(_) => EXIT_CONFIGURATION_ERROR,
            QconfError::QmasterUnreachable(_) => EXIT_QMASTER_UNREACHABLE,
            QconfError::Authorization(_) => EXIT_AUTHORIZATION_ERROR,
            QconfError::ObjectNotFound(_) => EXIT_OBJECT_NOT_FOUND,
            QconfError::ObjectAlreadyExists(_) => EXIT_OBJECT_ALREADY_EXISTS,
            QconfError::InvalidRequest(_) => EXIT_INVALID_REQUEST,
            QconfError::InvalidArgument(_) => EXIT_INVALID_ARGUMENT,
            QconfError::CommandFailed { .. } => EXIT_COMMAND_FAILED,
            QconfError::Qconf(_) => EXIT_ERROR,
        }
    }

    /// True for the "entity absent" outcome that managers probe for.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QconfError::ObjectNotFound(_))
    }
}

impl From<std::io::Error> for QconfError {
    fn from(err: std::io::Error) -> Self {
        QconfError::Qconf(format!("i/o error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, QconfError>;

/// Exception kinds the error-classification rules can map to.
///
/// Rules carry a kind rather than a closure so rule tables stay plain,
/// comparable data owned by each manager/executor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    QmasterUnreachable,
    Authorization,
    ObjectNotFound,
    ObjectAlreadyExists,
    InvalidRequest,
    InvalidArgument,
    Qconf,
}

impl ErrorKind {
    /// Build the error for this kind, appending human-readable details
    /// (e.g. the rejected file content) when supplied.
    pub fn to_error(self, message: &str, details: Option<&str>) -> QconfError {
        let text = match details {
            Some(details) => format!("{}\n{}", message.trim_end(), details),
            None => message.to_string(),
        };
        match self {
            ErrorKind::Configuration => QconfError::Configuration(text),
            ErrorKind::QmasterUnreachable => QconfError::QmasterUnreachable(text),
            ErrorKind::Authorization => QconfError::Authorization(text),
            ErrorKind::ObjectNotFound => QconfError::ObjectNotFound(text),
            ErrorKind::ObjectAlreadyExists => QconfError::ObjectAlreadyExists(text),
            ErrorKind::InvalidRequest => QconfError::InvalidRequest(text),
            ErrorKind::InvalidArgument => QconfError::InvalidArgument(text),
            ErrorKind::Qconf => QconfError::Qconf(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(QconfError::Qconf("x".into()).exit_code(), EXIT_ERROR);
        assert_eq!(
            QconfError::ObjectNotFound("q1".into()).exit_code(),
            EXIT_OBJECT_NOT_FOUND
        );
        assert_eq!(
            QconfError::CommandFailed {
                stdout: String::new(),
                stderr: "boom".into(),
                exit_status: 2,
            }
            .exit_code(),
            EXIT_COMMAND_FAILED
        );
    }

    #[test]
    fn test_error_kind_details() {
        let err = ErrorKind::InvalidRequest.to_error("rejected", Some("file content:\nqname q1"));
        assert!(err.to_string().contains("rejected"));
        assert!(err.to_string().contains("qname q1"));
    }
}
