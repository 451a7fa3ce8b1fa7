//! Configuration management client for Grid Engine style clusters,
//! driven through the external `qconf` tool.
//!
//! The crate models every configuration entity the scheduler exposes as
//! a typed record with a per-release schema, converts records between
//! the native line-oriented text and JSON, and wraps the qconf verbs in
//! managers that classify the tool's error text into a typed taxonomy.
//! [`QconfApi`] is the entry point; the object model under [`objects`]
//! is usable on its own for offline conversion work.

pub mod api;
pub mod config;
pub mod errors;
pub mod executor;
pub mod managers;
pub mod objects;

pub use api::QconfApi;
pub use config::{Actor, QconfSettings};
pub use errors::{QconfError, Result};
pub use executor::{ErrorRule, ExecutionResult, QconfExecutor, RunOptions, SuccessRule};
pub use managers::{NameList, Probe};
pub use objects::{ObjectData, ObjectFactory, ObjectKind, ObjectSpec, QconfObject, Value};
