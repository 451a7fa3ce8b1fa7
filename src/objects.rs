//! Entity model: typed values, per-version schemas, the generic record
//! type, and the factory that ties them to scheduler releases.

pub mod catalog;
pub mod factory;
pub mod object;
pub mod release_map;
pub mod schema;
pub mod value;

pub use factory::{ObjectFactory, ObjectSpec};
pub use object::{ObjectData, QconfObject};
pub use schema::{Layout, ObjectKind, Schema};
pub use value::{KeywordTable, Value};
