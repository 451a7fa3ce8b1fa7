//! Per-kind configuration managers. Each manager pairs the shared
//! executor with a descriptor that carries the verb fragments and
//! error classification rules for its kind.

pub mod descriptor;
pub mod dict;
pub mod dict_list;
pub mod name_list;
pub mod singleton;

pub use dict::DictObjectManager;
pub use dict_list::ShareTreeManager;
pub use name_list::{NameList, NameListManager};
pub use singleton::SingletonObjectManager;

use crate::objects::QconfObject;

/// Outcome of an existence probe.
pub enum Probe {
    Found(QconfObject),
    NotFound,
}

impl Probe {
    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }

    pub fn into_object(self) -> Option<QconfObject> {
        match self {
            Probe::Found(object) => Some(object),
            Probe::NotFound => None,
        }
    }
}
