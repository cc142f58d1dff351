//! Operation builders: entity graphs → batch operations.

mod account;
mod contact;
mod data;
mod raw_contact;
mod values;

pub(crate) use account::associate;
pub(crate) use contact::options_update;
pub use data::{DataReconciler, DesiredRow, Owner};
pub(crate) use raw_contact::RawContactOps;
pub use values::DataValues;
