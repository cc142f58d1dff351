//! Read path: rows → entities → contact graphs.

mod contacts;
mod entity;
pub mod tables;
mod temp;

pub use contacts::ContactsMapper;
pub use entity::FromDataCursor;
