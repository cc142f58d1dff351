//! Query builders returning contact graphs.

mod contacts;
mod raw_contacts;

pub use contacts::ContactsQuery;
pub use raw_contacts::RawContactsQuery;
