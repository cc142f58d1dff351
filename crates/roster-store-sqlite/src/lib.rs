//! SQLite content store for Roster.
//!
//! A stand-in for the platform contacts provider: it implements
//! [`RowSource`](roster_core::store::RowSource) and
//! [`BatchExecutor`](roster_core::store::BatchExecutor) over a single SQLite
//! database and emulates the provider-side bookkeeping (contacts created for
//! new raw contacts, cascading deletes, last-updated timestamps, default
//! group memberships).

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
