//! Core types and collaborator traits for the Roster contacts façade.
//!
//! This crate is deliberately free of storage dependencies. It defines the
//! typed entity model (contacts, raw contacts, data rows, groups), the
//! predicate language used to address rows, the batch operation primitive,
//! and the traits through which the façade talks to the underlying content
//! store.

pub mod account;
pub mod cancel;
pub mod column;
pub mod entity;
pub mod error;
pub mod field;
pub mod mime;
pub mod operation;
pub mod predicate;
pub mod store;
pub mod value;

pub use cancel::Cancel;
pub use error::{Error, Result};
pub use value::Value;

/// The first id of the profile id space. Every contact, raw contact and data
/// row belonging to the device owner's profile has an id at or above this
/// value.
pub const PROFILE_MIN_ID: i64 = i64::MAX - i32::MAX as i64;

/// Returns `true` if `id` belongs to the profile id space.
pub fn is_profile_id(id: i64) -> bool { id >= PROFILE_MIN_ID }
