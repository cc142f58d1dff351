//! The typed entity model.
//!
//! A [`Contact`] aggregates one or more [`RawContact`]s; each raw contact owns
//! its data rows (emails, phones, ...). Contacts are materialised by queries
//! and never persisted directly; writes are expressed against raw contacts
//! and their data.

mod contact;
mod custom;
mod data;
mod group;

use serde::{Deserialize, Serialize};

pub use contact::{Contact, Options, RawContact};
pub use custom::CustomDataEntity;
pub use data::*;
pub use group::{BlockedNumber, Group, SimContact};

use crate::mime::MimeType;

/// Columns every data row carries, regardless of mimetype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInfo {
  /// `None` until the row has been persisted.
  pub id:               Option<i64>,
  pub raw_contact_id:   Option<i64>,
  /// Weak back-reference to the aggregate contact; the raw contact owns the
  /// row.
  pub contact_id:       Option<i64>,
  pub is_primary:       bool,
  pub is_super_primary: bool,
}

/// Behaviour shared by every data-row entity.
pub trait DataEntity: Clone + std::fmt::Debug {
  fn mime_type(&self) -> MimeType;

  fn info(&self) -> &DataInfo;

  fn info_mut(&mut self) -> &mut DataInfo;

  /// `true` if none of the informative fields carry a value. Type and label
  /// never count: they say nothing on their own.
  fn is_blank(&self) -> bool;

  fn id(&self) -> Option<i64> { self.info().id }

  /// The contact-wide default of its mimetype.
  fn is_default(&self) -> bool { self.info().is_super_primary }
}

pub(crate) fn is_blank_text(value: &Option<String>) -> bool {
  value.as_deref().is_none_or(|s| s.trim().is_empty())
}

pub(crate) fn all_blank(values: &[&Option<String>]) -> bool {
  values.iter().all(|v| is_blank_text(v))
}
