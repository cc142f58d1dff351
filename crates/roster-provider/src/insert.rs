use roster_core::{
  Cancel, Result,
  account::Account,
  column,
  entity::RawContact,
  field::{self, Field, FieldSet},
  store::Table,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{Contacts, ops::RawContactOps, select};

/// Why a raw contact was not inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertFailure {
  PermissionDenied,
  /// Blank raw contacts are skipped unless blanks are allowed.
  Blank,
  /// The profile already has a raw contact for the account.
  ProfileExists,
  Cancelled,
  /// The batch was rejected by the store.
  Failed,
}

/// One outcome per raw contact, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertResult {
  pub results: Vec<Result<i64, InsertFailure>>,
}

impl InsertResult {
  pub fn is_successful(&self) -> bool { self.results.iter().all(|r| r.is_ok()) }

  /// The id of the raw contact inserted for input `index`.
  pub fn raw_contact_id(&self, index: usize) -> Option<i64> {
    self.results.get(index)?.ok()
  }

  pub fn failure(&self, index: usize) -> Option<InsertFailure> {
    self.results.get(index)?.err()
  }

  pub fn raw_contact_ids(&self) -> impl Iterator<Item = i64> + '_ {
    self.results.iter().filter_map(|r| r.ok())
  }
}

/// Insert new raw contacts, each with its data, in one batch per raw contact.
///
/// The store creates a contact for every new raw contact. Group memberships
/// are limited to groups of the target account.
#[derive(Debug)]
pub struct RawContactsInsert<'a> {
  contacts:     &'a Contacts,
  profile:      bool,
  account:      Option<Account>,
  allow_blanks: bool,
  include:      Option<FieldSet>,
  raw_contacts: Vec<RawContact>,
}

impl<'a> RawContactsInsert<'a> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self {
      contacts,
      profile,
      account: None,
      allow_blanks: false,
      include: None,
      raw_contacts: Vec::new(),
    }
  }

  /// Insert into `account`. An account that is not in the system is
  /// replaced by `None` (local).
  pub fn for_account(mut self, account: Option<Account>) -> Self {
    self.account = account;
    self
  }

  pub fn allow_blanks(mut self, allow: bool) -> Self {
    self.allow_blanks = allow;
    self
  }

  pub fn include<'f>(mut self, fields: impl IntoIterator<Item = &'f Field>) -> Self {
    self.include = Some(field::set(fields));
    self
  }

  pub fn raw_contact(mut self, raw_contact: RawContact) -> Self {
    self.raw_contacts.push(raw_contact);
    self
  }

  pub fn raw_contacts(
    mut self,
    raw_contacts: impl IntoIterator<Item = RawContact>,
  ) -> Self {
    self.raw_contacts.extend(raw_contacts);
    self
  }

  pub fn commit(self) -> Result<InsertResult> { self.commit_with_cancel(Cancel::never()) }

  /// Insert every raw contact. Once `cancel` fires, the remaining ones are
  /// reported as cancelled; those already inserted stay inserted.
  ///
  /// Errors only on an unregistered custom mimetype.
  pub fn commit_with_cancel(self, cancel: Cancel<'_>) -> Result<InsertResult> {
    let c = self.contacts;
    if !c.permissions.can_insert() {
      debug!("insert permission denied");
      return Ok(InsertResult {
        results: vec![Err(InsertFailure::PermissionDenied); self.raw_contacts.len()],
      });
    }

    let account = c.account_oracle.null_if_not_in_system(self.account.as_ref());
    let groups = c.account_groups(account.as_ref());
    let ops = RawContactOps::new(
      &*c.source,
      &c.registry,
      self.profile,
      self.include.as_ref(),
    );
    let mut profile_taken =
      self.profile && self.profile_raw_contact_exists(account.as_ref());

    let mut results = Vec::with_capacity(self.raw_contacts.len());
    for raw in &self.raw_contacts {
      let result = if cancel.is_cancelled() {
        Err(InsertFailure::Cancelled)
      } else if !self.allow_blanks && raw.is_blank() {
        Err(InsertFailure::Blank)
      } else if profile_taken {
        Err(InsertFailure::ProfileExists)
      } else if let Some(groups) = &groups {
        let batch = ops.insert(raw, account.as_ref(), groups)?;
        let id = c.apply(batch).and_then(|r| r.first().and_then(|r| r.id));
        profile_taken |= self.profile && id.is_some();
        id.ok_or(InsertFailure::Failed)
      } else {
        // Memberships are only written against a known group list.
        Err(InsertFailure::Failed)
      };
      results.push(result);
    }
    Ok(InsertResult { results })
  }

  /// A profile raw contact already exists for `account`. A failed lookup
  /// counts as existing so a second profile raw contact is never created.
  fn profile_raw_contact_exists(&self, account: Option<&Account>) -> bool {
    let c = self.contacts;
    let Some(cursor) = c.rows(
      Table::ProfileRawContacts,
      &[column::ID],
      Some(&select::account(account)),
      None,
    ) else {
      warn!("profile lookup failed");
      return true;
    };
    cursor.count() > 0
  }
}
