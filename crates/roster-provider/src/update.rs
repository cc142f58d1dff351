use std::collections::{BTreeMap, HashMap};

use roster_core::{
  Cancel, Result,
  account::Account,
  column,
  entity::{Contact, Group, RawContact},
  field::{self, Field, FieldSet},
  is_profile_id,
  operation::Operation,
  predicate::{equal_to, is_in},
  store::Table,
};
use serde::Serialize;
use tracing::debug;

use crate::{
  Contacts,
  cursor::{RawContactRow as _, RawContactsCursor, TypedCursor as _},
  ops::{RawContactOps, options_update},
  select,
};

/// Per-entity outcome of an update, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
  pub contacts:     BTreeMap<i64, bool>,
  pub raw_contacts: BTreeMap<i64, bool>,
}

impl UpdateResult {
  pub fn is_successful(&self) -> bool {
    self.contacts.values().chain(self.raw_contacts.values()).all(|ok| *ok)
  }

  pub fn raw_contact(&self, id: i64) -> bool {
    self.raw_contacts.get(&id).copied().unwrap_or(false)
  }

  pub fn contact(&self, id: i64) -> bool {
    self.contacts.get(&id).copied().unwrap_or(false)
  }
}

/// Make stored raw contacts match their in-memory state.
///
/// Each raw contact is reconciled in its own batch: data rows are inserted,
/// updated or deleted so that the stored rows equal the desired ones. A
/// contact contributes its options and all of its raw contacts.
#[derive(Debug)]
pub struct ContactsUpdate<'a> {
  contacts:        &'a Contacts,
  profile:         bool,
  include:         Option<FieldSet>,
  delete_blanks:   bool,
  to_contacts:     Vec<Contact>,
  to_raw_contacts: Vec<RawContact>,
}

impl<'a> ContactsUpdate<'a> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self {
      contacts,
      profile,
      include: None,
      delete_blanks: true,
      to_contacts: Vec::new(),
      to_raw_contacts: Vec::new(),
    }
  }

  /// Only write these fields. An empty set writes nothing.
  pub fn include<'f>(mut self, fields: impl IntoIterator<Item = &'f Field>) -> Self {
    self.include = Some(field::set(fields));
    self
  }

  /// Delete raw contacts that are blank instead of updating them. On by
  /// default.
  pub fn delete_blanks(mut self, delete: bool) -> Self {
    self.delete_blanks = delete;
    self
  }

  pub fn contacts(mut self, contacts: impl IntoIterator<Item = Contact>) -> Self {
    self.to_contacts.extend(contacts);
    self
  }

  pub fn raw_contacts(
    mut self,
    raw_contacts: impl IntoIterator<Item = RawContact>,
  ) -> Self {
    self.to_raw_contacts.extend(raw_contacts);
    self
  }

  pub fn commit(self) -> Result<UpdateResult> { self.commit_with_cancel(Cancel::never()) }

  /// Errors only on an unregistered custom mimetype.
  pub fn commit_with_cancel(mut self, cancel: Cancel<'_>) -> Result<UpdateResult> {
    let c = self.contacts;
    let mut result = UpdateResult::default();

    let contacts = std::mem::take(&mut self.to_contacts);
    let mut raw_contacts = std::mem::take(&mut self.to_raw_contacts);
    for contact in contacts {
      let ok = !cancel.is_cancelled()
        && c.permissions.can_update_delete()
        && self.update_options(&contact);
      result.contacts.insert(contact.id, ok);
      raw_contacts.extend(contact.raw_contacts);
    }

    if !c.permissions.can_update_delete() {
      debug!("update permission denied");
      result
        .raw_contacts
        .extend(raw_contacts.iter().filter_map(|r| r.id).map(|id| (id, false)));
      return Ok(result);
    }

    let ids: Vec<i64> = raw_contacts
      .iter()
      .filter_map(|r| r.id)
      .filter(|id| is_profile_id(*id) == self.profile)
      .collect();
    let accounts = self.stored_accounts(&ids).unwrap_or_default();
    let mut groups: HashMap<Option<Account>, Option<Vec<Group>>> = HashMap::new();
    let ops = RawContactOps::new(
      &*c.source,
      &c.registry,
      self.profile,
      self.include.as_ref(),
    );

    for raw in &raw_contacts {
      let Some(id) = raw.id else { continue };
      if cancel.is_cancelled() {
        result.raw_contacts.insert(id, false);
        continue;
      }
      // Only raw contacts that are still stored, on the right side of the
      // profile split, can be updated.
      let Some(account) = accounts.get(&id) else {
        result.raw_contacts.insert(id, false);
        continue;
      };

      let batch = if self.delete_blanks && raw.is_blank() {
        Some(vec![Operation::delete(
          Table::raw_contacts(self.profile),
          equal_to(column::ID, id),
        )])
      } else {
        let account_groups = groups
          .entry(account.clone())
          .or_insert_with(|| c.account_groups(account.as_ref()));
        // Memberships are only reconciled against a known group list.
        let Some(account_groups) = account_groups.as_deref() else {
          result.raw_contacts.insert(id, false);
          continue;
        };
        ops.update(id, raw, account_groups)?
      };
      let ok = batch.is_some_and(|batch| c.apply(batch).is_some());
      result.raw_contacts.insert(id, ok);
    }
    Ok(result)
  }

  fn update_options(&self, contact: &Contact) -> bool {
    if is_profile_id(contact.id) != self.profile {
      return false;
    }
    let Some(options) = &contact.options else { return true };
    match options_update(self.profile, contact.id, options, self.include.as_ref()) {
      Some(op) => self.contacts.apply(vec![op]).is_some(),
      None => true,
    }
  }

  /// The account of every stored raw contact among `ids`.
  fn stored_accounts(&self, ids: &[i64]) -> Option<HashMap<i64, Option<Account>>> {
    if ids.is_empty() {
      return Some(HashMap::new());
    }
    let mut cursor = RawContactsCursor::new(self.contacts.rows(
      Table::raw_contacts(self.profile),
      select::RAW_CONTACTS,
      Some(&is_in(column::ID, ids.iter().copied())),
      None,
    )?);
    let mut accounts = HashMap::new();
    while cursor.move_to_next() {
      if let Some(id) = cursor.raw_contact_id() {
        accounts.insert(id, cursor.account());
      }
    }
    Some(accounts)
  }
}
