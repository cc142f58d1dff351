use std::collections::BTreeMap;

use roster_core::{
  Cancel,
  column,
  entity::{Contact, RawContact},
  is_profile_id,
  operation::Operation,
  predicate::{Where, equal_to, is_in},
  store::Table,
};
use serde::Serialize;
use tracing::debug;

use crate::Contacts;

/// Per-id outcome of a delete. An id is successful if its row was deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
  pub contacts:     BTreeMap<i64, bool>,
  pub raw_contacts: BTreeMap<i64, bool>,
  /// Outcome of the `contacts_where` delete, if one was requested.
  pub by_selection: Option<bool>,
}

impl DeleteResult {
  pub fn is_successful(&self) -> bool {
    self.contacts.values().chain(self.raw_contacts.values()).all(|ok| *ok)
      && self.by_selection.unwrap_or(true)
  }
}

/// Delete contacts and raw contacts in a single batch.
///
/// Deleting a contact deletes all of its raw contacts; deleting a contact's
/// last raw contact deletes the contact.
#[derive(Debug)]
pub struct ContactsDelete<'a> {
  contacts:        &'a Contacts,
  profile:         bool,
  contact_ids:     Vec<i64>,
  raw_contact_ids: Vec<i64>,
  selection:       Option<Where>,
}

impl<'a> ContactsDelete<'a> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self {
      contacts,
      profile,
      contact_ids: Vec::new(),
      raw_contact_ids: Vec::new(),
      selection: None,
    }
  }

  pub fn contacts<'c>(self, contacts: impl IntoIterator<Item = &'c Contact>) -> Self {
    self.contact_ids(contacts.into_iter().map(|c| c.id))
  }

  pub fn contact_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
    self.contact_ids.extend(ids);
    self
  }

  /// Raw contacts without an id are ignored.
  pub fn raw_contacts<'r>(
    self,
    raw_contacts: impl IntoIterator<Item = &'r RawContact>,
  ) -> Self {
    self.raw_contact_ids(raw_contacts.into_iter().filter_map(|r| r.id))
  }

  pub fn raw_contact_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
    self.raw_contact_ids.extend(ids);
    self
  }

  /// Also delete every contact with a data row matching `selection`.
  pub fn contacts_where(mut self, selection: Where) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn commit(self) -> DeleteResult {
    let c = self.contacts;
    let mut result = DeleteResult::default();
    let fail_all = |result: &mut DeleteResult| {
      result.contacts.extend(self.contact_ids.iter().map(|id| (*id, false)));
      result.raw_contacts.extend(self.raw_contact_ids.iter().map(|id| (*id, false)));
      if self.selection.is_some() {
        result.by_selection = Some(false);
      }
    };
    if !c.permissions.can_update_delete() {
      debug!("delete permission denied");
      fail_all(&mut result);
      return result;
    }

    // (table, id) per operation; `None` for the selection delete.
    let mut targets: Vec<(Table, Option<i64>)> = Vec::new();
    let mut batch = Vec::new();
    for (table, ids) in [
      (Table::contacts(self.profile), &self.contact_ids),
      (Table::raw_contacts(self.profile), &self.raw_contact_ids),
    ] {
      for &id in ids {
        if is_profile_id(id) != self.profile {
          continue;
        }
        targets.push((table, Some(id)));
        batch.push(Operation::delete(table, equal_to(column::ID, id)));
      }
    }

    if let Some(selection) = &self.selection {
      let matched = c.ids_matching(
        Table::data(self.profile),
        column::CONTACT_ID,
        selection,
        Cancel::never(),
      );
      match matched {
        Some(ids) if !ids.is_empty() => {
          targets.push((Table::contacts(self.profile), None));
          batch.push(Operation::delete(
            Table::contacts(self.profile),
            is_in(column::ID, ids),
          ));
        }
        Some(_) => result.by_selection = Some(false),
        None => {
          fail_all(&mut result);
          return result;
        }
      }
    }

    let Some(outcomes) = c.apply(batch) else {
      fail_all(&mut result);
      return result;
    };
    for ((table, id), outcome) in targets.into_iter().zip(outcomes) {
      let ok = outcome.count.unwrap_or(0) > 0;
      match id {
        Some(id) if matches!(table, Table::Contacts | Table::ProfileContacts) => {
          result.contacts.insert(id, ok)
        }
        Some(id) => result.raw_contacts.insert(id, ok),
        None => result.by_selection.replace(ok),
      };
    }
    // Ids skipped for being on the wrong side of the profile split.
    for id in &self.contact_ids {
      result.contacts.entry(*id).or_insert(false);
    }
    for id in &self.raw_contact_ids {
      result.raw_contacts.entry(*id).or_insert(false);
    }
    result
  }
}
