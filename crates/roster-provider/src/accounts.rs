//! Moving raw contacts between accounts.
//!
//! Every transition is one batch that drops the affected raw contacts' group
//! memberships and rewrites their account columns. Memberships are scoped to
//! an account, so none of them survive the move; the store re-adds the new
//! account's default group.

use roster_core::{
  account::Account,
  column,
  entity::RawContact,
  is_profile_id,
  predicate::{Where, is_in},
  store::Table,
};
use tracing::debug;

use crate::{
  Contacts,
  cursor::{RawContactRow as _, RawContactsCursor, TypedCursor as _},
  ops, select,
};

#[derive(Debug, Clone, Copy)]
pub struct Accounts<'a> {
  contacts: &'a Contacts,
}

impl<'a> Accounts<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self { Self { contacts } }

  /// Move the given raw contacts into `account`, which must be in the
  /// system. Raw contacts already in it are left alone.
  pub fn associate_account_with_raw_contacts(
    &self,
    account: &Account,
    raw_contact_ids: &[i64],
  ) -> bool {
    if !self.can_move_to(Some(account)) || raw_contact_ids.is_empty() {
      return false;
    }
    let selection = is_in(column::ID, non_profile(raw_contact_ids));
    self.move_where(&selection, Some(account))
  }

  /// Move every local raw contact into `account`.
  pub fn associate_account_with_local_raw_contacts(&self, account: &Account) -> bool {
    if !self.can_move_to(Some(account)) {
      return false;
    }
    self.move_where(&select::account(None), Some(account))
  }

  /// Make the given raw contacts local.
  pub fn dissociate_raw_contacts(&self, raw_contact_ids: &[i64]) -> bool {
    if !self.can_move_to(None) || raw_contact_ids.is_empty() {
      return false;
    }
    let selection = is_in(column::ID, non_profile(raw_contact_ids));
    self.move_where(&selection, None)
  }

  /// Make every raw contact of `account` local. The account does not need
  /// to be in the system any more.
  pub fn dissociate_all_raw_contacts(&self, account: &Account) -> bool {
    if !self.can_move_to(None) {
      return false;
    }
    self.move_where(&select::account(Some(account)), None)
  }

  /// Raw contacts of `account` (`None`: local), with their data.
  pub fn query_raw_contacts_for_account(
    &self,
    account: Option<&Account>,
  ) -> Vec<RawContact> {
    self
      .contacts
      .raw_contacts_query()
      .accounts([account.cloned()])
      .find()
  }

  fn can_move_to(&self, account: Option<&Account>) -> bool {
    let c = self.contacts;
    if !c.permissions.can_update_delete() {
      debug!("account association permission denied");
      return false;
    }
    account.is_none_or(|a| c.account_oracle.is_in_system(a))
  }

  /// Move the raw contacts matching `selection` that are not already in
  /// `account`. Nothing to move trivially succeeds.
  fn move_where(&self, selection: &Where, account: Option<&Account>) -> bool {
    let c = self.contacts;
    let Some(rows) =
      c.rows(Table::RawContacts, select::RAW_CONTACTS, Some(selection), None)
    else {
      return false;
    };
    let mut cursor = RawContactsCursor::new(rows);
    let mut affected = Vec::new();
    while cursor.move_to_next() {
      if let Some(id) = cursor.raw_contact_id()
        && cursor.account().as_ref() != account
      {
        affected.push(id);
      }
    }
    if affected.is_empty() {
      return true;
    }
    debug!(raw_contacts = affected.len(), "moving raw contacts");
    c.apply(ops::associate(account, &affected)).is_some()
  }
}

/// Profile raw contacts are never moved.
fn non_profile(ids: &[i64]) -> impl Iterator<Item = i64> + '_ {
  ids.iter().copied().filter(|id| !is_profile_id(*id))
}
