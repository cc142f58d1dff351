//! Contacts stored on the SIM card.
//!
//! SIM rows have no stable identity: updates and deletes match rows by their
//! current name and number.

use roster_core::{
  column,
  entity::SimContact,
  operation::Operation,
  predicate::{Where, equal_to, is_null},
  store::Table,
};
use tracing::debug;

use crate::{
  Contacts,
  cursor::{SimContactsCursor, TypedCursor as _},
  mapper, select,
};

fn matching(sim: &SimContact) -> Where {
  let part = |column: &str, value: &Option<String>| match value {
    Some(v) => equal_to(column, v.as_str()),
    None => is_null(column),
  };
  part(column::SIM_NAME, &sim.name).and(part(column::SIM_NUMBER, &sim.number))
}

fn values(operation: Operation, sim: &SimContact) -> Operation {
  operation
    .with_value(column::SIM_NAME, sim.name.clone())
    .with_value(column::SIM_NUMBER, sim.number.clone())
}

#[derive(Debug, Clone, Copy)]
pub struct SimContacts<'a> {
  contacts: &'a Contacts,
}

impl<'a> SimContacts<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self { Self { contacts } }

  pub fn find(&self) -> Vec<SimContact> {
    let c = self.contacts;
    if !c.permissions.can_query() {
      debug!("sim query permission denied");
      return Vec::new();
    }
    let Some(rows) = c.rows(Table::SimContacts, select::SIM_CONTACTS, None, None)
    else {
      return Vec::new();
    };
    let mut cursor = SimContactsCursor::new(rows);
    let mut found = Vec::with_capacity(cursor.count());
    while cursor.move_to_next() {
      found.push(mapper::tables::sim_contact(&cursor));
    }
    found
  }

  /// Insert each contact in its own batch. Blank contacts are refused.
  pub fn insert<'s>(
    &self,
    sim_contacts: impl IntoIterator<Item = &'s SimContact>,
  ) -> Vec<bool> {
    let c = self.contacts;
    let allowed = c.permissions.can_insert();
    if !allowed {
      debug!("sim insert permission denied");
    }
    sim_contacts
      .into_iter()
      .map(|sim| {
        allowed
          && !sim.is_blank()
          && c.apply(vec![values(Operation::insert(Table::SimContacts), sim)]).is_some()
      })
      .collect()
  }

  /// Replace the row matching `current` with `changed`. A blank `changed`
  /// is refused.
  pub fn update(&self, current: &SimContact, changed: &SimContact) -> bool {
    let c = self.contacts;
    if !c.permissions.can_update_delete() {
      debug!("sim update permission denied");
      return false;
    }
    if changed.is_blank() {
      return false;
    }
    let op = values(Operation::update(Table::SimContacts, matching(current)), changed);
    c.apply(vec![op])
      .is_some_and(|r| r.first().and_then(|r| r.count).unwrap_or(0) > 0)
  }

  /// Delete the rows matching each contact, one batch each.
  pub fn delete<'s>(
    &self,
    sim_contacts: impl IntoIterator<Item = &'s SimContact>,
  ) -> Vec<bool> {
    let c = self.contacts;
    let allowed = c.permissions.can_update_delete();
    if !allowed {
      debug!("sim delete permission denied");
    }
    sim_contacts
      .into_iter()
      .map(|sim| {
        allowed
          && c
            .apply(vec![Operation::delete(Table::SimContacts, matching(sim))])
            .is_some_and(|r| r.first().and_then(|r| r.count).unwrap_or(0) > 0)
      })
      .collect()
  }
}
