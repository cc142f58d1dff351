//! Direct access to individual data rows, bypassing the contact graph.

use std::{collections::BTreeMap, marker::PhantomData};

use roster_core::{
  Cancel, Result,
  account::Account,
  column,
  entity::{CustomDataEntity, DataEntity},
  field::{self, Field, FieldSet},
  is_profile_id,
  operation::Operation,
  predicate::{OrderBy, Page, Where, equal_to, sort_order},
  store::Table,
};
use tracing::{debug, trace};

use crate::{
  Contacts,
  cursor::{DataCursor, TypedCursor as _},
  mapper::FromDataCursor,
  ops::{DataReconciler, DataValues, DesiredRow},
  select,
};

// ─── Query ───────────────────────────────────────────────────────────────────

/// Query data rows of one built-in kind, e.g. every email matching a filter.
/// Blank rows are skipped.
#[derive(Debug)]
pub struct DataQuery<'a, E> {
  contacts:  &'a Contacts,
  profile:   bool,
  include:   Option<FieldSet>,
  selection: Option<Where>,
  accounts:  Vec<Option<Account>>,
  order_by:  Vec<OrderBy>,
  page:      Page,
  entity:    PhantomData<fn() -> E>,
}

impl<E> Clone for DataQuery<'_, E> {
  fn clone(&self) -> Self {
    Self {
      contacts:  self.contacts,
      profile:   self.profile,
      include:   self.include.clone(),
      selection: self.selection.clone(),
      accounts:  self.accounts.clone(),
      order_by:  self.order_by.clone(),
      page:      self.page,
      entity:    PhantomData,
    }
  }
}

impl<'a, E: FromDataCursor> DataQuery<'a, E> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self {
      contacts,
      profile,
      include: None,
      selection: None,
      accounts: Vec::new(),
      order_by: Vec::new(),
      page: Page::default(),
      entity: PhantomData,
    }
  }

  pub fn include<'f>(mut self, fields: impl IntoIterator<Item = &'f Field>) -> Self {
    self.include = Some(field::set(fields));
    self
  }

  pub fn filter(mut self, selection: Where) -> Self {
    self.selection = Some(selection);
    self
  }

  /// Only rows of raw contacts in these accounts (`None`: local).
  pub fn accounts(
    mut self,
    accounts: impl IntoIterator<Item = Option<Account>>,
  ) -> Self {
    self.accounts.extend(accounts);
    self
  }

  pub fn order_by(mut self, order: OrderBy) -> Self {
    self.order_by.push(order);
    self
  }

  pub fn limit(mut self, limit: usize) -> Result<Self> {
    self.page.limit = Page::checked_limit(limit)?;
    Ok(self)
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.page.offset = offset;
    self
  }

  pub fn find(&self) -> Vec<E> { self.find_with_cancel(Cancel::never()) }

  /// Empty if permission is denied, the store fails or `cancel` fires.
  pub fn find_with_cancel(&self, cancel: Cancel<'_>) -> Vec<E> {
    let c = self.contacts;
    if !c.permissions.can_query() {
      debug!("data query permission denied");
      return Vec::new();
    }

    let selection = [
      Some(equal_to(column::MIMETYPE, E::mime().to_string())),
      self.selection.clone(),
      select::accounts(&self.accounts),
    ]
    .into_iter()
    .reduce(Where::and_opt)
    .flatten();
    let projection = select::data_projection(self.include.as_ref(), &c.registry);
    let Some(rows) = c.rows(
      Table::data(self.profile),
      &projection,
      selection.as_ref(),
      Some(&sort_order(&self.order_by, self.page)),
    ) else {
      return Vec::new();
    };

    let mut cursor = DataCursor::new(rows);
    let mut found = Vec::new();
    while cursor.move_to_next() {
      if cancel.is_cancelled() {
        trace!("data query cancelled");
        return Vec::new();
      }
      found.extend(E::non_blank_from_cursor(&cursor));
    }
    found
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Overwrite individual data rows by id. Each row is written in its own
/// batch; a blank entity deletes its row.
#[derive(Debug)]
pub struct DataUpdate<'a> {
  contacts: &'a Contacts,
  profile:  bool,
  include:  Option<FieldSet>,
  rows:     Vec<DesiredRow>,
}

impl<'a> DataUpdate<'a> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self { contacts, profile, include: None, rows: Vec::new() }
  }

  pub fn include<'f>(mut self, fields: impl IntoIterator<Item = &'f Field>) -> Self {
    self.include = Some(field::set(fields));
    self
  }

  /// Entities without an id are not stored yet and are ignored.
  pub fn data<E: DataValues>(mut self, entity: &E) -> Self {
    self.rows.push(DesiredRow::of(entity));
    self
  }

  /// Errors if the entity's mimetype is not registered.
  pub fn custom(mut self, entity: &CustomDataEntity) -> Result<Self> {
    let entry = self.contacts.registry.entry(&entity.mime_type)?;
    self.rows.push(DesiredRow::custom(entry, entity));
    Ok(self)
  }

  /// Outcome per data row id.
  pub fn commit(self) -> BTreeMap<i64, bool> {
    let c = self.contacts;
    let allowed = c.permissions.can_update_delete();
    if !allowed {
      debug!("data update permission denied");
    }
    let data = DataReconciler::new(&*c.source, self.profile, self.include.as_ref());

    let mut results = BTreeMap::new();
    for row in &self.rows {
      let Some(id) = row.id else { continue };
      let ok = allowed
        && is_profile_id(id) == self.profile
        && match (row.blank, data.update(id, row)) {
          (true, _) => apply_to_existing(c, data.delete(id)),
          (false, Some(op)) => apply_to_existing(c, op),
          // Nothing included; the row is left as is.
          (false, None) => true,
        };
      results.insert(id, ok);
    }
    results
  }
}

/// Apply a single-row operation; it succeeds only if the row existed.
fn apply_to_existing(contacts: &Contacts, operation: Operation) -> bool {
  contacts
    .apply(vec![operation])
    .is_some_and(|r| r.first().and_then(|r| r.count).unwrap_or(0) > 0)
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// Delete individual data rows by id, in a single batch.
#[derive(Debug)]
pub struct DataDelete<'a> {
  contacts: &'a Contacts,
  profile:  bool,
  ids:      Vec<i64>,
}

impl<'a> DataDelete<'a> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self { contacts, profile, ids: Vec::new() }
  }

  pub fn data<E: DataEntity>(mut self, entity: &E) -> Self {
    self.ids.extend(entity.id());
    self
  }

  pub fn ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
    self.ids.extend(ids);
    self
  }

  /// Outcome per data row id.
  pub fn commit(self) -> BTreeMap<i64, bool> {
    let c = self.contacts;
    let mut results: BTreeMap<i64, bool> =
      self.ids.iter().map(|id| (*id, false)).collect();
    if !c.permissions.can_update_delete() {
      debug!("data delete permission denied");
      return results;
    }

    let table = Table::data(self.profile);
    let targets: Vec<i64> = results
      .keys()
      .copied()
      .filter(|id| is_profile_id(*id) == self.profile)
      .collect();
    let batch = targets
      .iter()
      .map(|id| Operation::delete(table, equal_to(column::ID, *id)))
      .collect();
    if let Some(outcomes) = c.apply(batch) {
      for (id, outcome) in targets.into_iter().zip(outcomes) {
        results.insert(id, outcome.count.unwrap_or(0) > 0);
      }
    }
    results
  }
}
