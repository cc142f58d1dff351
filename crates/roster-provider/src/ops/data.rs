//! Data-row reconciliation: desired entities → the insert, update and delete
//! operations that make the rows stored for one raw contact match them.
//!
//! Single-valued mimetypes (name, note, ...) are replaced wholesale.
//! Multi-valued mimetypes are diffed by row id: claimed rows are updated,
//! unclaimed rows are deleted and everything else is inserted. Group
//! memberships are diffed by group id instead.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use roster_core::{
  column,
  entity::{CustomDataEntity, DataEntity, Group, GroupMembership},
  field::{self, Field, FieldSet, is_included},
  mime::MimeType,
  operation::Operation,
  predicate::{Page, Where, equal_to, sort_order},
  store::{Cursor, RowSource, Table},
  value::Value,
};
use tracing::warn;

use super::values::DataValues;
use crate::registry::CustomDataEntry;

/// The raw contact a data row is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
  Existing(i64),
  /// The raw contact inserted by the operation at this index of the batch.
  BackReference(usize),
}

/// A desired data row, flattened to column values.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredRow {
  pub id:     Option<i64>,
  pub blank:  bool,
  pub values: Vec<(Field, Value)>,
}

impl DesiredRow {
  pub fn of<E: DataValues>(entity: &E) -> Self {
    Self {
      id:     entity.id(),
      blank:  entity.is_blank(),
      values: entity.values(),
    }
  }

  pub fn custom(entry: &dyn CustomDataEntry, entity: &CustomDataEntity) -> Self {
    Self {
      id:     entity.id(),
      blank:  entry.is_blank(entity),
      values: entry.values(entity),
    }
  }
}

pub struct DataReconciler<'a> {
  source:  &'a dyn RowSource,
  profile: bool,
  include: Option<&'a FieldSet>,
}

impl<'a> DataReconciler<'a> {
  pub fn new(
    source: &'a dyn RowSource,
    profile: bool,
    include: Option<&'a FieldSet>,
  ) -> Self {
    Self { source, profile, include }
  }

  fn table(&self) -> Table { Table::data(self.profile) }

  /// Whether the include mask leaves none of `fields` to write, in which case
  /// the mimetype is left alone entirely.
  pub fn skips(&self, fields: &[Field]) -> bool {
    self
      .include
      .is_some_and(|set| !fields.iter().any(|f| set.contains(f)))
  }

  /// Insert `row` for `owner`. Only included, non-null values are written;
  /// `None` if that leaves nothing.
  pub fn insert(&self, owner: Owner, mime: &str, row: &DesiredRow) -> Option<Operation> {
    let mut op = Operation::insert(self.table());
    for (field, value) in &row.values {
      if is_included(field, self.include) && !value.is_null() {
        op.set_value(field.column, value.clone());
      }
    }
    if !op.has_values() {
      return None;
    }
    op.set_value(column::MIMETYPE, mime);
    Some(match owner {
      Owner::Existing(id) => op.with_value(column::RAW_CONTACT_ID, id),
      Owner::BackReference(index) => {
        op.with_back_reference(column::RAW_CONTACT_ID, index)
      }
    })
  }

  /// Overwrite the included columns of row `id`, nulls included.
  pub fn update(&self, id: i64, row: &DesiredRow) -> Option<Operation> {
    let mut op = Operation::update(self.table(), equal_to(column::ID, id));
    for (field, value) in &row.values {
      if is_included(field, self.include) {
        op.set_value(field.column, value.clone());
      }
    }
    op.has_values().then_some(op)
  }

  pub fn delete(&self, id: i64) -> Operation {
    Operation::delete(self.table(), equal_to(column::ID, id))
  }

  pub fn delete_all(&self, raw_contact_id: i64, mime: &str) -> Operation {
    Operation::delete(self.table(), of_mime(raw_contact_id, mime))
  }

  fn query(
    &self,
    projection: &[&str],
    selection: &Where,
  ) -> Option<Box<dyn Cursor + 'a>> {
    let order = sort_order(&[], Page::default());
    let cursor =
      self
        .source
        .query(self.table(), projection, Some(selection), Some(&order));
    if cursor.is_none() {
      warn!(table = %self.table(), %selection, "data query failed");
    }
    cursor
  }

  /// Ids of the stored rows of `mime` for the raw contact, ascending.
  fn existing_ids(&self, raw_contact_id: i64, mime: &str) -> Option<Vec<i64>> {
    let mut cursor = self.query(&[column::ID], &of_mime(raw_contact_id, mime))?;
    let mut ids = Vec::with_capacity(cursor.count());
    while cursor.move_to_next() {
      ids.extend(cursor.get(column::ID).as_i64());
    }
    Some(ids)
  }

  /// New rows for a raw contact that has none yet: every non-blank row is
  /// inserted, nothing is queried.
  pub fn inserts(
    &self,
    owner: Owner,
    mime: &str,
    fields: &[Field],
    rows: &[DesiredRow],
  ) -> Vec<Operation> {
    if self.skips(fields) {
      return Vec::new();
    }
    rows
      .iter()
      .filter(|r| !r.blank)
      .filter_map(|r| self.insert(owner, mime, r))
      .collect()
  }

  /// Reconcile a single-valued mimetype. A present, non-blank row updates the
  /// first stored row (or is inserted); anything else deletes every stored
  /// row of the mimetype.
  ///
  /// `None` if the stored rows could not be read.
  pub fn single(
    &self,
    raw_contact_id: i64,
    mime: &str,
    fields: &[Field],
    desired: Option<&DesiredRow>,
  ) -> Option<Vec<Operation>> {
    if self.skips(fields) {
      return Some(Vec::new());
    }
    let Some(row) = desired.filter(|r| !r.blank) else {
      return Some(vec![self.delete_all(raw_contact_id, mime)]);
    };
    // More than one stored row is an inconsistent state; the first one wins.
    let op = match self.existing_ids(raw_contact_id, mime)?.first() {
      Some(&id) => self.update(id, row),
      None => self.insert(Owner::Existing(raw_contact_id), mime, row),
    };
    Some(op.into_iter().collect())
  }

  /// Reconcile a multi-valued mimetype by row id.
  ///
  /// Every stored row is either updated (claimed by a non-blank desired row)
  /// or deleted (claimed by a blank one, or unclaimed). Desired rows whose
  /// claimed id is no longer stored are re-created, as are rows without an
  /// id. An all-blank desired set deletes everything without querying.
  pub fn multiple(
    &self,
    raw_contact_id: i64,
    mime: &str,
    fields: &[Field],
    desired: &[DesiredRow],
  ) -> Option<Vec<Operation>> {
    if self.skips(fields) {
      return Some(Vec::new());
    }
    if desired.iter().all(|r| r.blank) {
      return Some(vec![self.delete_all(raw_contact_id, mime)]);
    }

    let (claimed, new): (Vec<&DesiredRow>, Vec<&DesiredRow>) =
      desired.iter().partition(|r| r.id.is_some());
    let mut pending: BTreeMap<i64, &DesiredRow> = claimed
      .into_iter()
      .filter_map(|r| r.id.map(|id| (id, r)))
      .collect();

    let mut ops = Vec::new();
    for id in self.existing_ids(raw_contact_id, mime)? {
      match pending.remove(&id) {
        Some(row) if !row.blank => ops.extend(self.update(id, row)),
        _ => ops.push(self.delete(id)),
      }
    }

    let owner = Owner::Existing(raw_contact_id);
    for row in pending.into_values().chain(new).filter(|r| !r.blank) {
      ops.extend(self.insert(owner, mime, row));
    }
    Some(ops)
  }

  /// Reconcile group memberships by group id.
  ///
  /// Only groups in `account_groups` (the groups of the raw contact's
  /// account) are considered. Memberships of the account's default group are
  /// never deleted, and never inserted either: the store maintains them.
  pub fn group_memberships(
    &self,
    owner: Owner,
    desired: &[GroupMembership],
    account_groups: &[Group],
  ) -> Option<Vec<Operation>> {
    if self.skips(field::group_membership::ALL) {
      return Some(Vec::new());
    }
    let mime = MimeType::GroupMembership.to_string();
    let available: HashMap<i64, &Group> = account_groups
      .iter()
      .filter_map(|g| g.id.map(|id| (id, g)))
      .collect();
    let is_default =
      |group_id: i64| available.get(&group_id).is_some_and(|g| g.is_default());

    let mut wanted: BTreeSet<i64> = desired
      .iter()
      .filter_map(|m| m.group_id)
      .filter(|id| available.contains_key(id))
      .collect();

    let mut ops = Vec::new();
    if let Owner::Existing(raw_contact_id) = owner {
      let mut cursor = self.query(
        &[column::ID, field::group_membership::GROUP_ID.column],
        &of_mime(raw_contact_id, &mime),
      )?;
      while cursor.move_to_next() {
        let Some(row_id) = cursor.get(column::ID).as_i64() else { continue };
        match cursor.get(field::group_membership::GROUP_ID.column).as_i64() {
          Some(group_id) if wanted.remove(&group_id) || is_default(group_id) => {}
          _ => ops.push(self.delete(row_id)),
        }
      }
    }

    for group_id in wanted.into_iter().filter(|id| !is_default(*id)) {
      let row = DesiredRow::of(&GroupMembership::new(group_id));
      ops.extend(self.insert(owner, &mime, &row));
    }
    Some(ops)
  }
}

fn of_mime(raw_contact_id: i64, mime: &str) -> Where {
  equal_to(column::RAW_CONTACT_ID, raw_contact_id)
    .and(equal_to(column::MIMETYPE, mime))
}
