//! Collaborator traits: the content store and the platform oracles.
//!
//! The façade never talks to storage directly. Reads go through a
//! [`RowSource`] that hands back a [`Cursor`]; writes are submitted as
//! batches to a [`BatchExecutor`]. Both report failure as `None` rather than
//! an error, matching the store's "exceptions are suppressed" contract.

use std::collections::HashMap;

use strum::{Display, IntoStaticStr};

use crate::{
  account::Account, operation::Operation, operation::OperationResult,
  predicate::Where, value::Value,
};

// ─── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  Contacts,
  RawContacts,
  Data,
  ProfileContacts,
  ProfileRawContacts,
  ProfileData,
  Groups,
  BlockedNumbers,
  SimContacts,
}

impl Table {
  pub fn contacts(profile: bool) -> Self {
    if profile { Self::ProfileContacts } else { Self::Contacts }
  }

  pub fn raw_contacts(profile: bool) -> Self {
    if profile { Self::ProfileRawContacts } else { Self::RawContacts }
  }

  pub fn data(profile: bool) -> Self {
    if profile { Self::ProfileData } else { Self::Data }
  }

  pub fn is_profile(self) -> bool {
    matches!(
      self,
      Self::ProfileContacts | Self::ProfileRawContacts | Self::ProfileData
    )
  }
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// A forward-only, re-positionable view over the rows of a query result.
///
/// A fresh cursor is positioned before the first row; call
/// [`move_to_next`](Cursor::move_to_next) to advance.
pub trait Cursor {
  fn count(&self) -> usize;

  /// Advance to the next row. Returns `false` once past the last row.
  fn move_to_next(&mut self) -> bool;

  /// Move back to before the first row so the result can be scanned again.
  fn reset_position(&mut self);

  /// The value of `column` in the current row; `Value::Null` if the column
  /// was not projected or the cursor is not on a row.
  fn get(&self, column: &str) -> Value;
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
  fn count(&self) -> usize { (**self).count() }

  fn move_to_next(&mut self) -> bool { (**self).move_to_next() }

  fn reset_position(&mut self) { (**self).reset_position() }

  fn get(&self, column: &str) -> Value { (**self).get(column) }
}

/// A fully materialised cursor.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
  columns:  HashMap<String, usize>,
  rows:     Vec<Vec<Value>>,
  position: Option<usize>,
}

impl MemoryCursor {
  pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
    Self {
      columns: columns
        .iter()
        .enumerate()
        .map(|(i, c)| ((*c).to_owned(), i))
        .collect(),
      rows,
      position: None,
    }
  }

  /// Build from rows of `(column, value)` pairs; columns missing from a row
  /// read as null.
  pub fn from_records(records: Vec<Vec<(&str, Value)>>) -> Self {
    let mut columns: Vec<&str> = Vec::new();
    for record in &records {
      for (column, _) in record {
        if !columns.contains(column) {
          columns.push(*column);
        }
      }
    }
    let rows = records
      .iter()
      .map(|record| {
        columns
          .iter()
          .map(|c| {
            record
              .iter()
              .find(|(rc, _)| rc == c)
              .map(|(_, v)| v.clone())
              .unwrap_or_default()
          })
          .collect()
      })
      .collect();
    Self::new(&columns, rows)
  }
}

impl Cursor for MemoryCursor {
  fn count(&self) -> usize { self.rows.len() }

  fn move_to_next(&mut self) -> bool {
    let next = self.position.map_or(0, |p| p + 1);
    if next < self.rows.len() {
      self.position = Some(next);
      true
    } else {
      self.position = Some(self.rows.len());
      false
    }
  }

  fn reset_position(&mut self) { self.position = None; }

  fn get(&self, column: &str) -> Value {
    let (Some(row), Some(&index)) = (
      self.position.and_then(|p| self.rows.get(p)),
      self.columns.get(column),
    ) else {
      return Value::Null;
    };
    row.get(index).cloned().unwrap_or_default()
  }
}

// ─── Row source / batch executor ─────────────────────────────────────────────

/// The read half of the content store.
pub trait RowSource {
  /// Run a query. `sort_order` is the textual
  /// `"<orderings> LIMIT <n> OFFSET <m>"` fragment. Returns `None` on any
  /// failure.
  fn query(
    &self,
    table: Table,
    projection: &[&str],
    selection: Option<&Where>,
    sort_order: Option<&str>,
  ) -> Option<Box<dyn Cursor + '_>>;
}

/// The write half of the content store.
pub trait BatchExecutor {
  /// Apply `operations` atomically. Returns one result per operation, or
  /// `None` if the batch failed and nothing was applied.
  fn apply_batch(
    &self,
    operations: Vec<Operation>,
  ) -> Option<Vec<OperationResult>>;
}

// ─── Oracles ─────────────────────────────────────────────────────────────────

/// Whether the caller holds the permissions needed for each kind of access.
pub trait PermissionOracle {
  fn can_query(&self) -> bool;
  fn can_insert(&self) -> bool;
  fn can_update_delete(&self) -> bool;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
  fn can_query(&self) -> bool { true }

  fn can_insert(&self) -> bool { true }

  fn can_update_delete(&self) -> bool { true }
}

/// Knows which accounts exist on the system.
pub trait AccountOracle {
  fn is_in_system(&self, account: &Account) -> bool;

  /// `Some(account)` only if it is in the system.
  fn null_if_not_in_system(&self, account: Option<&Account>) -> Option<Account> {
    account.filter(|a| self.is_in_system(a)).cloned()
  }
}

/// A fixed list of accounts.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts(pub Vec<Account>);

impl AccountOracle for StaticAccounts {
  fn is_in_system(&self, account: &Account) -> bool {
    self.0.contains(account)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_cursor_rescans_after_reset() {
    let mut c = MemoryCursor::new(
      &["_id", "title"],
      vec![vec![1_i64.into(), "a".into()], vec![2_i64.into(), "b".into()]],
    );
    assert_eq!(c.get("_id"), Value::Null);

    let mut seen = vec![];
    while c.move_to_next() {
      seen.push(c.get("_id").as_i64().unwrap());
    }
    assert!(!c.move_to_next());
    c.reset_position();
    assert!(c.move_to_next());
    assert_eq!(c.get("title"), Value::from("a"));
    assert_eq!(seen, vec![1, 2]);
    assert_eq!(c.get("missing"), Value::Null);
  }

  #[test]
  fn from_records_fills_missing_columns() {
    let mut c = MemoryCursor::from_records(vec![
      vec![("_id", 1_i64.into())],
      vec![("_id", 2_i64.into()), ("data1", "x".into())],
    ]);
    assert!(c.move_to_next());
    assert_eq!(c.get("data1"), Value::Null);
    assert!(c.move_to_next());
    assert_eq!(c.get("data1"), Value::from("x"));
  }

  #[test]
  fn table_names_are_snake_case() {
    let name: &'static str = Table::ProfileRawContacts.into();
    assert_eq!(name, "profile_raw_contacts");
    assert_eq!(Table::BlockedNumbers.to_string(), "blocked_numbers");
  }
}
