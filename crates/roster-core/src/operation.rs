//! Batch operations: the write primitive submitted to a
//! [`BatchExecutor`](crate::store::BatchExecutor).
//!
//! A batch is applied all-or-nothing. An insert may take a column value from
//! the id produced by an earlier insert in the same batch (a back reference),
//! which is how a raw contact and its data rows are created in one batch.

use crate::{predicate::Where, store::Table, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
  Insert,
  Update,
  Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
  pub kind:            OperationKind,
  pub table:           Table,
  /// Row selection for updates and deletes; ignored for inserts.
  pub selection:       Option<Where>,
  pub values:          Vec<(String, Value)>,
  /// `(column, index)`: set `column` to the id produced by the operation at
  /// `index` in the same batch.
  pub back_references: Vec<(String, usize)>,
}

impl Operation {
  fn new(kind: OperationKind, table: Table) -> Self {
    Self {
      kind,
      table,
      selection: None,
      values: Vec::new(),
      back_references: Vec::new(),
    }
  }

  pub fn insert(table: Table) -> Self { Self::new(OperationKind::Insert, table) }

  pub fn update(table: Table, selection: Where) -> Self {
    Self { selection: Some(selection), ..Self::new(OperationKind::Update, table) }
  }

  pub fn delete(table: Table, selection: Where) -> Self {
    Self { selection: Some(selection), ..Self::new(OperationKind::Delete, table) }
  }

  pub fn with_value(mut self, column: &str, value: impl Into<Value>) -> Self {
    self.set_value(column, value);
    self
  }

  pub fn set_value(&mut self, column: &str, value: impl Into<Value>) {
    let value = value.into();
    match self.values.iter_mut().find(|(c, _)| c == column) {
      Some((_, existing)) => *existing = value,
      None => self.values.push((column.to_owned(), value)),
    }
  }

  pub fn with_back_reference(mut self, column: &str, index: usize) -> Self {
    self.back_references.push((column.to_owned(), index));
    self
  }

  /// The value that will be written to `column`, if any.
  pub fn value(&self, column: &str) -> Option<&Value> {
    self.values.iter().find(|(c, _)| c == column).map(|(_, v)| v)
  }

  /// Whether this operation writes at least one column. Inserts and updates
  /// that write nothing are never submitted.
  pub fn has_values(&self) -> bool {
    !self.values.is_empty() || !self.back_references.is_empty()
  }
}

/// The outcome of one operation in a successfully applied batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationResult {
  /// Id of the inserted row (inserts only).
  pub id:    Option<i64>,
  /// Number of rows affected (updates and deletes only).
  pub count: Option<usize>,
}
