//! [`SqliteStore`]: the SQLite implementation of [`RowSource`] and
//! [`BatchExecutor`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use rusqlite::{Connection, types::ValueRef};
use tracing::{debug, warn};

use roster_core::{
  account::Account,
  operation::{Operation, OperationKind, OperationResult},
  predicate::Where,
  store::{BatchExecutor, Cursor, MemoryCursor, RowSource, Table},
  value::Value,
};

use crate::{Error, Result, schema::schema};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A content store backed by a single SQLite database.
///
/// The connection is shared behind a mutex; every query and every batch
/// holds it for its whole duration, so batches are serialised.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").finish_non_exhaustive()
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(Connection::open(path)?)
  }

  /// Open an in-memory store, for tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(&schema())?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| Error::PoisonedConnection)
  }

  /// Register `account` on the device: create its read-only system groups,
  /// the default group new raw contacts join and the favorites group.
  /// Does nothing if they already exist.
  pub fn add_account(&self, account: &Account) -> Result<()> {
    let conn = self.conn()?;
    for (title, favorites, auto_add) in
      [("My Contacts", false, true), ("Starred in Android", true, false)]
    {
      conn.execute(
        "INSERT INTO \"groups\"
           (title, group_is_read_only, favorites, auto_add, account_name, account_type)
         SELECT ?1, 1, ?2, ?3, ?4, ?5
          WHERE NOT EXISTS (
            SELECT 1 FROM \"groups\"
             WHERE title = ?1 AND account_name = ?4 AND account_type = ?5)",
        rusqlite::params![title, favorites, auto_add, account.name, account.account_type],
      )?;
    }
    debug!(account = %account.name, "account added");
    Ok(())
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  fn select(
    &self,
    table: Table,
    projection: &[&str],
    selection: Option<&Where>,
    sort_order: Option<&str>,
  ) -> Result<MemoryCursor> {
    let mut sql = format!("SELECT {} FROM \"{}\"", projection.join(", "), view(table));
    if let Some(selection) = selection {
      sql.push_str(&format!(" WHERE {selection}"));
    }
    if let Some(order) = sort_order {
      sql.push_str(&format!(" ORDER BY {order}"));
    }

    let conn = self.conn()?;
    let mut stmt = conn.prepare(&sql)?;
    let width = stmt.column_count();
    let rows = stmt
      .query_map([], |row| {
        (0..width)
          .map(|i| row.get_ref(i).map(decode))
          .collect::<rusqlite::Result<Vec<Value>>>()
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(MemoryCursor::new(projection, rows))
  }

  // ─── Writes ────────────────────────────────────────────────────────────────

  fn apply(&self, operations: &[Operation]) -> Result<Vec<OperationResult>> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    let mut results: Vec<OperationResult> = Vec::with_capacity(operations.len());

    for operation in operations {
      let table = <&'static str>::from(operation.table);
      let mut columns: Vec<&str> = Vec::new();
      let mut params: Vec<rusqlite::types::Value> = Vec::new();
      for (column, value) in &operation.values {
        columns.push(column);
        params.push(encode(value));
      }
      for (column, index) in &operation.back_references {
        let id = results
          .get(*index)
          .and_then(|r| r.id)
          .ok_or(Error::BackReference(*index))?;
        columns.push(column);
        params.push(rusqlite::types::Value::Integer(id));
      }

      let result = match operation.kind {
        OperationKind::Insert => {
          let sql = if columns.is_empty() {
            format!("INSERT INTO \"{table}\" DEFAULT VALUES")
          } else {
            let placeholders: Vec<String> =
              (1..=columns.len()).map(|i| format!("?{i}")).collect();
            format!(
              "INSERT INTO \"{table}\" ({}) VALUES ({})",
              columns.join(", "),
              placeholders.join(", ")
            )
          };
          tx.execute(&sql, rusqlite::params_from_iter(params))?;
          OperationResult { id: Some(tx.last_insert_rowid()), count: None }
        }
        OperationKind::Update => {
          if columns.is_empty() {
            return Err(Error::EmptyValues(operation.table));
          }
          let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c} = ?{}", i + 1))
            .collect();
          let sql = format!(
            "UPDATE \"{table}\" SET {} WHERE {}",
            assignments.join(", "),
            selection(operation)?
          );
          let count = tx.execute(&sql, rusqlite::params_from_iter(params))?;
          OperationResult { id: None, count: Some(count) }
        }
        OperationKind::Delete => {
          let sql = format!("DELETE FROM \"{table}\" WHERE {}", selection(operation)?);
          let count = tx.execute(&sql, [])?;
          OperationResult { id: None, count: Some(count) }
        }
      };
      results.push(result);
    }

    tx.commit()?;
    Ok(results)
  }
}

fn selection(operation: &Operation) -> Result<&Where> {
  operation
    .selection
    .as_ref()
    .ok_or(Error::MissingSelection(operation.table))
}

/// Contacts, raw contacts and data are read through views carrying the
/// joined columns; the other tables are read directly.
fn view(table: Table) -> String {
  let name = <&'static str>::from(table);
  match table {
    Table::Groups | Table::BlockedNumbers | Table::SimContacts => name.to_owned(),
    _ => format!("{name}_view"),
  }
}

fn decode(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(r) => Value::Real(r),
    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::Blob(b.to_vec()),
  }
}

fn encode(value: &Value) -> rusqlite::types::Value {
  use rusqlite::types::Value as Sql;
  match value {
    Value::Null => Sql::Null,
    Value::Integer(i) => Sql::Integer(*i),
    Value::Real(r) => Sql::Real(*r),
    Value::Text(s) => Sql::Text(s.clone()),
    Value::Blob(b) => Sql::Blob(b.clone()),
  }
}

// ─── Collaborator traits ─────────────────────────────────────────────────────

impl RowSource for SqliteStore {
  fn query(
    &self,
    table: Table,
    projection: &[&str],
    selection: Option<&Where>,
    sort_order: Option<&str>,
  ) -> Option<Box<dyn Cursor + '_>> {
    match self.select(table, projection, selection, sort_order) {
      Ok(cursor) => Some(Box::new(cursor)),
      Err(error) => {
        warn!(%table, %error, "query failed");
        None
      }
    }
  }
}

impl BatchExecutor for SqliteStore {
  fn apply_batch(&self, operations: Vec<Operation>) -> Option<Vec<OperationResult>> {
    match self.apply(&operations) {
      Ok(results) => Some(results),
      Err(error) => {
        warn!(operations = operations.len(), %error, "batch rolled back");
        None
      }
    }
  }
}
