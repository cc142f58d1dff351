//! Error type for `roster-store-sqlite`.

use roster_core::store::Table;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// Another thread panicked while holding the connection.
  #[error("connection lock poisoned")]
  PoisonedConnection,

  /// A back reference pointed at an operation that produced no id.
  #[error("operation {0} has no id to refer back to")]
  BackReference(usize),

  #[error("{0} operation without a selection")]
  MissingSelection(Table),

  #[error("update of {0} writes no columns")]
  EmptyValues(Table),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
