//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A builder received an argument outside its domain (e.g. a zero limit).
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// A custom mimetype reached dispatch without being registered. This is a
  /// model/registry inconsistency, never the result of user input.
  #[error("unsupported mimetype: {0:?}")]
  UnsupportedMimeType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
