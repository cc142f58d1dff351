//! A single cell of a row, as read from or written to the content store.

use serde::{Deserialize, Serialize};

/// The dynamically-typed value of one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Blob(Vec<u8>),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Integer view of the value. Text that parses as an integer is accepted
  /// because the store is loosely typed.
  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Integer(i) => Some(*i),
      Self::Real(r) => Some(*r as i64),
      Self::Text(s) => s.trim().parse().ok(),
      Self::Null | Self::Blob(_) => None,
    }
  }

  /// Boolean view; any non-zero integer is `true`.
  pub fn as_bool(&self) -> Option<bool> { self.as_i64().map(|i| i != 0) }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Text view; numbers are rendered in decimal.
  pub fn to_text(&self) -> Option<String> {
    match self {
      Self::Text(s) => Some(s.clone()),
      Self::Integer(i) => Some(i.to_string()),
      Self::Real(r) => Some(r.to_string()),
      Self::Null | Self::Blob(_) => None,
    }
  }

  pub fn as_blob(&self) -> Option<&[u8]> {
    match self {
      Self::Blob(b) => Some(b),
      _ => None,
    }
  }

  /// `true` for null, whitespace-only text and empty blobs. Numbers are never
  /// blank.
  pub fn is_blank(&self) -> bool {
    match self {
      Self::Null => true,
      Self::Text(s) => s.trim().is_empty(),
      Self::Blob(b) => b.is_empty(),
      Self::Integer(_) | Self::Real(_) => false,
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self { Self::Integer(i64::from(v)) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<Vec<u8>> for Value {
  fn from(v: Vec<u8>) -> Self { Self::Blob(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_integers_are_readable_as_numbers() {
    assert_eq!(Value::from("42").as_i64(), Some(42));
    assert_eq!(Value::from("x").as_i64(), None);
    assert_eq!(Value::from(true).as_i64(), Some(1));
  }

  #[test]
  fn blankness() {
    assert!(Value::Null.is_blank());
    assert!(Value::from("  ").is_blank());
    assert!(Value::Blob(vec![]).is_blank());
    assert!(!Value::from(0_i64).is_blank());
    assert!(!Value::from("a").is_blank());
    assert!(Value::from(None::<String>).is_null());
  }
}
