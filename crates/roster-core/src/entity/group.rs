//! Groups and the adjacent single-table entities.

use serde::{Deserialize, Serialize};

use crate::account::Account;

/// An account-scoped group of raw contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub id:        Option<i64>,
  pub title:     String,
  pub read_only: bool,
  /// The account's "favorites" group; membership mirrors starring.
  pub favorites: bool,
  /// The account's default group; new raw contacts join it automatically.
  pub auto_add:  bool,
  pub account:   Option<Account>,
}

impl Group {
  pub fn new(title: impl Into<String>, account: Option<Account>) -> Self {
    Self { title: title.into(), account, ..Self::default() }
  }

  pub fn is_default(&self) -> bool { self.auto_add }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedNumber {
  pub id:                Option<i64>,
  pub number:            String,
  pub normalized_number: Option<String>,
}

/// A contact stored on the SIM card: a name and a number, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimContact {
  pub id:     Option<i64>,
  pub name:   Option<String>,
  pub number: Option<String>,
}

impl SimContact {
  pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
    Self { id: None, name: Some(name.into()), number: Some(number.into()) }
  }

  pub fn is_blank(&self) -> bool {
    crate::entity::all_blank(&[&self.name, &self.number])
  }
}
