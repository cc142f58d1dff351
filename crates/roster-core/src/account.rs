//! Accounts own raw contacts and groups.

use serde::{Deserialize, Serialize};

/// A sync account, identified by its name and type. A raw contact without an
/// account is "local" (unsynced).
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Account {
  pub name:         String,
  #[serde(rename = "type")]
  pub account_type: String,
}

impl Account {
  pub fn new(name: impl Into<String>, account_type: impl Into<String>) -> Self {
    Self { name: name.into(), account_type: account_type.into() }
  }
}
