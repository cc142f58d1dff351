//! The Roster contacts façade.
//!
//! [`Contacts`] is the entry point. It holds the content store collaborators
//! (a [`RowSource`] for reads, a [`BatchExecutor`] for writes), the
//! permission and account oracles, and the custom-data registry, and hands
//! out typed builders for every query and write.
//!
//! Reads map cursor rows into contact graphs through the
//! [`ContactsMapper`](mapper::ContactsMapper). Writes are computed by the
//! operation builders in [`ops`] and submitted as one atomic batch per
//! entity. Expected failures never surface as errors: they show up in the
//! typed result of each builder.

use std::{collections::HashSet, sync::Arc};

use roster_core::{
  Cancel,
  account::Account,
  entity::Group,
  operation::{Operation, OperationResult},
  predicate::{Page, Where, sort_order},
  store::{
    AccountOracle, AllowAll, BatchExecutor, Cursor, PermissionOracle,
    RowSource, StaticAccounts, Table,
  },
};
use tracing::{debug, warn};

use crate::cursor::{GroupsCursor, TypedCursor as _};

pub mod cursor;
pub mod mapper;
pub mod ops;
pub mod registry;

mod accounts;
mod blocked;
mod data;
mod delete;
mod groups;
mod insert;
mod query;
mod select;
mod sim;
mod update;

pub use accounts::Accounts;
pub use blocked::{BlockedNumbers, BlockedNumbersInsert};
pub use data::{DataDelete, DataQuery, DataUpdate};
pub use delete::{ContactsDelete, DeleteResult};
pub use groups::{
  GroupsDelete, GroupsInsert, GroupsInsertFailure, GroupsInsertResult,
  GroupsQuery, GroupsUpdate,
};
pub use insert::{InsertFailure, InsertResult, RawContactsInsert};
pub use query::{ContactsQuery, RawContactsQuery};
pub use registry::{CountRestriction, CustomDataEntry, CustomDataRegistry};
pub use roster_core::{Error, Result};
pub use sim::SimContacts;
pub use update::{ContactsUpdate, UpdateResult};

/// The contacts façade.
///
/// Cloning is cheap; every collaborator is reference-counted.
#[derive(Clone)]
pub struct Contacts {
  source:         Arc<dyn RowSource + Send + Sync>,
  executor:       Arc<dyn BatchExecutor + Send + Sync>,
  permissions:    Arc<dyn PermissionOracle + Send + Sync>,
  account_oracle: Arc<dyn AccountOracle + Send + Sync>,
  registry:       CustomDataRegistry,
}

impl std::fmt::Debug for Contacts {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Contacts")
      .field("registry", &self.registry)
      .finish_non_exhaustive()
  }
}

impl Contacts {
  /// A façade over `store` that grants every permission and knows no
  /// accounts.
  pub fn new<S>(store: S) -> Self
  where
    S: RowSource + BatchExecutor + Send + Sync + 'static,
  {
    let store = Arc::new(store);
    Self {
      source:         store.clone(),
      executor:       store,
      permissions:    Arc::new(AllowAll),
      account_oracle: Arc::new(StaticAccounts::default()),
      registry:       CustomDataRegistry::new(),
    }
  }

  pub fn with_permissions(
    mut self,
    permissions: impl PermissionOracle + Send + Sync + 'static,
  ) -> Self {
    self.permissions = Arc::new(permissions);
    self
  }

  pub fn with_account_oracle(
    mut self,
    oracle: impl AccountOracle + Send + Sync + 'static,
  ) -> Self {
    self.account_oracle = Arc::new(oracle);
    self
  }

  pub fn with_registry(mut self, registry: CustomDataRegistry) -> Self {
    self.registry = registry;
    self
  }

  pub fn registry(&self) -> &CustomDataRegistry { &self.registry }

  // ─── Builders ──────────────────────────────────────────────────────────────

  pub fn query(&self) -> ContactsQuery<'_> { ContactsQuery::new(self, false) }

  pub fn raw_contacts_query(&self) -> RawContactsQuery<'_> {
    RawContactsQuery::new(self, false)
  }

  pub fn insert(&self) -> RawContactsInsert<'_> {
    RawContactsInsert::new(self, false)
  }

  pub fn update(&self) -> ContactsUpdate<'_> { ContactsUpdate::new(self, false) }

  pub fn delete(&self) -> ContactsDelete<'_> { ContactsDelete::new(self, false) }

  pub fn data_query<E: mapper::FromDataCursor>(&self) -> DataQuery<'_, E> {
    DataQuery::new(self, false)
  }

  pub fn data_update(&self) -> DataUpdate<'_> { DataUpdate::new(self, false) }

  pub fn data_delete(&self) -> DataDelete<'_> { DataDelete::new(self, false) }

  /// The device owner's profile. Profile builders only ever touch profile
  /// rows, and the builders above never do.
  pub fn profile(&self) -> Profile<'_> { Profile { contacts: self } }

  pub fn groups(&self) -> GroupsQuery<'_> { GroupsQuery::new(self) }

  pub fn groups_insert(&self) -> GroupsInsert<'_> { GroupsInsert::new(self) }

  pub fn groups_update(&self) -> GroupsUpdate<'_> { GroupsUpdate::new(self) }

  pub fn groups_delete(&self) -> GroupsDelete<'_> { GroupsDelete::new(self) }

  pub fn blocked_numbers(&self) -> BlockedNumbers<'_> {
    BlockedNumbers::new(self)
  }

  pub fn sim_contacts(&self) -> SimContacts<'_> { SimContacts::new(self) }

  pub fn accounts(&self) -> Accounts<'_> { Accounts::new(self) }

  // ─── Store access ──────────────────────────────────────────────────────────

  /// Run a query, logging failures. `None` if the store failed.
  fn rows(
    &self,
    table: Table,
    projection: &[&str],
    selection: Option<&Where>,
    order: Option<&str>,
  ) -> Option<Box<dyn Cursor + '_>> {
    debug!(%table, selection = selection.map(tracing::field::display), "query");
    let cursor = self.source.query(table, projection, selection, order);
    if cursor.is_none() {
      warn!(%table, "query failed");
    }
    cursor
  }

  /// Apply one batch. An empty batch trivially succeeds without touching the
  /// store.
  fn apply(&self, operations: Vec<Operation>) -> Option<Vec<OperationResult>> {
    if operations.is_empty() {
      return Some(Vec::new());
    }
    debug!(operations = operations.len(), "applying batch");
    let results = self.executor.apply_batch(operations);
    if results.is_none() {
      warn!("batch failed");
    }
    results
  }

  /// Distinct ids in column `id_column` of the rows matching `selection`.
  /// `None` if the store failed or `cancel` fired.
  fn ids_matching(
    &self,
    table: Table,
    id_column: &str,
    selection: &Where,
    cancel: Cancel<'_>,
  ) -> Option<Vec<i64>> {
    let mut cursor = self.rows(
      table,
      &[id_column],
      Some(selection),
      Some(&sort_order(&[], Page::default())),
    )?;
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    while cursor.move_to_next() {
      if cancel.is_cancelled() {
        return None;
      }
      if let Some(id) = cursor.get(id_column).as_i64()
        && seen.insert(id)
      {
        ids.push(id);
      }
    }
    Some(ids)
  }

  /// The groups `account` can hold memberships of.
  fn account_groups(&self, account: Option<&Account>) -> Option<Vec<Group>> {
    let selection = select::account(account);
    let mut cursor = GroupsCursor::new(self.rows(
      Table::Groups,
      select::GROUPS,
      Some(&selection),
      None,
    )?);
    let mut groups = Vec::new();
    while cursor.move_to_next() {
      groups.push(mapper::tables::group(&cursor));
    }
    Some(groups)
  }
}

/// Builders scoped to the device owner's profile.
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
  contacts: &'a Contacts,
}

impl<'a> Profile<'a> {
  pub fn query(&self) -> ContactsQuery<'a> {
    ContactsQuery::new(self.contacts, true)
  }

  pub fn raw_contacts_query(&self) -> RawContactsQuery<'a> {
    RawContactsQuery::new(self.contacts, true)
  }

  pub fn insert(&self) -> RawContactsInsert<'a> {
    RawContactsInsert::new(self.contacts, true)
  }

  pub fn update(&self) -> ContactsUpdate<'a> {
    ContactsUpdate::new(self.contacts, true)
  }

  pub fn delete(&self) -> ContactsDelete<'a> {
    ContactsDelete::new(self.contacts, true)
  }

  pub fn data_query<E: mapper::FromDataCursor>(&self) -> DataQuery<'a, E> {
    DataQuery::new(self.contacts, true)
  }

  pub fn data_update(&self) -> DataUpdate<'a> {
    DataUpdate::new(self.contacts, true)
  }

  pub fn data_delete(&self) -> DataDelete<'a> {
    DataDelete::new(self.contacts, true)
  }
}

#[cfg(test)]
mod tests;
