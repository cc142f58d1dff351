//! Groups: account-scoped labels raw contacts can be members of.
//!
//! Titles are unique within an account. Read-only groups (system groups such
//! as the account's default group) cannot be renamed or deleted.

use std::collections::BTreeMap;

use roster_core::{
  Result,
  account::Account,
  column,
  entity::Group,
  operation::Operation,
  predicate::{OrderBy, Page, Where, equal_to, is_in, sort_order},
  store::Table,
};
use serde::Serialize;
use tracing::debug;

use crate::{
  Contacts,
  cursor::{GroupsCursor, TypedCursor as _},
  mapper, select,
};

/// Groups matching `selection`, in `order`. `None` if the store failed.
fn load(
  contacts: &Contacts,
  selection: Option<&Where>,
  order: Option<&str>,
) -> Option<Vec<Group>> {
  let mut cursor =
    GroupsCursor::new(contacts.rows(Table::Groups, select::GROUPS, selection, order)?);
  let mut groups = Vec::with_capacity(cursor.count());
  while cursor.move_to_next() {
    groups.push(mapper::tables::group(&cursor));
  }
  Some(groups)
}

fn title_taken(groups: &[Group], title: &str, except: Option<i64>) -> bool {
  groups
    .iter()
    .any(|g| g.title == title && (except.is_none() || g.id != except))
}

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GroupsQuery<'a> {
  contacts:  &'a Contacts,
  selection: Option<Where>,
  accounts:  Vec<Option<Account>>,
  order_by:  Vec<OrderBy>,
  page:      Page,
}

impl<'a> GroupsQuery<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self {
    Self {
      contacts,
      selection: None,
      accounts: Vec::new(),
      order_by: Vec::new(),
      page: Page::default(),
    }
  }

  /// Only groups of these accounts (`None`: local groups).
  pub fn accounts(
    mut self,
    accounts: impl IntoIterator<Item = Option<Account>>,
  ) -> Self {
    self.accounts.extend(accounts);
    self
  }

  pub fn filter(mut self, selection: Where) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn order_by(mut self, order: OrderBy) -> Self {
    self.order_by.push(order);
    self
  }

  pub fn limit(mut self, limit: usize) -> Result<Self> {
    self.page.limit = Page::checked_limit(limit)?;
    Ok(self)
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.page.offset = offset;
    self
  }

  pub fn find(&self) -> Vec<Group> {
    let c = self.contacts;
    if !c.permissions.can_query() {
      debug!("groups query permission denied");
      return Vec::new();
    }
    let selection =
      Where::and_opt(self.selection.clone(), select::accounts(&self.accounts));
    load(c, selection.as_ref(), Some(&sort_order(&self.order_by, self.page)))
      .unwrap_or_default()
  }
}

// ─── Insert ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupsInsertFailure {
  /// The account already has a group with this title.
  TitleAlreadyExists,
  /// Groups need an account that is in the system.
  InvalidAccount,
  /// Permission denied or the store rejected the insert.
  Unknown,
}

/// One outcome per group, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupsInsertResult {
  pub results: Vec<Result<i64, GroupsInsertFailure>>,
}

impl GroupsInsertResult {
  pub fn is_successful(&self) -> bool { self.results.iter().all(|r| r.is_ok()) }

  pub fn group_id(&self, index: usize) -> Option<i64> {
    self.results.get(index)?.ok()
  }

  pub fn failure(&self, index: usize) -> Option<GroupsInsertFailure> {
    self.results.get(index)?.err()
  }
}

/// Insert new groups, one batch each. Only the title and account are
/// written; new groups are never read-only.
#[derive(Debug)]
pub struct GroupsInsert<'a> {
  contacts: &'a Contacts,
  groups:   Vec<Group>,
}

impl<'a> GroupsInsert<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self {
    Self { contacts, groups: Vec::new() }
  }

  pub fn group(mut self, group: Group) -> Self {
    self.groups.push(group);
    self
  }

  pub fn groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
    self.groups.extend(groups);
    self
  }

  pub fn commit(self) -> GroupsInsertResult {
    use GroupsInsertFailure::*;

    let c = self.contacts;
    if !c.permissions.can_insert() {
      debug!("groups insert permission denied");
      return GroupsInsertResult { results: vec![Err(Unknown); self.groups.len()] };
    }

    let mut existing: BTreeMap<Account, Vec<Group>> = BTreeMap::new();
    let mut results = Vec::with_capacity(self.groups.len());
    for group in self.groups {
      let Some(account) = group
        .account
        .as_ref()
        .filter(|a| c.account_oracle.is_in_system(a))
      else {
        results.push(Err(InvalidAccount));
        continue;
      };
      if !existing.contains_key(account) {
        let Some(groups) = c.account_groups(Some(account)) else {
          results.push(Err(Unknown));
          continue;
        };
        existing.insert(account.clone(), groups);
      }
      let Some(taken) = existing.get_mut(account) else { continue };
      if title_taken(taken, &group.title, None) {
        results.push(Err(TitleAlreadyExists));
        continue;
      }

      let op = Operation::insert(Table::Groups)
        .with_value(column::TITLE, group.title.as_str())
        .with_value(column::ACCOUNT_NAME, account.name.as_str())
        .with_value(column::ACCOUNT_TYPE, account.account_type.as_str());
      let id = c.apply(vec![op]).and_then(|r| r.first().and_then(|r| r.id));
      match id {
        Some(id) => {
          taken.push(Group { id: Some(id), ..group });
          results.push(Ok(id));
        }
        None => results.push(Err(Unknown)),
      }
    }
    GroupsInsertResult { results }
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Rename groups. Only the title is writable; read-only groups and titles
/// already used in the group's account are refused.
#[derive(Debug)]
pub struct GroupsUpdate<'a> {
  contacts: &'a Contacts,
  groups:   Vec<Group>,
}

impl<'a> GroupsUpdate<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self {
    Self { contacts, groups: Vec::new() }
  }

  pub fn group(mut self, group: Group) -> Self {
    self.groups.push(group);
    self
  }

  pub fn groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
    self.groups.extend(groups);
    self
  }

  /// Outcome per group id. Groups without an id are ignored.
  pub fn commit(self) -> BTreeMap<i64, bool> {
    let c = self.contacts;
    let ids: Vec<i64> = self.groups.iter().filter_map(|g| g.id).collect();
    let mut results: BTreeMap<i64, bool> = ids.iter().map(|id| (*id, false)).collect();
    if !c.permissions.can_update_delete() {
      debug!("groups update permission denied");
      return results;
    }
    if ids.is_empty() {
      return results;
    }
    let Some(stored) = load(c, Some(&is_in(column::ID, ids)), None) else {
      return results;
    };

    for group in &self.groups {
      let Some(id) = group.id else { continue };
      let Some(current) = stored.iter().find(|g| g.id == Some(id)) else {
        continue;
      };
      if current.read_only {
        continue;
      }
      if current.title == group.title {
        results.insert(id, true);
        continue;
      }
      let Some(siblings) = c.account_groups(current.account.as_ref()) else {
        continue;
      };
      if title_taken(&siblings, &group.title, Some(id)) {
        continue;
      }
      let op = Operation::update(Table::Groups, equal_to(column::ID, id))
        .with_value(column::TITLE, group.title.as_str());
      results.insert(id, c.apply(vec![op]).is_some());
    }
    results
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// Delete groups in a single batch. Read-only groups are refused. The store
/// removes the memberships of deleted groups.
#[derive(Debug)]
pub struct GroupsDelete<'a> {
  contacts: &'a Contacts,
  ids:      Vec<i64>,
}

impl<'a> GroupsDelete<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self {
    Self { contacts, ids: Vec::new() }
  }

  pub fn groups<'g>(mut self, groups: impl IntoIterator<Item = &'g Group>) -> Self {
    self.ids.extend(groups.into_iter().filter_map(|g| g.id));
    self
  }

  pub fn ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
    self.ids.extend(ids);
    self
  }

  /// Outcome per group id.
  pub fn commit(self) -> BTreeMap<i64, bool> {
    let c = self.contacts;
    let mut results: BTreeMap<i64, bool> =
      self.ids.iter().map(|id| (*id, false)).collect();
    if !c.permissions.can_update_delete() {
      debug!("groups delete permission denied");
      return results;
    }
    if self.ids.is_empty() {
      return results;
    }
    let Some(stored) = load(c, Some(&is_in(column::ID, self.ids)), None) else {
      return results;
    };

    let deletable: Vec<i64> = stored
      .iter()
      .filter(|g| !g.read_only)
      .filter_map(|g| g.id)
      .collect();
    let batch = deletable
      .iter()
      .map(|id| Operation::delete(Table::Groups, equal_to(column::ID, *id)))
      .collect();
    if let Some(outcomes) = c.apply(batch) {
      for (id, outcome) in deletable.into_iter().zip(outcomes) {
        results.insert(id, outcome.count.unwrap_or(0) > 0);
      }
    }
    results
  }
}
