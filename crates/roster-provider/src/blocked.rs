//! The blocked numbers list.

use std::collections::BTreeMap;

use roster_core::{
  Result, column,
  entity::BlockedNumber,
  operation::Operation,
  predicate::{OrderBy, Page, Where, equal_to, sort_order},
  store::Table,
};
use tracing::debug;

use crate::{
  Contacts,
  cursor::{BlockedNumbersCursor, TypedCursor as _},
  mapper, select,
};

/// Query and delete blocked numbers; [`insert`](Self::insert) adds new ones.
#[derive(Debug, Clone)]
pub struct BlockedNumbers<'a> {
  contacts:  &'a Contacts,
  selection: Option<Where>,
  order_by:  Vec<OrderBy>,
  page:      Page,
}

impl<'a> BlockedNumbers<'a> {
  pub(crate) fn new(contacts: &'a Contacts) -> Self {
    Self {
      contacts,
      selection: None,
      order_by: Vec::new(),
      page: Page::default(),
    }
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

  pub fn find(&self) -> Vec<BlockedNumber> {
    let c = self.contacts;
    if !c.permissions.can_query() {
      debug!("blocked numbers query permission denied");
      return Vec::new();
    }
    let Some(rows) = c.rows(
      Table::BlockedNumbers,
      select::BLOCKED_NUMBERS,
      self.selection.as_ref(),
      Some(&sort_order(&self.order_by, self.page)),
    ) else {
      return Vec::new();
    };
    let mut cursor = BlockedNumbersCursor::new(rows);
    let mut found = Vec::with_capacity(cursor.count());
    while cursor.move_to_next() {
      found.push(mapper::tables::blocked_number(&cursor));
    }
    found
  }

  /// Whether `number` is blocked, comparing the number as entered.
  pub fn is_blocked(&self, number: &str) -> bool {
    !self
      .clone()
      .filter(equal_to(column::ORIGINAL_NUMBER, number))
      .find()
      .is_empty()
  }

  pub fn insert(&self) -> BlockedNumbersInsert<'a> {
    BlockedNumbersInsert { contacts: self.contacts, numbers: Vec::new() }
  }

  /// Unblock by id, in a single batch. Outcome per id.
  pub fn delete(&self, ids: impl IntoIterator<Item = i64>) -> BTreeMap<i64, bool> {
    let c = self.contacts;
    let mut results: BTreeMap<i64, bool> = ids.into_iter().map(|id| (id, false)).collect();
    if !c.permissions.can_update_delete() {
      debug!("blocked numbers delete permission denied");
      return results;
    }
    let ids: Vec<i64> = results.keys().copied().collect();
    let batch = ids
      .iter()
      .map(|id| Operation::delete(Table::BlockedNumbers, equal_to(column::ID, *id)))
      .collect();
    if let Some(outcomes) = c.apply(batch) {
      for (id, outcome) in ids.into_iter().zip(outcomes) {
        results.insert(id, outcome.count.unwrap_or(0) > 0);
      }
    }
    results
  }

  /// Unblock every entry for `number`. `true` if at least one was removed.
  pub fn unblock(&self, number: &str) -> bool {
    let ids: Vec<i64> = self
      .clone()
      .filter(equal_to(column::ORIGINAL_NUMBER, number))
      .find()
      .into_iter()
      .filter_map(|b| b.id)
      .collect();
    !ids.is_empty() && self.delete(ids).values().all(|ok| *ok)
  }
}

/// Block numbers, one batch each. Blank numbers are refused.
#[derive(Debug)]
pub struct BlockedNumbersInsert<'a> {
  contacts: &'a Contacts,
  numbers:  Vec<BlockedNumber>,
}

impl BlockedNumbersInsert<'_> {
  pub fn number(mut self, number: impl Into<String>) -> Self {
    self.numbers.push(BlockedNumber { number: number.into(), ..BlockedNumber::default() });
    self
  }

  pub fn blocked_numbers(
    mut self,
    numbers: impl IntoIterator<Item = BlockedNumber>,
  ) -> Self {
    self.numbers.extend(numbers);
    self
  }

  /// The new row id per number, in submission order.
  pub fn commit(self) -> Vec<Option<i64>> {
    let c = self.contacts;
    if !c.permissions.can_insert() {
      debug!("blocked numbers insert permission denied");
      return vec![None; self.numbers.len()];
    }
    self
      .numbers
      .iter()
      .map(|blocked| {
        if blocked.number.trim().is_empty() {
          return None;
        }
        let op = Operation::insert(Table::BlockedNumbers)
          .with_value(column::ORIGINAL_NUMBER, blocked.number.as_str())
          .with_value(column::E164_NUMBER, blocked.normalized_number.clone());
        c.apply(vec![op])?.first()?.id
      })
      .collect()
  }
}

