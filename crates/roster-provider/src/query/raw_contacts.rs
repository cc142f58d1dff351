use std::collections::HashMap;

use roster_core::{
  Cancel, Result,
  account::Account,
  column,
  entity::RawContact,
  field::{self, Field, FieldSet},
  predicate::{OrderBy, Page, Where, is_in, sort_order},
  store::Table,
};
use tracing::debug;

use crate::{
  Contacts,
  cursor::{DataCursor, RawContactsCursor, TypedCursor as _},
  mapper::ContactsMapper,
  select,
};

/// Query raw contacts directly. `filter` and `order_by` apply to raw contact
/// columns.
#[derive(Debug, Clone)]
pub struct RawContactsQuery<'a> {
  contacts:  &'a Contacts,
  profile:   bool,
  include:   Option<FieldSet>,
  selection: Option<Where>,
  accounts:  Vec<Option<Account>>,
  order_by:  Vec<OrderBy>,
  page:      Page,
}

impl<'a> RawContactsQuery<'a> {
  pub(crate) fn new(contacts: &'a Contacts, profile: bool) -> Self {
    Self {
      contacts,
      profile,
      include: None,
      selection: None,
      accounts: Vec::new(),
      order_by: Vec::new(),
      page: Page::default(),
    }
  }

  pub fn include<'f>(mut self, fields: impl IntoIterator<Item = &'f Field>) -> Self {
    self.include = Some(field::set(fields));
    self
  }

  pub fn filter(mut self, selection: Where) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn accounts(
    mut self,
    accounts: impl IntoIterator<Item = Option<Account>>,
  ) -> Self {
    self.accounts.extend(accounts);
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

  pub fn find(&self) -> Vec<RawContact> { self.find_with_cancel(Cancel::never()) }

  /// Raw contacts in the requested order, each with its data.
  pub fn find_with_cancel(&self, cancel: Cancel<'_>) -> Vec<RawContact> {
    if !self.contacts.permissions.can_query() {
      debug!("query permission denied");
      return Vec::new();
    }
    self.run(cancel).unwrap_or_default()
  }

  fn run(&self, cancel: Cancel<'_>) -> Option<Vec<RawContact>> {
    let c = self.contacts;
    let selection =
      Where::and_opt(self.selection.clone(), select::accounts(&self.accounts));
    let mut raw_contacts = RawContactsCursor::new(c.rows(
      Table::raw_contacts(self.profile),
      select::RAW_CONTACTS,
      selection.as_ref(),
      Some(&sort_order(&self.order_by, self.page)),
    )?);
    let mut order = HashMap::new();
    while raw_contacts.move_to_next() {
      if let Some(id) = raw_contacts.long(column::ID) {
        let position = order.len();
        order.entry(id).or_insert(position);
      }
    }
    if order.is_empty() {
      return Some(Vec::new());
    }

    let projection = select::data_projection(self.include.as_ref(), &c.registry);
    let mut data = DataCursor::new(c.rows(
      Table::data(self.profile),
      &projection,
      Some(&is_in(column::RAW_CONTACT_ID, order.keys().copied())),
      None,
    )?);

    let mut mapper =
      ContactsMapper::new(&c.registry, self.include.as_ref(), cancel);
    mapper
      .process_raw_contacts_cursor(&mut raw_contacts)
      .process_data_cursor(&mut data);
    let mut found: Vec<RawContact> = mapper
      .map()
      .into_iter()
      .flat_map(|contact| contact.raw_contacts)
      .filter(|raw| raw.id.is_some_and(|id| order.contains_key(&id)))
      .collect();
    found.sort_by_key(|raw| raw.id.and_then(|id| order.get(&id).copied()));
    Some(found)
  }
}
