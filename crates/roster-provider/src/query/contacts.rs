use roster_core::{
  Cancel, Result,
  account::Account,
  column,
  entity::Contact,
  field::{self, Field, FieldSet},
  predicate::{OrderBy, Page, Where, is_in, sort_order},
  store::Table,
};
use tracing::debug;

use crate::{
  Contacts,
  cursor::{ContactsCursor, DataCursor, RawContactsCursor, TypedCursor as _},
  mapper::ContactsMapper,
  select,
};

/// Query contacts, matching on data.
///
/// `filter` applies to the data table (which also carries the raw contact's
/// account and the contact's display name). A contact matches if any of its
/// data rows does. `order_by`, `limit` and `offset` apply to contacts.
#[derive(Debug, Clone)]
pub struct ContactsQuery<'a> {
  contacts:  &'a Contacts,
  profile:   bool,
  include:   Option<FieldSet>,
  selection: Option<Where>,
  accounts:  Vec<Option<Account>>,
  order_by:  Vec<OrderBy>,
  page:      Page,
}

impl<'a> ContactsQuery<'a> {
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

  /// Read only these fields; the common data fields are always read.
  pub fn include<'f>(mut self, fields: impl IntoIterator<Item = &'f Field>) -> Self {
    self.include = Some(field::set(fields));
    self
  }

  pub fn filter(mut self, selection: Where) -> Self {
    self.selection = Some(selection);
    self
  }

  /// Only raw contacts of these accounts (`None`: local) and their data are
  /// returned; contacts without any are left out.
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

  pub fn find(&self) -> Vec<Contact> { self.find_with_cancel(Cancel::never()) }

  /// The first matching contact. For the profile this is the profile
  /// contact, if there is one.
  pub fn find_one(&self) -> Option<Contact> {
    let mut one = self.clone();
    one.page.limit = 1;
    one.find().into_iter().next()
  }

  /// Run the query. Returns nothing if permission is denied, the store fails
  /// or `cancel` fires at any point.
  pub fn find_with_cancel(&self, cancel: Cancel<'_>) -> Vec<Contact> {
    let c = self.contacts;
    if !c.permissions.can_query() {
      debug!("query permission denied");
      return Vec::new();
    }
    self.run(cancel).unwrap_or_default()
  }

  fn run(&self, cancel: Cancel<'_>) -> Option<Vec<Contact>> {
    let c = self.contacts;
    let accounts = select::accounts(&self.accounts);

    // Data rows carry their raw contact's account, so a data filter is
    // narrowed there; an account filter alone goes to the raw contacts table,
    // which also covers raw contacts without data.
    let matched = if let Some(selection) = &self.selection {
      let selection = match &accounts {
        Some(accounts) => selection.clone().and(accounts.clone()),
        None => selection.clone(),
      };
      Some(c.ids_matching(
        Table::data(self.profile),
        column::CONTACT_ID,
        &selection,
        cancel,
      )?)
    } else if let Some(accounts) = &accounts {
      Some(c.ids_matching(
        Table::raw_contacts(self.profile),
        column::CONTACT_ID,
        accounts,
        cancel,
      )?)
    } else {
      None
    };
    if matched.as_ref().is_some_and(Vec::is_empty) {
      return Some(Vec::new());
    }

    let mut contacts = ContactsCursor::new(c.rows(
      Table::contacts(self.profile),
      select::CONTACTS,
      matched.map(|ids| is_in(column::ID, ids)).as_ref(),
      Some(&sort_order(&self.order_by, self.page)),
    )?);
    let mut ids = Vec::with_capacity(contacts.count());
    while contacts.move_to_next() {
      ids.extend(contacts.long(column::ID));
    }
    if ids.is_empty() {
      return Some(Vec::new());
    }

    let owned = Where::and_opt(Some(is_in(column::CONTACT_ID, ids)), accounts);
    let mut raw_contacts = RawContactsCursor::new(c.rows(
      Table::raw_contacts(self.profile),
      select::RAW_CONTACTS,
      owned.as_ref(),
      None,
    )?);
    let projection = select::data_projection(self.include.as_ref(), &c.registry);
    let mut data = DataCursor::new(c.rows(
      Table::data(self.profile),
      &projection,
      owned.as_ref(),
      None,
    )?);

    let mut mapper =
      ContactsMapper::new(&c.registry, self.include.as_ref(), cancel);
    mapper
      .process_contacts_cursor(&mut contacts)
      .process_raw_contacts_cursor(&mut raw_contacts)
      .process_data_cursor(&mut data);
    let mut found = mapper.map();
    if !self.accounts.is_empty() {
      found.retain(|contact| !contact.raw_contacts.is_empty());
    }
    Some(found)
  }
}
