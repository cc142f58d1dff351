//! The accumulation engine: contacts, raw contacts and data rows → a forest
//! of [`Contact`]s.
//!
//! Cursors may be processed in any order and any number of times. Every
//! entry is first-writer-wins keyed by id, so re-processing a cursor (or a
//! second cursor over the same rows with a different projection) never
//! changes what was already accumulated.
//!
//! Cancellation is polled before every row and every unit of work in
//! [`ContactsMapper::map`]. Once observed, the whole result is discarded:
//! callers get an empty list, never a partial graph.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use roster_core::{
  Cancel,
  entity::{Contact, Options},
  field::FieldSet,
  mime::MimeType,
};
use tracing::trace;

use super::{FromDataCursor, temp::TempRawContact};
use crate::{
  cursor::{
    ContactRow, ContactsCursor, DataCursor, RawContactRow, RawContactsCursor,
    TypedCursor,
  },
  registry::CustomDataRegistry,
};

pub struct ContactsMapper<'a> {
  registry:      &'a CustomDataRegistry,
  include:       Option<&'a FieldSet>,
  cancel:        Cancel<'a>,
  cancelled:     bool,
  /// Contact ids in the order they were first seen.
  contact_order: Vec<i64>,
  contacts:      HashMap<i64, Contact>,
  raw_contacts:  HashMap<i64, TempRawContact>,
  /// Data rows already appended, by data id.
  data_ids:      HashSet<i64>,
}

fn contact_from_row<C: ContactRow + ?Sized>(id: i64, row: &C) -> Contact {
  let options = Options {
    starred:           row.starred(),
    custom_ringtone:   row.custom_ringtone(),
    send_to_voicemail: row.send_to_voicemail(),
  };
  Contact {
    id,
    display_name_primary: row.display_name_primary(),
    display_name_alt: row.display_name_alt(),
    last_updated: row.last_updated(),
    options: Some(options).filter(|o| *o != Options::default()),
    raw_contacts: Vec::new(),
  }
}

impl<'a> ContactsMapper<'a> {
  /// `include` limits which custom-data fields are mapped; built-in fields
  /// are limited by the cursor projection itself.
  pub fn new(
    registry: &'a CustomDataRegistry,
    include: Option<&'a FieldSet>,
    cancel: Cancel<'a>,
  ) -> Self {
    Self {
      registry,
      include,
      cancel,
      cancelled: false,
      contact_order: Vec::new(),
      contacts: HashMap::new(),
      raw_contacts: HashMap::new(),
      data_ids: HashSet::new(),
    }
  }

  /// Polls the cancellation token. Sticky: once cancelled, always cancelled.
  fn is_cancelled(&mut self) -> bool {
    if !self.cancelled && self.cancel.is_cancelled() {
      trace!("contacts mapping cancelled");
      self.cancelled = true;
    }
    self.cancelled
  }

  fn add_contact_if_absent<C: ContactRow + ?Sized>(&mut self, id: i64, row: &C) {
    if let Entry::Vacant(slot) = self.contacts.entry(id) {
      slot.insert(contact_from_row(id, row));
      self.contact_order.push(id);
    }
  }

  pub fn process_contacts_cursor(
    &mut self,
    cursor: &mut ContactsCursor<'_>,
  ) -> &mut Self {
    cursor.reset_position();
    while !self.is_cancelled() && cursor.move_to_next() {
      if let Some(id) = cursor.contact_id() {
        self.add_contact_if_absent(id, &*cursor);
      }
    }
    self
  }

  pub fn process_raw_contacts_cursor(
    &mut self,
    cursor: &mut RawContactsCursor<'_>,
  ) -> &mut Self {
    cursor.reset_position();
    while !self.is_cancelled() && cursor.move_to_next() {
      let Some(id) = cursor.raw_contact_id() else { continue };
      self.raw_contacts.entry(id).or_insert_with(|| {
        let mut temp = TempRawContact::from_row(id, &*cursor);
        temp.display_name_primary = cursor.display_name_primary();
        temp.display_name_alt = cursor.display_name_alt();
        temp
      });
    }
    self
  }

  pub fn process_data_cursor(&mut self, cursor: &mut DataCursor<'_>) -> &mut Self {
    cursor.reset_position();
    while !self.is_cancelled() && cursor.move_to_next() {
      if let Some(contact_id) = ContactRow::contact_id(&*cursor) {
        self.add_contact_if_absent(contact_id, &*cursor);
      }
      let Some(raw_id) = cursor.raw_contact_id() else { continue };
      if let Some(data_id) = cursor.data_id()
        && !self.data_ids.insert(data_id)
      {
        continue;
      }
      let temp = self
        .raw_contacts
        .entry(raw_id)
        .or_insert_with(|| TempRawContact::from_row(raw_id, &*cursor));
      append_data(temp, cursor, self.registry, self.include);
    }
    self
  }

  /// Terminal reduction into contacts, each holding its raw contacts sorted by
  /// id. Raw contacts whose contact was never seen are wrapped in stand-in
  /// contacts carrying only the id.
  pub fn map(mut self) -> Vec<Contact> {
    if self.is_cancelled() {
      return Vec::new();
    }

    let mut grouped: HashMap<i64, Vec<_>> = HashMap::new();
    let temps: Vec<TempRawContact> =
      std::mem::take(&mut self.raw_contacts).into_values().collect();
    for temp in temps {
      if self.is_cancelled() {
        return Vec::new();
      }
      let Some(contact_id) = temp.contact_id else { continue };
      grouped.entry(contact_id).or_default().push(temp.build());
    }

    let mut out = Vec::with_capacity(self.contact_order.len() + grouped.len());
    for id in std::mem::take(&mut self.contact_order) {
      if self.is_cancelled() {
        return Vec::new();
      }
      let Some(mut contact) = self.contacts.remove(&id) else { continue };
      let mut raw_contacts = grouped.remove(&id).unwrap_or_default();
      raw_contacts.sort_by_key(|r| r.id);
      contact.raw_contacts = raw_contacts;
      out.push(contact);
    }

    let mut orphans: Vec<_> = grouped.into_iter().collect();
    orphans.sort_by_key(|(id, _)| *id);
    for (contact_id, mut raw_contacts) in orphans {
      if self.is_cancelled() {
        return Vec::new();
      }
      raw_contacts.sort_by_key(|r| r.id);
      out.push(Contact::stand_in(contact_id, raw_contacts));
    }

    out
  }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) {
  if slot.is_none() {
    *slot = value;
  }
}

/// Dispatch the current data row onto the accumulator by mimetype, skipping
/// blank values.
fn append_data(
  temp: &mut TempRawContact,
  cursor: &DataCursor<'_>,
  registry: &CustomDataRegistry,
  include: Option<&FieldSet>,
) {
  use roster_core::entity::*;

  fn push<T: FromDataCursor>(list: &mut Vec<T>, cursor: &DataCursor<'_>) {
    list.extend(T::non_blank_from_cursor(cursor));
  }

  match registry.resolve(cursor.mime_type()) {
    MimeType::Address => push(&mut temp.addresses, cursor),
    MimeType::Email => push(&mut temp.emails, cursor),
    MimeType::Event => push(&mut temp.events, cursor),
    MimeType::GroupMembership => push(&mut temp.group_memberships, cursor),
    MimeType::Im => push(&mut temp.ims, cursor),
    MimeType::Phone => push(&mut temp.phones, cursor),
    MimeType::Relation => push(&mut temp.relations, cursor),
    MimeType::Website => push(&mut temp.websites, cursor),
    MimeType::Name => {
      set_once(&mut temp.name, Name::non_blank_from_cursor(cursor))
    }
    MimeType::Nickname => {
      set_once(&mut temp.nickname, Nickname::non_blank_from_cursor(cursor))
    }
    MimeType::Note => {
      set_once(&mut temp.note, Note::non_blank_from_cursor(cursor))
    }
    MimeType::Organization => set_once(
      &mut temp.organization,
      Organization::non_blank_from_cursor(cursor),
    ),
    MimeType::Photo => {
      set_once(&mut temp.photo, Photo::non_blank_from_cursor(cursor))
    }
    MimeType::SipAddress => set_once(
      &mut temp.sip_address,
      SipAddress::non_blank_from_cursor(cursor),
    ),
    MimeType::Custom(mime) => {
      // `resolve` only lets registered mimetypes through.
      let Ok(entry) = registry.entry(&mime) else { return };
      let entity = entry.map(cursor, include);
      if entry.is_blank(&entity) {
        return;
      }
      temp
        .custom_data
        .entry(mime)
        .or_insert_with(|| super::temp::CustomDataHolder {
          entities:    Vec::new(),
          restriction: entry.count_restriction(),
        })
        .push(entity);
    }
    MimeType::Unknown => {}
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use roster_core::{
    Value, column,
    entity::DataEntity,
    field::Field,
    store::MemoryCursor,
  };

  use super::*;
  use crate::registry::SimpleCustomData;

  const GENDER_MIME: &str = "vnd.example/gender";
  const GENDER: Field = Field::new("Gender.Gender", column::DATA1);

  fn registry() -> CustomDataRegistry {
    CustomDataRegistry::new()
      .with(SimpleCustomData::new(GENDER_MIME, &[GENDER]).single())
  }

  fn contacts_cursor(ids: &[i64]) -> ContactsCursor<'static> {
    ContactsCursor::new(Box::new(MemoryCursor::from_records(
      ids
        .iter()
        .map(|id| {
          vec![
            (column::ID, Value::from(*id)),
            (column::DISPLAY_NAME_PRIMARY, Value::from(format!("Contact {id}"))),
            (column::STARRED, Value::from(true)),
          ]
        })
        .collect(),
    )))
  }

  fn raw_contacts_cursor(rows: &[(i64, i64)]) -> RawContactsCursor<'static> {
    RawContactsCursor::new(Box::new(MemoryCursor::from_records(
      rows
        .iter()
        .map(|(id, contact_id)| {
          vec![
            (column::ID, Value::from(*id)),
            (column::CONTACT_ID, Value::from(*contact_id)),
            (column::ACCOUNT_NAME, Value::from("a@x.com")),
            (column::ACCOUNT_TYPE, Value::from("com.example")),
          ]
        })
        .collect(),
    )))
  }

  /// `(data id, raw contact id, contact id, mimetype, data1)`
  fn data_cursor(
    rows: &[(i64, i64, i64, &str, Option<&str>)],
  ) -> DataCursor<'static> {
    DataCursor::new(Box::new(MemoryCursor::from_records(
      rows
        .iter()
        .map(|(id, raw, contact, mime, data1)| {
          vec![
            (column::ID, Value::from(*id)),
            (column::RAW_CONTACT_ID, Value::from(*raw)),
            (column::CONTACT_ID, Value::from(*contact)),
            (column::MIMETYPE, Value::from(*mime)),
            (column::DATA1, Value::from(*data1)),
          ]
        })
        .collect(),
    )))
  }

  const EMAIL: &str = "vnd.android.cursor.item/email_v2";
  const PHONE: &str = "vnd.android.cursor.item/phone_v2";
  const NOTE: &str = "vnd.android.cursor.item/note";

  fn sample_data() -> DataCursor<'static> {
    data_cursor(&[
      (100, 11, 1, EMAIL, Some("b@x.com")),
      (101, 10, 1, EMAIL, Some("a@x.com")),
      (102, 10, 1, PHONE, Some("555")),
      (103, 20, 2, NOTE, Some("orphan note")),
    ])
  }

  fn run(cancel: Cancel<'_>, registry: &CustomDataRegistry) -> Vec<Contact> {
    let mut mapper = ContactsMapper::new(registry, None, cancel);
    mapper
      .process_contacts_cursor(&mut contacts_cursor(&[1]))
      .process_raw_contacts_cursor(&mut raw_contacts_cursor(&[(10, 1), (11, 1)]))
      .process_data_cursor(&mut sample_data());
    mapper.map()
  }

  #[test]
  fn builds_nested_contacts_with_sorted_raw_contacts() {
    let registry = registry();
    let contacts = run(Cancel::never(), &registry);

    assert_eq!(contacts.len(), 2);
    let first = &contacts[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.display_name_primary.as_deref(), Some("Contact 1"));
    assert_eq!(first.options.as_ref().and_then(|o| o.starred), Some(true));
    let ids: Vec<_> = first.raw_contacts.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![Some(10), Some(11)]);
    assert_eq!(first.raw_contacts[0].emails[0].address.as_deref(), Some("a@x.com"));
    assert_eq!(first.raw_contacts[0].phones.len(), 1);
    assert_eq!(
      first.raw_contacts[0].account.as_ref().map(|a| a.name.as_str()),
      Some("a@x.com")
    );
  }

  #[test]
  fn orphan_raw_contacts_become_stand_in_contacts() {
    let registry = registry();
    let mut mapper = ContactsMapper::new(&registry, None, Cancel::never());
    mapper.process_raw_contacts_cursor(&mut raw_contacts_cursor(&[(30, 3)]));
    let contacts = mapper.map();

    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].id, 3);
    assert_eq!(contacts[0].display_name_primary, None);
    assert_eq!(contacts[0].options, None);
    assert_eq!(contacts[0].raw_contacts[0].id, Some(30));
  }

  #[test]
  fn data_rows_create_missing_contacts_and_raw_contacts() {
    let registry = registry();
    let contacts = run(Cancel::never(), &registry);
    let second = &contacts[1];
    assert_eq!(second.id, 2);
    assert_eq!(second.raw_contacts.len(), 1);
    assert_eq!(
      second.raw_contacts[0].note.as_ref().and_then(|n| n.note.as_deref()),
      Some("orphan note")
    );
  }

  #[test]
  fn reprocessing_is_idempotent() {
    let registry = registry();
    let once = run(Cancel::never(), &registry);

    let mut mapper = ContactsMapper::new(&registry, None, Cancel::never());
    let mut contacts = contacts_cursor(&[1]);
    let mut raws = raw_contacts_cursor(&[(10, 1), (11, 1)]);
    let mut data = sample_data();
    mapper
      .process_contacts_cursor(&mut contacts)
      .process_raw_contacts_cursor(&mut raws)
      .process_data_cursor(&mut data)
      .process_contacts_cursor(&mut contacts)
      .process_raw_contacts_cursor(&mut raws)
      .process_data_cursor(&mut data);
    let twice = mapper.map();
    assert_eq!(once, twice);
  }

  #[test]
  fn data_rows_are_appended_once_per_id() {
    let registry = registry();
    let mut mapper = ContactsMapper::new(&registry, None, Cancel::never());
    mapper
      .process_data_cursor(&mut data_cursor(&[(1, 10, 1, EMAIL, Some("a@x.com"))]))
      .process_data_cursor(&mut data_cursor(&[
        (1, 10, 1, EMAIL, Some("a@x.com")),
        (2, 10, 1, EMAIL, Some("b@x.com")),
      ]));
    let contacts = mapper.map();
    let emails: Vec<_> = contacts[0].raw_contacts[0]
      .emails
      .iter()
      .map(|e| e.info.id)
      .collect();
    assert_eq!(emails, vec![Some(1), Some(2)]);
  }

  #[test]
  fn cancellation_at_any_point_yields_nothing() {
    let registry = registry();
    let uncancelled_polls = {
      let polls = Cell::new(0);
      let predicate = || {
        polls.set(polls.get() + 1);
        false
      };
      assert!(!run(Cancel::new(&predicate), &registry).is_empty());
      polls.get()
    };

    for cancel_at in 1..=uncancelled_polls {
      let polls = Cell::new(0);
      let predicate = || {
        polls.set(polls.get() + 1);
        polls.get() >= cancel_at
      };
      let contacts = run(Cancel::new(&predicate), &registry);
      assert!(contacts.is_empty(), "partial result when cancelled at poll {cancel_at}");
    }
  }

  #[test]
  fn blank_and_unknown_rows_are_skipped() {
    let registry = registry();
    let mut mapper = ContactsMapper::new(&registry, None, Cancel::never());
    mapper.process_data_cursor(&mut data_cursor(&[
      (1, 10, 1, EMAIL, None),
      (2, 10, 1, EMAIL, Some("   ")),
      (3, 10, 1, "vnd.example/unregistered", Some("x")),
    ]));
    let contacts = mapper.map();
    let raw = &contacts[0].raw_contacts[0];
    assert!(raw.emails.is_empty());
    assert!(raw.custom_data.is_empty());
    assert!(raw.is_blank());
  }

  #[test]
  fn custom_data_honours_count_restriction() {
    let registry = registry();
    let mut mapper = ContactsMapper::new(&registry, None, Cancel::never());
    mapper.process_data_cursor(&mut data_cursor(&[
      (1, 10, 1, GENDER_MIME, Some("female")),
      (2, 10, 1, GENDER_MIME, Some("other")),
    ]));
    let contacts = mapper.map();
    let custom = &contacts[0].raw_contacts[0].custom_data[GENDER_MIME];
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].get(column::DATA1), &Value::from("female"));
    assert_eq!(custom[0].id(), Some(1));
  }

  #[test]
  fn single_valued_mimetypes_keep_the_first_row() {
    let registry = registry();
    let mut mapper = ContactsMapper::new(&registry, None, Cancel::never());
    mapper.process_data_cursor(&mut data_cursor(&[
      (1, 10, 1, NOTE, Some("first")),
      (2, 10, 1, NOTE, Some("second")),
    ]));
    let contacts = mapper.map();
    let raw = &contacts[0].raw_contacts[0];
    assert_eq!(raw.note.as_ref().and_then(|n| n.note.as_deref()), Some("first"));
  }
}
