//! Typed cursors, one per table family.
//!
//! Each wrapper owns the raw [`Cursor`] returned by the row source and adds
//! accessors that know which column holds what. The contact-level and
//! raw-contact-level accessors are traits because the data table carries
//! those columns too, under different names.

use chrono::{DateTime, Utc};
use roster_core::{
  account::Account,
  column,
  entity::DataInfo,
  field::Field,
  mime::MimeType,
  store::Cursor,
};

/// Navigation and primitive accessors shared by every typed cursor.
pub trait TypedCursor {
  fn raw(&self) -> &dyn Cursor;

  fn raw_mut(&mut self) -> &mut dyn Cursor;

  fn move_to_next(&mut self) -> bool { self.raw_mut().move_to_next() }

  fn reset_position(&mut self) { self.raw_mut().reset_position() }

  fn count(&self) -> usize { self.raw().count() }

  fn long(&self, column: &str) -> Option<i64> { self.raw().get(column).as_i64() }

  fn text(&self, column: &str) -> Option<String> {
    self.raw().get(column).to_text()
  }

  fn flag(&self, column: &str) -> Option<bool> {
    self.raw().get(column).as_bool()
  }

  fn blob(&self, column: &str) -> Option<Vec<u8>> {
    self.raw().get(column).as_blob().map(<[u8]>::to_vec)
  }

  fn field_text(&self, field: &Field) -> Option<String> { self.text(field.column) }

  fn field_long(&self, field: &Field) -> Option<i64> { self.long(field.column) }
}

macro_rules! typed_cursor {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    pub struct $name<'s> {
      cursor: Box<dyn Cursor + 's>,
    }

    impl<'s> $name<'s> {
      pub fn new(cursor: Box<dyn Cursor + 's>) -> Self { Self { cursor } }
    }

    impl TypedCursor for $name<'_> {
      fn raw(&self) -> &dyn Cursor { &*self.cursor }

      fn raw_mut(&mut self) -> &mut dyn Cursor { &mut *self.cursor }
    }
  };
}

typed_cursor!(
  /// Rows of the contacts table.
  ContactsCursor
);
typed_cursor!(
  /// Rows of the raw contacts table.
  RawContactsCursor
);
typed_cursor!(
  /// Rows of the data table. Each row also carries its raw contact's account
  /// and its contact's display columns.
  DataCursor
);
typed_cursor!(GroupsCursor);
typed_cursor!(BlockedNumbersCursor);
typed_cursor!(SimContactsCursor);

fn account_of<C: TypedCursor + ?Sized>(cursor: &C) -> Option<Account> {
  match (
    cursor.text(column::ACCOUNT_NAME),
    cursor.text(column::ACCOUNT_TYPE),
  ) {
    (Some(name), Some(account_type)) => Some(Account { name, account_type }),
    _ => None,
  }
}

// ─── Contact-level columns ───────────────────────────────────────────────────

/// Accessors for the columns describing a contact.
pub trait ContactRow: TypedCursor {
  fn contact_id(&self) -> Option<i64>;

  fn display_name_primary(&self) -> Option<String> {
    self.text(column::DISPLAY_NAME_PRIMARY)
  }

  fn display_name_alt(&self) -> Option<String> {
    self.text(column::DISPLAY_NAME_ALT)
  }

  fn last_updated(&self) -> Option<DateTime<Utc>> {
    self
      .long(column::LAST_UPDATED)
      .and_then(DateTime::from_timestamp_millis)
  }

  fn starred(&self) -> Option<bool> { self.flag(column::STARRED) }

  fn custom_ringtone(&self) -> Option<String> {
    self.text(column::CUSTOM_RINGTONE)
  }

  fn send_to_voicemail(&self) -> Option<bool> {
    self.flag(column::SEND_TO_VOICEMAIL)
  }
}

impl ContactRow for ContactsCursor<'_> {
  fn contact_id(&self) -> Option<i64> { self.long(column::ID) }
}

impl ContactRow for DataCursor<'_> {
  fn contact_id(&self) -> Option<i64> { self.long(column::CONTACT_ID) }
}

// ─── Raw-contact-level columns ───────────────────────────────────────────────

/// Accessors for the columns describing a raw contact.
pub trait RawContactRow: TypedCursor {
  fn raw_contact_id(&self) -> Option<i64>;

  fn owning_contact_id(&self) -> Option<i64> { self.long(column::CONTACT_ID) }

  fn account(&self) -> Option<Account> { account_of(self) }
}

impl RawContactRow for RawContactsCursor<'_> {
  fn raw_contact_id(&self) -> Option<i64> { self.long(column::ID) }
}

impl RawContactsCursor<'_> {
  pub fn display_name_primary(&self) -> Option<String> {
    self.text(column::DISPLAY_NAME_PRIMARY)
  }

  pub fn display_name_alt(&self) -> Option<String> {
    self.text(column::DISPLAY_NAME_ALT)
  }
}

impl RawContactRow for DataCursor<'_> {
  fn raw_contact_id(&self) -> Option<i64> { self.long(column::RAW_CONTACT_ID) }
}

// ─── Data rows ───────────────────────────────────────────────────────────────

impl DataCursor<'_> {
  pub fn data_id(&self) -> Option<i64> { self.long(column::ID) }

  /// The row's mimetype as stored; custom mimetypes still need resolving
  /// through the registry.
  pub fn mime_type(&self) -> MimeType {
    self
      .text(column::MIMETYPE)
      .map_or(MimeType::Unknown, |m| MimeType::from_value(&m))
  }

  pub fn info(&self) -> DataInfo {
    DataInfo {
      id:               self.data_id(),
      raw_contact_id:   self.raw_contact_id(),
      contact_id:       ContactRow::contact_id(self),
      is_primary:       self.flag(column::IS_PRIMARY).unwrap_or(false),
      is_super_primary: self.flag(column::IS_SUPER_PRIMARY).unwrap_or(false),
    }
  }
}

// ─── Groups / blocked numbers / SIM ──────────────────────────────────────────

impl GroupsCursor<'_> {
  pub fn id(&self) -> Option<i64> { self.long(column::ID) }

  pub fn title(&self) -> Option<String> { self.text(column::TITLE) }

  pub fn read_only(&self) -> bool {
    self.flag(column::GROUP_IS_READ_ONLY).unwrap_or(false)
  }

  pub fn favorites(&self) -> bool { self.flag(column::FAVORITES).unwrap_or(false) }

  pub fn auto_add(&self) -> bool { self.flag(column::AUTO_ADD).unwrap_or(false) }

  pub fn account(&self) -> Option<Account> { account_of(self) }
}

impl BlockedNumbersCursor<'_> {
  pub fn id(&self) -> Option<i64> { self.long(column::ID) }

  pub fn number(&self) -> Option<String> { self.text(column::ORIGINAL_NUMBER) }

  pub fn normalized_number(&self) -> Option<String> {
    self.text(column::E164_NUMBER)
  }
}

impl SimContactsCursor<'_> {
  pub fn id(&self) -> Option<i64> { self.long(column::ID) }

  pub fn name(&self) -> Option<String> { self.text(column::SIM_NAME) }

  pub fn number(&self) -> Option<String> { self.text(column::SIM_NUMBER) }
}
