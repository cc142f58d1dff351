//! Entity mappers: the current data row → an immutable entity.

use roster_core::{
  entity::*,
  field::{self, Field},
  mime::MimeType,
};

use crate::cursor::{DataCursor, TypedCursor};

/// A data entity that can be read from the current row of a [`DataCursor`].
pub trait FromDataCursor: DataEntity + Sized {
  /// The mimetype of rows this entity is read from.
  fn mime() -> MimeType;

  /// Pure projection of the current row.
  fn from_cursor(cursor: &DataCursor<'_>) -> Self;

  /// Like [`from_cursor`](Self::from_cursor), but `None` for rows that carry
  /// no data, so blank rows never turn into noise entries.
  fn non_blank_from_cursor(cursor: &DataCursor<'_>) -> Option<Self> {
    Some(Self::from_cursor(cursor)).filter(|e| !e.is_blank())
  }
}

fn text(cursor: &DataCursor<'_>, field: &Field) -> Option<String> {
  cursor.field_text(field)
}

fn code<T>(
  cursor: &DataCursor<'_>,
  field: &Field,
  from: fn(i64) -> Option<T>,
) -> Option<T> {
  cursor.field_long(field).and_then(from)
}

impl FromDataCursor for Address {
  fn mime() -> MimeType { MimeType::Address }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::address::*;
    Self {
      info:              c.info(),
      kind:              code(c, &TYPE, AddressType::from_repr),
      label:             text(c, &LABEL),
      formatted_address: text(c, &FORMATTED_ADDRESS),
      street:            text(c, &STREET),
      po_box:            text(c, &PO_BOX),
      neighborhood:      text(c, &NEIGHBORHOOD),
      city:              text(c, &CITY),
      region:            text(c, &REGION),
      postcode:          text(c, &POSTCODE),
      country:           text(c, &COUNTRY),
    }
  }
}

impl FromDataCursor for Email {
  fn mime() -> MimeType { MimeType::Email }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::email::*;
    Self {
      info:         c.info(),
      kind:         code(c, &TYPE, EmailType::from_repr),
      label:        text(c, &LABEL),
      address:      text(c, &ADDRESS),
      display_name: text(c, &DISPLAY_NAME),
    }
  }
}

impl FromDataCursor for Event {
  fn mime() -> MimeType { MimeType::Event }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::event::*;
    Self {
      info:       c.info(),
      kind:       code(c, &TYPE, EventType::from_repr),
      label:      text(c, &LABEL),
      start_date: text(c, &START_DATE),
    }
  }
}

impl FromDataCursor for GroupMembership {
  fn mime() -> MimeType { MimeType::GroupMembership }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    Self {
      info:     c.info(),
      group_id: c.field_long(&field::group_membership::GROUP_ID),
    }
  }
}

impl FromDataCursor for Im {
  fn mime() -> MimeType { MimeType::Im }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::im::*;
    Self {
      info:            c.info(),
      protocol:        code(c, &PROTOCOL, ImProtocol::from_repr),
      custom_protocol: text(c, &CUSTOM_PROTOCOL),
      data:            text(c, &DATA),
    }
  }
}

impl FromDataCursor for Name {
  fn mime() -> MimeType { MimeType::Name }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::name::*;
    Self {
      info:                 c.info(),
      display_name:         text(c, &DISPLAY_NAME),
      given_name:           text(c, &GIVEN_NAME),
      middle_name:          text(c, &MIDDLE_NAME),
      family_name:          text(c, &FAMILY_NAME),
      prefix:               text(c, &PREFIX),
      suffix:               text(c, &SUFFIX),
      phonetic_given_name:  text(c, &PHONETIC_GIVEN_NAME),
      phonetic_middle_name: text(c, &PHONETIC_MIDDLE_NAME),
      phonetic_family_name: text(c, &PHONETIC_FAMILY_NAME),
    }
  }
}

impl FromDataCursor for Nickname {
  fn mime() -> MimeType { MimeType::Nickname }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::nickname::*;
    Self {
      info:  c.info(),
      kind:  code(c, &TYPE, NicknameType::from_repr),
      label: text(c, &LABEL),
      name:  text(c, &NAME),
    }
  }
}

impl FromDataCursor for Note {
  fn mime() -> MimeType { MimeType::Note }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    Self { info: c.info(), note: text(c, &field::note::NOTE) }
  }
}

impl FromDataCursor for Organization {
  fn mime() -> MimeType { MimeType::Organization }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::organization::*;
    Self {
      info:            c.info(),
      kind:            code(c, &TYPE, OrganizationType::from_repr),
      label:           text(c, &LABEL),
      company:         text(c, &COMPANY),
      title:           text(c, &TITLE),
      department:      text(c, &DEPARTMENT),
      job_description: text(c, &JOB_DESCRIPTION),
      symbol:          text(c, &SYMBOL),
      phonetic_name:   text(c, &PHONETIC_NAME),
      office_location: text(c, &OFFICE_LOCATION),
    }
  }
}

impl FromDataCursor for Phone {
  fn mime() -> MimeType { MimeType::Phone }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::phone::*;
    Self {
      info:              c.info(),
      kind:              code(c, &TYPE, PhoneType::from_repr),
      label:             text(c, &LABEL),
      number:            text(c, &NUMBER),
      normalized_number: text(c, &NORMALIZED_NUMBER),
    }
  }
}

impl FromDataCursor for Photo {
  fn mime() -> MimeType { MimeType::Photo }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::photo::*;
    Self {
      info:      c.info(),
      file_id:   c.field_long(&FILE_ID),
      thumbnail: c.blob(THUMBNAIL.column),
    }
  }
}

impl FromDataCursor for Relation {
  fn mime() -> MimeType { MimeType::Relation }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::relation::*;
    Self {
      info:  c.info(),
      kind:  code(c, &TYPE, RelationType::from_repr),
      label: text(c, &LABEL),
      name:  text(c, &NAME),
    }
  }
}

impl FromDataCursor for SipAddress {
  fn mime() -> MimeType { MimeType::SipAddress }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::sip_address::*;
    Self {
      info:        c.info(),
      kind:        code(c, &TYPE, SipAddressType::from_repr),
      label:       text(c, &LABEL),
      sip_address: text(c, &SIP_ADDRESS),
    }
  }
}

impl FromDataCursor for Website {
  fn mime() -> MimeType { MimeType::Website }

  fn from_cursor(c: &DataCursor<'_>) -> Self {
    use field::website::*;
    Self {
      info:  c.info(),
      kind:  code(c, &TYPE, WebsiteType::from_repr),
      label: text(c, &LABEL),
      url:   text(c, &URL),
    }
  }
}

#[cfg(test)]
mod tests {
  use roster_core::{Value, column, store::MemoryCursor};

  use super::*;

  fn cursor(records: Vec<Vec<(&str, Value)>>) -> DataCursor<'static> {
    let mut c = DataCursor::new(Box::new(MemoryCursor::from_records(records)));
    assert!(c.move_to_next());
    c
  }

  #[test]
  fn maps_email_row() {
    let c = cursor(vec![vec![
      (column::ID, 10_i64.into()),
      (column::RAW_CONTACT_ID, 2_i64.into()),
      (column::CONTACT_ID, 1_i64.into()),
      (column::MIMETYPE, MimeType::Email.to_string().into()),
      (column::IS_SUPER_PRIMARY, 1_i64.into()),
      (column::DATA1, "a@x.com".into()),
      (column::DATA2, 2_i64.into()),
    ]]);
    let email = Email::from_cursor(&c);
    assert_eq!(email.info.id, Some(10));
    assert_eq!(email.info.raw_contact_id, Some(2));
    assert_eq!(email.info.contact_id, Some(1));
    assert!(email.is_default());
    assert_eq!(email.address.as_deref(), Some("a@x.com"));
    assert_eq!(email.kind, Some(EmailType::Work));
  }

  #[test]
  fn blank_rows_are_suppressed() {
    let c = cursor(vec![vec![
      (column::ID, 10_i64.into()),
      (column::MIMETYPE, MimeType::Email.to_string().into()),
      (column::DATA2, 1_i64.into()),
      (column::DATA3, "label only".into()),
    ]]);
    assert!(Email::non_blank_from_cursor(&c).is_none());
    assert!(Phone::non_blank_from_cursor(&c).is_none());
  }

  #[test]
  fn unknown_type_codes_read_as_none() {
    let c = cursor(vec![vec![
      (column::DATA1, "555".into()),
      (column::DATA2, 999_i64.into()),
    ]]);
    let phone = Phone::from_cursor(&c);
    assert_eq!(phone.kind, None);
    assert_eq!(phone.number.as_deref(), Some("555"));
  }
}
