//! Entity → column values, the write-side mirror of the entity mappers.

use roster_core::{
  entity::*,
  field::{self, Field},
  value::Value,
};

/// A data entity that can be written to a data row.
pub trait DataValues: DataEntity {
  /// One `(field, value)` pair per entity field of the mimetype, nulls
  /// included.
  fn values(&self) -> Vec<(Field, Value)>;
}

fn text(value: &Option<String>) -> Value { value.clone().into() }

impl DataValues for Address {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::address::*;
    vec![
      (FORMATTED_ADDRESS, text(&self.formatted_address)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
      (STREET, text(&self.street)),
      (PO_BOX, text(&self.po_box)),
      (NEIGHBORHOOD, text(&self.neighborhood)),
      (CITY, text(&self.city)),
      (REGION, text(&self.region)),
      (POSTCODE, text(&self.postcode)),
      (COUNTRY, text(&self.country)),
    ]
  }
}

impl DataValues for Email {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::email::*;
    vec![
      (ADDRESS, text(&self.address)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
      (DISPLAY_NAME, text(&self.display_name)),
    ]
  }
}

impl DataValues for Event {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::event::*;
    vec![
      (START_DATE, text(&self.start_date)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
    ]
  }
}

impl DataValues for GroupMembership {
  fn values(&self) -> Vec<(Field, Value)> {
    vec![(field::group_membership::GROUP_ID, self.group_id.into())]
  }
}

impl DataValues for Im {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::im::*;
    vec![
      (DATA, text(&self.data)),
      (PROTOCOL, self.protocol.map(|p| p as i64).into()),
      (CUSTOM_PROTOCOL, text(&self.custom_protocol)),
    ]
  }
}

impl DataValues for Name {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::name::*;
    vec![
      (DISPLAY_NAME, text(&self.display_name)),
      (GIVEN_NAME, text(&self.given_name)),
      (FAMILY_NAME, text(&self.family_name)),
      (PREFIX, text(&self.prefix)),
      (MIDDLE_NAME, text(&self.middle_name)),
      (SUFFIX, text(&self.suffix)),
      (PHONETIC_GIVEN_NAME, text(&self.phonetic_given_name)),
      (PHONETIC_MIDDLE_NAME, text(&self.phonetic_middle_name)),
      (PHONETIC_FAMILY_NAME, text(&self.phonetic_family_name)),
    ]
  }
}

impl DataValues for Nickname {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::nickname::*;
    vec![
      (NAME, text(&self.name)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
    ]
  }
}

impl DataValues for Note {
  fn values(&self) -> Vec<(Field, Value)> {
    vec![(field::note::NOTE, text(&self.note))]
  }
}

impl DataValues for Organization {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::organization::*;
    vec![
      (COMPANY, text(&self.company)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
      (TITLE, text(&self.title)),
      (DEPARTMENT, text(&self.department)),
      (JOB_DESCRIPTION, text(&self.job_description)),
      (SYMBOL, text(&self.symbol)),
      (PHONETIC_NAME, text(&self.phonetic_name)),
      (OFFICE_LOCATION, text(&self.office_location)),
    ]
  }
}

impl DataValues for Phone {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::phone::*;
    vec![
      (NUMBER, text(&self.number)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
      (NORMALIZED_NUMBER, text(&self.normalized_number)),
    ]
  }
}

impl DataValues for Photo {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::photo::*;
    vec![
      (FILE_ID, self.file_id.into()),
      (THUMBNAIL, self.thumbnail.clone().into()),
    ]
  }
}

impl DataValues for Relation {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::relation::*;
    vec![
      (NAME, text(&self.name)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
    ]
  }
}

impl DataValues for SipAddress {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::sip_address::*;
    vec![
      (SIP_ADDRESS, text(&self.sip_address)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
    ]
  }
}

impl DataValues for Website {
  fn values(&self) -> Vec<(Field, Value)> {
    use field::website::*;
    vec![
      (URL, text(&self.url)),
      (TYPE, self.kind.map(|k| k as i64).into()),
      (LABEL, text(&self.label)),
    ]
  }
}
