//! Fields: the column-level read projection and write mask ("include
//! fields").
//!
//! An include set of `None` means "no filtering". `Some(empty)` means
//! "nothing", which write paths treat as an explicit skip. Fields marked
//! `required` are always read and written regardless of the include set.

use std::collections::BTreeSet;

use crate::{column::*, mime::MimeType};

/// A named attribute of an entity, stored in `column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field {
  /// Unique, human-readable name, e.g. `Email.Address`.
  pub name:     &'static str,
  pub column:   &'static str,
  pub required: bool,
}

impl Field {
  pub const fn new(name: &'static str, column: &'static str) -> Self {
    Self { name, column, required: false }
  }

  pub const fn required(name: &'static str, column: &'static str) -> Self {
    Self { name, column, required: true }
  }
}

pub type FieldSet = BTreeSet<Field>;

/// Whether `field` passes the include mask.
pub fn is_included(field: &Field, include: Option<&FieldSet>) -> bool {
  field.required || include.is_none_or(|set| set.contains(field))
}

/// Collect fields into a [`FieldSet`].
pub fn set<'a>(fields: impl IntoIterator<Item = &'a Field>) -> FieldSet {
  fields.into_iter().copied().collect()
}

/// Columns shared by every data row.
pub mod data {
  use super::*;

  pub const ID: Field = Field::required("Data.Id", super::ID);
  pub const RAW_CONTACT_ID: Field =
    Field::required("Data.RawContactId", super::RAW_CONTACT_ID);
  pub const CONTACT_ID: Field =
    Field::required("Data.ContactId", super::CONTACT_ID);
  pub const MIMETYPE: Field = Field::required("Data.MimeType", super::MIMETYPE);
  pub const IS_PRIMARY: Field =
    Field::required("Data.IsPrimary", super::IS_PRIMARY);
  pub const IS_SUPER_PRIMARY: Field =
    Field::required("Data.IsSuperPrimary", super::IS_SUPER_PRIMARY);

  pub const ALL: &[Field] =
    &[ID, RAW_CONTACT_ID, CONTACT_ID, MIMETYPE, IS_PRIMARY, IS_SUPER_PRIMARY];
}

pub mod address {
  use super::*;

  pub const FORMATTED_ADDRESS: Field =
    Field::new("Address.FormattedAddress", DATA1);
  pub const TYPE: Field = Field::new("Address.Type", DATA2);
  pub const LABEL: Field = Field::new("Address.Label", DATA3);
  pub const STREET: Field = Field::new("Address.Street", DATA4);
  pub const PO_BOX: Field = Field::new("Address.PoBox", DATA5);
  pub const NEIGHBORHOOD: Field = Field::new("Address.Neighborhood", DATA6);
  pub const CITY: Field = Field::new("Address.City", DATA7);
  pub const REGION: Field = Field::new("Address.Region", DATA8);
  pub const POSTCODE: Field = Field::new("Address.Postcode", DATA9);
  pub const COUNTRY: Field = Field::new("Address.Country", DATA10);

  pub const ALL: &[Field] = &[
    FORMATTED_ADDRESS,
    TYPE,
    LABEL,
    STREET,
    PO_BOX,
    NEIGHBORHOOD,
    CITY,
    REGION,
    POSTCODE,
    COUNTRY,
  ];
}

pub mod email {
  use super::*;

  pub const ADDRESS: Field = Field::new("Email.Address", DATA1);
  pub const TYPE: Field = Field::new("Email.Type", DATA2);
  pub const LABEL: Field = Field::new("Email.Label", DATA3);
  pub const DISPLAY_NAME: Field = Field::new("Email.DisplayName", DATA4);

  pub const ALL: &[Field] = &[ADDRESS, TYPE, LABEL, DISPLAY_NAME];
}

pub mod event {
  use super::*;

  pub const START_DATE: Field = Field::new("Event.StartDate", DATA1);
  pub const TYPE: Field = Field::new("Event.Type", DATA2);
  pub const LABEL: Field = Field::new("Event.Label", DATA3);

  pub const ALL: &[Field] = &[START_DATE, TYPE, LABEL];
}

pub mod group_membership {
  use super::*;

  pub const GROUP_ID: Field = Field::new("GroupMembership.GroupId", DATA1);

  pub const ALL: &[Field] = &[GROUP_ID];
}

pub mod im {
  use super::*;

  pub const DATA: Field = Field::new("Im.Data", DATA1);
  pub const PROTOCOL: Field = Field::new("Im.Protocol", DATA5);
  pub const CUSTOM_PROTOCOL: Field = Field::new("Im.CustomProtocol", DATA6);

  pub const ALL: &[Field] = &[DATA, PROTOCOL, CUSTOM_PROTOCOL];
}

pub mod name {
  use super::*;

  pub const DISPLAY_NAME: Field = Field::new("Name.DisplayName", DATA1);
  pub const GIVEN_NAME: Field = Field::new("Name.GivenName", DATA2);
  pub const FAMILY_NAME: Field = Field::new("Name.FamilyName", DATA3);
  pub const PREFIX: Field = Field::new("Name.Prefix", DATA4);
  pub const MIDDLE_NAME: Field = Field::new("Name.MiddleName", DATA5);
  pub const SUFFIX: Field = Field::new("Name.Suffix", DATA6);
  pub const PHONETIC_GIVEN_NAME: Field =
    Field::new("Name.PhoneticGivenName", DATA7);
  pub const PHONETIC_MIDDLE_NAME: Field =
    Field::new("Name.PhoneticMiddleName", DATA8);
  pub const PHONETIC_FAMILY_NAME: Field =
    Field::new("Name.PhoneticFamilyName", DATA9);

  pub const ALL: &[Field] = &[
    DISPLAY_NAME,
    GIVEN_NAME,
    FAMILY_NAME,
    PREFIX,
    MIDDLE_NAME,
    SUFFIX,
    PHONETIC_GIVEN_NAME,
    PHONETIC_MIDDLE_NAME,
    PHONETIC_FAMILY_NAME,
  ];
}

pub mod nickname {
  use super::*;

  pub const NAME: Field = Field::new("Nickname.Name", DATA1);
  pub const TYPE: Field = Field::new("Nickname.Type", DATA2);
  pub const LABEL: Field = Field::new("Nickname.Label", DATA3);

  pub const ALL: &[Field] = &[NAME, TYPE, LABEL];
}

pub mod note {
  use super::*;

  pub const NOTE: Field = Field::new("Note.Note", DATA1);

  pub const ALL: &[Field] = &[NOTE];
}

pub mod organization {
  use super::*;

  pub const COMPANY: Field = Field::new("Organization.Company", DATA1);
  pub const TYPE: Field = Field::new("Organization.Type", DATA2);
  pub const LABEL: Field = Field::new("Organization.Label", DATA3);
  pub const TITLE: Field = Field::new("Organization.Title", DATA4);
  pub const DEPARTMENT: Field = Field::new("Organization.Department", DATA5);
  pub const JOB_DESCRIPTION: Field =
    Field::new("Organization.JobDescription", DATA6);
  pub const SYMBOL: Field = Field::new("Organization.Symbol", DATA7);
  pub const PHONETIC_NAME: Field =
    Field::new("Organization.PhoneticName", DATA8);
  pub const OFFICE_LOCATION: Field =
    Field::new("Organization.OfficeLocation", DATA9);

  pub const ALL: &[Field] = &[
    COMPANY,
    TYPE,
    LABEL,
    TITLE,
    DEPARTMENT,
    JOB_DESCRIPTION,
    SYMBOL,
    PHONETIC_NAME,
    OFFICE_LOCATION,
  ];
}

pub mod phone {
  use super::*;

  pub const NUMBER: Field = Field::new("Phone.Number", DATA1);
  pub const TYPE: Field = Field::new("Phone.Type", DATA2);
  pub const LABEL: Field = Field::new("Phone.Label", DATA3);
  pub const NORMALIZED_NUMBER: Field =
    Field::new("Phone.NormalizedNumber", DATA4);

  pub const ALL: &[Field] = &[NUMBER, TYPE, LABEL, NORMALIZED_NUMBER];
}

pub mod photo {
  use super::*;

  pub const FILE_ID: Field = Field::new("Photo.FileId", DATA14);
  pub const THUMBNAIL: Field = Field::new("Photo.Thumbnail", DATA15);

  pub const ALL: &[Field] = &[FILE_ID, THUMBNAIL];
}

pub mod relation {
  use super::*;

  pub const NAME: Field = Field::new("Relation.Name", DATA1);
  pub const TYPE: Field = Field::new("Relation.Type", DATA2);
  pub const LABEL: Field = Field::new("Relation.Label", DATA3);

  pub const ALL: &[Field] = &[NAME, TYPE, LABEL];
}

pub mod sip_address {
  use super::*;

  pub const SIP_ADDRESS: Field = Field::new("SipAddress.SipAddress", DATA1);
  pub const TYPE: Field = Field::new("SipAddress.Type", DATA2);
  pub const LABEL: Field = Field::new("SipAddress.Label", DATA3);

  pub const ALL: &[Field] = &[SIP_ADDRESS, TYPE, LABEL];
}

pub mod website {
  use super::*;

  pub const URL: Field = Field::new("Website.Url", DATA1);
  pub const TYPE: Field = Field::new("Website.Type", DATA2);
  pub const LABEL: Field = Field::new("Website.Label", DATA3);

  pub const ALL: &[Field] = &[URL, TYPE, LABEL];
}

/// Contact-level options, stored on the contacts table rather than in data
/// rows.
pub mod options {
  use super::*;

  pub const STARRED: Field = Field::new("Options.Starred", super::STARRED);
  pub const CUSTOM_RINGTONE: Field =
    Field::new("Options.CustomRingtone", super::CUSTOM_RINGTONE);
  pub const SEND_TO_VOICEMAIL: Field =
    Field::new("Options.SendToVoicemail", super::SEND_TO_VOICEMAIL);

  pub const ALL: &[Field] = &[STARRED, CUSTOM_RINGTONE, SEND_TO_VOICEMAIL];
}

/// The entity fields of a built-in mimetype. Custom mimetypes declare their
/// fields through their registry entry; `Unknown` has none.
pub fn for_mime(mime: &MimeType) -> &'static [Field] {
  match mime {
    MimeType::Address => address::ALL,
    MimeType::Email => email::ALL,
    MimeType::Event => event::ALL,
    MimeType::GroupMembership => group_membership::ALL,
    MimeType::Im => im::ALL,
    MimeType::Name => name::ALL,
    MimeType::Nickname => nickname::ALL,
    MimeType::Note => note::ALL,
    MimeType::Organization => organization::ALL,
    MimeType::Phone => phone::ALL,
    MimeType::Photo => photo::ALL,
    MimeType::Relation => relation::ALL,
    MimeType::SipAddress => sip_address::ALL,
    MimeType::Website => website::ALL,
    MimeType::Custom(_) | MimeType::Unknown => &[],
  }
}

/// Every field of every built-in mimetype, including the common data fields.
pub fn all_data() -> FieldSet {
  MimeType::BUILT_IN
    .iter()
    .flat_map(for_mime)
    .chain(data::ALL)
    .copied()
    .collect()
}
