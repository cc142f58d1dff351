//! The built-in data-row entities and their type codes.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::FromRepr;

use super::{DataEntity, DataInfo, all_blank, is_blank_text};
use crate::mime::MimeType;

macro_rules! data_entity {
  ($ty:ident, $mime:ident, |$e:ident| $blank:expr) => {
    impl DataEntity for $ty {
      fn mime_type(&self) -> MimeType { MimeType::$mime }

      fn info(&self) -> &DataInfo { &self.info }

      fn info_mut(&mut self) -> &mut DataInfo { &mut self.info }

      fn is_blank(&self) -> bool {
        let $e = self;
        $blank
      }
    }
  };
}

// ─── Type codes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum AddressType {
  Custom = 0,
  Home   = 1,
  Work   = 2,
  Other  = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum EmailType {
  Custom = 0,
  Home   = 1,
  Work   = 2,
  Other  = 3,
  Mobile = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum EventType {
  Custom      = 0,
  Anniversary = 1,
  Other       = 2,
  Birthday    = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum ImProtocol {
  Custom     = -1,
  Aim        = 0,
  Msn        = 1,
  Yahoo      = 2,
  Skype      = 3,
  Qq         = 4,
  GoogleTalk = 5,
  Icq        = 6,
  Jabber     = 7,
  NetMeeting = 8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum NicknameType {
  Custom     = 0,
  Default    = 1,
  OtherName  = 2,
  MaidenName = 3,
  ShortName  = 4,
  Initials   = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum OrganizationType {
  Custom = 0,
  Work   = 1,
  Other  = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum PhoneType {
  Custom      = 0,
  Home        = 1,
  Mobile      = 2,
  Work        = 3,
  FaxWork     = 4,
  FaxHome     = 5,
  Pager       = 6,
  Other       = 7,
  Callback    = 8,
  Car         = 9,
  CompanyMain = 10,
  Isdn        = 11,
  Main        = 12,
  OtherFax    = 13,
  Radio       = 14,
  Telex       = 15,
  TtyTdd      = 16,
  WorkMobile  = 17,
  WorkPager   = 18,
  Assistant   = 19,
  Mms         = 20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum RelationType {
  Custom          = 0,
  Assistant       = 1,
  Brother         = 2,
  Child           = 3,
  DomesticPartner = 4,
  Father          = 5,
  Friend          = 6,
  Manager         = 7,
  Mother          = 8,
  Parent          = 9,
  Partner         = 10,
  ReferredBy      = 11,
  Relative        = 12,
  Sister          = 13,
  Spouse          = 14,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum SipAddressType {
  Custom = 0,
  Home   = 1,
  Work   = 2,
  Other  = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(i64)]
pub enum WebsiteType {
  Custom   = 0,
  Homepage = 1,
  Blog     = 2,
  Profile  = 3,
  Home     = 4,
  Work     = 5,
  Ftp      = 6,
  Other    = 7,
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
  #[serde(flatten)]
  pub info:              DataInfo,
  #[serde(rename = "type")]
  pub kind:              Option<AddressType>,
  pub label:             Option<String>,
  pub formatted_address: Option<String>,
  pub street:            Option<String>,
  pub po_box:            Option<String>,
  pub neighborhood:      Option<String>,
  pub city:              Option<String>,
  pub region:            Option<String>,
  pub postcode:          Option<String>,
  pub country:           Option<String>,
}

data_entity!(Address, Address, |a| all_blank(&[
  &a.formatted_address,
  &a.street,
  &a.po_box,
  &a.neighborhood,
  &a.city,
  &a.region,
  &a.postcode,
  &a.country,
]));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
  #[serde(flatten)]
  pub info:         DataInfo,
  #[serde(rename = "type")]
  pub kind:         Option<EmailType>,
  pub label:        Option<String>,
  pub address:      Option<String>,
  pub display_name: Option<String>,
}

impl Email {
  pub fn new(kind: EmailType, address: impl Into<String>) -> Self {
    Self {
      kind: Some(kind),
      address: Some(address.into()),
      ..Self::default()
    }
  }
}

data_entity!(Email, Email, |e| is_blank_text(&e.address));

/// A calendar date whose year may be unknown (stored as `--MM-dd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDate {
  pub year:  Option<i32>,
  pub month: u32,
  pub day:   u32,
}

impl EventDate {
  /// Parse `yyyy-MM-dd` or the year-less `--MM-dd`.
  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix("--") {
      // A leap year validates Feb 29 without asserting a real year.
      let date = NaiveDate::parse_from_str(&format!("2000-{rest}"), "%Y-%m-%d")
        .ok()?;
      return Some(Self { year: None, month: date.month(), day: date.day() });
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Self::from(date))
  }

  pub fn to_naive_date(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(self.year?, self.month, self.day)
  }
}

impl From<NaiveDate> for EventDate {
  fn from(date: NaiveDate) -> Self {
    Self { year: Some(date.year()), month: date.month(), day: date.day() }
  }
}

impl fmt::Display for EventDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.year {
      Some(year) => write!(f, "{year:04}-{:02}-{:02}", self.month, self.day),
      None => write!(f, "--{:02}-{:02}", self.month, self.day),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
  #[serde(flatten)]
  pub info:       DataInfo,
  #[serde(rename = "type")]
  pub kind:       Option<EventType>,
  pub label:      Option<String>,
  /// Stored verbatim; see [`Event::date`] for the parsed form.
  pub start_date: Option<String>,
}

impl Event {
  pub fn new(kind: EventType, date: EventDate) -> Self {
    Self {
      kind: Some(kind),
      start_date: Some(date.to_string()),
      ..Self::default()
    }
  }

  pub fn date(&self) -> Option<EventDate> {
    self.start_date.as_deref().and_then(EventDate::parse)
  }
}

data_entity!(Event, Event, |e| is_blank_text(&e.start_date));

/// Membership of the owning raw contact in a group.
///
/// Memberships are never edited in place; the set of memberships of a raw
/// contact is replaced wholesale, keyed by group id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
  #[serde(flatten)]
  pub info:     DataInfo,
  pub group_id: Option<i64>,
}

impl GroupMembership {
  pub fn new(group_id: i64) -> Self {
    Self { group_id: Some(group_id), ..Self::default() }
  }
}

data_entity!(GroupMembership, GroupMembership, |g| g.group_id.is_none());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Im {
  #[serde(flatten)]
  pub info:            DataInfo,
  pub protocol:        Option<ImProtocol>,
  pub custom_protocol: Option<String>,
  pub data:            Option<String>,
}

data_entity!(Im, Im, |i| is_blank_text(&i.data));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Name {
  #[serde(flatten)]
  pub info:                 DataInfo,
  pub display_name:         Option<String>,
  pub given_name:           Option<String>,
  pub middle_name:          Option<String>,
  pub family_name:          Option<String>,
  pub prefix:               Option<String>,
  pub suffix:               Option<String>,
  pub phonetic_given_name:  Option<String>,
  pub phonetic_middle_name: Option<String>,
  pub phonetic_family_name: Option<String>,
}

data_entity!(Name, Name, |n| all_blank(&[
  &n.display_name,
  &n.given_name,
  &n.middle_name,
  &n.family_name,
  &n.prefix,
  &n.suffix,
  &n.phonetic_given_name,
  &n.phonetic_middle_name,
  &n.phonetic_family_name,
]));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nickname {
  #[serde(flatten)]
  pub info:  DataInfo,
  #[serde(rename = "type")]
  pub kind:  Option<NicknameType>,
  pub label: Option<String>,
  pub name:  Option<String>,
}

data_entity!(Nickname, Nickname, |n| is_blank_text(&n.name));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
  #[serde(flatten)]
  pub info: DataInfo,
  pub note: Option<String>,
}

data_entity!(Note, Note, |n| is_blank_text(&n.note));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
  #[serde(flatten)]
  pub info:            DataInfo,
  #[serde(rename = "type")]
  pub kind:            Option<OrganizationType>,
  pub label:           Option<String>,
  pub company:         Option<String>,
  pub title:           Option<String>,
  pub department:      Option<String>,
  pub job_description: Option<String>,
  pub symbol:          Option<String>,
  pub phonetic_name:   Option<String>,
  pub office_location: Option<String>,
}

data_entity!(Organization, Organization, |o| all_blank(&[
  &o.company,
  &o.title,
  &o.department,
  &o.job_description,
  &o.symbol,
  &o.phonetic_name,
  &o.office_location,
]));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phone {
  #[serde(flatten)]
  pub info:              DataInfo,
  #[serde(rename = "type")]
  pub kind:              Option<PhoneType>,
  pub label:             Option<String>,
  pub number:            Option<String>,
  pub normalized_number: Option<String>,
}

impl Phone {
  pub fn new(kind: PhoneType, number: impl Into<String>) -> Self {
    Self {
      kind: Some(kind),
      number: Some(number.into()),
      ..Self::default()
    }
  }
}

data_entity!(Phone, Phone, |p| all_blank(&[&p.number, &p.normalized_number]));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Photo {
  #[serde(flatten)]
  pub info:      DataInfo,
  /// Id of the full-size photo file kept by the store.
  pub file_id:   Option<i64>,
  pub thumbnail: Option<Vec<u8>>,
}

data_entity!(Photo, Photo, |p| p.file_id.is_none()
  && p.thumbnail.as_ref().is_none_or(Vec::is_empty));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
  #[serde(flatten)]
  pub info:  DataInfo,
  #[serde(rename = "type")]
  pub kind:  Option<RelationType>,
  pub label: Option<String>,
  pub name:  Option<String>,
}

data_entity!(Relation, Relation, |r| is_blank_text(&r.name));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SipAddress {
  #[serde(flatten)]
  pub info:        DataInfo,
  #[serde(rename = "type")]
  pub kind:        Option<SipAddressType>,
  pub label:       Option<String>,
  pub sip_address: Option<String>,
}

data_entity!(SipAddress, SipAddress, |s| is_blank_text(&s.sip_address));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Website {
  #[serde(flatten)]
  pub info:  DataInfo,
  #[serde(rename = "type")]
  pub kind:  Option<WebsiteType>,
  pub label: Option<String>,
  pub url:   Option<String>,
}

data_entity!(Website, Website, |w| is_blank_text(&w.url));

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn type_and_label_do_not_count_towards_blankness() {
    let email = Email {
      kind: Some(EmailType::Work),
      label: Some("work".into()),
      ..Email::default()
    };
    assert!(email.is_blank());
    assert!(!Email::new(EmailType::Work, "a@x.com").is_blank());
    assert!(Email::new(EmailType::Work, "   ").is_blank());
  }

  #[test]
  fn type_codes_follow_platform_values() {
    assert_eq!(PhoneType::from_repr(2), Some(PhoneType::Mobile));
    assert_eq!(ImProtocol::from_repr(-1), Some(ImProtocol::Custom));
    assert_eq!(EmailType::Mobile as i64, 4);
    assert_eq!(WebsiteType::from_repr(99), None);
  }

  #[test]
  fn event_dates_with_and_without_year() {
    let full = EventDate::parse("1990-02-28").unwrap();
    assert_eq!(full.year, Some(1990));
    assert_eq!(full.to_string(), "1990-02-28");
    assert!(full.to_naive_date().is_some());

    let yearless = EventDate::parse("--02-29").unwrap();
    assert_eq!(yearless.year, None);
    assert_eq!((yearless.month, yearless.day), (2, 29));
    assert_eq!(yearless.to_string(), "--02-29");
    assert!(yearless.to_naive_date().is_none());

    assert!(EventDate::parse("not a date").is_none());
    let event = Event::new(EventType::Birthday, full);
    assert_eq!(event.date(), Some(full));
  }

  #[test]
  fn photo_blankness() {
    assert!(Photo::default().is_blank());
    assert!(Photo { thumbnail: Some(vec![]), ..Photo::default() }.is_blank());
    assert!(!Photo { file_id: Some(3), ..Photo::default() }.is_blank());
  }
}
