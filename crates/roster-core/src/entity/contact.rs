//! Contacts and raw contacts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
  Address, CustomDataEntity, DataEntity, Email, Event, GroupMembership, Im,
  Name, Nickname, Note, Organization, Phone, Photo, Relation, SipAddress,
  Website,
};
use crate::{account::Account, is_profile_id};

/// Per-contact preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
  pub starred:           Option<bool>,
  pub custom_ringtone:   Option<String>,
  pub send_to_voicemail: Option<bool>,
}

/// The aggregate of one or more raw contacts that the platform considers the
/// same person. Materialised by queries only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub id:                   i64,
  /// Computed by the store; read-only.
  pub display_name_primary: Option<String>,
  /// Computed by the store; read-only.
  pub display_name_alt:     Option<String>,
  pub last_updated:         Option<DateTime<Utc>>,
  pub options:              Option<Options>,
  /// Always sorted by raw contact id, ascending.
  pub raw_contacts:         Vec<RawContact>,
}

impl Contact {
  /// A contact known only by id, as synthesised for raw contacts whose
  /// parent contact row was not part of the query result.
  pub fn stand_in(id: i64, raw_contacts: Vec<RawContact>) -> Self {
    Self {
      id,
      display_name_primary: None,
      display_name_alt: None,
      last_updated: None,
      options: None,
      raw_contacts,
    }
  }

  pub fn is_blank(&self) -> bool {
    self.raw_contacts.iter().all(RawContact::is_blank)
  }

  pub fn is_profile(&self) -> bool { is_profile_id(self.id) }

  pub fn raw_contact_ids(&self) -> impl Iterator<Item = i64> + '_ {
    self.raw_contacts.iter().filter_map(|r| r.id)
  }

  pub fn emails(&self) -> impl Iterator<Item = &Email> {
    self.raw_contacts.iter().flat_map(|r| &r.emails)
  }

  pub fn phones(&self) -> impl Iterator<Item = &Phone> {
    self.raw_contacts.iter().flat_map(|r| &r.phones)
  }

  pub fn names(&self) -> impl Iterator<Item = &Name> {
    self.raw_contacts.iter().filter_map(|r| r.name.as_ref())
  }
}

/// One account's contribution to a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContact {
  /// `None` until inserted.
  pub id:                   Option<i64>,
  pub contact_id:           Option<i64>,
  /// `None` for a local (unsynced) raw contact.
  pub account:              Option<Account>,
  pub display_name_primary: Option<String>,
  pub display_name_alt:     Option<String>,

  pub name:         Option<Name>,
  pub nickname:     Option<Nickname>,
  pub note:         Option<Note>,
  pub organization: Option<Organization>,
  pub photo:        Option<Photo>,
  pub sip_address:  Option<SipAddress>,

  pub addresses:         Vec<Address>,
  pub emails:            Vec<Email>,
  pub events:            Vec<Event>,
  pub ims:               Vec<Im>,
  pub phones:            Vec<Phone>,
  pub relations:         Vec<Relation>,
  pub websites:          Vec<Website>,
  pub group_memberships: Vec<GroupMembership>,

  /// Custom data rows keyed by custom mimetype.
  pub custom_data: BTreeMap<String, Vec<CustomDataEntity>>,
}

fn blank_opt<T: DataEntity>(value: &Option<T>) -> bool {
  value.as_ref().is_none_or(DataEntity::is_blank)
}

fn blank_all<T: DataEntity>(values: &[T]) -> bool {
  values.iter().all(DataEntity::is_blank)
}

impl RawContact {
  pub fn new() -> Self { Self::default() }

  /// `true` if every contained data value is blank.
  ///
  /// Group memberships are not considered: the store adds the default group
  /// membership on its own, so a membership says nothing about the person.
  pub fn is_blank(&self) -> bool {
    blank_opt(&self.name)
      && blank_opt(&self.nickname)
      && blank_opt(&self.note)
      && blank_opt(&self.organization)
      && blank_opt(&self.photo)
      && blank_opt(&self.sip_address)
      && blank_all(&self.addresses)
      && blank_all(&self.emails)
      && blank_all(&self.events)
      && blank_all(&self.ims)
      && blank_all(&self.phones)
      && blank_all(&self.relations)
      && blank_all(&self.websites)
      && self.custom_data.values().all(|v| blank_all(v))
  }

  pub fn is_profile(&self) -> bool { self.id.is_some_and(is_profile_id) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entity::EmailType;

  #[test]
  fn raw_contact_blankness_ignores_group_memberships() {
    let mut raw = RawContact::new();
    assert!(raw.is_blank());

    raw.group_memberships.push(GroupMembership::new(1));
    raw.emails.push(Email::default());
    assert!(raw.is_blank());

    raw.emails.push(Email::new(EmailType::Home, "b@x.com"));
    assert!(!raw.is_blank());
  }

  #[test]
  fn contact_is_blank_iff_all_raw_contacts_are() {
    let blank = RawContact::new();
    let mut full = RawContact::new();
    full.note = Some(Note { note: Some("hi".into()), ..Note::default() });

    assert!(Contact::stand_in(1, vec![blank.clone()]).is_blank());
    assert!(!Contact::stand_in(1, vec![blank, full]).is_blank());
  }
}
