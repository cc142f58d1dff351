//! The mutable accumulator behind [`ContactsMapper`](super::ContactsMapper).

use std::collections::BTreeMap;

use roster_core::{
  account::Account,
  entity::{
    Address, CustomDataEntity, Email, Event, GroupMembership, Im, Name,
    Nickname, Note, Organization, Phone, Photo, RawContact, Relation,
    SipAddress, Website,
  },
};

use crate::{
  cursor::RawContactRow,
  registry::CountRestriction,
};

/// Rows of one custom mimetype gathered for a raw contact.
#[derive(Debug, Default)]
pub(super) struct CustomDataHolder {
  pub entities:    Vec<CustomDataEntity>,
  pub restriction: CountRestriction,
}

impl CustomDataHolder {
  pub fn push(&mut self, entity: CustomDataEntity) {
    if self.restriction == CountRestriction::Single && !self.entities.is_empty()
    {
      return;
    }
    self.entities.push(entity);
  }
}

/// A raw contact under construction. Never leaves the read path: it is frozen
/// into a [`RawContact`] by [`TempRawContact::build`].
#[derive(Debug, Default)]
pub(super) struct TempRawContact {
  pub id:                   i64,
  pub contact_id:           Option<i64>,
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

  pub custom_data: BTreeMap<String, CustomDataHolder>,
}

impl TempRawContact {
  /// Start from a row that identifies a raw contact (a raw contacts row or a
  /// data row).
  pub fn from_row<R: RawContactRow + ?Sized>(id: i64, row: &R) -> Self {
    Self {
      id,
      contact_id: row.owning_contact_id(),
      account: row.account(),
      ..Self::default()
    }
  }

  pub fn build(self) -> RawContact {
    RawContact {
      id:                   Some(self.id),
      contact_id:           self.contact_id,
      account:              self.account,
      display_name_primary: self.display_name_primary,
      display_name_alt:     self.display_name_alt,
      name:                 self.name,
      nickname:             self.nickname,
      note:                 self.note,
      organization:         self.organization,
      photo:                self.photo,
      sip_address:          self.sip_address,
      addresses:            self.addresses,
      emails:               self.emails,
      events:               self.events,
      ims:                  self.ims,
      phones:               self.phones,
      relations:            self.relations,
      websites:             self.websites,
      group_memberships:    self.group_memberships,
      custom_data:          self
        .custom_data
        .into_iter()
        .filter(|(_, holder)| !holder.entities.is_empty())
        .map(|(mime, holder)| (mime, holder.entities))
        .collect(),
    }
  }
}
