//! Mimetypes: the tag that says what kind of fact a data row holds.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of built-in mimetypes plus an open [`MimeType::Custom`]
/// extension point resolved through a custom-data registry.
///
/// Parsing never fails: any non-empty string that is not a built-in mimetype
/// becomes `Custom`, and the empty string is `Unknown`. Whether a custom mimetype is actually supported is decided by
/// the registry, which maps unregistered ones to [`MimeType::Unknown`].
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Display,
  EnumString,
  Serialize,
  Deserialize,
)]
#[serde(into = "String", from = "String")]
pub enum MimeType {
  #[strum(serialize = "vnd.android.cursor.item/postal-address_v2")]
  Address,
  #[strum(serialize = "vnd.android.cursor.item/email_v2")]
  Email,
  #[strum(serialize = "vnd.android.cursor.item/contact_event")]
  Event,
  #[strum(serialize = "vnd.android.cursor.item/group_membership")]
  GroupMembership,
  #[strum(serialize = "vnd.android.cursor.item/im")]
  Im,
  #[strum(serialize = "vnd.android.cursor.item/name")]
  Name,
  #[strum(serialize = "vnd.android.cursor.item/nickname")]
  Nickname,
  #[strum(serialize = "vnd.android.cursor.item/note")]
  Note,
  #[strum(serialize = "vnd.android.cursor.item/organization")]
  Organization,
  #[strum(serialize = "vnd.android.cursor.item/phone_v2")]
  Phone,
  #[strum(serialize = "vnd.android.cursor.item/photo")]
  Photo,
  #[strum(serialize = "vnd.android.cursor.item/relation")]
  Relation,
  #[strum(serialize = "vnd.android.cursor.item/sip_address")]
  SipAddress,
  #[strum(serialize = "vnd.android.cursor.item/website")]
  Website,
  #[strum(default)]
  Custom(String),
  #[strum(serialize = "")]
  Unknown,
}

impl MimeType {
  /// Every built-in mimetype, in the order data rows are dispatched.
  pub const BUILT_IN: [MimeType; 14] = [
    Self::Address,
    Self::Email,
    Self::Event,
    Self::GroupMembership,
    Self::Im,
    Self::Name,
    Self::Nickname,
    Self::Note,
    Self::Organization,
    Self::Phone,
    Self::Photo,
    Self::Relation,
    Self::SipAddress,
    Self::Website,
  ];

  /// Parse a `mimetype` column value; its `Display` form is the stored
  /// string. Infallible, see the type docs.
  pub fn from_value(value: &str) -> Self {
    value.parse().unwrap_or_else(|_| Self::Custom(value.to_owned()))
  }

  pub fn is_custom(&self) -> bool { matches!(self, Self::Custom(_)) }
}

impl From<MimeType> for String {
  fn from(m: MimeType) -> Self { m.to_string() }
}

impl From<String> for MimeType {
  fn from(s: String) -> Self { Self::from_value(&s) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn built_in_values_round_trip() {
    for mime in MimeType::BUILT_IN {
      assert_eq!(MimeType::from_value(&mime.to_string()), mime);
    }
  }

  #[test]
  fn unrecognised_values_are_custom() {
    assert_eq!(
      MimeType::from_value("vnd.example/gender"),
      MimeType::Custom("vnd.example/gender".into())
    );
  }

  #[test]
  fn display_is_the_stored_string() {
    assert_eq!(MimeType::Email.to_string(), "vnd.android.cursor.item/email_v2");
    assert_eq!(MimeType::Custom("vnd.example/gender".into()).to_string(), "vnd.example/gender");
    assert_eq!(MimeType::Unknown.to_string(), "");
    assert_eq!(MimeType::from_value(""), MimeType::Unknown);
  }
}
