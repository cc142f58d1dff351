//! Column names of the content store tables.
//!
//! Data rows share the generic `data1`..`data15` columns; which column holds
//! which attribute depends on the row's mimetype (see [`crate::field`]).

pub const ID: &str = "_id";
pub const CONTACT_ID: &str = "contact_id";
pub const RAW_CONTACT_ID: &str = "raw_contact_id";

// ─── Contacts ────────────────────────────────────────────────────────────────

pub const DISPLAY_NAME_PRIMARY: &str = "display_name";
pub const DISPLAY_NAME_ALT: &str = "display_name_alt";
/// Epoch milliseconds.
pub const LAST_UPDATED: &str = "contact_last_updated_timestamp";
pub const STARRED: &str = "starred";
pub const CUSTOM_RINGTONE: &str = "custom_ringtone";
pub const SEND_TO_VOICEMAIL: &str = "send_to_voicemail";

// ─── RawContacts / Groups ────────────────────────────────────────────────────

pub const ACCOUNT_NAME: &str = "account_name";
pub const ACCOUNT_TYPE: &str = "account_type";

// ─── Data ────────────────────────────────────────────────────────────────────

pub const MIMETYPE: &str = "mimetype";
pub const IS_PRIMARY: &str = "is_primary";
pub const IS_SUPER_PRIMARY: &str = "is_super_primary";

pub const DATA1: &str = "data1";
pub const DATA2: &str = "data2";
pub const DATA3: &str = "data3";
pub const DATA4: &str = "data4";
pub const DATA5: &str = "data5";
pub const DATA6: &str = "data6";
pub const DATA7: &str = "data7";
pub const DATA8: &str = "data8";
pub const DATA9: &str = "data9";
pub const DATA10: &str = "data10";
pub const DATA11: &str = "data11";
pub const DATA12: &str = "data12";
pub const DATA13: &str = "data13";
pub const DATA14: &str = "data14";
pub const DATA15: &str = "data15";

pub const DATA_COLUMNS: [&str; 15] = [
  DATA1, DATA2, DATA3, DATA4, DATA5, DATA6, DATA7, DATA8, DATA9, DATA10,
  DATA11, DATA12, DATA13, DATA14, DATA15,
];

// ─── Groups ──────────────────────────────────────────────────────────────────

pub const TITLE: &str = "title";
pub const GROUP_IS_READ_ONLY: &str = "group_is_read_only";
pub const FAVORITES: &str = "favorites";
pub const AUTO_ADD: &str = "auto_add";

// ─── Blocked numbers ─────────────────────────────────────────────────────────

pub const ORIGINAL_NUMBER: &str = "original_number";
pub const E164_NUMBER: &str = "e164_number";

// ─── SIM contacts ────────────────────────────────────────────────────────────

pub const SIM_NAME: &str = "name";
pub const SIM_NUMBER: &str = "number";
