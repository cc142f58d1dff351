//! Selections and projections shared by the builders.

use roster_core::{
  account::Account,
  column,
  field::{self, FieldSet},
  predicate::{Where, equal_to, is_null},
};

use crate::registry::CustomDataRegistry;

pub(crate) const CONTACTS: &[&str] = &[
  column::ID,
  column::DISPLAY_NAME_PRIMARY,
  column::DISPLAY_NAME_ALT,
  column::LAST_UPDATED,
  column::STARRED,
  column::CUSTOM_RINGTONE,
  column::SEND_TO_VOICEMAIL,
];

pub(crate) const RAW_CONTACTS: &[&str] = &[
  column::ID,
  column::CONTACT_ID,
  column::ACCOUNT_NAME,
  column::ACCOUNT_TYPE,
  column::DISPLAY_NAME_PRIMARY,
  column::DISPLAY_NAME_ALT,
];

pub(crate) const GROUPS: &[&str] = &[
  column::ID,
  column::TITLE,
  column::GROUP_IS_READ_ONLY,
  column::FAVORITES,
  column::AUTO_ADD,
  column::ACCOUNT_NAME,
  column::ACCOUNT_TYPE,
];

pub(crate) const BLOCKED_NUMBERS: &[&str] =
  &[column::ID, column::ORIGINAL_NUMBER, column::E164_NUMBER];

pub(crate) const SIM_CONTACTS: &[&str] =
  &[column::ID, column::SIM_NAME, column::SIM_NUMBER];

/// Data columns to read for `include`: the common data columns and the
/// owning raw contact's account, plus the columns of every included field
/// (built-in or custom). `None` reads every data column.
pub(crate) fn data_projection(
  include: Option<&FieldSet>,
  registry: &CustomDataRegistry,
) -> Vec<&'static str> {
  let mut columns: Vec<&'static str> = field::data::ALL
    .iter()
    .map(|f| f.column)
    .chain([column::ACCOUNT_NAME, column::ACCOUNT_TYPE])
    .collect();
  let extra: Vec<&'static str> = match include {
    None => column::DATA_COLUMNS.to_vec(),
    Some(set) => field::all_data()
      .into_iter()
      .chain(registry.fields())
      .filter(|f| set.contains(f))
      .map(|f| f.column)
      .collect(),
  };
  for column in extra {
    if !columns.contains(&column) {
      columns.push(column);
    }
  }
  columns
}

/// Rows owned by `account`; `None` selects local rows.
pub(crate) fn account(account: Option<&Account>) -> Where {
  match account {
    Some(a) => equal_to(column::ACCOUNT_NAME, a.name.as_str())
      .and(equal_to(column::ACCOUNT_TYPE, a.account_type.as_str())),
    None => is_null(column::ACCOUNT_NAME),
  }
}

/// Rows owned by any of `accounts`. An empty list does not filter.
pub(crate) fn accounts(accounts: &[Option<Account>]) -> Option<Where> {
  accounts
    .iter()
    .map(|a| account(a.as_ref()))
    .reduce(Where::or)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn account_selection() {
    let a = Account::new("a@x.com", "com.example");
    assert_eq!(
      accounts(&[Some(a), None]).map(|w| w.to_string()).as_deref(),
      Some(
        "(((account_name = 'a@x.com') AND (account_type = 'com.example')) OR \
         (account_name IS NULL))"
      )
    );
    assert!(accounts(&[]).is_none());
  }

  #[test]
  fn projection_follows_include() {
    let registry = CustomDataRegistry::new();
    let all = data_projection(None, &registry);
    assert!(all.contains(&column::DATA15));

    let include = field::set([&field::email::ADDRESS, &field::phone::NUMBER]);
    let some = data_projection(Some(&include), &registry);
    assert!(some.contains(&column::DATA1));
    assert!(!some.contains(&column::DATA2));
    assert!(some.contains(&column::MIMETYPE));
    assert_eq!(some.iter().filter(|c| **c == column::DATA1).count(), 1);
  }
}
