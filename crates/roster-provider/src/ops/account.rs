use roster_core::{
  account::Account,
  column,
  mime::MimeType,
  operation::Operation,
  predicate::{equal_to, is_in},
  store::Table,
};

/// Move raw contacts to `account` (`None`: local). Memberships are
/// account-scoped, so they are dropped in the same batch.
pub(crate) fn associate(
  account: Option<&Account>,
  raw_contact_ids: &[i64],
) -> Vec<Operation> {
  let memberships = is_in(column::RAW_CONTACT_ID, raw_contact_ids.iter().copied())
    .and(equal_to(column::MIMETYPE, MimeType::GroupMembership.to_string()));
  vec![
    Operation::delete(Table::Data, memberships),
    Operation::update(
      Table::RawContacts,
      is_in(column::ID, raw_contact_ids.iter().copied()),
    )
    .with_value(column::ACCOUNT_NAME, account.map(|a| a.name.clone()))
    .with_value(column::ACCOUNT_TYPE, account.map(|a| a.account_type.clone())),
  ]
}

#[cfg(test)]
mod tests {
  use roster_core::{operation::OperationKind, value::Value};

  use super::*;

  #[test]
  fn drops_memberships_then_moves_accounts() {
    let account = Account::new("a@x.com", "com.example");
    let ops = associate(Some(&account), &[1, 2]);
    assert_eq!(ops[0].kind, OperationKind::Delete);
    assert_eq!(ops[0].table, Table::Data);
    assert_eq!(
      ops[1].selection.as_ref().map(ToString::to_string).as_deref(),
      Some("(_id IN (1, 2))")
    );
    assert_eq!(ops[1].value(column::ACCOUNT_NAME), Some(&Value::from("a@x.com")));

    let local = associate(None, &[1]);
    assert_eq!(local[1].value(column::ACCOUNT_TYPE), Some(&Value::Null));
  }
}
