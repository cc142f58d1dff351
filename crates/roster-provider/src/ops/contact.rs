use roster_core::{
  column,
  entity::Options,
  field::{FieldSet, is_included, options::*},
  operation::Operation,
  predicate::equal_to,
  store::Table,
  value::Value,
};

/// Write the included options columns of a contact row. `None` if no option
/// field is included.
pub(crate) fn options_update(
  profile: bool,
  contact_id: i64,
  options: &Options,
  include: Option<&FieldSet>,
) -> Option<Operation> {
  let mut op =
    Operation::update(Table::contacts(profile), equal_to(column::ID, contact_id));
  let values: [(_, Value); 3] = [
    (STARRED, options.starred.into()),
    (CUSTOM_RINGTONE, options.custom_ringtone.clone().into()),
    (SEND_TO_VOICEMAIL, options.send_to_voicemail.into()),
  ];
  for (field, value) in values {
    if is_included(&field, include) {
      op.set_value(field.column, value);
    }
  }
  op.has_values().then_some(op)
}

#[cfg(test)]
mod tests {
  use roster_core::field;

  use super::*;

  #[test]
  fn writes_only_included_options() {
    let options = Options { starred: Some(true), ..Options::default() };

    let op = options_update(false, 3, &options, None).unwrap();
    assert_eq!(op.table, Table::Contacts);
    assert_eq!(op.value(column::STARRED), Some(&Value::from(true)));
    assert_eq!(op.value(column::CUSTOM_RINGTONE), Some(&Value::Null));

    let include = field::set([&STARRED]);
    let op = options_update(true, 3, &options, Some(&include)).unwrap();
    assert_eq!(op.table, Table::ProfileContacts);
    assert_eq!(op.values.len(), 1);

    assert!(options_update(false, 3, &options, Some(&FieldSet::new())).is_none());
  }
}
