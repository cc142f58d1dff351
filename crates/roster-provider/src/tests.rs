//! End-to-end tests of the façade against an in-memory SQLite store.

use std::{
  cell::Cell,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use roster_core::{
  Cancel, Error,
  account::Account,
  column,
  entity::{
    BlockedNumber, CustomDataEntity, DataEntity as _, Email, EmailType, Group,
    GroupMembership, Name, Note, Options, Phone, PhoneType, RawContact,
    SimContact,
  },
  field,
  operation::{Operation, OperationResult},
  predicate::{OrderBy, Where, equal_to, like},
  store::{
    BatchExecutor, Cursor, PermissionOracle, RowSource, StaticAccounts, Table,
  },
  value::Value,
};
use roster_store_sqlite::SqliteStore;

use crate::{
  Contacts, GroupsInsertFailure, InsertFailure,
  registry::{CustomDataRegistry, SimpleCustomData},
};

fn account() -> Account { Account::new("ada@example.com", "com.example") }

fn contacts() -> Contacts {
  let store = SqliteStore::open_in_memory().expect("in-memory store");
  store.add_account(&account()).expect("account added");
  Contacts::new(store).with_account_oracle(StaticAccounts(vec![account()]))
}

fn ada() -> RawContact {
  let mut raw = RawContact::new();
  raw.name = Some(Name {
    display_name: Some("Ada Lovelace".into()),
    given_name: Some("Ada".into()),
    family_name: Some("Lovelace".into()),
    ..Name::default()
  });
  raw.emails = vec![
    Email::new(EmailType::Work, "a@x.com"),
    Email::new(EmailType::Home, "b@x.com"),
  ];
  raw
}

fn insert_one(c: &Contacts, raw: RawContact, account: Option<Account>) -> i64 {
  let result = c.insert().for_account(account).raw_contact(raw).commit().unwrap();
  result.raw_contact_id(0).expect("inserted")
}

fn by_email(address: &str) -> roster_core::predicate::Where {
  equal_to(column::MIMETYPE, roster_core::mime::MimeType::Email.to_string())
    .and(equal_to(field::email::ADDRESS.column, address))
}

// ─── Insert / query ──────────────────────────────────────────────────────────

#[test]
fn inserted_raw_contact_is_found_with_its_data() {
  let c = contacts();
  let raw_id = insert_one(&c, ada(), None);

  let found = c.query().filter(by_email("b@x.com")).find();
  assert_eq!(found.len(), 1);
  let contact = &found[0];
  assert_eq!(contact.display_name_primary.as_deref(), Some("Ada Lovelace"));
  assert_eq!(contact.display_name_alt.as_deref(), Some("Lovelace, Ada"));
  assert!(contact.last_updated.is_some());
  assert_eq!(contact.raw_contacts.len(), 1);

  let raw = &contact.raw_contacts[0];
  assert_eq!(raw.id, Some(raw_id));
  assert_eq!(raw.account, None);
  assert_eq!(raw.name.as_ref().and_then(|n| n.given_name.as_deref()), Some("Ada"));
  let emails: Vec<_> = raw
    .emails
    .iter()
    .map(|e| (e.kind, e.address.as_deref(), e.info.contact_id))
    .collect();
  assert_eq!(emails, vec![
    (Some(EmailType::Work), Some("a@x.com"), Some(contact.id)),
    (Some(EmailType::Home), Some("b@x.com"), Some(contact.id)),
  ]);
}

#[test]
fn blank_raw_contacts_are_skipped_unless_allowed() {
  let c = contacts();
  let result = c.insert().raw_contact(RawContact::new()).commit().unwrap();
  assert_eq!(result.failure(0), Some(InsertFailure::Blank));

  let result = c
    .insert()
    .allow_blanks(true)
    .raw_contact(RawContact::new())
    .commit()
    .unwrap();
  assert!(result.is_successful());
  assert_eq!(c.query().find().len(), 1);
}

#[test]
fn unknown_account_inserts_locally() {
  let c = contacts();
  let stranger = Account::new("eve@example.com", "com.example");
  let raw_id = insert_one(&c, ada(), Some(stranger));
  let raws = c.raw_contacts_query().find();
  assert_eq!(raws[0].id, Some(raw_id));
  assert_eq!(raws[0].account, None);
}

#[test]
fn query_orders_and_pages_contacts() {
  let c = contacts();
  for name in ["Carol", "Alice", "Bob"] {
    let mut raw = RawContact::new();
    raw.name = Some(Name { display_name: Some(name.into()), ..Name::default() });
    insert_one(&c, raw, None);
  }

  let names = |contacts: Vec<roster_core::entity::Contact>| -> Vec<String> {
    contacts
      .into_iter()
      .filter_map(|c| c.display_name_primary)
      .collect()
  };
  let query = c.query().order_by(OrderBy::asc(column::DISPLAY_NAME_PRIMARY));
  assert_eq!(names(query.find()), vec!["Alice", "Bob", "Carol"]);
  assert_eq!(
    names(query.clone().limit(1).unwrap().offset(1).find()),
    vec!["Bob"]
  );
  assert_eq!(
    names(c.query().filter(like(column::DISPLAY_NAME_PRIMARY, "%o%")).find()),
    vec!["Carol", "Bob"]
  );
  assert!(matches!(c.query().limit(0), Err(Error::InvalidArgument(_))));
}

#[test]
fn account_filter_limits_raw_contacts() {
  let c = contacts();
  insert_one(&c, ada(), Some(account()));
  insert_one(&c, ada(), None);

  let synced = c.query().accounts([Some(account())]).find();
  assert_eq!(synced.len(), 1);
  assert_eq!(synced[0].raw_contacts[0].account, Some(account()));

  let local = c.raw_contacts_query().accounts([None]).find();
  assert_eq!(local.len(), 1);
  assert_eq!(local[0].account, None);
}

#[test]
fn contacts_matching_several_rows_are_returned_once() {
  let c = contacts();
  insert_one(&c, ada(), None);
  let found = c.query().filter(like(column::DATA1, "%@x.com")).find();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].raw_contacts[0].emails.len(), 2);
}

#[test]
fn queries_cancelled_part_way_return_nothing() {
  let c = contacts();
  insert_one(&c, ada(), None);
  insert_one(&c, ada(), Some(account()));

  let polls = Cell::new(0);
  let counting = || {
    polls.set(polls.get() + 1);
    false
  };
  let contacts = c.query().filter(like(column::DATA1, "%@x.com"));
  assert_eq!(contacts.find_with_cancel(Cancel::new(&counting)).len(), 2);
  let contact_polls = polls.replace(0);
  let raw_contacts = c.raw_contacts_query();
  assert_eq!(raw_contacts.find_with_cancel(Cancel::new(&counting)).len(), 2);
  let raw_contact_polls = polls.get();
  assert!(contact_polls > 0 && raw_contact_polls > 0);

  for after in 0..contact_polls {
    let seen = Cell::new(0);
    let cancel = || {
      seen.set(seen.get() + 1);
      seen.get() > after
    };
    assert!(
      contacts.find_with_cancel(Cancel::new(&cancel)).is_empty(),
      "contacts query cancelled after {after} polls"
    );
  }
  for after in 0..raw_contact_polls {
    let seen = Cell::new(0);
    let cancel = || {
      seen.set(seen.get() + 1);
      seen.get() > after
    };
    assert!(
      raw_contacts.find_with_cancel(Cancel::new(&cancel)).is_empty(),
      "raw contacts query cancelled after {after} polls"
    );
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[test]
fn dropping_an_email_deletes_only_that_row() {
  let c = contacts();
  let raw_id = insert_one(&c, ada(), None);

  let mut raw = c.raw_contacts_query().find().remove(0);
  let work_id = raw.emails[0].id();
  raw.emails.retain(|e| e.kind == Some(EmailType::Work));
  let result = c.update().raw_contacts([raw]).commit().unwrap();
  assert!(result.is_successful());
  assert!(result.raw_contact(raw_id));

  let raw = c.raw_contacts_query().find().remove(0);
  assert_eq!(raw.emails.len(), 1);
  assert_eq!(raw.emails[0].id(), work_id);
  assert_eq!(raw.emails[0].address.as_deref(), Some("a@x.com"));
}

#[test]
fn update_adds_replaces_and_removes_data() {
  let c = contacts();
  insert_one(&c, ada(), None);

  let mut raw = c.raw_contacts_query().find().remove(0);
  raw.note = Some(Note { note: Some("met at the lab".into()), ..Note::default() });
  raw.phones.push(Phone::new(PhoneType::Mobile, "+1 555 0100"));
  raw.name = None;
  raw.emails[0].address = Some("ada@x.com".into());
  assert!(c.update().raw_contacts([raw]).commit().unwrap().is_successful());

  let raw = c.raw_contacts_query().find().remove(0);
  assert_eq!(raw.note.and_then(|n| n.note).as_deref(), Some("met at the lab"));
  assert_eq!(raw.phones.len(), 1);
  assert_eq!(raw.name, None);
  let addresses: Vec<_> = raw.emails.iter().filter_map(|e| e.address.as_deref()).collect();
  assert_eq!(addresses, vec!["ada@x.com", "b@x.com"]);
}

#[test]
fn include_limits_what_an_update_writes() {
  let c = contacts();
  insert_one(&c, ada(), None);

  let mut raw = c.raw_contacts_query().find().remove(0);
  raw.emails.clear();
  raw.phones.push(Phone::new(PhoneType::Mobile, "+1 555 0100"));
  let result = c
    .update()
    .include(field::phone::ALL)
    .raw_contacts([raw])
    .commit()
    .unwrap();
  assert!(result.is_successful());

  let raw = c.raw_contacts_query().find().remove(0);
  assert_eq!(raw.emails.len(), 2);
  assert_eq!(raw.phones.len(), 1);
}

#[test]
fn blank_raw_contacts_are_deleted_on_update() {
  let c = contacts();
  let raw_id = insert_one(&c, ada(), None);

  let mut raw = c.raw_contacts_query().find().remove(0);
  raw.name = None;
  raw.emails.clear();
  let result = c.update().raw_contacts([raw]).commit().unwrap();
  assert!(result.raw_contact(raw_id));
  assert!(c.query().find().is_empty());
}

#[test]
fn contact_options_are_written() {
  let c = contacts();
  insert_one(&c, ada(), None);

  let mut contact = c.query().find().remove(0);
  contact.options = Some(Options {
    starred: Some(true),
    custom_ringtone: Some("bells".into()),
    ..Options::default()
  });
  let id = contact.id;
  let result = c.update().contacts([contact]).commit().unwrap();
  assert!(result.contact(id));

  let options = c.query().find().remove(0).options.unwrap();
  assert_eq!(options.starred, Some(true));
  assert_eq!(options.custom_ringtone.as_deref(), Some("bells"));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[test]
fn delete_by_id_and_by_selection() {
  let c = contacts();
  let first = insert_one(&c, ada(), None);
  let mut other = RawContact::new();
  other.emails.push(Email::new(EmailType::Home, "c@x.com"));
  insert_one(&c, other, None);

  let result = c.delete().raw_contact_ids([first, 999]).commit();
  assert_eq!(result.raw_contacts.get(&first), Some(&true));
  assert_eq!(result.raw_contacts.get(&999), Some(&false));
  assert!(!result.is_successful());

  let result = c.delete().contacts_where(by_email("c@x.com")).commit();
  assert_eq!(result.by_selection, Some(true));
  assert!(c.query().find().is_empty());
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[test]
fn profile_is_kept_apart_from_contacts() {
  let c = contacts();
  let profile_raw = c
    .profile()
    .insert()
    .raw_contact(ada())
    .commit()
    .unwrap()
    .raw_contact_id(0)
    .unwrap();
  assert!(roster_core::is_profile_id(profile_raw));
  assert!(c.query().find().is_empty());

  let me = c.profile().query().find_one().unwrap();
  assert!(me.is_profile());
  assert_eq!(me.emails().count(), 2);

  // One profile raw contact per account.
  let again = c.profile().insert().raw_contact(ada()).commit().unwrap();
  assert_eq!(again.failure(0), Some(InsertFailure::ProfileExists));

  // Regular builders never touch profile rows.
  let result = c.delete().raw_contact_ids([profile_raw]).commit();
  assert_eq!(result.raw_contacts.get(&profile_raw), Some(&false));
  assert!(c.profile().delete().raw_contact_ids([profile_raw]).commit().is_successful());
  assert!(c.profile().query().find().is_empty());
}

// ─── Data ────────────────────────────────────────────────────────────────────

#[test]
fn data_rows_are_queried_updated_and_deleted_directly() {
  let c = contacts();
  insert_one(&c, ada(), None);

  let emails = c
    .data_query::<Email>()
    .order_by(OrderBy::desc(field::email::ADDRESS.column))
    .find();
  let addresses: Vec<_> = emails.iter().filter_map(|e| e.address.as_deref()).collect();
  assert_eq!(addresses, vec!["b@x.com", "a@x.com"]);

  let mut home = emails[0].clone();
  home.address = Some("home@x.com".into());
  let home_id = home.id().unwrap();
  let updated = c.data_update().data(&home).commit();
  assert_eq!(updated.get(&home_id), Some(&true));

  let deleted = c.data_delete().data(&emails[1]).commit();
  assert!(deleted.values().all(|ok| *ok));

  let left: Vec<_> = c
    .data_query::<Email>()
    .find()
    .into_iter()
    .filter_map(|e| e.address)
    .collect();
  assert_eq!(left, vec!["home@x.com"]);
  assert!(c.data_query::<Phone>().find().is_empty());
}

#[test]
fn custom_data_round_trips_through_the_registry() {
  const MOOD: &str = "vnd.example.cursor.item/mood";
  const MOOD_FIELD: field::Field = field::Field::new("Mood.Mood", column::DATA1);

  let c = contacts()
    .with_registry(CustomDataRegistry::new().with(SimpleCustomData::new(MOOD, &[MOOD_FIELD])));
  let mut raw = ada();
  raw
    .custom_data
    .insert(MOOD.into(), vec![CustomDataEntity::new(MOOD).with(column::DATA1, "calm")]);
  insert_one(&c, raw, None);

  let raw = c.raw_contacts_query().find().remove(0);
  let moods = &raw.custom_data[MOOD];
  assert_eq!(moods.len(), 1);
  assert_eq!(moods[0].get(column::DATA1), &Value::from("calm"));

  let mut changed = moods[0].clone();
  changed.values.insert(column::DATA1.into(), Value::from("curious"));
  let id = changed.info.id.unwrap();
  assert_eq!(c.data_update().custom(&changed).unwrap().commit().get(&id), Some(&true));

  let unknown = CustomDataEntity::new("vnd.example.cursor.item/unknown");
  assert!(matches!(
    c.data_update().custom(&unknown),
    Err(Error::UnsupportedMimeType(_))
  ));
}

// ─── Groups ──────────────────────────────────────────────────────────────────

#[test]
fn groups_are_account_scoped_and_titles_unique() {
  let c = contacts();
  let system = c.groups().accounts([Some(account())]).find();
  assert_eq!(system.len(), 2);
  assert!(system.iter().all(|g| g.read_only));

  let result = c
    .groups_insert()
    .group(Group::new("Friends", Some(account())))
    .group(Group::new("Friends", Some(account())))
    .group(Group::new("Local", None))
    .commit();
  let friends = result.group_id(0).unwrap();
  assert_eq!(result.failure(1), Some(GroupsInsertFailure::TitleAlreadyExists));
  assert_eq!(result.failure(2), Some(GroupsInsertFailure::InvalidAccount));

  let mut renamed = c.groups().filter(equal_to(column::ID, friends)).find().remove(0);
  renamed.title = "My Contacts".into();
  assert_eq!(c.groups_update().group(renamed.clone()).commit().get(&friends), Some(&false));
  renamed.title = "Close friends".into();
  assert_eq!(c.groups_update().group(renamed).commit().get(&friends), Some(&true));

  let mut system_group = system[0].clone();
  let system_id = system_group.id.unwrap();
  system_group.title = "Renamed".into();
  assert_eq!(c.groups_update().group(system_group).commit().get(&system_id), Some(&false));

  let deleted = c.groups_delete().ids([friends, system_id]).commit();
  assert_eq!(deleted.get(&friends), Some(&true));
  assert_eq!(deleted.get(&system_id), Some(&false));
}

#[test]
fn memberships_follow_the_account_and_keep_the_default_group() {
  let c = contacts();
  let friends = c
    .groups_insert()
    .group(Group::new("Friends", Some(account())))
    .commit()
    .group_id(0)
    .unwrap();
  let default = c
    .groups()
    .accounts([Some(account())])
    .find()
    .into_iter()
    .find(Group::is_default)
    .and_then(|g| g.id)
    .unwrap();

  let mut raw = ada();
  raw.group_memberships = vec![GroupMembership::new(friends), GroupMembership::new(12345)];
  insert_one(&c, raw, Some(account()));

  let group_ids = |raw: &RawContact| -> Vec<i64> {
    let mut ids: Vec<i64> = raw.group_memberships.iter().filter_map(|m| m.group_id).collect();
    ids.sort();
    ids
  };
  let mut raw = c.raw_contacts_query().find().remove(0);
  let mut expected = vec![default, friends];
  expected.sort();
  assert_eq!(group_ids(&raw), expected);

  raw.group_memberships.clear();
  assert!(c.update().raw_contacts([raw]).commit().unwrap().is_successful());
  let raw = c.raw_contacts_query().find().remove(0);
  assert_eq!(group_ids(&raw), vec![default]);
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[test]
fn raw_contacts_move_between_accounts() {
  let c = contacts();
  let raw_id = insert_one(&c, ada(), None);
  let accounts = c.accounts();

  let stranger = Account::new("eve@example.com", "com.example");
  assert!(!accounts.associate_account_with_raw_contacts(&stranger, &[raw_id]));
  assert!(!accounts.associate_account_with_raw_contacts(&account(), &[]));

  assert!(accounts.associate_account_with_raw_contacts(&account(), &[raw_id]));
  let moved = accounts.query_raw_contacts_for_account(Some(&account()));
  assert_eq!(moved.len(), 1);
  assert_eq!(moved[0].group_memberships.len(), 1);
  // Already there: nothing to do.
  assert!(accounts.associate_account_with_raw_contacts(&account(), &[raw_id]));

  assert!(accounts.dissociate_raw_contacts(&[raw_id]));
  let local = accounts.query_raw_contacts_for_account(None);
  assert_eq!(local.len(), 1);
  assert!(local[0].group_memberships.is_empty());
  assert_eq!(local[0].emails.len(), 2);

  assert!(accounts.associate_account_with_local_raw_contacts(&account()));
  assert!(accounts.dissociate_all_raw_contacts(&account()));
  assert!(accounts.query_raw_contacts_for_account(Some(&account())).is_empty());
}

// ─── Blocked numbers / SIM ───────────────────────────────────────────────────

#[test]
fn numbers_are_blocked_and_unblocked() {
  let c = contacts();
  let blocked = c.blocked_numbers();
  let ids = blocked
    .insert()
    .number("+1 555 0100")
    .number("  ")
    .blocked_numbers([BlockedNumber {
      number: "555 0199".into(),
      normalized_number: Some("+15550199".into()),
      ..BlockedNumber::default()
    }])
    .commit();
  assert!(ids[0].is_some());
  assert_eq!(ids[1], None);

  assert!(blocked.is_blocked("+1 555 0100"));
  assert_eq!(blocked.find().len(), 2);
  assert!(blocked.unblock("+1 555 0100"));
  assert!(!blocked.is_blocked("+1 555 0100"));

  let left = blocked.find();
  assert_eq!(left[0].normalized_number.as_deref(), Some("+15550199"));
  let deleted = blocked.delete(left.iter().filter_map(|b| b.id));
  assert!(deleted.values().all(|ok| *ok));
  assert!(blocked.find().is_empty());
}

#[test]
fn sim_contacts_are_matched_by_name_and_number() {
  let c = contacts();
  let sim = c.sim_contacts();
  let ada = SimContact::new("Ada", "555 0100");
  assert_eq!(sim.insert([&ada, &SimContact::default()]), vec![true, false]);

  let changed = SimContact::new("Ada L.", "555 0100");
  assert!(sim.update(&ada, &changed));
  assert!(!sim.update(&ada, &changed));

  let found = sim.find();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].name.as_deref(), Some("Ada L."));
  assert_eq!(sim.delete([&changed]), vec![true]);
  assert!(sim.find().is_empty());
}

// ─── Permissions ─────────────────────────────────────────────────────────────

struct ReadOnly;

impl PermissionOracle for ReadOnly {
  fn can_query(&self) -> bool { true }

  fn can_insert(&self) -> bool { false }

  fn can_update_delete(&self) -> bool { false }
}

#[test]
fn denied_permissions_fail_without_touching_the_store() {
  let c = contacts();
  insert_one(&c, ada(), None);
  let c = c.with_permissions(ReadOnly);

  let result = c.insert().raw_contact(ada()).commit().unwrap();
  assert_eq!(result.failure(0), Some(InsertFailure::PermissionDenied));

  let raw = c.raw_contacts_query().find().remove(0);
  let raw_id = raw.id.unwrap();
  let result = c.update().raw_contacts([raw]).commit().unwrap();
  assert!(!result.raw_contact(raw_id));
  assert!(!c.delete().raw_contact_ids([raw_id]).commit().is_successful());
  assert!(!c.accounts().associate_account_with_raw_contacts(&account(), &[raw_id]));
  assert_eq!(c.query().find().len(), 1);
}

// ─── Store failures ──────────────────────────────────────────────────────────

/// SQLite, except that the groups table stops answering once `fail` is set.
struct GroupsUnreadable {
  store: SqliteStore,
  fail:  Arc<AtomicBool>,
}

impl RowSource for GroupsUnreadable {
  fn query(
    &self,
    table: Table,
    projection: &[&str],
    selection: Option<&Where>,
    sort_order: Option<&str>,
  ) -> Option<Box<dyn Cursor + '_>> {
    if table == Table::Groups && self.fail.load(Ordering::SeqCst) {
      return None;
    }
    self.store.query(table, projection, selection, sort_order)
  }
}

impl BatchExecutor for GroupsUnreadable {
  fn apply_batch(&self, operations: Vec<Operation>) -> Option<Vec<OperationResult>> {
    self.store.apply_batch(operations)
  }
}

#[test]
fn unreadable_groups_fail_writes_and_keep_memberships() {
  let store = SqliteStore::open_in_memory().expect("in-memory store");
  store.add_account(&account()).expect("account added");
  let fail = Arc::new(AtomicBool::new(false));
  let c = Contacts::new(GroupsUnreadable { store, fail: fail.clone() })
    .with_account_oracle(StaticAccounts(vec![account()]));

  let friends = c
    .groups_insert()
    .group(Group::new("Friends", Some(account())))
    .commit()
    .group_id(0)
    .unwrap();
  let mut raw = ada();
  raw.group_memberships = vec![GroupMembership::new(friends)];
  let raw_id = insert_one(&c, raw, Some(account()));
  let stored = c.raw_contacts_query().find().remove(0);
  // Friends plus the account's default group.
  assert_eq!(stored.group_memberships.len(), 2);

  fail.store(true, Ordering::SeqCst);
  let result = c.update().raw_contacts([stored.clone()]).commit().unwrap();
  assert!(!result.raw_contact(raw_id));
  let result = c
    .insert()
    .for_account(Some(account()))
    .raw_contact(ada())
    .commit()
    .unwrap();
  assert_eq!(result.failure(0), Some(InsertFailure::Failed));

  fail.store(false, Ordering::SeqCst);
  let after = c.raw_contacts_query().find();
  assert_eq!(after.len(), 1);
  assert_eq!(after[0].group_memberships, stored.group_memberships);
}
