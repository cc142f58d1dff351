//! Whole-raw-contact operation building on top of [`DataReconciler`].

use roster_core::{
  Result,
  account::Account,
  column,
  entity::{Group, RawContact},
  field::{self, Field, FieldSet},
  mime::MimeType,
  operation::Operation,
  store::{RowSource, Table},
};

use super::{
  data::{DataReconciler, DesiredRow, Owner},
  values::DataValues,
};
use crate::registry::{CountRestriction, CustomDataRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cardinality {
  Single,
  Multiple,
}

/// The desired rows of one mimetype.
struct MimeRows<'r> {
  mime:        String,
  fields:      &'r [Field],
  cardinality: Cardinality,
  rows:        Vec<DesiredRow>,
}

impl<'r> MimeRows<'r> {
  fn new(mime: MimeType, cardinality: Cardinality, rows: Vec<DesiredRow>) -> Self {
    Self {
      fields: field::for_mime(&mime),
      mime: mime.to_string(),
      cardinality,
      rows,
    }
  }
}

fn one<E: DataValues>(entity: &Option<E>) -> Vec<DesiredRow> {
  entity.iter().map(DesiredRow::of).collect()
}

fn many<E: DataValues>(entities: &[E]) -> Vec<DesiredRow> {
  entities.iter().map(DesiredRow::of).collect()
}

pub(crate) struct RawContactOps<'a> {
  profile:  bool,
  data:     DataReconciler<'a>,
  registry: &'a CustomDataRegistry,
}

impl<'a> RawContactOps<'a> {
  pub fn new(
    source: &'a dyn RowSource,
    registry: &'a CustomDataRegistry,
    profile: bool,
    include: Option<&'a FieldSet>,
  ) -> Self {
    Self {
      profile,
      data: DataReconciler::new(source, profile, include),
      registry,
    }
  }

  /// Every mimetype of `raw` except group memberships, built-in ones first,
  /// then every registered custom mimetype (present in `raw` or not).
  fn rows(&self, raw: &RawContact) -> Result<Vec<MimeRows<'a>>> {
    for mime in raw.custom_data.keys() {
      self.registry.entry(mime)?;
    }

    use Cardinality::*;
    let mut out = vec![
      MimeRows::new(MimeType::Name, Single, one(&raw.name)),
      MimeRows::new(MimeType::Nickname, Single, one(&raw.nickname)),
      MimeRows::new(MimeType::Note, Single, one(&raw.note)),
      MimeRows::new(MimeType::Organization, Single, one(&raw.organization)),
      MimeRows::new(MimeType::Photo, Single, one(&raw.photo)),
      MimeRows::new(MimeType::SipAddress, Single, one(&raw.sip_address)),
      MimeRows::new(MimeType::Address, Multiple, many(&raw.addresses)),
      MimeRows::new(MimeType::Email, Multiple, many(&raw.emails)),
      MimeRows::new(MimeType::Event, Multiple, many(&raw.events)),
      MimeRows::new(MimeType::Im, Multiple, many(&raw.ims)),
      MimeRows::new(MimeType::Phone, Multiple, many(&raw.phones)),
      MimeRows::new(MimeType::Relation, Multiple, many(&raw.relations)),
      MimeRows::new(MimeType::Website, Multiple, many(&raw.websites)),
    ];

    for entry in self.registry.entries() {
      let cardinality = match entry.count_restriction() {
        CountRestriction::Single => Single,
        CountRestriction::Multiple => Multiple,
      };
      let entities = raw
        .custom_data
        .get(entry.mime_type())
        .map(Vec::as_slice)
        .unwrap_or_default();
      let limit = if cardinality == Single { 1 } else { entities.len() };
      let rows = entities
        .iter()
        .take(limit)
        .map(|e| DesiredRow::custom(entry, e))
        .collect();
      out.push(MimeRows {
        mime: entry.mime_type().to_owned(),
        fields: entry.fields(),
        cardinality,
        rows,
      });
    }
    Ok(out)
  }

  /// The batch inserting `raw` as a new raw contact of `account`. The raw
  /// contact row comes first; data rows link to it by back reference.
  pub fn insert(
    &self,
    raw: &RawContact,
    account: Option<&Account>,
    account_groups: &[Group],
  ) -> Result<Vec<Operation>> {
    let mut ops = vec![
      Operation::insert(Table::raw_contacts(self.profile))
        .with_value(column::ACCOUNT_NAME, account.map(|a| a.name.clone()))
        .with_value(
          column::ACCOUNT_TYPE,
          account.map(|a| a.account_type.clone()),
        ),
    ];
    let owner = Owner::BackReference(0);
    for mime in self.rows(raw)? {
      ops.extend(self.data.inserts(owner, &mime.mime, mime.fields, &mime.rows));
    }
    // Nothing is queried for a back-referenced owner, so this cannot fail.
    ops.extend(
      self
        .data
        .group_memberships(owner, &raw.group_memberships, account_groups)
        .unwrap_or_default(),
    );
    Ok(ops)
  }

  /// The operations reconciling the stored data of raw contact `id` with
  /// `raw`. `Ok(None)` if stored rows could not be read.
  pub fn update(
    &self,
    id: i64,
    raw: &RawContact,
    account_groups: &[Group],
  ) -> Result<Option<Vec<Operation>>> {
    let mut ops = Vec::new();
    for mime in self.rows(raw)? {
      let reconciled = match mime.cardinality {
        Cardinality::Single => {
          self.data.single(id, &mime.mime, mime.fields, mime.rows.first())
        }
        Cardinality::Multiple => {
          self.data.multiple(id, &mime.mime, mime.fields, &mime.rows)
        }
      };
      let Some(reconciled) = reconciled else { return Ok(None) };
      ops.extend(reconciled);
    }
    let Some(memberships) = self.data.group_memberships(
      Owner::Existing(id),
      &raw.group_memberships,
      account_groups,
    ) else {
      return Ok(None);
    };
    ops.extend(memberships);
    Ok(Some(ops))
  }
}

#[cfg(test)]
mod tests {
  use roster_core::{
    Error,
    entity::{CustomDataEntity, Email, EmailType, Name},
    operation::OperationKind,
    predicate::Where,
    store::{Cursor, MemoryCursor},
    value::Value,
  };

  use super::*;
  use crate::registry::SimpleCustomData;

  struct NoRows;

  impl RowSource for NoRows {
    fn query(
      &self,
      _table: Table,
      _projection: &[&str],
      _selection: Option<&Where>,
      _sort_order: Option<&str>,
    ) -> Option<Box<dyn Cursor + '_>> {
      Some(Box::new(MemoryCursor::default()))
    }
  }

  const MOOD: &str = "vnd.example/mood";

  fn registry() -> CustomDataRegistry {
    CustomDataRegistry::new().with(
      SimpleCustomData::new(MOOD, &[Field::new("Mood.Mood", column::DATA1)])
        .single(),
    )
  }

  fn sample() -> RawContact {
    let mut raw = RawContact::new();
    raw.name = Some(Name { given_name: Some("Ada".into()), ..Name::default() });
    raw.emails = vec![
      Email::new(EmailType::Work, "a@x.com"),
      Email::new(EmailType::Home, "b@x.com"),
    ];
    raw.custom_data.insert(MOOD.into(), vec![
      CustomDataEntity::new(MOOD).with(column::DATA1, "calm"),
      CustomDataEntity::new(MOOD).with(column::DATA1, "ignored"),
    ]);
    raw
  }

  #[test]
  fn insert_links_every_row_to_the_new_raw_contact() {
    let registry = registry();
    let ops = RawContactOps::new(&NoRows, &registry, false, None);
    let account = Account::new("a@x.com", "com.example");
    let batch = ops.insert(&sample(), Some(&account), &[]).unwrap();

    // raw contact + name + 2 emails + 1 mood (single)
    assert_eq!(batch.len(), 5);
    assert_eq!(batch[0].table, Table::RawContacts);
    assert_eq!(batch[0].value(column::ACCOUNT_NAME), Some(&Value::from("a@x.com")));
    assert!(batch[1..].iter().all(|op| {
      op.kind == OperationKind::Insert
        && op.back_references == vec![(column::RAW_CONTACT_ID.to_owned(), 0)]
    }));
    assert_eq!(batch[4].value(column::MIMETYPE), Some(&Value::from(MOOD)));
    assert_eq!(batch[4].value(column::DATA1), Some(&Value::from("calm")));
  }

  #[test]
  fn update_of_empty_raw_contact_deletes_every_mimetype() {
    let registry = registry();
    let ops = RawContactOps::new(&NoRows, &registry, false, None);
    let batch = ops.update(4, &RawContact::new(), &[]).unwrap().unwrap();

    // 13 built-in mimetypes + 1 custom; memberships have nothing to delete.
    assert_eq!(batch.len(), 14);
    assert!(batch.iter().all(|op| op.kind == OperationKind::Delete));
  }

  #[test]
  fn empty_include_produces_no_operations() {
    let registry = registry();
    let include = FieldSet::new();
    let ops = RawContactOps::new(&NoRows, &registry, false, Some(&include));
    let batch = ops.update(4, &sample(), &[]).unwrap().unwrap();
    assert!(batch.is_empty());
  }

  #[test]
  fn unregistered_custom_data_is_a_programming_error() {
    let registry = CustomDataRegistry::new();
    let ops = RawContactOps::new(&NoRows, &registry, false, None);
    let mut raw = RawContact::new();
    raw.custom_data.insert("vnd.example/unknown".into(), vec![]);
    assert!(matches!(
      ops.update(4, &raw, &[]),
      Err(Error::UnsupportedMimeType(m)) if m == "vnd.example/unknown"
    ));
  }
}
