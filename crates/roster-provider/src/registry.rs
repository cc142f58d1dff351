//! The custom-data registry.
//!
//! Custom mimetypes are plugged in at runtime by registering a
//! [`CustomDataEntry`]. The registry is an ordinary value handed to the
//! façade; there is no process-wide state.

use std::{collections::BTreeMap, fmt, sync::Arc};

use roster_core::{
  Error, Result,
  entity::{CustomDataEntity, DataEntity},
  field::{Field, FieldSet, is_included},
  mime::MimeType,
  value::Value,
};

use crate::cursor::{DataCursor, TypedCursor};

/// How many rows of a custom mimetype a raw contact may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountRestriction {
  /// At most one; extra rows read from the store are ignored.
  Single,
  #[default]
  Multiple,
}

/// Everything the mappers and operation builders need to handle one custom
/// mimetype.
pub trait CustomDataEntry: Send + Sync {
  fn mime_type(&self) -> &str;

  /// The entity fields of this mimetype (excluding the common data fields).
  fn fields(&self) -> &[Field];

  fn count_restriction(&self) -> CountRestriction { CountRestriction::Multiple }

  /// Project the cursor's current row, limited to the fields in `include`.
  fn map(
    &self,
    cursor: &DataCursor<'_>,
    include: Option<&FieldSet>,
  ) -> CustomDataEntity {
    let mut entity = CustomDataEntity::new(self.mime_type());
    entity.info = cursor.info();
    for field in self.fields().iter().filter(|f| is_included(f, include)) {
      entity
        .values
        .insert(field.column.to_owned(), cursor.raw().get(field.column));
    }
    entity
  }

  fn is_blank(&self, entity: &CustomDataEntity) -> bool { entity.is_blank() }

  /// The values to write for `entity`, one per declared field.
  fn values(&self, entity: &CustomDataEntity) -> Vec<(Field, Value)> {
    self
      .fields()
      .iter()
      .map(|f| (*f, entity.get(f.column).clone()))
      .collect()
  }
}

/// A custom mimetype described entirely by its fields.
#[derive(Debug, Clone)]
pub struct SimpleCustomData {
  pub mime_type:         String,
  pub fields:            Vec<Field>,
  pub count_restriction: CountRestriction,
}

impl SimpleCustomData {
  pub fn new(mime_type: impl Into<String>, fields: &[Field]) -> Self {
    Self {
      mime_type:         mime_type.into(),
      fields:            fields.to_vec(),
      count_restriction: CountRestriction::Multiple,
    }
  }

  pub fn single(mut self) -> Self {
    self.count_restriction = CountRestriction::Single;
    self
  }
}

impl CustomDataEntry for SimpleCustomData {
  fn mime_type(&self) -> &str { &self.mime_type }

  fn fields(&self) -> &[Field] { &self.fields }

  fn count_restriction(&self) -> CountRestriction { self.count_restriction }
}

/// Registered custom mimetypes, keyed by mimetype value.
#[derive(Clone, Default)]
pub struct CustomDataRegistry {
  entries: BTreeMap<String, Arc<dyn CustomDataEntry>>,
}

impl fmt::Debug for CustomDataRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.entries.keys()).finish()
  }
}

impl CustomDataRegistry {
  pub fn new() -> Self { Self::default() }

  pub fn register(&mut self, entry: impl CustomDataEntry + 'static) -> &mut Self {
    self
      .entries
      .insert(entry.mime_type().to_owned(), Arc::new(entry));
    self
  }

  pub fn with(mut self, entry: impl CustomDataEntry + 'static) -> Self {
    self.register(entry);
    self
  }

  /// Look up the entry for a custom mimetype.
  pub fn entry(&self, mime_type: &str) -> Result<&dyn CustomDataEntry> {
    self
      .entries
      .get(mime_type)
      .map(|e| &**e)
      .ok_or_else(|| Error::UnsupportedMimeType(mime_type.to_owned()))
  }

  /// Map an unregistered custom mimetype to [`MimeType::Unknown`]; other
  /// mimetypes pass through.
  pub fn resolve(&self, mime: MimeType) -> MimeType {
    match mime {
      MimeType::Custom(ref value) if !self.entries.contains_key(value) => {
        MimeType::Unknown
      }
      other => other,
    }
  }

  pub fn entries(&self) -> impl Iterator<Item = &(dyn CustomDataEntry + 'static)> {
    self.entries.values().map(|e| &**e)
  }

  pub fn mime_types(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  /// The fields of every registered mimetype.
  pub fn fields(&self) -> FieldSet {
    self.entries().flat_map(|e| e.fields().iter().copied()).collect()
  }
}

#[cfg(test)]
mod tests {
  use roster_core::column;

  use super::*;

  const GENDER: Field = Field::new("Gender.Gender", column::DATA1);

  #[test]
  fn unregistered_custom_mimetypes_resolve_to_unknown() {
    let registry = CustomDataRegistry::new()
      .with(SimpleCustomData::new("vnd.example/gender", &[GENDER]).single());

    assert_eq!(
      registry.resolve(MimeType::from_value("vnd.example/gender")),
      MimeType::Custom("vnd.example/gender".into())
    );
    assert_eq!(
      registry.resolve(MimeType::from_value("vnd.example/other")),
      MimeType::Unknown
    );
    assert_eq!(registry.resolve(MimeType::Email), MimeType::Email);
  }

  #[test]
  fn missing_entry_is_unsupported() {
    let registry = CustomDataRegistry::new();
    let err = registry.entry("vnd.example/nope").err().unwrap();
    assert!(matches!(err, Error::UnsupportedMimeType(m) if m == "vnd.example/nope"));
  }

  #[test]
  fn default_values_cover_declared_fields() {
    let entry = SimpleCustomData::new("vnd.example/gender", &[GENDER]);
    let entity = CustomDataEntity::new("vnd.example/gender")
      .with(column::DATA1, "female")
      .with(column::DATA9, "ignored");
    assert_eq!(entry.values(&entity), vec![(GENDER, Value::from("female"))]);
    assert_eq!(entry.count_restriction(), CountRestriction::Multiple);
  }
}
