//! Data rows of custom mimetypes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DataEntity, DataInfo};
use crate::{mime::MimeType, value::Value};

/// A data row of a registered custom mimetype. Values are keyed by column
/// (`data1`..`data15`); what each column means is declared by the mimetype's
/// registry entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomDataEntity {
  #[serde(flatten)]
  pub info:      DataInfo,
  pub mime_type: String,
  pub values:    BTreeMap<String, Value>,
}

impl CustomDataEntity {
  pub fn new(mime_type: impl Into<String>) -> Self {
    Self { mime_type: mime_type.into(), ..Self::default() }
  }

  pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
    self.values.insert(column.to_owned(), value.into());
    self
  }

  pub fn get(&self, column: &str) -> &Value {
    static NULL: Value = Value::Null;
    self.values.get(column).unwrap_or(&NULL)
  }
}

impl DataEntity for CustomDataEntity {
  fn mime_type(&self) -> MimeType { MimeType::Custom(self.mime_type.clone()) }

  fn info(&self) -> &DataInfo { &self.info }

  fn info_mut(&mut self) -> &mut DataInfo { &mut self.info }

  fn is_blank(&self) -> bool { self.values.values().all(Value::is_blank) }
}
