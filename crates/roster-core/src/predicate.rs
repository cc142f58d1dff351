//! The predicate and sort-order language used to address rows.
//!
//! Predicates render to the textual selection format understood by the
//! content store: every comparison is parenthesised, text literals are
//! single-quoted with embedded quotes doubled, and booleans are written as
//! `0`/`1`.

use std::fmt;

use crate::{Error, Result, value::Value};

// ─── Where ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Equal,
  NotEqual,
  Like,
  Less,
  Greater,
}

impl Comparison {
  fn operator(self) -> &'static str {
    match self {
      Self::Equal => "=",
      Self::NotEqual => "!=",
      Self::Like => "LIKE",
      Self::Less => "<",
      Self::Greater => ">",
    }
  }
}

/// A boolean expression over columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
  Compare {
    column: String,
    op:     Comparison,
    value:  Value,
  },
  In {
    column: String,
    values: Vec<Value>,
    negate: bool,
  },
  Null {
    column: String,
    negate: bool,
  },
  And(Box<Where>, Box<Where>),
  Or(Box<Where>, Box<Where>),
}

pub fn equal_to(column: &str, value: impl Into<Value>) -> Where {
  compare(column, Comparison::Equal, value.into())
}

pub fn not_equal_to(column: &str, value: impl Into<Value>) -> Where {
  compare(column, Comparison::NotEqual, value.into())
}

/// `LIKE` with the pattern used verbatim (callers add `%` wildcards).
pub fn like(column: &str, pattern: impl Into<Value>) -> Where {
  compare(column, Comparison::Like, pattern.into())
}

pub fn less_than(column: &str, value: impl Into<Value>) -> Where {
  compare(column, Comparison::Less, value.into())
}

pub fn greater_than(column: &str, value: impl Into<Value>) -> Where {
  compare(column, Comparison::Greater, value.into())
}

pub fn is_in<V: Into<Value>>(
  column: &str,
  values: impl IntoIterator<Item = V>,
) -> Where {
  Where::In {
    column: column.to_owned(),
    values: values.into_iter().map(Into::into).collect(),
    negate: false,
  }
}

pub fn not_in<V: Into<Value>>(
  column: &str,
  values: impl IntoIterator<Item = V>,
) -> Where {
  Where::In {
    column: column.to_owned(),
    values: values.into_iter().map(Into::into).collect(),
    negate: true,
  }
}

pub fn is_null(column: &str) -> Where {
  Where::Null { column: column.to_owned(), negate: false }
}

pub fn is_not_null(column: &str) -> Where {
  Where::Null { column: column.to_owned(), negate: true }
}

fn compare(column: &str, op: Comparison, value: Value) -> Where {
  Where::Compare { column: column.to_owned(), op, value }
}

impl Where {
  pub fn and(self, other: Where) -> Where {
    Where::And(Box::new(self), Box::new(other))
  }

  pub fn or(self, other: Where) -> Where {
    Where::Or(Box::new(self), Box::new(other))
  }

  /// `a AND b` where either side may be absent.
  pub fn and_opt(left: Option<Where>, right: Option<Where>) -> Option<Where> {
    match (left, right) {
      (Some(l), Some(r)) => Some(l.and(r)),
      (l, r) => l.or(r),
    }
  }

  /// Every column referenced by this expression, in order of appearance.
  pub fn columns(&self) -> Vec<&str> {
    let mut out = Vec::new();
    self.collect_columns(&mut out);
    out
  }

  fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      Where::Compare { column, .. }
      | Where::In { column, .. }
      | Where::Null { column, .. } => out.push(column),
      Where::And(l, r) | Where::Or(l, r) => {
        l.collect_columns(out);
        r.collect_columns(out);
      }
    }
  }
}

/// Render a literal in selection syntax.
fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
  match value {
    Value::Null => f.write_str("NULL"),
    Value::Integer(i) => write!(f, "{i}"),
    Value::Real(r) => write!(f, "{r}"),
    Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
    Value::Blob(b) => {
      f.write_str("X'")?;
      for byte in b {
        write!(f, "{byte:02X}")?;
      }
      f.write_str("'")
    }
  }
}

impl fmt::Display for Where {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Where::Compare { column, op, value } => {
        // `= NULL` never matches; spell it the way the store understands.
        match (op, value) {
          (Comparison::Equal, Value::Null) => write!(f, "({column} IS NULL)"),
          (Comparison::NotEqual, Value::Null) => {
            write!(f, "({column} IS NOT NULL)")
          }
          _ => {
            write!(f, "({column} {} ", op.operator())?;
            write_literal(f, value)?;
            f.write_str(")")
          }
        }
      }
      Where::In { column, values, negate } => {
        let op = if *negate { "NOT IN" } else { "IN" };
        write!(f, "({column} {op} (")?;
        for (i, value) in values.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write_literal(f, value)?;
        }
        f.write_str("))")
      }
      Where::Null { column, negate: false } => {
        write!(f, "({column} IS NULL)")
      }
      Where::Null { column, negate: true } => {
        write!(f, "({column} IS NOT NULL)")
      }
      Where::And(l, r) => write!(f, "({l} AND {r})"),
      Where::Or(l, r) => write!(f, "({l} OR {r})"),
    }
  }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// One ordering term of a sort-order clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
  pub column:      String,
  pub ascending:   bool,
  pub ignore_case: bool,
}

impl OrderBy {
  pub fn asc(column: &str) -> Self {
    Self { column: column.to_owned(), ascending: true, ignore_case: false }
  }

  pub fn desc(column: &str) -> Self {
    Self { column: column.to_owned(), ascending: false, ignore_case: false }
  }

  pub fn ignoring_case(mut self) -> Self {
    self.ignore_case = true;
    self
  }
}

impl fmt::Display for OrderBy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.column)?;
    if self.ignore_case {
      f.write_str(" COLLATE NOCASE")?;
    }
    f.write_str(if self.ascending { " ASC" } else { " DESC" })
  }
}

/// Paging window applied after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub limit:  usize,
  pub offset: usize,
}

impl Default for Page {
  fn default() -> Self { Self { limit: i32::MAX as usize, offset: 0 } }
}

impl Page {
  /// Validates `limit`; a zero limit is a programming error caught at the
  /// builder call site.
  pub fn checked_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
      return Err(Error::InvalidArgument(
        "limit must be greater than 0".into(),
      ));
    }
    Ok(limit)
  }
}

/// Build the `"<orderings> LIMIT <n> OFFSET <m>"` sort-order string. An empty
/// ordering falls back to `_id ASC` so the paging window is deterministic.
pub fn sort_order(order_by: &[OrderBy], page: Page) -> String {
  let ordering = if order_by.is_empty() {
    OrderBy::asc(crate::column::ID).to_string()
  } else {
    order_by
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(", ")
  };
  format!("{ordering} LIMIT {} OFFSET {}", page.limit, page.offset)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_comparisons() {
    assert_eq!(equal_to("data1", "a@x.com").to_string(), "(data1 = 'a@x.com')");
    assert_eq!(not_equal_to("starred", true).to_string(), "(starred != 1)");
    assert_eq!(equal_to("data1", Value::Null).to_string(), "(data1 IS NULL)");
    assert_eq!(
      like("display_name", "%o'b%").to_string(),
      "(display_name LIKE '%o''b%')"
    );
  }

  #[test]
  fn renders_sets_and_nulls() {
    assert_eq!(is_in("_id", [1_i64, 2, 3]).to_string(), "(_id IN (1, 2, 3))");
    assert_eq!(
      not_in("title", ["a", "b"]).to_string(),
      "(title NOT IN ('a', 'b'))"
    );
    assert_eq!(is_null("account_name").to_string(), "(account_name IS NULL)");
    assert_eq!(
      is_not_null("account_type").to_string(),
      "(account_type IS NOT NULL)"
    );
  }

  #[test]
  fn renders_nested_boolean_expressions() {
    let w = equal_to("mimetype", "m")
      .and(equal_to("raw_contact_id", 7_i64).or(is_null("data1")));
    assert_eq!(
      w.to_string(),
      "((mimetype = 'm') AND ((raw_contact_id = 7) OR (data1 IS NULL)))"
    );
    assert_eq!(w.columns(), vec!["mimetype", "raw_contact_id", "data1"]);
  }

  #[test]
  fn and_opt_keeps_present_side() {
    let a = equal_to("a", 1_i64);
    assert_eq!(Where::and_opt(Some(a.clone()), None), Some(a.clone()));
    assert_eq!(Where::and_opt(None, Some(a.clone())), Some(a));
    assert_eq!(Where::and_opt(None, None), None);
  }

  #[test]
  fn sort_order_string() {
    let page = Page { limit: 5, offset: 10 };
    assert_eq!(sort_order(&[], page), "_id ASC LIMIT 5 OFFSET 10");
    assert_eq!(
      sort_order(
        &[OrderBy::asc("display_name").ignoring_case(), OrderBy::desc("_id")],
        page
      ),
      "display_name COLLATE NOCASE ASC, _id DESC LIMIT 5 OFFSET 10"
    );
  }

  #[test]
  fn zero_limit_is_rejected() {
    assert!(Page::checked_limit(0).is_err());
    assert_eq!(Page::checked_limit(3).unwrap(), 3);
  }
}
