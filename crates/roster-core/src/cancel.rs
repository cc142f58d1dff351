//! Cooperative cancellation.
//!
//! Every multi-row scan takes a [`Cancel`] and polls it at row boundaries.
//! Nothing is interrupted preemptively; a cancelled read is discarded by the
//! caller, and writes that were already applied stay applied.

use std::fmt;

/// A borrowed cancellation predicate. The default value never cancels.
#[derive(Clone, Copy, Default)]
pub struct Cancel<'a> {
  predicate: Option<&'a dyn Fn() -> bool>,
}

impl<'a> Cancel<'a> {
  /// A token that is never cancelled.
  pub fn never() -> Self { Self { predicate: None } }

  /// Wrap a predicate that returns `true` once the work should stop.
  pub fn new(predicate: &'a dyn Fn() -> bool) -> Self {
    Self { predicate: Some(predicate) }
  }

  pub fn is_cancelled(&self) -> bool { self.predicate.is_some_and(|p| p()) }
}

impl fmt::Debug for Cancel<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cancel")
      .field("has_predicate", &self.predicate.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::*;

  #[test]
  fn never_is_not_cancelled() {
    assert!(!Cancel::never().is_cancelled());
    assert!(!Cancel::default().is_cancelled());
  }

  #[test]
  fn predicate_is_polled_each_time() {
    let calls = Cell::new(0);
    let predicate = || {
      calls.set(calls.get() + 1);
      calls.get() > 2
    };
    let cancel = Cancel::new(&predicate);
    assert!(!cancel.is_cancelled());
    assert!(!cancel.is_cancelled());
    assert!(cancel.is_cancelled());
    assert_eq!(calls.get(), 3);
  }
}
