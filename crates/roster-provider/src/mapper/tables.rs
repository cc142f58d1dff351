//! Mappers for the single-table entities.

use roster_core::entity::{BlockedNumber, Group, SimContact};

use crate::cursor::{BlockedNumbersCursor, GroupsCursor, SimContactsCursor};

pub fn group(cursor: &GroupsCursor<'_>) -> Group {
  Group {
    id:        cursor.id(),
    title:     cursor.title().unwrap_or_default(),
    read_only: cursor.read_only(),
    favorites: cursor.favorites(),
    auto_add:  cursor.auto_add(),
    account:   cursor.account(),
  }
}

pub fn blocked_number(cursor: &BlockedNumbersCursor<'_>) -> BlockedNumber {
  BlockedNumber {
    id:                cursor.id(),
    number:            cursor.number().unwrap_or_default(),
    normalized_number: cursor.normalized_number(),
  }
}

pub fn sim_contact(cursor: &SimContactsCursor<'_>) -> SimContact {
  SimContact {
    id:     cursor.id(),
    name:   cursor.name(),
    number: cursor.number(),
  }
}
