//! Classification of SQLite constraint failures.
//!
//! SQLite reports a primary-key collision as an extended constraint code plus
//! a message naming the offending `table.column`. Both are checked so that a
//! collision on some other unique column is never mistaken for this table's
//! key.

use rusqlite::{ErrorCode, ffi};

use crate::table::Table;

/// `true` when `err` is a uniqueness failure on `table`'s primary key.
pub fn is_primary_key_conflict(err: &rusqlite::Error, table: &Table) -> bool {
  let rusqlite::Error::SqliteFailure(failure, Some(message)) = err else {
    return false;
  };
  if failure.code != ErrorCode::ConstraintViolation {
    return false;
  }
  if failure.extended_code != ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    && failure.extended_code != ffi::SQLITE_CONSTRAINT_UNIQUE
  {
    return false;
  }

  let failed_on = message.rsplit(": ").next().unwrap_or_default();
  let mut parts = failed_on.split('.');
  parts.next() == Some(table.name)
    && parts.next() == Some(table.primary_key)
    && parts.next().is_none()
}

#[cfg(test)]
mod tests {
  use super::*;

  const PERSON: Table = Table {
    name:        "Person",
    primary_key: "id",
    columns:     &["id"],
  };

  fn failure(code: i32, message: &str) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some(message.into()))
  }

  #[test]
  fn primary_key_collision_matches() {
    let err = failure(
      ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
      "UNIQUE constraint failed: Person.id",
    );
    assert!(is_primary_key_conflict(&err, &PERSON));
  }

  #[test]
  fn unique_code_with_key_column_matches() {
    let err =
      failure(ffi::SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed: Person.id");
    assert!(is_primary_key_conflict(&err, &PERSON));
  }

  #[test]
  fn other_table_does_not_match() {
    let err = failure(
      ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
      "UNIQUE constraint failed: Event.id",
    );
    assert!(!is_primary_key_conflict(&err, &PERSON));
  }

  #[test]
  fn other_column_does_not_match() {
    let err = failure(
      ffi::SQLITE_CONSTRAINT_UNIQUE,
      "UNIQUE constraint failed: Person.spouse_id",
    );
    assert!(!is_primary_key_conflict(&err, &PERSON));

    let composite = failure(
      ffi::SQLITE_CONSTRAINT_UNIQUE,
      "UNIQUE constraint failed: Person.id, Person.associated_username",
    );
    assert!(!is_primary_key_conflict(&composite, &PERSON));
  }

  #[test]
  fn other_constraints_do_not_match() {
    let not_null = failure(
      ffi::SQLITE_CONSTRAINT_NOTNULL,
      "NOT NULL constraint failed: Person.id",
    );
    assert!(!is_primary_key_conflict(&not_null, &PERSON));

    let foreign = failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, "FOREIGN KEY constraint failed");
    assert!(!is_primary_key_conflict(&foreign, &PERSON));

    assert!(!is_primary_key_conflict(&rusqlite::Error::QueryReturnedNoRows, &PERSON));
  }
}
