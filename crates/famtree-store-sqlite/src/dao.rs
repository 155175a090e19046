//! [`Dao`]: generic record access over one table, bound to an open session.

use std::marker::PhantomData;

use famtree_core::{event::Event, person::Person, user::AuthToken};
use rusqlite::{Connection, params_from_iter};

use crate::{Error, Result, conflict::is_primary_key_conflict, table::Record};

/// CRUD primitives for records of type `R`.
///
/// A `Dao` borrows the connection of a [`crate::Session`], so every call runs
/// inside that session's transaction and sees its earlier writes.
pub struct Dao<'s, R> {
  conn:   &'s Connection,
  record: PhantomData<fn() -> R>,
}

impl<'s, R: Record> Dao<'s, R> {
  pub(crate) fn new(conn: &'s Connection) -> Self {
    Self { conn, record: PhantomData }
  }

  fn table(&self) -> &'static str { R::TABLE.name }

  /// Insert `record`.
  ///
  /// Fails with [`Error::DuplicateKey`] when a row with the same primary key
  /// already exists; the existing row is left untouched.
  pub fn insert(&self, record: &R) -> Result<()> {
    let mut stmt = self
      .conn
      .prepare_cached(&R::TABLE.insert_sql())
      .map_err(Error::sqlite("insert", self.table()))?;

    match stmt.execute(params_from_iter(record.encode())) {
      Ok(_) => Ok(()),
      Err(source) if is_primary_key_conflict(&source, &R::TABLE) => {
        Err(Error::DuplicateKey {
          table: self.table(),
          key:   record.key().to_owned(),
        })
      }
      Err(source) => Err(Error::Sqlite {
        op: "insert",
        table: self.table(),
        source,
      }),
    }
  }

  /// Insert `record` unless its primary key is already taken.
  ///
  /// Returns `true` when a row was written. Any failure other than a
  /// collision on this record's key is returned as an error.
  pub fn insert_if_absent(&self, record: &R) -> Result<bool> {
    match self.insert(record) {
      Ok(()) => Ok(true),
      Err(Error::DuplicateKey { .. }) => Ok(false),
      Err(e) => Err(e),
    }
  }

  /// Delete any row with `record`'s key, then insert `record`.
  pub fn replace(&self, record: &R) -> Result<()> {
    self.delete(record.key())?;
    self.insert(record)
  }

  /// Fetch the record with primary key `id`, if any.
  pub fn find(&self, id: &str) -> Result<Option<R>> {
    Ok(self.find_all_where(R::TABLE.primary_key, id)?.into_iter().next())
  }

  /// Every record whose `column` equals `value`, in insertion order.
  pub fn find_all_where(&self, column: &str, value: &str) -> Result<Vec<R>> {
    if !R::TABLE.has_column(column) {
      return Err(Error::UnknownColumn {
        table:  self.table(),
        column: column.to_owned(),
      });
    }

    let mut stmt = self
      .conn
      .prepare_cached(&R::TABLE.select_where_sql(column))
      .map_err(Error::sqlite("find", self.table()))?;
    stmt
      .query_map([value], |row| R::decode(row))
      .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
      .map_err(Error::sqlite("find", self.table()))
  }

  /// Delete the record with primary key `id`. Absent ids are not an error.
  pub fn delete(&self, id: &str) -> Result<()> {
    self
      .conn
      .prepare_cached(&R::TABLE.delete_by_key_sql())
      .and_then(|mut stmt| stmt.execute([id]))
      .map_err(Error::sqlite("delete", self.table()))?;
    Ok(())
  }

  /// Delete every row in the table.
  pub fn delete_all(&self) -> Result<()> {
    self
      .conn
      .execute(&R::TABLE.delete_all_sql(), [])
      .map_err(Error::sqlite("delete all", self.table()))?;
    Ok(())
  }

  pub fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .query_row(&R::TABLE.count_sql(), [], |row| row.get(0))
      .map_err(Error::sqlite("count", self.table()))?;
    Ok(n.unsigned_abs())
  }
}

// ─── Per-table lookups ───────────────────────────────────────────────────────

const OWNER: &str = "associated_username";

impl Dao<'_, Person> {
  /// Every person in `username`'s tree.
  pub fn find_for_user(&self, username: &str) -> Result<Vec<Person>> {
    self.find_all_where(OWNER, username)
  }
}

impl Dao<'_, Event> {
  /// Every event owned by `username`.
  pub fn find_for_user(&self, username: &str) -> Result<Vec<Event>> {
    self.find_all_where(OWNER, username)
  }

  /// Every event whose subject is `person_id`.
  pub fn find_for_person(&self, person_id: &str) -> Result<Vec<Event>> {
    self.find_all_where("person_id", person_id)
  }
}

impl Dao<'_, AuthToken> {
  /// Every token issued to `username`.
  pub fn find_for_user(&self, username: &str) -> Result<Vec<AuthToken>> {
    self.find_all_where(OWNER, username)
  }
}
