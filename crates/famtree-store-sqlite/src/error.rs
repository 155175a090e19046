//! Error type for `famtree-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A session is already open on this database.
  #[error("a database connection is already open")]
  AlreadyOpen,

  /// An insert collided with an existing row's primary key.
  #[error("duplicate key {key:?} in {table}")]
  DuplicateKey { table: &'static str, key: String },

  #[error("table {table} has no column {column:?}")]
  UnknownColumn { table: &'static str, column: String },

  /// Failure opening, committing or rolling back a connection.
  #[error("{op} failed: {source}")]
  Connection {
    op:     &'static str,
    #[source]
    source: rusqlite::Error,
  },

  /// Failure running a statement against one table.
  #[error("{op} on {table} failed: {source}")]
  Sqlite {
    op:     &'static str,
    table:  &'static str,
    #[source]
    source: rusqlite::Error,
  },
}

impl Error {
  pub(crate) fn connection(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
    move |source| Self::Connection { op, source }
  }

  pub(crate) fn sqlite(
    op: &'static str,
    table: &'static str,
  ) -> impl FnOnce(rusqlite::Error) -> Self {
    move |source| Self::Sqlite { op, table, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
