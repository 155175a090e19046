//! Table descriptors and the [`Record`] trait that ties a row type to one.

use rusqlite::{Row, types::Value};

/// Static description of one table: its name, primary key and the columns
/// written by an insert, in bind order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
  pub name:        &'static str,
  pub primary_key: &'static str,
  pub columns:     &'static [&'static str],
}

impl Table {
  pub fn has_column(&self, column: &str) -> bool {
    self.columns.contains(&column)
  }

  pub(crate) fn insert_sql(&self) -> String {
    let placeholders = (1..=self.columns.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");
    format!(
      r#"INSERT INTO "{}" ({}) VALUES ({placeholders})"#,
      self.name,
      self.columns.join(", "),
    )
  }

  pub(crate) fn select_where_sql(&self, column: &str) -> String {
    format!(
      r#"SELECT {} FROM "{}" WHERE {column} = ?1 ORDER BY rowid"#,
      self.columns.join(", "),
      self.name,
    )
  }

  pub(crate) fn delete_by_key_sql(&self) -> String {
    format!(r#"DELETE FROM "{}" WHERE {} = ?1"#, self.name, self.primary_key)
  }

  pub(crate) fn delete_all_sql(&self) -> String {
    format!(r#"DELETE FROM "{}""#, self.name)
  }

  pub(crate) fn count_sql(&self) -> String {
    format!(r#"SELECT COUNT(*) FROM "{}""#, self.name)
  }
}

/// A row type stored in exactly one [`Table`].
///
/// `encode` must yield one value per entry of `TABLE.columns`, in order;
/// `decode` reads a row selected with the same column list.
pub trait Record: Sized {
  const TABLE: Table;

  /// The primary-key value of this record.
  fn key(&self) -> &str;

  fn encode(&self) -> Vec<Value>;

  fn decode(row: &Row<'_>) -> rusqlite::Result<Self>;
}
