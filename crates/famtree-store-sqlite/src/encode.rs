//! Row mapping between famtree record types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, genders as their one-letter
//! code and event types as their tag.

use chrono::{DateTime, Utc};
use famtree_core::{
  event::{Event, EventType},
  person::{Gender, Person},
  user::{AuthToken, User},
};
use rusqlite::{
  Row,
  types::{Type, Value},
};

use crate::table::{Record, Table};

// ─── Column helpers ──────────────────────────────────────────────────────────

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn opt_text(s: Option<&str>) -> Value { s.map_or(Value::Null, text) }

fn opt_real(f: Option<f64>) -> Value { f.map_or(Value::Null, Value::Real) }

fn conversion_error(
  idx: usize,
  err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decode_gender(row: &Row<'_>, idx: usize) -> rusqlite::Result<Gender> {
  let code: String = row.get(idx)?;
  Gender::from_code(&code).map_err(|e| conversion_error(idx, e))
}

fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

fn decode_dt(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  let raw: String = row.get(idx)?;
  DateTime::parse_from_rfc3339(&raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| conversion_error(idx, e))
}

// ─── User ────────────────────────────────────────────────────────────────────

impl Record for User {
  const TABLE: Table = Table {
    name:        "User",
    primary_key: "username",
    columns:     &[
      "username",
      "password",
      "email",
      "first_name",
      "last_name",
      "gender",
      "person_id",
    ],
  };

  fn key(&self) -> &str { &self.username }

  fn encode(&self) -> Vec<Value> {
    vec![
      text(&self.username),
      text(&self.password),
      text(&self.email),
      text(&self.first_name),
      text(&self.last_name),
      text(self.gender.code()),
      opt_text(self.person_id.as_deref()),
    ]
  }

  fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      username:   row.get(0)?,
      password:   row.get(1)?,
      email:      row.get(2)?,
      first_name: row.get(3)?,
      last_name:  row.get(4)?,
      gender:     decode_gender(row, 5)?,
      person_id:  row.get(6)?,
    })
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

impl Record for Person {
  const TABLE: Table = Table {
    name:        "Person",
    primary_key: "id",
    columns:     &[
      "id",
      "associated_username",
      "first_name",
      "last_name",
      "gender",
      "father_id",
      "mother_id",
      "spouse_id",
    ],
  };

  fn key(&self) -> &str { &self.id }

  fn encode(&self) -> Vec<Value> {
    vec![
      text(&self.id),
      text(&self.associated_username),
      text(&self.first_name),
      text(&self.last_name),
      text(self.gender.code()),
      opt_text(self.father_id.as_deref()),
      opt_text(self.mother_id.as_deref()),
      opt_text(self.spouse_id.as_deref()),
    ]
  }

  fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      associated_username: row.get(1)?,
      first_name:          row.get(2)?,
      last_name:           row.get(3)?,
      gender:              decode_gender(row, 4)?,
      father_id:           row.get(5)?,
      mother_id:           row.get(6)?,
      spouse_id:           row.get(7)?,
    })
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

impl Record for Event {
  const TABLE: Table = Table {
    name:        "Event",
    primary_key: "id",
    columns:     &[
      "id",
      "associated_username",
      "person_id",
      "latitude",
      "longitude",
      "country",
      "city",
      "event_type",
      "year",
    ],
  };

  fn key(&self) -> &str { &self.id }

  fn encode(&self) -> Vec<Value> {
    vec![
      text(&self.id),
      text(&self.associated_username),
      text(&self.person_id),
      opt_real(self.latitude),
      opt_real(self.longitude),
      opt_text(self.country.as_deref()),
      opt_text(self.city.as_deref()),
      text(self.event_type.as_str()),
      Value::Integer(i64::from(self.year)),
    ]
  }

  fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      associated_username: row.get(1)?,
      person_id:           row.get(2)?,
      latitude:            row.get(3)?,
      longitude:           row.get(4)?,
      country:             row.get(5)?,
      city:                row.get(6)?,
      event_type:          EventType::from(row.get::<_, String>(7)?),
      year:                row.get(8)?,
    })
  }
}

// ─── AuthToken ───────────────────────────────────────────────────────────────

impl Record for AuthToken {
  const TABLE: Table = Table {
    name:        "AuthToken",
    primary_key: "id",
    columns:     &["id", "associated_username", "created_at", "is_valid"],
  };

  fn key(&self) -> &str { &self.id }

  fn encode(&self) -> Vec<Value> {
    vec![
      text(&self.id),
      text(&self.associated_username),
      Value::Text(encode_dt(self.created_at)),
      Value::Integer(i64::from(self.is_valid)),
    ]
  }

  fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      associated_username: row.get(1)?,
      created_at:          decode_dt(row, 2)?,
      is_valid:            row.get(3)?,
    })
  }
}
