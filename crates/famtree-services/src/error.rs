//! Error type for `famtree-services`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no user named {0:?}")]
  UserNotFound(String),

  /// Two generated records were given the same id.
  #[error("generated id {key:?} collided in {table}")]
  DuplicateObjectId { table: &'static str, key: String },

  #[error("username {0:?} is already taken")]
  DuplicateUsername(String),

  #[error("incorrect password")]
  IncorrectPassword,

  #[error("auth token is missing or no longer valid")]
  InvalidToken,

  /// A loaded record points at a person owned by a different user.
  #[error("{table} {key:?} refers to person {person_id:?} of another user")]
  ForeignPerson {
    table:     &'static str,
    key:       String,
    person_id: String,
  },

  #[error("{kind} {id:?} not found")]
  NotFound { kind: &'static str, id: String },

  #[error("{kind} {id:?} belongs to another user")]
  Forbidden { kind: &'static str, id: String },

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error(transparent)]
  Core(#[from] famtree_core::Error),

  #[error("store error: {0}")]
  Store(#[from] famtree_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
