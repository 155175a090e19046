//! Error types for `famtree-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("username must not be empty")]
  EmptyUsername,

  #[error("generation count must be zero or greater, got {0}")]
  NegativeGenerations(i32),

  #[error("at most {max} generations can be generated, got {requested}")]
  TooManyGenerations { requested: i32, max: i32 },

  #[error("root person {person_id} belongs to {actual:?}, not {expected:?}")]
  OwnerMismatch {
    person_id: String,
    expected:  String,
    actual:    String,
  },

  #[error("corpus has no {0}")]
  EmptyCorpus(&'static str),

  #[error("unknown gender: {0:?}")]
  UnknownGender(String),

  #[error("corpus file {path}: {source}")]
  CorpusIo {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
