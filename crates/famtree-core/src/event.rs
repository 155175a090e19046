//! A dated life event attached to a person.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of life event. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
  Birth,
  Marriage,
  Death,
  Other(String),
}

impl EventType {
  /// The tag stored in the `event_type` column.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Birth => "birth",
      Self::Marriage => "marriage",
      Self::Death => "death",
      Self::Other(tag) => tag,
    }
  }
}

impl From<String> for EventType {
  fn from(tag: String) -> Self {
    match tag.as_str() {
      "birth" => Self::Birth,
      "marriage" => Self::Marriage,
      "death" => Self::Death,
      _ => Self::Other(tag),
    }
  }
}

impl From<&str> for EventType {
  fn from(tag: &str) -> Self { Self::from(tag.to_owned()) }
}

impl From<EventType> for String {
  fn from(ty: EventType) -> Self {
    match ty {
      EventType::Other(tag) => tag,
      known => known.as_str().to_owned(),
    }
  }
}

impl fmt::Display for EventType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A life event. `person_id` must name a person owned by the same user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  #[serde(rename = "eventID")]
  pub id:                  String,
  pub associated_username: String,
  #[serde(rename = "personID")]
  pub person_id:           String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latitude:            Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub longitude:           Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city:                Option<String>,
  pub event_type:          EventType,
  pub year:                i32,
}
