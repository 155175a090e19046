//! A single node of a user's family tree.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// A person's gender, stored as `m` or `f`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum Gender {
  #[serde(rename = "m")]
  #[strum(serialize = "m")]
  Male,
  #[serde(rename = "f")]
  #[strum(serialize = "f")]
  Female,
}

impl Gender {
  /// The one-letter code stored in the `gender` column.
  pub fn code(self) -> &'static str { self.into() }

  /// Parse a stored one-letter code.
  pub fn from_code(code: &str) -> Result<Self> {
    code
      .parse()
      .map_err(|_| Error::UnknownGender(code.to_owned()))
  }
}

/// A member of a user's family tree.
///
/// A person has either both parent links or neither. When `spouse_id` is set,
/// the spouse record points back at this person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  #[serde(rename = "personID")]
  pub id:                  String,
  pub associated_username: String,
  pub first_name:          String,
  pub last_name:           String,
  pub gender:              Gender,
  #[serde(rename = "fatherID", default, skip_serializing_if = "Option::is_none")]
  pub father_id:           Option<String>,
  #[serde(rename = "motherID", default, skip_serializing_if = "Option::is_none")]
  pub mother_id:           Option<String>,
  #[serde(rename = "spouseID", default, skip_serializing_if = "Option::is_none")]
  pub spouse_id:           Option<String>,
}

impl Person {
  /// A person with no family links.
  pub fn new(
    id: impl Into<String>,
    associated_username: impl Into<String>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    gender: Gender,
  ) -> Self {
    Self {
      id: id.into(),
      associated_username: associated_username.into(),
      first_name: first_name.into(),
      last_name: last_name.into(),
      gender,
      father_id: None,
      mother_id: None,
      spouse_id: None,
    }
  }

  /// Link this person to a father and mother at once.
  pub fn set_parents(&mut self, father_id: &str, mother_id: &str) {
    self.father_id = Some(father_id.to_owned());
    self.mother_id = Some(mother_id.to_owned());
  }

  /// `true` when both parent links are set.
  pub fn has_parents(&self) -> bool {
    self.father_id.is_some() && self.mother_id.is_some()
  }
}
