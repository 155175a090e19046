//! User accounts and the auth tokens issued to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::person::Gender;

/// A registered account. Each account owns at most one family tree, rooted at
/// `person_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub username:   String,
  /// Stored credential. The services layer keeps an argon2 PHC string here.
  pub password:   String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub gender:     Gender,
  #[serde(rename = "personID", default, skip_serializing_if = "Option::is_none")]
  pub person_id:  Option<String>,
}

/// A bearer token granting access to one user's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
  #[serde(rename = "authtoken")]
  pub id:                  String,
  pub associated_username: String,
  pub created_at:          DateTime<Utc>,
  pub is_valid:            bool,
}
