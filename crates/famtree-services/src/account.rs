//! User accounts: registration, login and bearer-token authentication.

use chrono::Utc;
use famtree_core::{
  corpus::Corpus,
  id::new_object_id,
  person::{Gender, Person},
  user::{AuthToken, User},
};
use famtree_store_sqlite::{Database, Outcome, Session};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Error, Result,
  fill::FillService,
  password::{hash_password, verify_password},
};

/// Details supplied when a new user signs up. `password` is plaintext and is
/// hashed before it is stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub username:   String,
  pub password:   String,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
  pub gender:     Gender,
}

/// Returned by a successful register or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResult {
  #[serde(rename = "authtoken")]
  pub auth_token: String,
  pub username:   String,
  #[serde(rename = "personID")]
  pub person_id:  String,
}

pub struct AccountService<'a, C> {
  db:   &'a Database,
  fill: FillService<'a, C>,
}

impl<'a, C: Corpus> AccountService<'a, C> {
  pub fn new(db: &'a Database, corpus: &'a C) -> Self {
    Self { db, fill: FillService::new(db, corpus) }
  }

  /// Create a user, give them a root person and a first token, then fill
  /// `generations` generations of ancestors.
  pub fn register(
    &self,
    registration: Registration,
    generations: i32,
  ) -> Result<AuthResult> {
    if registration.username.is_empty() {
      return Err(famtree_core::Error::EmptyUsername.into());
    }
    let password = hash_password(&registration.password)?;

    let mut rng = rand::thread_rng();
    let person_id = new_object_id(&mut rng);
    let token = new_token(&registration.username, &mut rng);

    let user = User {
      person_id: Some(person_id.clone()),
      password,
      username: registration.username,
      email: registration.email,
      first_name: registration.first_name,
      last_name: registration.last_name,
      gender: registration.gender,
    };
    let root = Person::new(
      &person_id,
      &user.username,
      &user.first_name,
      &user.last_name,
      user.gender,
    );

    self.db.run_transaction(|session| {
      match session.users().insert(&user) {
        Err(famtree_store_sqlite::Error::DuplicateKey { .. }) => {
          return Err(Error::DuplicateUsername(user.username.clone()));
        }
        other => other?,
      }
      session.persons().insert(&root)?;
      session.auth_tokens().insert(&token)?;
      Ok(Outcome::Commit(()))
    })?;
    info!(username = %user.username, "registered user");

    self.fill.fill(&user.username, generations)?;

    Ok(AuthResult {
      auth_token: token.id,
      username: user.username,
      person_id,
    })
  }

  /// Check `password` and issue a new token.
  pub fn login(&self, username: &str, password: &str) -> Result<AuthResult> {
    let token = new_token(username, &mut rand::thread_rng());

    let person_id = self.db.run_transaction(|session| {
      let user = session
        .users()
        .find(username)?
        .ok_or_else(|| Error::UserNotFound(username.to_owned()))?;
      if !verify_password(password, &user.password) {
        warn!(username, "rejected login");
        return Err(Error::IncorrectPassword);
      }
      session.auth_tokens().insert(&token)?;
      Ok(Outcome::Commit(user.person_id.unwrap_or_default()))
    })?;
    info!(username, "logged in");

    Ok(AuthResult {
      auth_token: token.id,
      username: username.to_owned(),
      person_id,
    })
  }

  /// The username a valid token was issued to.
  pub fn authenticate(&self, token: &str) -> Result<String> {
    self.db.run_transaction(|session| {
      owner_of(session, token).map(Outcome::Rollback)
    })
  }

  /// Mark `token` as no longer valid. Revoking an unknown or already revoked
  /// token fails with [`Error::InvalidToken`].
  pub fn revoke(&self, token: &str) -> Result<()> {
    self.db.run_transaction(|session| {
      let tokens = session.auth_tokens();
      let mut stored = tokens
        .find(token)?
        .filter(|t| t.is_valid)
        .ok_or(Error::InvalidToken)?;
      stored.is_valid = false;
      tokens.replace(&stored)?;
      Ok(Outcome::Commit(()))
    })
  }
}

/// Resolve `token` to its owner inside an open session.
pub(crate) fn owner_of(session: &Session<'_>, token: &str) -> Result<String> {
  match session.auth_tokens().find(token)? {
    Some(stored) if stored.is_valid => Ok(stored.associated_username),
    _ => Err(Error::InvalidToken),
  }
}

fn new_token<R: rand::Rng>(username: &str, rng: &mut R) -> AuthToken {
  AuthToken {
    id:                  new_object_id(rng),
    associated_username: username.to_owned(),
    created_at:          Utc::now(),
    is_valid:            true,
  }
}
