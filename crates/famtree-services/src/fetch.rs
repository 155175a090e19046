//! Read access to a user's persons and events, scoped by auth token.

use famtree_core::{event::Event, person::Person};
use famtree_store_sqlite::{Database, Outcome, Record, Session};

use crate::{Error, Result, account::owner_of};

/// Reads never write, so every transaction here ends in a rollback.
pub struct FetchService<'a> {
  db: &'a Database,
}

impl<'a> FetchService<'a> {
  pub fn new(db: &'a Database) -> Self { Self { db } }

  /// Every person in the token owner's tree.
  pub fn persons(&self, token: &str) -> Result<Vec<Person>> {
    self.read(|session| {
      let owner = owner_of(session, token)?;
      Ok(session.persons().find_for_user(&owner)?)
    })
  }

  /// One person, which must belong to the token's owner.
  pub fn person(&self, token: &str, id: &str) -> Result<Person> {
    self.read(|session| {
      let owner = owner_of(session, token)?;
      let person = session.persons().find(id)?;
      owned(person, &owner, id)
    })
  }

  /// Every event owned by the token's owner.
  pub fn events(&self, token: &str) -> Result<Vec<Event>> {
    self.read(|session| {
      let owner = owner_of(session, token)?;
      Ok(session.events().find_for_user(&owner)?)
    })
  }

  /// One event, which must belong to the token's owner.
  pub fn event(&self, token: &str, id: &str) -> Result<Event> {
    self.read(|session| {
      let owner = owner_of(session, token)?;
      let event = session.events().find(id)?;
      owned(event, &owner, id)
    })
  }

  fn read<T>(&self, work: impl FnOnce(&Session<'_>) -> Result<T>) -> Result<T> {
    self.db.run_transaction(|session| work(session).map(Outcome::Rollback))
  }
}

/// Records that name their owning user.
trait Owned: Record {
  fn owner(&self) -> &str;
}

impl Owned for Person {
  fn owner(&self) -> &str { &self.associated_username }
}

impl Owned for Event {
  fn owner(&self) -> &str { &self.associated_username }
}

fn owned<R: Owned>(record: Option<R>, owner: &str, id: &str) -> Result<R> {
  let kind = R::TABLE.name;
  match record {
    None => Err(Error::NotFound { kind, id: id.to_owned() }),
    Some(r) if r.owner() != owner => {
      Err(Error::Forbidden { kind, id: id.to_owned() })
    }
    Some(r) => Ok(r),
  }
}

#[cfg(test)]
mod tests {
  use famtree_core::{corpus::StaticCorpus, person::Gender};

  use super::*;
  use crate::account::{AccountService, Registration};

  /// Register `username` and return their token and root person id.
  fn register(
    db: &Database,
    username: &str,
    generations: i32,
  ) -> (String, String) {
    let corpus = StaticCorpus::builtin().unwrap();
    let result = AccountService::new(db, &corpus)
      .register(
        Registration {
          username:   username.into(),
          password:   "pw".into(),
          email:      format!("{username}@example.com"),
          first_name: "Alan".into(),
          last_name:  "Turing".into(),
          gender:     Gender::Male,
        },
        generations,
      )
      .unwrap();
    (result.auth_token, result.person_id)
  }

  #[test]
  fn lists_only_the_owners_records() {
    let db = Database::open_in_memory().unwrap();
    let (alan, _) = register(&db, "alan", 2);
    register(&db, "joan", 1);

    let fetch = FetchService::new(&db);
    let persons = fetch.persons(&alan).unwrap();
    assert_eq!(persons.len(), 7);
    assert!(persons.iter().all(|p| p.associated_username == "alan"));

    let events = fetch.events(&alan).unwrap();
    assert_eq!(events.len(), 19);
    assert!(events.iter().all(|e| e.associated_username == "alan"));
  }

  #[test]
  fn single_lookups() {
    let db = Database::open_in_memory().unwrap();
    let (alan, alan_root) = register(&db, "alan", 1);
    let (joan, joan_root) = register(&db, "joan", 0);
    let fetch = FetchService::new(&db);

    let root = fetch.person(&alan, &alan_root).unwrap();
    assert_eq!(root.first_name, "Alan");
    assert!(root.has_parents());

    let birth = fetch.events(&joan).unwrap().remove(0);
    assert_eq!(fetch.event(&joan, &birth.id).unwrap(), birth);

    assert!(matches!(
      fetch.person(&alan, &joan_root),
      Err(Error::Forbidden { kind: "Person", .. })
    ));
    assert!(matches!(
      fetch.event(&alan, &birth.id),
      Err(Error::Forbidden { kind: "Event", .. })
    ));
    assert!(matches!(
      fetch.person(&alan, "missing"),
      Err(Error::NotFound { kind: "Person", .. })
    ));
  }

  #[test]
  fn rejects_unknown_tokens() {
    let db = Database::open_in_memory().unwrap();
    register(&db, "alan", 0);
    let fetch = FetchService::new(&db);
    assert!(matches!(fetch.persons("nope"), Err(Error::InvalidToken)));
    assert!(matches!(fetch.event("nope", "x"), Err(Error::InvalidToken)));
  }
}
