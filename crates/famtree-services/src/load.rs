//! Wholesale replacement of the store's contents.

use std::collections::{HashMap, HashSet};

use famtree_core::{event::Event, person::Person, user::User};
use famtree_store_sqlite::{Dao, Database, Outcome, Record};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result, password::hash_password};

/// Records to load. User passwords are plaintext.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoadRequest {
  pub users:   Vec<User>,
  pub persons: Vec<Person>,
  pub events:  Vec<Event>,
}

/// Rows actually written by a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
  pub users:   usize,
  pub persons: usize,
  pub events:  usize,
}

/// Delete every row from every table.
pub fn clear(db: &Database) -> Result<()> {
  db.clear_tables()?;
  info!("cleared store");
  Ok(())
}

/// Clear the store, then insert `request`'s records. When several records
/// share a key the first one wins.
///
/// A user's root person and an event's subject must belong to that user or
/// event owner; otherwise the load fails with [`Error::ForeignPerson`] and the
/// store is left as it was.
pub fn load(db: &Database, request: LoadRequest) -> Result<LoadSummary> {
  let mut users = dedupe(request.users);
  let persons = dedupe(request.persons);
  let events = dedupe(request.events);
  check_person_owners(&users, &persons, &events)?;

  for user in &mut users {
    user.password = hash_password(&user.password)?;
  }

  db.clear_tables()?;
  let summary = db.run_transaction(|session| {
    Ok::<_, Error>(Outcome::Commit(LoadSummary {
      users:   insert_all(&session.users(), &users)?,
      persons: insert_all(&session.persons(), &persons)?,
      events:  insert_all(&session.events(), &events)?,
    }))
  })?;

  info!(
    users = summary.users,
    persons = summary.persons,
    events = summary.events,
    "loaded store"
  );
  Ok(summary)
}

fn check_person_owners(
  users: &[User],
  persons: &[Person],
  events: &[Event],
) -> Result<()> {
  let owners: HashMap<&str, &str> = persons
    .iter()
    .map(|p| (p.id.as_str(), p.associated_username.as_str()))
    .collect();
  let foreign = |person_id: &str, owner: &str| {
    owners.get(person_id).is_some_and(|o| *o != owner)
  };

  for user in users {
    if let Some(person_id) = &user.person_id
      && foreign(person_id, &user.username)
    {
      return Err(Error::ForeignPerson {
        table:     User::TABLE.name,
        key:       user.username.clone(),
        person_id: person_id.clone(),
      });
    }
  }
  for event in events {
    if foreign(&event.person_id, &event.associated_username) {
      return Err(Error::ForeignPerson {
        table:     Event::TABLE.name,
        key:       event.id.clone(),
        person_id: event.person_id.clone(),
      });
    }
  }
  Ok(())
}

fn dedupe<R: Record>(records: Vec<R>) -> Vec<R> {
  let mut seen = HashSet::new();
  records
    .into_iter()
    .filter(|r| seen.insert(r.key().to_owned()))
    .collect()
}

fn insert_all<R: Record>(dao: &Dao<'_, R>, records: &[R]) -> Result<usize> {
  let mut written = 0;
  for record in records {
    if dao.insert_if_absent(record)? {
      written += 1;
    }
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use famtree_core::person::Gender;
  use serde_json::json;

  use super::*;
  use crate::password::verify_password;

  fn request() -> LoadRequest {
    serde_json::from_value(json!({
      "users": [
        {
          "username": "sheila", "password": "parker", "email": "s@p.com",
          "firstName": "Sheila", "lastName": "Parker", "gender": "f",
          "personID": "sheila_parker"
        },
        {
          "username": "sheila", "password": "again", "email": "dup@p.com",
          "firstName": "Dup", "lastName": "Dup", "gender": "f"
        }
      ],
      "persons": [
        {
          "personID": "sheila_parker", "associatedUsername": "sheila",
          "firstName": "Sheila", "lastName": "Parker", "gender": "f",
          "fatherID": "blaine_mcgary", "motherID": "betty_white"
        },
        {
          "personID": "blaine_mcgary", "associatedUsername": "sheila",
          "firstName": "Blaine", "lastName": "McGary", "gender": "m",
          "spouseID": "betty_white"
        },
        {
          "personID": "betty_white", "associatedUsername": "sheila",
          "firstName": "Betty", "lastName": "White", "gender": "f",
          "spouseID": "blaine_mcgary"
        }
      ],
      "events": [
        {
          "eventID": "sheila_birth", "associatedUsername": "sheila",
          "personID": "sheila_parker", "latitude": -36.1833,
          "longitude": 144.9667, "country": "Australia", "city": "Melbourne",
          "eventType": "birth", "year": 1970
        },
        {
          "eventID": "sheila_asteroids", "associatedUsername": "sheila",
          "personID": "sheila_parker", "eventType": "completed asteroids",
          "year": 2014
        }
      ]
    }))
    .unwrap()
  }

  #[test]
  fn loads_and_hashes_passwords() {
    let db = Database::open_in_memory().unwrap();
    let summary = load(&db, request()).unwrap();
    assert_eq!(summary, LoadSummary { users: 1, persons: 3, events: 2 });

    let user = db
      .run_transaction(|s| s.users().find("sheila").map(Outcome::Rollback))
      .unwrap()
      .unwrap();
    assert_eq!(user.email, "s@p.com");
    assert_eq!(user.gender, Gender::Female);
    assert!(verify_password("parker", &user.password));
  }

  #[test]
  fn load_replaces_previous_contents() {
    let db = Database::open_in_memory().unwrap();
    load(&db, request()).unwrap();

    let mut smaller = request();
    smaller.events.clear();
    smaller.persons.truncate(1);
    smaller.persons[0].father_id = None;
    smaller.persons[0].mother_id = None;
    let summary = load(&db, smaller).unwrap();
    assert_eq!(summary, LoadSummary { users: 1, persons: 1, events: 0 });
  }

  #[test]
  fn dangling_owner_rolls_back_the_load() {
    let db = Database::open_in_memory().unwrap();
    let mut bad = request();
    bad.users.clear();

    let err = load(&db, bad).unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    let persons = db
      .run_transaction(|s| s.persons().count().map(Outcome::Rollback))
      .unwrap();
    assert_eq!(persons, 0);
  }

  #[test]
  fn records_pointing_at_another_users_person_are_rejected() {
    let db = Database::open_in_memory().unwrap();
    load(&db, request()).unwrap();

    let mut with_bob = request();
    with_bob.users.push(
      serde_json::from_value(json!({
        "username": "bob", "password": "pw", "email": "b@b.com",
        "firstName": "Bob", "lastName": "Brown", "gender": "m",
        "personID": "bob_p"
      }))
      .unwrap(),
    );
    with_bob.persons.push(
      serde_json::from_value(json!({
        "personID": "bob_p", "associatedUsername": "bob",
        "firstName": "Bob", "lastName": "Brown", "gender": "m"
      }))
      .unwrap(),
    );

    let mut stolen_subject = with_bob.clone();
    stolen_subject.events[1].person_id = "bob_p".into();
    assert!(matches!(
      load(&db, stolen_subject),
      Err(Error::ForeignPerson { table: "Event", ref key, .. })
        if key == "sheila_asteroids"
    ));

    let mut stolen_root = with_bob.clone();
    stolen_root.users[0].person_id = Some("bob_p".into());
    assert!(matches!(
      load(&db, stolen_root),
      Err(Error::ForeignPerson { table: "User", ref key, .. })
        if key == "sheila"
    ));

    // The rejected loads left the earlier contents in place.
    let persons = db
      .run_transaction(|s| s.persons().count().map(Outcome::Rollback))
      .unwrap();
    assert_eq!(persons, 3);

    assert_eq!(
      load(&db, with_bob).unwrap(),
      LoadSummary { users: 2, persons: 4, events: 2 }
    );
  }

  #[test]
  fn clear_empties_everything() {
    let db = Database::open_in_memory().unwrap();
    load(&db, request()).unwrap();
    clear(&db).unwrap();
    let total = db
      .run_transaction(|s| {
        let n = s.users().count()? + s.persons().count()? + s.events().count()?;
        Ok::<_, famtree_store_sqlite::Error>(Outcome::Rollback(n))
      })
      .unwrap();
    assert_eq!(total, 0);
  }
}
