//! Replacing a user's family tree with a freshly generated one.
//!
//! A fill runs in three phases:
//!
//! 1. **Wipe and anchor**: in one transaction, every person the user owns is
//!    deleted together with their events, as is any other event the user
//!    owns. The user's root person is then re-created from the user's own
//!    details. An existing root id is reused unless another user's person
//!    holds it; otherwise a new id is minted.
//! 2. **Generate**: ancestors and events are synthesized in memory with no
//!    connection held.
//! 3. **Persist**: every generated record is written in a second transaction.
//!    A generated id that is already present in the store fails the fill with
//!    [`Error::DuplicateObjectId`] before anything is written.
//!
//! A failure during persist leaves the user with the anchored root and no
//! ancestors. Running the fill again recovers.

use std::collections::HashSet;

use chrono::{Datelike, Utc};
use famtree_core::{
  corpus::Corpus,
  event::Event,
  generator::{GeneratedTree, MAX_GENERATIONS, TreeGenerator},
  id::new_object_id,
  person::Person,
};
use famtree_store_sqlite::{Database, Outcome, Record, Session};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::{Error, Result};

/// Counts reported after a successful fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillSummary {
  pub person_count: usize,
  pub event_count:  usize,
}

pub struct FillService<'a, C> {
  db:     &'a Database,
  corpus: &'a C,
}

impl<'a, C: Corpus> FillService<'a, C> {
  pub fn new(db: &'a Database, corpus: &'a C) -> Self { Self { db, corpus } }

  /// Replace `username`'s tree with `generations` generations of ancestors,
  /// using fresh entropy and the current calendar year.
  pub fn fill(&self, username: &str, generations: i32) -> Result<FillSummary> {
    self.fill_with(
      username,
      generations,
      StdRng::from_entropy(),
      Utc::now().year(),
    )
  }

  /// [`fill`](Self::fill) with an explicit random source and year.
  pub fn fill_with<R: Rng>(
    &self,
    username: &str,
    generations: i32,
    mut rng: R,
    current_year: i32,
  ) -> Result<FillSummary> {
    if username.is_empty() {
      return Err(famtree_core::Error::EmptyUsername.into());
    }
    if generations < 0 {
      return Err(famtree_core::Error::NegativeGenerations(generations).into());
    }
    if generations > MAX_GENERATIONS {
      return Err(
        famtree_core::Error::TooManyGenerations {
          requested: generations,
          max:       MAX_GENERATIONS,
        }
        .into(),
      );
    }

    let root = self.db.run_transaction(|session| {
      let removed = wipe_in(session, username)?;
      debug!(username, removed, "wiped previous tree");
      anchor_in(session, username, &mut rng).map(Outcome::Commit)
    })?;

    let tree = TreeGenerator::new(self.corpus, rng, current_year).generate(
      &root,
      generations,
      username,
    )?;
    check_unique_ids(&tree)?;
    self.persist(&tree)?;

    let summary = FillSummary {
      person_count: tree.person_count(),
      event_count:  tree.events.len(),
    };
    info!(
      username,
      generations,
      persons = summary.person_count,
      events = summary.event_count,
      "filled family tree"
    );
    Ok(summary)
  }

  /// Delete every person `username` owns, and their events, in one
  /// transaction. The user row is kept. Returns the number of persons removed.
  pub fn wipe(&self, username: &str) -> Result<usize> {
    self.db.run_transaction(|session| {
      wipe_in(session, username).map(Outcome::Commit)
    })
  }

  /// Write the tree. The root was anchored already and is replaced to pick
  /// up its parent links; every other id must be new to the store.
  fn persist(&self, tree: &GeneratedTree) -> Result<()> {
    self.db.run_transaction(|session| {
      let persons = session.persons();
      let events = session.events();
      for person in &tree.ancestors {
        ensure_unused(persons.find(&person.id)?, &person.id)?;
      }
      for event in &tree.events {
        ensure_unused(events.find(&event.id)?, &event.id)?;
      }

      for person in tree.persons() {
        persons.replace(person)?;
      }
      for event in &tree.events {
        events.replace(event)?;
      }
      Ok(Outcome::Commit(()))
    })
  }
}

// ─── Phases ──────────────────────────────────────────────────────────────────

fn wipe_in(session: &Session<'_>, username: &str) -> Result<usize> {
  if session.users().find(username)?.is_none() {
    return Err(Error::UserNotFound(username.to_owned()));
  }

  let persons = session.persons();
  let events = session.events();
  let owned = persons.find_for_user(username)?;
  for person in &owned {
    for event in events.find_for_person(&person.id)? {
      events.delete(&event.id)?;
    }
    persons.delete(&person.id)?;
  }
  // Events the user owns whose subject was never one of their persons.
  for event in events.find_for_user(username)? {
    events.delete(&event.id)?;
  }
  Ok(owned.len())
}

/// Re-create the root person for `username` and point the user at it.
fn anchor_in<R: Rng>(
  session: &Session<'_>,
  username: &str,
  rng: &mut R,
) -> Result<Person> {
  let users = session.users();
  let mut user = users
    .find(username)?
    .ok_or_else(|| Error::UserNotFound(username.to_owned()))?;

  // A root id already taken by another user's person is never reused.
  let person_id = match user.person_id.take() {
    Some(id) if !owned_by_other(session, &id, username)? => id,
    _ => new_object_id(rng),
  };
  let root = Person::new(
    &person_id,
    username,
    &user.first_name,
    &user.last_name,
    user.gender,
  );

  user.person_id = Some(person_id);
  users.replace(&user)?;
  session.persons().replace(&root)?;
  Ok(root)
}

fn owned_by_other(
  session: &Session<'_>,
  person_id: &str,
  username: &str,
) -> Result<bool> {
  Ok(
    session
      .persons()
      .find(person_id)?
      .is_some_and(|p| p.associated_username != username),
  )
}

fn ensure_unused<R: Record>(existing: Option<R>, id: &str) -> Result<()> {
  match existing {
    Some(_) => Err(Error::DuplicateObjectId {
      table: R::TABLE.name,
      key:   id.to_owned(),
    }),
    None => Ok(()),
  }
}

/// Reject a tree in which two records of the same table share an id.
fn check_unique_ids(tree: &GeneratedTree) -> Result<()> {
  let mut seen = HashSet::new();
  for person in tree.persons() {
    if !seen.insert(person.id.as_str()) {
      return Err(Error::DuplicateObjectId {
        table: Person::TABLE.name,
        key:   person.id.clone(),
      });
    }
  }

  seen.clear();
  for event in &tree.events {
    if !seen.insert(event.id.as_str()) {
      return Err(Error::DuplicateObjectId {
        table: Event::TABLE.name,
        key:   event.id.clone(),
      });
    }
  }
  Ok(())
}
