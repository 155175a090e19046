//! Ancestor-tree synthesis.
//!
//! [`TreeGenerator::generate`] walks backwards from a root person one
//! generation at a time. Every person on the current frontier gets a freshly
//! minted father and mother, and each new couple gets birth, marriage and death
//! events. Nothing here touches the store; given the same corpus, seed and
//! current year the output is identical.

use rand::{Rng, seq::SliceRandom};

use crate::{
  Error, Result,
  corpus::{Corpus, Location},
  event::{Event, EventType},
  id::new_object_id,
  person::{Gender, Person},
};

// ─── Ages ────────────────────────────────────────────────────────────────────

/// Assumed age of the root person in the current year.
pub const ROOT_CURRENT_AGE: i32 = 23;
/// A father's age when his child is born.
pub const FATHER_AGE: i32 = 23;
/// A father's age when the couple marries.
pub const MARRIAGE_AGE: i32 = 21;
/// A father's age at death, before clamping and jitter.
pub const LIFE_EXPECTANCY: i32 = 85;

/// Largest generation count [`TreeGenerator::generate`] accepts. The tree
/// doubles with every generation, so this caps one fill at
/// `2^(MAX_GENERATIONS + 1) - 1` persons.
pub const MAX_GENERATIONS: i32 = 16;

const MOTHER_BIRTH_JITTER: i32 = 2;
const MOTHER_DEATH_JITTER: i32 = 5;

// ─── Output ──────────────────────────────────────────────────────────────────

/// The records produced by one generator run.
#[derive(Debug, Clone)]
pub struct GeneratedTree {
  /// The caller's root person, with parent links set when `generations > 0`.
  pub root:      Person,
  /// Every synthesized ancestor, `2^(g+1) - 2` of them for `g` generations.
  pub ancestors: Vec<Person>,
  /// All events, starting with the root's birth.
  pub events:    Vec<Event>,
}

impl GeneratedTree {
  /// The root followed by every ancestor.
  pub fn persons(&self) -> impl Iterator<Item = &Person> {
    std::iter::once(&self.root).chain(&self.ancestors)
  }

  pub fn person_count(&self) -> usize { 1 + self.ancestors.len() }
}

// ─── Generator ───────────────────────────────────────────────────────────────

/// Synthesizes ancestor trees from a corpus and a random source.
pub struct TreeGenerator<'c, C, R> {
  corpus:       &'c C,
  rng:          R,
  current_year: i32,
}

impl<'c, C: Corpus, R: Rng> TreeGenerator<'c, C, R> {
  pub fn new(corpus: &'c C, rng: R, current_year: i32) -> Self {
    Self { corpus, rng, current_year }
  }

  /// The year the root person was born.
  pub fn root_birth_year(&self) -> i32 { self.current_year - ROOT_CURRENT_AGE }

  /// Build `generations` generations of ancestors for `root`, all owned by
  /// `owner`.
  pub fn generate(
    &mut self,
    root: &Person,
    generations: i32,
    owner: &str,
  ) -> Result<GeneratedTree> {
    if owner.is_empty() {
      return Err(Error::EmptyUsername);
    }
    if generations < 0 {
      return Err(Error::NegativeGenerations(generations));
    }
    if generations > MAX_GENERATIONS {
      return Err(Error::TooManyGenerations {
        requested: generations,
        max:       MAX_GENERATIONS,
      });
    }
    if root.associated_username != owner {
      return Err(Error::OwnerMismatch {
        person_id: root.id.clone(),
        expected:  owner.to_owned(),
        actual:    root.associated_username.clone(),
      });
    }

    let root_birth = self.root_birth_year();
    let mut events = vec![self.event(
      owner,
      &root.id,
      EventType::Birth,
      root_birth,
      None,
    )?];

    // Index 0 is the root; the frontier holds indices into `persons` so
    // children can be linked to parents after both exist.
    let mut persons = vec![root.clone()];
    let mut frontier = vec![0usize];

    for generation in 1..=generations {
      let fathers_birth = root_birth - FATHER_AGE * generation;
      let mut next = Vec::with_capacity(frontier.len() * 2);

      for child_idx in frontier {
        let (father, mother) =
          self.couple(&persons[child_idx], owner, fathers_birth, &mut events)?;
        persons[child_idx].set_parents(&father.id, &mother.id);

        next.push(persons.len());
        persons.push(father);
        next.push(persons.len());
        persons.push(mother);
      }

      frontier = next;
    }

    let ancestors = persons.split_off(1);
    let root = persons.pop().unwrap_or_else(|| root.clone());

    Ok(GeneratedTree { root, ancestors, events })
  }

  /// Synthesize the parents of `child` plus their six life events.
  fn couple(
    &mut self,
    child: &Person,
    owner: &str,
    fathers_birth: i32,
    events: &mut Vec<Event>,
  ) -> Result<(Person, Person)> {
    // A son carries his father's surname; a daughter's maiden name is not
    // recorded, so her father gets a fresh one.
    let surname = match child.gender {
      Gender::Male => child.last_name.clone(),
      Gender::Female => self.last_name()?,
    };

    let mut father = Person::new(
      new_object_id(&mut self.rng),
      owner,
      self.first_name(Gender::Male)?,
      surname.clone(),
      Gender::Male,
    );
    let mut mother = Person::new(
      new_object_id(&mut self.rng),
      owner,
      self.first_name(Gender::Female)?,
      surname,
      Gender::Female,
    );
    father.spouse_id = Some(mother.id.clone());
    mother.spouse_id = Some(father.id.clone());

    // Birth
    let mothers_birth = self.jitter(fathers_birth, MOTHER_BIRTH_JITTER);
    events.push(self.event(owner, &father.id, EventType::Birth, fathers_birth, None)?);
    events.push(self.event(owner, &mother.id, EventType::Birth, mothers_birth, None)?);

    // Marriage: one year, one place
    let marriage_year = fathers_birth + MARRIAGE_AGE;
    let marriage_place = self.location()?;
    events.push(self.event(
      owner,
      &father.id,
      EventType::Marriage,
      marriage_year,
      Some(marriage_place.clone()),
    )?);
    events.push(self.event(
      owner,
      &mother.id,
      EventType::Marriage,
      marriage_year,
      Some(marriage_place),
    )?);

    // Death: one place, years may differ
    let expected_death = fathers_birth + LIFE_EXPECTANCY;
    let fathers_death = self.clamp_to_past(expected_death);
    let mothers_death = self.jitter(expected_death, MOTHER_DEATH_JITTER);
    let mothers_death = self.clamp_to_past(mothers_death);
    let death_place = self.location()?;
    events.push(self.event(
      owner,
      &father.id,
      EventType::Death,
      fathers_death,
      Some(death_place.clone()),
    )?);
    events.push(self.event(
      owner,
      &mother.id,
      EventType::Death,
      mothers_death,
      Some(death_place),
    )?);

    Ok((father, mother))
  }

  fn event(
    &mut self,
    owner: &str,
    person_id: &str,
    event_type: EventType,
    year: i32,
    place: Option<Location>,
  ) -> Result<Event> {
    let place = match place {
      Some(place) => place,
      None => self.location()?,
    };
    Ok(Event {
      id: new_object_id(&mut self.rng),
      associated_username: owner.to_owned(),
      person_id: person_id.to_owned(),
      latitude: Some(place.latitude),
      longitude: Some(place.longitude),
      country: Some(place.country),
      city: Some(place.city),
      event_type,
      year,
    })
  }

  /// Deaths never land in the current year or later.
  fn clamp_to_past(&self, year: i32) -> i32 { year.min(self.current_year - 1) }

  fn jitter(&mut self, year: i32, delta: i32) -> i32 {
    self.rng.gen_range(year - delta..=year + delta)
  }

  fn first_name(&mut self, gender: Gender) -> Result<String> {
    let what = match gender {
      Gender::Male => "male first names",
      Gender::Female => "female first names",
    };
    self
      .corpus
      .first_names(gender)
      .choose(&mut self.rng)
      .cloned()
      .ok_or(Error::EmptyCorpus(what))
  }

  fn last_name(&mut self) -> Result<String> {
    self
      .corpus
      .last_names()
      .choose(&mut self.rng)
      .cloned()
      .ok_or(Error::EmptyCorpus("last names"))
  }

  fn location(&mut self) -> Result<Location> {
    self
      .corpus
      .locations()
      .choose(&mut self.rng)
      .cloned()
      .ok_or(Error::EmptyCorpus("locations"))
  }
}

#[cfg(test)]
mod tests {
  use std::collections::{HashMap, HashSet};

  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::corpus::StaticCorpus;

  const YEAR: i32 = 2024;

  fn corpus() -> StaticCorpus { StaticCorpus::builtin().unwrap() }

  fn root() -> Person {
    Person::new("root", "alice", "Alice", "Smith", Gender::Female)
  }

  fn generate(corpus: &StaticCorpus, seed: u64, g: i32) -> GeneratedTree {
    TreeGenerator::new(corpus, StdRng::seed_from_u64(seed), YEAR)
      .generate(&root(), g, "alice")
      .unwrap()
  }

  fn births(tree: &GeneratedTree) -> HashMap<&str, i32> {
    tree
      .events
      .iter()
      .filter(|e| e.event_type == EventType::Birth)
      .map(|e| (e.person_id.as_str(), e.year))
      .collect()
  }

  #[test]
  fn generation_zero_is_root_and_birth() {
    let corpus = corpus();
    let tree = generate(&corpus, 1, 0);
    assert_eq!(tree.root, root());
    assert!(tree.ancestors.is_empty());
    assert_eq!(tree.events.len(), 1);
    assert_eq!(tree.events[0].person_id, "root");
    assert_eq!(tree.events[0].event_type, EventType::Birth);
    assert_eq!(tree.events[0].year, YEAR - ROOT_CURRENT_AGE);
  }

  #[test]
  fn ancestor_and_event_counts() {
    let corpus = corpus();
    for g in 0..6 {
      let tree = generate(&corpus, g as u64, g);
      let couples = (1usize << g) - 1;
      assert_eq!(tree.ancestors.len(), (1usize << (g + 1)) - 2, "g = {g}");
      assert_eq!(tree.person_count(), tree.ancestors.len() + 1);
      assert!(tree.events.len() >= 4 * couples);
      assert_eq!(tree.events.len(), 1 + 6 * couples);
    }
  }

  #[test]
  fn every_record_is_owned_by_the_caller() {
    let corpus = corpus();
    let tree = generate(&corpus, 3, 3);
    assert!(tree.persons().all(|p| p.associated_username == "alice"));
    assert!(tree.events.iter().all(|e| e.associated_username == "alice"));
  }

  #[test]
  fn event_subjects_are_generated_persons() {
    let corpus = corpus();
    let tree = generate(&corpus, 4, 3);
    let ids: HashSet<&str> = tree.persons().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), tree.person_count());
    assert!(tree.events.iter().all(|e| ids.contains(e.person_id.as_str())));

    let event_ids: HashSet<&str> =
      tree.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(event_ids.len(), tree.events.len());
  }

  #[test]
  fn spouses_are_reciprocal() {
    let corpus = corpus();
    let tree = generate(&corpus, 5, 3);
    let by_id: HashMap<&str, &Person> =
      tree.persons().map(|p| (p.id.as_str(), p)).collect();

    for person in &tree.ancestors {
      let spouse_id = person.spouse_id.as_deref().unwrap();
      let spouse = by_id[spouse_id];
      assert_eq!(spouse.spouse_id.as_deref(), Some(person.id.as_str()));
      assert_ne!(spouse.gender, person.gender);
      assert_eq!(spouse.last_name, person.last_name);
    }
  }

  #[test]
  fn parent_links_are_all_or_nothing() {
    let corpus = corpus();
    let tree = generate(&corpus, 6, 2);
    for person in tree.persons() {
      assert_eq!(person.father_id.is_some(), person.mother_id.is_some());
    }
    assert!(tree.root.has_parents());

    // Only the oldest generation lacks parents.
    let orphans = tree.persons().filter(|p| !p.has_parents()).count();
    assert_eq!(orphans, 4);
  }

  #[test]
  fn fathers_and_mothers_have_the_right_gender() {
    let corpus = corpus();
    let tree = generate(&corpus, 7, 3);
    let by_id: HashMap<&str, &Person> =
      tree.persons().map(|p| (p.id.as_str(), p)).collect();
    for child in tree.persons().filter(|p| p.has_parents()) {
      let father = by_id[child.father_id.as_deref().unwrap()];
      let mother = by_id[child.mother_id.as_deref().unwrap()];
      assert_eq!(father.gender, Gender::Male);
      assert_eq!(mother.gender, Gender::Female);
      assert_eq!(father.spouse_id.as_deref(), Some(mother.id.as_str()));
      if child.gender == Gender::Male {
        assert_eq!(father.last_name, child.last_name);
      }
    }
  }

  #[test]
  fn births_precede_the_current_year_and_children() {
    let corpus = corpus();
    let tree = generate(&corpus, 8, 4);
    let births = births(&tree);
    assert_eq!(births.len(), tree.person_count());
    assert!(births.values().all(|&year| year < YEAR));

    for child in tree.persons().filter(|p| p.has_parents()) {
      let child_birth = births[child.id.as_str()];
      for parent in [&child.father_id, &child.mother_id] {
        let parent_birth = births[parent.as_deref().unwrap()];
        assert!(child_birth - parent_birth >= 13, "{child_birth} vs {parent_birth}");
      }
    }
  }

  #[test]
  fn couples_share_marriage_year_and_place() {
    let corpus = corpus();
    let tree = generate(&corpus, 9, 3);
    let marriages: HashMap<&str, &Event> = tree
      .events
      .iter()
      .filter(|e| e.event_type == EventType::Marriage)
      .map(|e| (e.person_id.as_str(), e))
      .collect();
    assert_eq!(marriages.len(), tree.ancestors.len());

    for person in &tree.ancestors {
      let mine = marriages[person.id.as_str()];
      let theirs = marriages[person.spouse_id.as_deref().unwrap()];
      assert_eq!(mine.year, theirs.year);
      assert_eq!(mine.city, theirs.city);
      assert_eq!(mine.latitude, theirs.latitude);
    }
  }

  #[test]
  fn deaths_share_place_and_stay_in_the_past() {
    let corpus = corpus();
    let tree = generate(&corpus, 10, 3);
    let births = births(&tree);
    let deaths: HashMap<&str, &Event> = tree
      .events
      .iter()
      .filter(|e| e.event_type == EventType::Death)
      .map(|e| (e.person_id.as_str(), e))
      .collect();
    assert_eq!(deaths.len(), tree.ancestors.len());

    for person in &tree.ancestors {
      let mine = deaths[person.id.as_str()];
      let theirs = deaths[person.spouse_id.as_deref().unwrap()];
      assert_eq!(mine.country, theirs.country);
      assert_eq!(mine.city, theirs.city);
      assert!(mine.year < YEAR);
      assert!(mine.year > births[person.id.as_str()]);
    }
  }

  #[test]
  fn same_seed_same_tree() {
    let corpus = corpus();
    let a = generate(&corpus, 99, 3);
    let b = generate(&corpus, 99, 3);
    assert_eq!(a.ancestors, b.ancestors);
    assert_eq!(a.events, b.events);

    let c = generate(&corpus, 100, 3);
    assert_ne!(a.ancestors[0].id, c.ancestors[0].id);
  }

  #[test]
  fn preconditions_fail_fast() {
    let corpus = corpus();
    let mut generator =
      TreeGenerator::new(&corpus, StdRng::seed_from_u64(0), YEAR);

    assert!(matches!(
      generator.generate(&root(), -1, "alice"),
      Err(Error::NegativeGenerations(-1))
    ));
    assert!(matches!(
      generator.generate(&root(), 2, ""),
      Err(Error::EmptyUsername)
    ));
    assert!(matches!(
      generator.generate(&root(), 30, "alice"),
      Err(Error::TooManyGenerations { requested: 30, max: MAX_GENERATIONS })
    ));
    assert!(matches!(
      generator.generate(&root(), 2, "bob"),
      Err(Error::OwnerMismatch { .. })
    ));
  }

  #[test]
  fn empty_corpus_is_reported() {
    let empty = StaticCorpus::default();
    let mut generator =
      TreeGenerator::new(&empty, StdRng::seed_from_u64(0), YEAR);
    assert!(matches!(
      generator.generate(&root(), 1, "alice"),
      Err(Error::EmptyCorpus("locations"))
    ));
  }
}
