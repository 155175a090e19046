//! Name and location corpora drawn on by the tree generator.
//!
//! The generator only sees the [`Corpus`] trait; [`StaticCorpus`] is the
//! stock implementation, built either from the lists compiled into this crate
//! or from a directory of replacement files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, person::Gender};

const MALE_NAMES: &str = include_str!("../data/first_names_male.txt");
const FEMALE_NAMES: &str = include_str!("../data/first_names_female.txt");
const LAST_NAMES: &str = include_str!("../data/last_names.txt");
const LOCATIONS: &str = include_str!("../data/locations.json");

/// File names looked up by [`StaticCorpus::from_dir`].
pub const MALE_NAMES_FILE: &str = "first_names_male.txt";
pub const FEMALE_NAMES_FILE: &str = "first_names_female.txt";
pub const LAST_NAMES_FILE: &str = "last_names.txt";
pub const LOCATIONS_FILE: &str = "locations.json";

/// A real-world place an event can be set in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub country:   String,
  pub city:      String,
  pub latitude:  f64,
  pub longitude: f64,
}

/// On-disk shape of `locations.json`.
#[derive(Deserialize)]
struct LocationList {
  data: Vec<Location>,
}

/// Source of random-draw material for the generator.
pub trait Corpus {
  fn first_names(&self, gender: Gender) -> &[String];
  fn last_names(&self) -> &[String];
  fn locations(&self) -> &[Location];
}

/// A corpus held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCorpus {
  male:      Vec<String>,
  female:    Vec<String>,
  last:      Vec<String>,
  locations: Vec<Location>,
}

impl StaticCorpus {
  /// The corpus compiled into this crate.
  pub fn builtin() -> Result<Self> {
    Self::from_parts(MALE_NAMES, FEMALE_NAMES, LAST_NAMES, LOCATIONS)
  }

  /// Build a corpus from newline-separated name lists and a locations JSON
  /// document of the form `{"data": [{country, city, latitude, longitude}]}`.
  pub fn from_parts(
    male: &str,
    female: &str,
    last: &str,
    locations_json: &str,
  ) -> Result<Self> {
    let LocationList { data } = serde_json::from_str(locations_json)?;
    Ok(Self {
      male:      lines(male),
      female:    lines(female),
      last:      lines(last),
      locations: data,
    })
  }

  /// Read the four corpus files from `dir`.
  pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    let read = |name: &str| {
      let path = dir.join(name);
      std::fs::read_to_string(&path).map_err(|source| Error::CorpusIo {
        path: path.display().to_string(),
        source,
      })
    };
    Self::from_parts(
      &read(MALE_NAMES_FILE)?,
      &read(FEMALE_NAMES_FILE)?,
      &read(LAST_NAMES_FILE)?,
      &read(LOCATIONS_FILE)?,
    )
  }
}

impl Corpus for StaticCorpus {
  fn first_names(&self, gender: Gender) -> &[String] {
    match gender {
      Gender::Male => &self.male,
      Gender::Female => &self.female,
    }
  }

  fn last_names(&self) -> &[String] { &self.last }

  fn locations(&self) -> &[Location] { &self.locations }
}

fn lines(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|l| !l.is_empty())
    .map(str::to_owned)
    .collect()
}
