//! `CliConfig`: settings layered from a TOML file, `FAMTREE_*` environment
//! variables and command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Generations filled by `register`, and by `fill` without an explicit count.
pub const DEFAULT_GENERATIONS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  pub store_path:          PathBuf,
  pub default_generations: i32,
  /// Directory holding replacement name lists and locations.
  pub corpus_dir:          Option<PathBuf>,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self {
      store_path:          PathBuf::from("famtree.sqlite"),
      default_generations: DEFAULT_GENERATIONS,
      corpus_dir:          None,
    }
  }
}

impl CliConfig {
  /// Read `file` (if it exists) and the environment, then apply
  /// `store_override`. Leading `~/` in paths is expanded.
  pub fn load(
    file: &Path,
    store_override: Option<&Path>,
  ) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("FAMTREE"))
      .set_override_option(
        "store_path",
        store_override.map(|p| p.to_string_lossy().into_owned()),
      )
      .context("invalid --store override")?
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.corpus_dir = cfg.corpus_dir.as_deref().map(expand_tilde);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
